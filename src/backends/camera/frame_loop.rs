// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle for acquisition loops
//!
//! Drivers run their hardware polling on a dedicated thread that publishes
//! snapshots. This module owns that thread: starting it, signalling it to
//! stop and joining it when the device handle is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Action returned by one loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Keep acquiring
    Continue,
    /// Leave the loop (device gone or unrecoverable fault)
    Stop,
}

/// Controller for an acquisition loop running on its own thread
///
/// # Example
///
/// ```ignore
/// let controller = AcquisitionLoop::start("synthetic-acquisition", move || {
///     match source.next_event() {
///         SourceEvent::Disconnected(_) => LoopAction::Stop,
///         _ => LoopAction::Continue,
///     }
/// });
/// ```
pub struct AcquisitionLoop {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    iterations: Arc<AtomicU64>,
    name: String,
}

impl AcquisitionLoop {
    /// Spawn the loop thread
    ///
    /// `loop_fn` is called repeatedly until it returns `LoopAction::Stop` or
    /// `stop()` is called. The stop signal is checked before every iteration,
    /// so `loop_fn` must return within a bounded time.
    pub fn start<F>(name: &str, mut loop_fn: F) -> std::io::Result<Self>
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let iterations = Arc::new(AtomicU64::new(0));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let iterations_clone = Arc::clone(&iterations);
        let name_clone = name.to_string();

        info!(name = %name, "Starting acquisition loop");

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!(name = %name_clone, "Acquisition thread started");

                while !stop_signal_clone.load(Ordering::SeqCst) {
                    let action = loop_fn();
                    iterations_clone.fetch_add(1, Ordering::Relaxed);
                    if action == LoopAction::Stop {
                        debug!(name = %name_clone, "Loop requested stop");
                        break;
                    }
                }

                info!(
                    name = %name_clone,
                    iterations = iterations_clone.load(Ordering::Relaxed),
                    "Acquisition thread exiting"
                );
            })?;

        Ok(Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            iterations,
            name: name.to_string(),
        })
    }

    /// True while the thread has not finished
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Completed iterations so far
    pub fn iterations(&self) -> u64 {
        self.iterations.load(Ordering::Relaxed)
    }

    /// Signal the loop to stop without waiting
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting acquisition loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Signal the loop and wait for the thread to exit
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread without signalling it
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Acquisition thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Acquisition thread finished");
            }
        }
    }
}

impl Drop for AcquisitionLoop {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "AcquisitionLoop dropped, stopping thread");
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    #[test]
    fn test_loop_stops_itself() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut controller = AcquisitionLoop::start("test-loop", move || {
            let count = counter_clone.fetch_add(1, Ordering::SeqCst);
            if count >= 10 {
                LoopAction::Stop
            } else {
                LoopAction::Continue
            }
        })
        .unwrap();

        controller.join();

        assert_eq!(counter.load(Ordering::SeqCst), 11);
        assert_eq!(controller.iterations(), 11);
        assert!(!controller.is_running());
    }

    #[test]
    fn test_stop_signal() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut controller = AcquisitionLoop::start("test-loop", move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            LoopAction::Continue
        })
        .unwrap();

        thread::sleep(Duration::from_millis(30));
        controller.stop();

        let after_stop = counter.load(Ordering::SeqCst);
        assert!(after_stop > 0);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(counter.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_drop_stops_thread() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        {
            let _controller = AcquisitionLoop::start("test-loop", move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(1));
                LoopAction::Continue
            })
            .unwrap();
            thread::sleep(Duration::from_millis(10));
        }

        let after_drop = counter.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(counter.load(Ordering::SeqCst), after_drop);
    }
}
