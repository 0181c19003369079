// SPDX-License-Identifier: GPL-3.0-only

//! Hand-off structures between the acquisition thread and capture calls
//!
//! The acquisition side publishes fully formed, immutable snapshots. A
//! capture call clones the latest `Arc` under a short lock and copies out of
//! it after the lock is released, so it never observes a half-written frame
//! and never blocks the acquisition thread for the duration of a copy.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tracing::{debug, trace};

/// Latest-value slot holding an immutable snapshot
pub struct SnapshotSlot<T> {
    latest: Mutex<Option<Arc<T>>>,
    published: Condvar,
}

impl<T> SnapshotSlot<T> {
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(None),
            published: Condvar::new(),
        }
    }

    /// Replace the current snapshot, waking anyone waiting for the first one
    pub fn publish(&self, value: T) -> Arc<T> {
        let snapshot = Arc::new(value);
        if let Ok(mut guard) = self.latest.lock() {
            *guard = Some(Arc::clone(&snapshot));
        }
        self.published.notify_all();
        snapshot
    }

    /// Most recent snapshot, if any was published
    pub fn latest(&self) -> Option<Arc<T>> {
        self.latest.lock().ok()?.clone()
    }

    /// Block until a snapshot exists or the timeout elapses
    pub fn wait_for_first(&self, timeout: Duration) -> Option<Arc<T>> {
        let guard = self.latest.lock().ok()?;
        let (guard, result) = self
            .published
            .wait_timeout_while(guard, timeout, |latest| latest.is_none())
            .ok()?;
        if result.timed_out() {
            debug!(?timeout, "Timed out waiting for first snapshot");
        }
        guard.clone()
    }

    /// Drop the current snapshot
    pub fn clear(&self) {
        if let Ok(mut guard) = self.latest.lock() {
            *guard = None;
        }
    }
}

impl<T> Default for SnapshotSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded FIFO of raw audio bytes
///
/// Audio is a stream rather than a latest-value snapshot: every byte is
/// delivered once. When the consumer falls behind, the oldest bytes are
/// discarded to keep the queue within `capacity`.
pub struct AudioQueue {
    bytes: Mutex<VecDeque<u8>>,
    capacity: usize,
}

impl AudioQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append samples, discarding the oldest bytes on overflow
    pub fn push(&self, samples: &[u8]) {
        let Ok(mut queue) = self.bytes.lock() else {
            return;
        };

        // Only the newest `capacity` bytes of an oversized chunk can survive
        let samples = &samples[samples.len().saturating_sub(self.capacity)..];
        let overflow = (queue.len() + samples.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            trace!(overflow, "Audio queue full, dropping oldest bytes");
            let discard = overflow.min(queue.len());
            queue.drain(..discard);
        }
        queue.extend(samples.iter().copied());
    }

    /// Move up to `buffer.len()` bytes into `buffer`, returning the count
    pub fn drain_into(&self, buffer: &mut [u8]) -> usize {
        let Ok(mut queue) = self.bytes.lock() else {
            return 0;
        };
        let count = buffer.len().min(queue.len());
        for (dst, src) in buffer.iter_mut().zip(queue.drain(..count)) {
            *dst = src;
        }
        count
    }

    pub fn len(&self) -> usize {
        self.bytes.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
