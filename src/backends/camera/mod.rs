// SPDX-License-Identifier: GPL-3.0-only

//! Depth camera capture contract
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐
//! │ Consumers (render, rec) │
//! └───────────┬─────────────┘
//!             │ capture_*(&mut buffer)
//!             ▼
//! ┌─────────────────────────┐
//! │   DepthCamera trait     │  ← capability-tagged contract
//! └───────────┬─────────────┘
//!             │
//!             ▼
//! ┌─────────────────────────┐     ┌──────────────────┐
//! │ StreamingCamera<S>      │ ◀── │ acquisition loop │ ← FrameSource (driver)
//! │ (snapshot hand-off)     │     └──────────────────┘
//! └─────────────────────────┘
//! ```
//!
//! Captures are pull-based: the consumer calls `start()` once and then polls
//! the capture operations on its own cadence. Every capture copies the most
//! recent device snapshot into storage the caller already allocated; the
//! callee borrows the buffer for the duration of the call only and never
//! resizes it.

pub mod format_converters;
pub mod frame_loop;
pub mod snapshot;
pub mod streaming;
pub mod synthetic;
pub mod types;

pub use streaming::{FrameSource, RawFrame, SourceEvent, StreamingCamera, StreamingConfig};
pub use synthetic::{SyntheticConfig, SyntheticControl, SyntheticSource, synthetic_camera};
pub use types::*;

use crate::errors::{CaptureError, CaptureResult};

/// Capture contract every depth camera driver implements
///
/// `start`, the two size queries, `capabilities` and `state` are required.
/// The `capture_*` operations are optional capabilities: a driver overrides
/// the ones it supports and lists them in [`capabilities`](Self::capabilities).
/// The default bodies report [`CaptureError::Unsupported`], so a missing
/// modality is never confused with "no new data".
///
/// For every capture:
/// - the caller owns the buffer and must size it beforehand
///   (`depth_size()`, `color_size()` or the depth pixel count for clouds);
/// - on success the buffer is completely overwritten;
/// - on error the buffer is left untouched;
/// - a wrong-shaped buffer is rejected with `BufferShape`/`BufferLength`;
/// - a capture before `start()` is rejected with `NotStarted`;
/// - after a device failure every capture returns `DeviceFailed`.
///
/// Captures are non-blocking snapshot copies. Calls from one thread observe
/// non-decreasing [`FrameStamp`]s; frames may be skipped when the caller is
/// slower than the device.
pub trait DepthCamera: Send + Sync {
    // ===== Required =====

    /// Depth (and amplitude) frame size; `Size::ZERO` before a successful start
    fn depth_size(&self) -> Size;

    /// Color frame size; `Size::ZERO` before a successful start
    fn color_size(&self) -> Size;

    /// Optional modalities this driver implements
    fn capabilities(&self) -> Capabilities;

    /// Current lifecycle state
    fn state(&self) -> DeviceState;

    /// Begin streaming
    ///
    /// Must be called once per handle. On failure the handle is left in the
    /// failed state and must be recreated; a second call returns
    /// `AlreadyStarted` (or `DeviceFailed` when the handle already failed).
    fn start(&mut self) -> CaptureResult<()>;

    // ===== Optional capabilities =====

    /// Copy the latest depth frame (millimetres) into `buffer`
    ///
    /// # Arguments
    /// * `buffer` - Depth image already sized to `depth_size()`
    fn capture_depth(&self, buffer: &mut DepthImage) -> CaptureResult<FrameStamp> {
        let _ = buffer;
        Err(CaptureError::Unsupported(Modality::Depth))
    }

    /// Copy the latest amplitude frame into `buffer` (sized to `depth_size()`)
    fn capture_amplitude(&self, buffer: &mut AmplitudeImage) -> CaptureResult<FrameStamp> {
        let _ = buffer;
        Err(CaptureError::Unsupported(Modality::Amplitude))
    }

    /// Copy the latest color frame into `buffer` (sized to `color_size()`)
    fn capture_color(&self, buffer: &mut ColorImage) -> CaptureResult<FrameStamp> {
        let _ = buffer;
        Err(CaptureError::Unsupported(Modality::Color))
    }

    /// Copy the latest vertex cloud into `buffer`
    ///
    /// `buffer` must hold exactly `depth_size().area()` points; entry `i`
    /// corresponds to depth pixel `i` in row-major order.
    fn capture_vertex(&self, buffer: &mut [PointXyzRgb]) -> CaptureResult<FrameStamp> {
        let _ = buffer;
        Err(CaptureError::Unsupported(Modality::Vertex))
    }

    /// Copy the latest temporally smoothed vertex cloud into `buffer`
    ///
    /// Same layout and size requirement as [`capture_vertex`](Self::capture_vertex).
    /// The averaging window is driver configuration; index `i` always
    /// refers to the same depth pixel as in the raw cloud.
    fn capture_moving_averaged_vertex(
        &self,
        buffer: &mut [PointXyzRgb],
    ) -> CaptureResult<FrameStamp> {
        let _ = buffer;
        Err(CaptureError::Unsupported(Modality::SmoothedVertex))
    }

    /// Move pending raw audio bytes into `buffer`, returning how many were written
    ///
    /// Audio is a stream: each byte is delivered once. Bytes that do not fit
    /// stay queued for the next call. Zero means nothing arrived since the
    /// previous call.
    fn capture_audio(&self, buffer: &mut [u8]) -> CaptureResult<usize> {
        let _ = buffer;
        Err(CaptureError::Unsupported(Modality::Audio))
    }

    /// Write the latest accelerometer sample into `acceleration`
    fn capture_acceleration(&self, acceleration: &mut Acceleration) -> CaptureResult<FrameStamp> {
        let _ = acceleration;
        Err(CaptureError::Unsupported(Modality::Acceleration))
    }

    // ===== Provided =====

    /// Whether `modality` is implemented by this driver
    fn supports(&self, modality: Modality) -> bool {
        self.capabilities().contains(modality)
    }

    /// Allocate a depth buffer of the right shape
    fn depth_buffer(&self) -> DepthImage {
        let size = self.depth_size();
        DepthImage::new(size.width, size.height)
    }

    /// Allocate an amplitude buffer of the right shape
    fn amplitude_buffer(&self) -> AmplitudeImage {
        let size = self.depth_size();
        AmplitudeImage::new(size.width, size.height)
    }

    /// Allocate a color buffer of the right shape
    fn color_buffer(&self) -> ColorImage {
        let size = self.color_size();
        ColorImage::new(size.width, size.height)
    }

    /// Allocate a vertex buffer of the right length
    fn vertex_buffer(&self) -> Vec<PointXyzRgb> {
        vec![PointXyzRgb::INVALID; self.depth_size().area()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Driver that implements only the required operations
    struct DepthlessDevice {
        state: DeviceState,
    }

    impl DepthCamera for DepthlessDevice {
        fn depth_size(&self) -> Size {
            Size::ZERO
        }

        fn color_size(&self) -> Size {
            Size::ZERO
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::empty()
        }

        fn state(&self) -> DeviceState {
            self.state.clone()
        }

        fn start(&mut self) -> CaptureResult<()> {
            self.state = DeviceState::Running;
            Ok(())
        }
    }

    #[test]
    fn test_defaults_report_unsupported() {
        let mut device = DepthlessDevice {
            state: DeviceState::Constructed,
        };
        device.start().unwrap();

        let mut depth = device.depth_buffer();
        assert_eq!(
            device.capture_depth(&mut depth),
            Err(CaptureError::Unsupported(Modality::Depth))
        );
        let mut points = device.vertex_buffer();
        assert_eq!(
            device.capture_moving_averaged_vertex(&mut points),
            Err(CaptureError::Unsupported(Modality::SmoothedVertex))
        );
        let mut audio = [0u8; 16];
        assert_eq!(
            device.capture_audio(&mut audio),
            Err(CaptureError::Unsupported(Modality::Audio))
        );
        let mut acc = Acceleration::default();
        assert!(device.capture_acceleration(&mut acc).unwrap_err().is_unsupported());
        assert_eq!(device.state(), DeviceState::Running);
        assert!(!device.supports(Modality::Color));
    }

    #[test]
    fn test_trait_is_object_safe() {
        let device: Box<dyn DepthCamera> = Box::new(DepthlessDevice {
            state: DeviceState::Constructed,
        });
        assert!(device.capabilities().is_empty());
        assert_eq!(device.depth_size(), Size::ZERO);
    }
}
