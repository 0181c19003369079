// SPDX-License-Identifier: MPL-2.0

//! depth-capture - A uniform capture contract for depth cameras
//!
//! This library defines how consumers pull depth, amplitude, color, point
//! cloud, audio and inertial data from a depth camera into buffers they own,
//! and provides a streaming driver shim plus a synthetic device built on it.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: The [`DepthCamera`] contract and device implementations
//! - [`pipelines`]: Point cloud projection, smoothing and export
//! - [`config`]: User configuration handling
//! - [`errors`]: Error types
//!
//! # Example
//!
//! ```no_run
//! use depth_capture::{DepthCamera, StreamingConfig, SyntheticConfig, synthetic_camera};
//!
//! let (mut camera, _control) =
//!     synthetic_camera(SyntheticConfig::default(), StreamingConfig::default());
//! camera.start()?;
//!
//! let mut depth = camera.depth_buffer();
//! let stamp = camera.capture_depth(&mut depth)?;
//! println!("frame {} is {}", stamp.sequence, camera.depth_size());
//! # Ok::<(), depth_capture::errors::CaptureError>(())
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;

// Re-export commonly used types
pub use backends::camera::{
    Capabilities, DepthCamera, DeviceState, FrameStamp, Modality, PointXyzRgb, Size,
    StreamingCamera, StreamingConfig, SyntheticConfig, SyntheticControl, synthetic_camera,
};
pub use config::Config;
pub use errors::{CaptureError, CaptureResult};
