// SPDX-License-Identifier: GPL-3.0-only

//! Crate-wide constants

use std::time::Duration;

use crate::backends::camera::types::Size;

/// Default depth resolution of the synthetic device
pub const DEFAULT_DEPTH_SIZE: Size = Size::new(320, 240);
/// Default color resolution of the synthetic device
pub const DEFAULT_COLOR_SIZE: Size = Size::new(640, 480);
/// Default device frame rate
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Closest usable depth (mm); samples below are invalid
pub const DEPTH_MIN_USABLE_MM: f32 = 400.0;
/// Farthest usable depth (mm); samples above are invalid
pub const DEPTH_MAX_USABLE_MM: f32 = 4000.0;

/// Upper bound on how long `start()` waits for the first frame
pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(2);
/// Consecutive dropped frames tolerated before the device is declared failed
pub const MAX_CONSECUTIVE_DROPS: u32 = 30;
/// Sleep between polls when the source has nothing new
pub const IDLE_BACKOFF: Duration = Duration::from_micros(500);
/// Audio bytes buffered between capture calls (1 s of 16 kHz 16-bit mono)
pub const AUDIO_QUEUE_BYTES: usize = 32_000;

/// Default exponential smoothing weight of the newest vertex cloud
pub const DEFAULT_SMOOTHING_ALPHA: f32 = 0.3;

/// Standard gravity (m/s²)
pub const GRAVITY: f32 = 9.80665;

/// Kinect depth camera intrinsics
///
/// Reference resolution: 640x480. Scale with
/// [`CameraIntrinsics::scaled_to`](crate::pipelines::scene::CameraIntrinsics::scaled_to)
/// for other depth resolutions.
pub mod kinect {
    /// Focal length X (pixels) at 640x480 base resolution
    pub const FX: f32 = 594.21;
    /// Focal length Y (pixels) at 640x480 base resolution
    pub const FY: f32 = 591.04;
    /// Principal point X (pixels) at 640x480 base resolution
    pub const CX: f32 = 339.5;
    /// Principal point Y (pixels) at 640x480 base resolution
    pub const CY: f32 = 242.7;

    /// Base width for intrinsics calculation
    pub const BASE_WIDTH: f32 = 640.0;
    /// Base height for intrinsics calculation
    pub const BASE_HEIGHT: f32 = 480.0;
}
