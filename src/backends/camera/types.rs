// SPDX-License-Identifier: GPL-3.0-only
// Shared types for the capture contract

//! Shared types for depth camera devices
//!
//! Frames use `image::ImageBuffer` as their storage so consumers can hand the
//! same buffers to encoders and viewers. Point clouds are plain slices of
//! [`PointXyzRgb`], one entry per depth pixel in row-major order.

use image::{ImageBuffer, Luma, Pixel, RgbImage};
use serde::{Deserialize, Serialize};

/// Depth frame: one `f32` distance in millimetres per pixel, `0.0` = invalid
pub type DepthImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Amplitude frame: one `f32` intensity per pixel, same shape as depth
pub type AmplitudeImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Color frame: 3 x 8-bit RGB
pub type ColorImage = RgbImage;

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    /// Size reported by a device that has not started
    pub const ZERO: Size = Size {
        width: 0,
        height: 0,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels (and of point cloud entries for a depth size)
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Size of an image buffer
    pub fn of<P: Pixel>(image: &ImageBuffer<P, Vec<P::Subpixel>>) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height }
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Data modalities a device may provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Depth,
    Amplitude,
    Color,
    Vertex,
    SmoothedVertex,
    Audio,
    Acceleration,
}

impl Modality {
    pub const ALL: [Modality; 7] = [
        Modality::Depth,
        Modality::Amplitude,
        Modality::Color,
        Modality::Vertex,
        Modality::SmoothedVertex,
        Modality::Audio,
        Modality::Acceleration,
    ];

    fn bit(self) -> u8 {
        match self {
            Modality::Depth => 1 << 0,
            Modality::Amplitude => 1 << 1,
            Modality::Color => 1 << 2,
            Modality::Vertex => 1 << 3,
            Modality::SmoothedVertex => 1 << 4,
            Modality::Audio => 1 << 5,
            Modality::Acceleration => 1 << 6,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Modality::Depth => "depth",
            Modality::Amplitude => "amplitude",
            Modality::Color => "color",
            Modality::Vertex => "vertex",
            Modality::SmoothedVertex => "smoothed vertex",
            Modality::Audio => "audio",
            Modality::Acceleration => "acceleration",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Set of optional modalities a driver implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Modality::ALL.into_iter().collect()
    }

    /// Builder-style insert
    pub fn with(mut self, modality: Modality) -> Self {
        self.insert(modality);
        self
    }

    pub fn insert(&mut self, modality: Modality) {
        self.0 |= modality.bit();
    }

    pub fn remove(&mut self, modality: Modality) {
        self.0 &= !modality.bit();
    }

    pub fn contains(&self, modality: Modality) -> bool {
        self.0 & modality.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Modality> + '_ {
        Modality::ALL.into_iter().filter(|m| self.contains(*m))
    }
}

impl FromIterator<Modality> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Modality>>(iter: I) -> Self {
        let mut caps = Capabilities::empty();
        for modality in iter {
            caps.insert(modality);
        }
        caps
    }
}

/// Lifecycle state of a device handle
///
/// `Constructed -> Running -> (Running | Failed)`. Failed is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeviceState {
    #[default]
    Constructed,
    Running,
    Failed(String),
}

impl DeviceState {
    pub fn is_running(&self) -> bool {
        matches!(self, DeviceState::Running)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DeviceState::Failed(_))
    }
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceState::Constructed => write!(f, "constructed"),
            DeviceState::Running => write!(f, "running"),
            DeviceState::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Colored 3D point, positions in metres
///
/// Layout is fixed (16 bytes, no padding) so a cloud can be viewed as raw
/// bytes with `bytemuck::cast_slice` for GPU upload or recording.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointXyzRgb {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl PointXyzRgb {
    /// Position of a pixel with no valid depth
    pub const INVALID: PointXyzRgb = PointXyzRgb {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub fn new(x: f32, y: f32, z: f32, rgb: [u8; 3]) -> Self {
        Self {
            x,
            y,
            z,
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
            a: 255,
        }
    }

    /// Points with no depth sit at the origin
    pub fn is_valid(&self) -> bool {
        self.z > 0.0
    }

    pub fn position(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    pub fn rgb(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Euclidean distance between positions
    pub fn distance(&self, other: &PointXyzRgb) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Inertial sensor sample in m/s²
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Acceleration {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Acceleration {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Identifies the device snapshot a capture copied from
///
/// `sequence` increases by one per published snapshot; `timestamp_us` is the
/// device timestamp of that snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct FrameStamp {
    pub sequence: u64,
    pub timestamp_us: u64,
}
