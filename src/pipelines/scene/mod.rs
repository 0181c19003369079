// SPDX-License-Identifier: GPL-3.0-only

//! Scene geometry pipeline
//!
//! Turns a depth frame (and optionally a color frame) into a colored vertex
//! cloud:
//! - Pinhole unprojection of every depth pixel
//! - Depth-to-color registration for per-point color
//! - Temporal smoothing of successive clouds (see [`smoothing`])
//! - LAS export of a captured cloud

mod las_export;
pub mod smoothing;

pub use las_export::export_point_cloud_las;
pub use smoothing::{SmoothingConfig, SmoothingMode, VertexSmoother};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backends::camera::types::{ColorImage, DepthImage, PointXyzRgb, Size};
use crate::constants::{DEPTH_MAX_USABLE_MM, DEPTH_MIN_USABLE_MM, kinect};

/// Color given to points whose registered color pixel is unavailable
pub const FALLBACK_COLOR: [u8; 3] = [255, 255, 255];

/// Camera intrinsics for depth-to-3D unprojection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
    /// Samples closer than this (mm) are invalid
    pub min_depth_mm: f32,
    /// Samples farther than this (mm) are invalid
    pub max_depth_mm: f32,
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        // Kinect defaults for 640x480 base resolution
        Self {
            fx: kinect::FX,
            fy: kinect::FY,
            cx: kinect::CX,
            cy: kinect::CY,
            min_depth_mm: DEPTH_MIN_USABLE_MM,
            max_depth_mm: DEPTH_MAX_USABLE_MM,
        }
    }
}

impl CameraIntrinsics {
    /// Rescale the 640x480 reference intrinsics to another depth resolution
    pub fn scaled_to(&self, size: Size) -> Self {
        let sx = size.width as f32 / kinect::BASE_WIDTH;
        let sy = size.height as f32 / kinect::BASE_HEIGHT;
        Self {
            fx: self.fx * sx,
            fy: self.fy * sy,
            cx: self.cx * sx,
            cy: self.cy * sy,
            ..*self
        }
    }

    /// True when a depth sample (mm) lies in the usable range
    pub fn is_valid_depth(&self, depth_mm: f32) -> bool {
        depth_mm.is_finite() && depth_mm >= self.min_depth_mm && depth_mm <= self.max_depth_mm
    }

    /// Unproject pixel (u, v) at `depth_mm` to a position in metres
    pub fn unproject(&self, u: u32, v: u32, depth_mm: f32) -> Option<[f32; 3]> {
        if !self.is_valid_depth(depth_mm) {
            return None;
        }
        let z = depth_mm / 1000.0;
        let x = (u as f32 - self.cx) * z / self.fx;
        let y = (v as f32 - self.cy) * z / self.fy;
        Some([x, y, z])
    }
}

/// Depth-to-color pixel mapping
///
/// Depth and color sensors share a field of view up to a fixed pixel offset,
/// so a depth pixel maps to the color pixel at the same relative position
/// shifted by `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRegistration {
    depth_size: Size,
    color_size: Size,
    offset: [i32; 2],
}

impl ColorRegistration {
    pub fn new(depth_size: Size, color_size: Size, offset: [i32; 2]) -> Self {
        Self {
            depth_size,
            color_size,
            offset,
        }
    }

    /// Color pixel for depth pixel (u, v), `None` when it falls outside the frame
    pub fn color_coords(&self, u: u32, v: u32) -> Option<(u32, u32)> {
        if self.depth_size.is_empty() || self.color_size.is_empty() {
            return None;
        }
        let scale_x = self.color_size.width as f32 / self.depth_size.width as f32;
        let scale_y = self.color_size.height as f32 / self.depth_size.height as f32;
        let x = ((u as f32 + 0.5) * scale_x) as i32 + self.offset[0];
        let y = ((v as f32 + 0.5) * scale_y) as i32 + self.offset[1];

        if x < 0
            || y < 0
            || x >= self.color_size.width as i32
            || y >= self.color_size.height as i32
        {
            return None;
        }
        Some((x as u32, y as u32))
    }
}

/// Converts depth frames into vertex clouds
///
/// Per-pixel ray directions are precomputed once per resolution, so
/// projecting a frame is a multiply per axis.
pub struct VertexProjector {
    depth_size: Size,
    intrinsics: CameraIntrinsics,
    registration: ColorRegistration,
    /// (u - cx) / fx and (v - cy) / fy per pixel, row-major
    rays: Vec<[f32; 2]>,
}

impl VertexProjector {
    /// `intrinsics` must already match `depth_size`
    pub fn new(intrinsics: CameraIntrinsics, registration: ColorRegistration) -> Self {
        let depth_size = registration.depth_size;
        let mut rays = Vec::with_capacity(depth_size.area());
        for v in 0..depth_size.height {
            for u in 0..depth_size.width {
                rays.push([
                    (u as f32 - intrinsics.cx) / intrinsics.fx,
                    (v as f32 - intrinsics.cy) / intrinsics.fy,
                ]);
            }
        }

        debug!(
            depth_size = %depth_size,
            fx = intrinsics.fx,
            fy = intrinsics.fy,
            "Vertex projector ready"
        );

        Self {
            depth_size,
            intrinsics,
            registration,
            rays,
        }
    }

    pub fn depth_size(&self) -> Size {
        self.depth_size
    }

    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    /// Project a depth frame into `out`
    ///
    /// `depth` must match the projector's depth size and `out` must hold one
    /// entry per depth pixel; returns the number of valid points written.
    pub fn project(
        &self,
        depth: &DepthImage,
        color: Option<&ColorImage>,
        out: &mut [PointXyzRgb],
    ) -> usize {
        debug_assert_eq!(Size::of(depth), self.depth_size);
        debug_assert_eq!(out.len(), self.depth_size.area());

        let width = self.depth_size.width;
        let mut valid = 0;

        for (index, ((sample, ray), point)) in depth
            .as_raw()
            .iter()
            .zip(&self.rays)
            .zip(out.iter_mut())
            .enumerate()
        {
            let depth_mm = *sample;
            if !self.intrinsics.is_valid_depth(depth_mm) {
                *point = PointXyzRgb::INVALID;
                continue;
            }

            let u = index as u32 % width;
            let v = index as u32 / width;
            let rgb = color
                .and_then(|image| {
                    let (x, y) = self.registration.color_coords(u, v)?;
                    Some(image.get_pixel(x, y).0)
                })
                .unwrap_or(FALLBACK_COLOR);

            let z = depth_mm / 1000.0;
            *point = PointXyzRgb::new(ray[0] * z, ray[1] * z, z, rgb);
            valid += 1;
        }

        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    fn projector(depth: Size, color: Size) -> VertexProjector {
        VertexProjector::new(
            CameraIntrinsics::default().scaled_to(depth),
            ColorRegistration::new(depth, color, [0, 0]),
        )
    }

    #[test]
    fn test_intrinsics_scaling() {
        let half = CameraIntrinsics::default().scaled_to(Size::new(320, 240));
        assert!((half.fx - kinect::FX / 2.0).abs() < 1e-4);
        assert!((half.cy - kinect::CY / 2.0).abs() < 1e-4);
        assert_eq!(half.min_depth_mm, DEPTH_MIN_USABLE_MM);
    }

    #[test]
    fn test_unproject_principal_point() {
        let intrinsics = CameraIntrinsics {
            cx: 10.0,
            cy: 5.0,
            ..CameraIntrinsics::default()
        };
        let p = intrinsics.unproject(10, 5, 1500.0).unwrap();
        assert_eq!(p, [0.0, 0.0, 1.5]);
        assert!(intrinsics.unproject(10, 5, 0.0).is_none());
        assert!(intrinsics.unproject(10, 5, f32::NAN).is_none());
        assert!(intrinsics.unproject(10, 5, 9000.0).is_none());
    }

    #[test]
    fn test_registration_scaling() {
        let reg = ColorRegistration::new(Size::new(320, 240), Size::new(640, 480), [0, 0]);
        assert_eq!(reg.color_coords(0, 0), Some((1, 1)));
        assert_eq!(reg.color_coords(319, 239), Some((639, 479)));

        let shifted = ColorRegistration::new(Size::new(320, 240), Size::new(640, 480), [4, 0]);
        assert_eq!(shifted.color_coords(319, 0), None);
    }

    #[test]
    fn test_project_matches_unproject() {
        let size = Size::new(8, 6);
        let projector = projector(size, Size::new(16, 12));
        let depth = DepthImage::from_fn(8, 6, |u, v| Luma([1000.0 + (u * 10 + v) as f32]));
        let color = ColorImage::from_pixel(16, 12, Rgb([10, 20, 30]));
        let mut out = vec![PointXyzRgb::default(); size.area()];

        let valid = projector.project(&depth, Some(&color), &mut out);
        assert_eq!(valid, size.area());

        for (i, point) in out.iter().enumerate() {
            let u = i as u32 % 8;
            let v = i as u32 / 8;
            let expected = projector
                .intrinsics()
                .unproject(u, v, depth.get_pixel(u, v).0[0])
                .unwrap();
            for axis in 0..3 {
                assert!((point.position()[axis] - expected[axis]).abs() < 1e-5);
            }
            assert_eq!(point.rgb(), [10, 20, 30]);
        }
    }

    #[test]
    fn test_project_invalid_and_uncolored() {
        let size = Size::new(2, 1);
        let projector = projector(size, Size::new(2, 1));
        let depth = DepthImage::from_raw(2, 1, vec![0.0, 2000.0]).unwrap();
        let mut out = vec![PointXyzRgb::default(); 2];

        let valid = projector.project(&depth, None, &mut out);
        assert_eq!(valid, 1);
        assert!(!out[0].is_valid());
        assert!(out[1].is_valid());
        assert_eq!(out[1].rgb(), FALLBACK_COLOR);
    }
}
