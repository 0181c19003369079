// SPDX-License-Identifier: GPL-3.0-only
//! Frame visualization helpers
//!
//! Turns floating point depth and amplitude frames into 8-bit RGB images
//! for previews and PNG output.

use image::Rgb;

use super::types::{AmplitudeImage, ColorImage, DepthImage};
use crate::constants::{DEPTH_MAX_USABLE_MM, DEPTH_MIN_USABLE_MM};

/// Depth visualization options
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthVisualizationOptions {
    /// Use grayscale instead of colormap (near=bright, far=dark)
    pub grayscale: bool,
    /// Quantize depth into bands for smoother visualization
    pub quantize: bool,
    /// Number of quantization bands
    pub quantize_bands: u32,
    /// Minimum depth in mm (values below are clamped)
    pub min_depth_mm: f32,
    /// Maximum depth in mm; 0 = auto-detect from the frame
    pub max_depth_mm: f32,
}

impl DepthVisualizationOptions {
    /// Fixed Kinect usable range with the turbo colormap
    pub fn kinect() -> Self {
        Self {
            grayscale: false,
            quantize: false,
            quantize_bands: 32,
            min_depth_mm: DEPTH_MIN_USABLE_MM,
            max_depth_mm: DEPTH_MAX_USABLE_MM,
        }
    }

    /// Grayscale, ranged to the valid samples of each frame
    pub fn auto_range() -> Self {
        Self {
            grayscale: true,
            quantize: false,
            quantize_bands: 32,
            min_depth_mm: 0.0,
            max_depth_mm: 0.0,
        }
    }
}

/// Turbo colormap: perceptually uniform rainbow (blue=near, red=far)
///
/// Based on the Google Turbo colormap.
fn turbo(t: f32) -> [u8; 3] {
    let r = (0.13572138
        + t * (4.6153926 + t * (-42.66032 + t * (132.13108 + t * (-152.54825 + t * 59.28144)))))
        .clamp(0.0, 1.0);
    let g = (0.09140261
        + t * (2.19418 + t * (4.84296 + t * (-14.18503 + t * (4.27805 + t * 2.53377)))))
        .clamp(0.0, 1.0);
    let b = (0.1066733
        + t * (12.64194 + t * (-60.58204 + t * (109.99648 + t * (-82.52904 + t * 20.43388)))))
        .clamp(0.0, 1.0);
    [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8]
}

fn is_valid_sample(d: f32) -> bool {
    d.is_finite() && d > 0.0
}

/// Min and max of the valid samples, `None` when the frame has no range
fn sample_range(samples: &[f32]) -> Option<(f32, f32)> {
    let (min, max) = samples
        .iter()
        .copied()
        .filter(|d| is_valid_sample(*d))
        .fold((f32::MAX, f32::MIN), |(min, max), d| (min.min(d), max.max(d)));
    (max > min).then_some((min, max))
}

/// Convert a depth frame (mm) to an RGB visualization
///
/// Supports:
/// - Grayscale mode (near=bright, far=dark)
/// - Turbo colormap (blue=near, red=far)
/// - Optional band quantization
/// - Auto-ranging or fixed range
///
/// Invalid samples (zero, negative, NaN) are black.
pub fn depth_to_rgb(depth: &DepthImage, options: &DepthVisualizationOptions) -> ColorImage {
    let (min_depth, max_depth) = if options.max_depth_mm <= 0.0 {
        sample_range(depth.as_raw()).unwrap_or((0.0, DEPTH_MAX_USABLE_MM))
    } else {
        (options.min_depth_mm, options.max_depth_mm)
    };
    let range = (max_depth - min_depth).max(f32::EPSILON);

    ColorImage::from_fn(depth.width(), depth.height(), |x, y| {
        let d = depth.get_pixel(x, y).0[0];
        if !is_valid_sample(d) {
            return Rgb([0, 0, 0]);
        }

        let mut t = ((d - min_depth) / range).clamp(0.0, 1.0);
        if options.quantize && options.quantize_bands > 0 {
            let bands = options.quantize_bands as f32;
            t = (t * bands).floor() / bands;
        }

        if options.grayscale {
            let gray = ((1.0 - t) * 255.0) as u8;
            Rgb([gray, gray, gray])
        } else {
            Rgb(turbo(t))
        }
    })
}

/// Convert an amplitude frame to grayscale, scaled to its own range
pub fn amplitude_to_rgb(amplitude: &AmplitudeImage) -> ColorImage {
    let (min, max) = sample_range(amplitude.as_raw()).unwrap_or((0.0, 1.0));
    let range = max - min;

    ColorImage::from_fn(amplitude.width(), amplitude.height(), |x, y| {
        let a = amplitude.get_pixel(x, y).0[0];
        if !is_valid_sample(a) {
            return Rgb([0, 0, 0]);
        }
        let gray = (((a - min) / range).clamp(0.0, 1.0) * 255.0) as u8;
        Rgb([gray, gray, gray])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_depth_to_rgb_grayscale_auto_range() {
        let depth = DepthImage::from_raw(3, 1, vec![1000.0, 2000.0, 0.0]).unwrap();
        let rgb = depth_to_rgb(&depth, &DepthVisualizationOptions::auto_range());

        assert_eq!(rgb.dimensions(), (3, 1));
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]); // nearest
        assert_eq!(rgb.get_pixel(1, 0).0, [0, 0, 0]); // farthest
        assert_eq!(rgb.get_pixel(2, 0).0, [0, 0, 0]); // invalid
    }

    #[test]
    fn test_depth_to_rgb_fixed_range_clamps() {
        let depth = DepthImage::from_raw(2, 1, vec![100.0, 9000.0]).unwrap();
        let rgb = depth_to_rgb(&depth, &DepthVisualizationOptions::kinect());
        assert_eq!(rgb.get_pixel(0, 0).0, turbo(0.0));
        assert_eq!(rgb.get_pixel(1, 0).0, turbo(1.0));
    }

    #[test]
    fn test_depth_to_rgb_flat_frame() {
        let depth = DepthImage::from_pixel(4, 4, Luma([1500.0]));
        let rgb = depth_to_rgb(&depth, &DepthVisualizationOptions::auto_range());
        // No range in the data: falls back to the full usable range
        let first = rgb.get_pixel(0, 0).0;
        assert!(rgb.pixels().all(|p| p.0 == first));
        assert_ne!(first, [0, 0, 0]);
    }

    #[test]
    fn test_quantize_bands() {
        let depth = DepthImage::from_raw(2, 1, vec![1000.0, 1010.0]).unwrap();
        let options = DepthVisualizationOptions {
            quantize: true,
            quantize_bands: 4,
            min_depth_mm: 0.0,
            max_depth_mm: 4000.0,
            grayscale: true,
        };
        let rgb = depth_to_rgb(&depth, &options);
        assert_eq!(rgb.get_pixel(0, 0), rgb.get_pixel(1, 0));
    }

    #[test]
    fn test_amplitude_to_rgb() {
        let amplitude = AmplitudeImage::from_raw(3, 1, vec![10.0, 20.0, f32::NAN]).unwrap();
        let rgb = amplitude_to_rgb(&amplitude);
        assert_eq!(rgb.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(rgb.get_pixel(1, 0).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(2, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_turbo_colormap() {
        // Test that colormap changes across the range (t=0 to t=1)
        let start = turbo(0.0);
        let mid = turbo(0.5);
        let end = turbo(1.0);

        assert_ne!(start, mid);
        assert_ne!(mid, end);
        assert_ne!(start, end);

        // End (t=1) should have higher red than start (t=0)
        assert!(end[0] > start[0]);
    }
}
