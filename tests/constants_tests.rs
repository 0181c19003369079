// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use depth_capture::constants::{
    DEFAULT_COLOR_SIZE, DEFAULT_DEPTH_SIZE, DEPTH_MAX_USABLE_MM, DEPTH_MIN_USABLE_MM, kinect,
};
use depth_capture::pipelines::scene::CameraIntrinsics;

#[test]
fn test_default_sizes() {
    // Color is at least as large as depth and shares its aspect ratio
    assert!(DEFAULT_COLOR_SIZE.area() >= DEFAULT_DEPTH_SIZE.area());
    assert_eq!(
        DEFAULT_DEPTH_SIZE.width * DEFAULT_COLOR_SIZE.height,
        DEFAULT_COLOR_SIZE.width * DEFAULT_DEPTH_SIZE.height
    );
}

#[test]
fn test_usable_depth_range() {
    assert!(DEPTH_MIN_USABLE_MM > 0.0);
    assert!(DEPTH_MIN_USABLE_MM < DEPTH_MAX_USABLE_MM);
}

#[test]
fn test_principal_point_inside_base_frame() {
    assert!(kinect::CX > 0.0 && kinect::CX < kinect::BASE_WIDTH);
    assert!(kinect::CY > 0.0 && kinect::CY < kinect::BASE_HEIGHT);
}

#[test]
fn test_intrinsics_scale_to_default_depth() {
    // The default depth size is half the Kinect base resolution
    let scaled = CameraIntrinsics::default().scaled_to(DEFAULT_DEPTH_SIZE);
    assert!((scaled.fx * 2.0 - kinect::FX).abs() < 1e-3);
    assert!((scaled.cx * 2.0 - kinect::CX).abs() < 1e-3);
}
