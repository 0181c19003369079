// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use depth_capture::Config;
use depth_capture::errors::ConfigError;
use depth_capture::pipelines::scene::SmoothingMode;

#[test]
fn test_config_default() {
    let config = Config::default();

    // Exponential smoothing with the documented weight by default
    assert_eq!(
        config.streaming.smoothing.mode,
        SmoothingMode::Exponential { alpha: 0.3 }
    );
    assert!(config.output_dir.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut config = Config::default();
    config.device.frame_rate = 15;
    config.streaming.smoothing.mode = SmoothingMode::Window { frames: 8 };
    config.streaming.color_offset = [-3, 2];
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_config_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");

    assert!(matches!(Config::load(&path), Err(ConfigError::Io(_))));
    assert_eq!(Config::load_or_default(Some(&path)), Config::default());
}

#[test]
fn test_config_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    assert_eq!(Config::load_or_default(Some(&path)), Config::default());
}

#[test]
fn test_config_rejects_bad_smoothing() {
    let mut config = Config::default();
    config.streaming.smoothing.mode = SmoothingMode::Exponential { alpha: 1.5 };
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let dir = tempfile::tempdir().unwrap();
    assert!(config.save(&dir.path().join("config.json")).is_err());
}
