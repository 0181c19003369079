// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backends::camera::{StreamingConfig, SyntheticConfig};
use crate::errors::ConfigError;

/// Directory name under the platform config dir
pub const CONFIG_DIR_NAME: &str = "depth-capture";
/// Config file name inside [`CONFIG_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.json";

/// User configuration
///
/// Every section falls back to its defaults when missing, so a partial file
/// only overrides what it names.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Synthetic device settings
    pub device: SyntheticConfig,
    /// Acquisition, geometry and smoothing settings
    pub streaming: StreamingConfig,
    /// Where `snapshot` writes its files; `None` = current directory
    pub output_dir: Option<PathBuf>,
}

impl Config {
    /// `<config dir>/depth-capture/config.json`, when the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Read and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load `path` (or the default location), falling back to defaults
    ///
    /// A missing file is normal; an unreadable or invalid one is logged and
    /// ignored.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Self::default();
        };
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring config file");
                Self::default()
            }
        }
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.device
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("device: {}", e)))?;
        self.streaming
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("streaming: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_default_path_location() {
        if let Some(path) = Config::default_path() {
            assert!(path.ends_with("depth-capture/config.json"));
        }
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "device": { "frame_rate": 15 } }"#).unwrap();
        assert_eq!(config.device.frame_rate, 15);
        assert_eq!(config.device.depth_size, SyntheticConfig::default().depth_size);
        assert_eq!(config.streaming, StreamingConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "device": { "frame_rate": 0 } }"#).unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));
        assert_eq!(Config::load_or_default(Some(&path)), Config::default());
    }
}
