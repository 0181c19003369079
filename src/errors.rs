// SPDX-License-Identifier: GPL-3.0-only

//! Error types for depth capture

use std::fmt;

use crate::backends::camera::types::{Modality, Size};

/// Result type alias for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Errors reported by the capture contract
///
/// Every variant is reported synchronously from the call that hit it.
/// Transient conditions (a single dropped frame) never show up here.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// A capture was issued before `start()` succeeded
    NotStarted,
    /// `start()` was called on a handle that already left the constructed state
    AlreadyStarted,
    /// The driver does not implement this modality
    Unsupported(Modality),
    /// Caller's frame buffer has the wrong dimensions
    BufferShape {
        modality: Modality,
        expected: Size,
        actual: Size,
    },
    /// Caller's point buffer has the wrong number of entries
    BufferLength {
        modality: Modality,
        expected: usize,
        actual: usize,
    },
    /// The device could not be brought into the running state
    StartFailed(String),
    /// Unrecoverable device fault after start (disconnect, driver fault)
    DeviceFailed(String),
}

impl CaptureError {
    /// True for contract violations by the caller
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            CaptureError::NotStarted
                | CaptureError::AlreadyStarted
                | CaptureError::BufferShape { .. }
                | CaptureError::BufferLength { .. }
        )
    }

    /// True when the handle must be considered unusable
    pub fn is_device_failure(&self) -> bool {
        matches!(
            self,
            CaptureError::StartFailed(_) | CaptureError::DeviceFailed(_)
        )
    }

    /// True when the modality is simply not provided by the driver
    pub fn is_unsupported(&self) -> bool {
        matches!(self, CaptureError::Unsupported(_))
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NotStarted => write!(f, "Device not started"),
            CaptureError::AlreadyStarted => write!(f, "Device already started"),
            CaptureError::Unsupported(modality) => {
                write!(f, "Modality not supported by this device: {}", modality)
            }
            CaptureError::BufferShape {
                modality,
                expected,
                actual,
            } => write!(
                f,
                "{} buffer has shape {}, expected {}",
                modality, actual, expected
            ),
            CaptureError::BufferLength {
                modality,
                expected,
                actual,
            } => write!(
                f,
                "{} buffer has {} entries, expected {}",
                modality, actual, expected
            ),
            CaptureError::StartFailed(msg) => write!(f, "Failed to start device: {}", msg),
            CaptureError::DeviceFailed(msg) => write!(f, "Device failed: {}", msg),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Config file could not be read or written
    Io(String),
    /// Config file is not valid JSON for this schema
    Parse(String),
    /// Values parse but cannot be used
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

/// Errors while writing captured data to disk
#[derive(Debug, Clone)]
pub enum ExportError {
    /// Nothing valid to write
    Empty,
    /// Image encoding failed
    Image(String),
    /// Point cloud writer failed
    PointCloud(String),
    /// Filesystem error
    Io(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Empty => write!(f, "No valid points to export"),
            ExportError::Image(msg) => write!(f, "Image export failed: {}", msg),
            ExportError::PointCloud(msg) => write!(f, "Point cloud export failed: {}", msg),
            ExportError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

/// Top-level error for the command line tool
#[derive(Debug, Clone)]
pub enum AppError {
    Capture(CaptureError),
    Config(ConfigError),
    Export(ExportError),
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Export(e) => write!(f, "Export error: {}", e),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for ExportError {}
impl std::error::Error for AppError {}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        AppError::Export(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err.to_string())
    }
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        ExportError::Image(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(CaptureError::NotStarted.is_precondition());
        assert!(
            CaptureError::BufferLength {
                modality: Modality::Vertex,
                expected: 4,
                actual: 3,
            }
            .is_precondition()
        );
        assert!(CaptureError::DeviceFailed("gone".into()).is_device_failure());
        assert!(!CaptureError::DeviceFailed("gone".into()).is_precondition());
        assert!(CaptureError::Unsupported(Modality::Audio).is_unsupported());
        assert!(!CaptureError::Unsupported(Modality::Audio).is_device_failure());
    }

    #[test]
    fn test_shape_error_message() {
        let err = CaptureError::BufferShape {
            modality: Modality::Color,
            expected: Size::new(640, 480),
            actual: Size::new(320, 240),
        };
        assert_eq!(
            err.to_string(),
            "color buffer has shape 320x240, expected 640x480"
        );
    }

    #[test]
    fn test_app_error_from_capture() {
        let err: AppError = CaptureError::NotStarted.into();
        assert!(matches!(err, AppError::Capture(CaptureError::NotStarted)));
    }
}
