// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the pose relay library.

use std::fmt;

/// Result type alias for pose relay operations.
pub type Result<T> = std::result::Result<T, PoseError>;

/// Main error type for the pose relay library.
#[derive(Debug)]
pub enum PoseError {
    /// Error loading the ONNX pose model.
    ModelLoadError(String),
    /// Error during model inference.
    InferenceError(String),
    /// Error processing images or frames.
    ImageError(String),
    /// Invalid configuration provided.
    ConfigError(String),
    /// Error opening or reading a capture device.
    CaptureError(String),
    /// A landmark collection did not have the expected number of entries.
    LandmarkCount {
        /// Number of landmarks the model contract requires.
        expected: usize,
        /// Number of landmarks actually received.
        actual: usize,
    },
    /// Error encoding an outbound packet.
    SerializationError(String),
    /// Wrapped `std::io::Error` (sockets, files).
    Io(std::io::Error),
    /// Visualizer error.
    VisualizerError(String),
    /// Video decoding error.
    VideoError(String),
    /// Feature not enabled.
    FeatureNotEnabled(String),
}

impl fmt::Display for PoseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelLoadError(msg) => write!(f, "Model load error: {msg}"),
            Self::InferenceError(msg) => write!(f, "Inference error: {msg}"),
            Self::ImageError(msg) => write!(f, "Image error: {msg}"),
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
            Self::CaptureError(msg) => write!(f, "Capture error: {msg}"),
            Self::LandmarkCount { expected, actual } => {
                write!(f, "Landmark count error: expected {expected}, got {actual}")
            }
            Self::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
            Self::VisualizerError(msg) => write!(f, "Visualizer error: {msg}"),
            Self::VideoError(msg) => write!(f, "Video error: {msg}"),
            Self::FeatureNotEnabled(msg) => write!(f, "Feature not enabled: {msg}"),
        }
    }
}

impl std::error::Error for PoseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PoseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for PoseError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageError(err.to_string())
    }
}

impl From<serde_json::Error> for PoseError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PoseError::ModelLoadError("test".to_string());
        assert_eq!(err.to_string(), "Model load error: test");

        let err = PoseError::CaptureError("device busy".to_string());
        assert_eq!(err.to_string(), "Capture error: device busy");

        let err = PoseError::LandmarkCount {
            expected: 33,
            actual: 17,
        };
        assert_eq!(
            err.to_string(),
            "Landmark count error: expected 33, got 17"
        );
    }

    #[test]
    fn test_io_error_source() {
        use std::error::Error;

        let err = PoseError::from(std::io::Error::other("socket closed"));
        assert!(err.source().is_some());
        assert!(PoseError::ConfigError("x".into()).source().is_none());
    }
}
