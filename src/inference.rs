// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose estimation configuration.
//!
//! This module defines the [`PoseConfig`] struct, which controls how the pose
//! model is run: streaming versus single-image mode, model size, temporal
//! smoothing and the detection/tracking confidence thresholds.

use std::fmt;
use std::str::FromStr;

/// How consecutive frames relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunningMode {
    /// Frames form a video stream; the previous pose seeds the next search
    /// region and landmarks are smoothed over time.
    #[default]
    Stream,
    /// Every frame is an unrelated still image.
    Image,
}

/// Latency/accuracy trade-off of the landmark network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelComplexity {
    /// Fastest, least accurate.
    Lite,
    /// Balanced.
    #[default]
    Full,
    /// Slowest, most accurate.
    Heavy,
}

impl ModelComplexity {
    /// Default ONNX file name for this complexity.
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Lite => "pose_landmark_lite.onnx",
            Self::Full => "pose_landmark_full.onnx",
            Self::Heavy => "pose_landmark_heavy.onnx",
        }
    }
}

impl fmt::Display for ModelComplexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lite => write!(f, "lite"),
            Self::Full => write!(f, "full"),
            Self::Heavy => write!(f, "heavy"),
        }
    }
}

impl FromStr for ModelComplexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "0" | "lite" | "low" => Ok(Self::Lite),
            "1" | "full" | "medium" => Ok(Self::Full),
            "2" | "heavy" | "high" => Ok(Self::Heavy),
            other => Err(format!("Unknown model complexity: {other}")),
        }
    }
}

/// Configuration for pose estimation.
///
/// Uses a builder pattern for convenient construction.
///
/// # Example
///
/// ```rust
/// use pose_relay::{ModelComplexity, PoseConfig};
///
/// let config = PoseConfig::new()
///     .with_complexity(ModelComplexity::Heavy)
///     .with_detection_confidence(0.6)
///     .with_tracking_confidence(0.4)
///     .with_smoothing(false);
/// ```
#[derive(Debug, Clone)]
pub struct PoseConfig {
    /// Streaming or single-image operation.
    pub running_mode: RunningMode,
    /// Landmark network size.
    pub complexity: ModelComplexity,
    /// Apply temporal smoothing to landmarks (streaming mode only).
    pub smooth_landmarks: bool,
    /// Minimum pose presence score for a fresh detection (0.0 to 1.0).
    pub min_detection_confidence: f32,
    /// Minimum pose presence score to keep tracking from the previous frame
    /// (0.0 to 1.0).
    pub min_tracking_confidence: f32,
    /// Number of intra-op threads for ONNX Runtime; `0` lets it decide.
    pub num_threads: usize,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            running_mode: RunningMode::Stream,
            complexity: ModelComplexity::Full,
            smooth_landmarks: true,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            num_threads: 0,
        }
    }
}

impl PoseConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the running mode.
    #[must_use]
    pub const fn with_running_mode(mut self, mode: RunningMode) -> Self {
        self.running_mode = mode;
        self
    }

    /// Set the model complexity.
    #[must_use]
    pub const fn with_complexity(mut self, complexity: ModelComplexity) -> Self {
        self.complexity = complexity;
        self
    }

    /// Enable or disable temporal landmark smoothing.
    #[must_use]
    pub const fn with_smoothing(mut self, smooth: bool) -> Self {
        self.smooth_landmarks = smooth;
        self
    }

    /// Set the detection confidence threshold.
    #[must_use]
    pub const fn with_detection_confidence(mut self, threshold: f32) -> Self {
        self.min_detection_confidence = threshold;
        self
    }

    /// Set the tracking confidence threshold.
    #[must_use]
    pub const fn with_tracking_confidence(mut self, threshold: f32) -> Self {
        self.min_tracking_confidence = threshold;
        self
    }

    /// Set the number of threads for inference.
    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }

    /// Whether the previous frame's pose may seed the next search region.
    #[must_use]
    pub fn tracking_enabled(&self) -> bool {
        self.running_mode == RunningMode::Stream
    }

    /// Whether landmarks are smoothed across frames.
    #[must_use]
    pub fn smoothing_enabled(&self) -> bool {
        self.running_mode == RunningMode::Stream && self.smooth_landmarks
    }

    /// Check that thresholds lie in [0, 1].
    ///
    /// # Errors
    ///
    /// Returns [`crate::PoseError::ConfigError`] naming the offending value.
    pub fn validate(&self) -> crate::Result<()> {
        for (name, value) in [
            ("min_detection_confidence", self.min_detection_confidence),
            ("min_tracking_confidence", self.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(crate::PoseError::ConfigError(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = PoseConfig::default();
        assert_eq!(config.running_mode, RunningMode::Stream);
        assert_eq!(config.complexity, ModelComplexity::Full);
        assert!(config.smooth_landmarks);
        assert!((config.min_detection_confidence - 0.5).abs() < f32::EPSILON);
        assert!((config.min_tracking_confidence - 0.5).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = PoseConfig::new()
            .with_running_mode(RunningMode::Image)
            .with_complexity(ModelComplexity::Lite)
            .with_detection_confidence(0.7)
            .with_tracking_confidence(0.3)
            .with_threads(4);

        assert_eq!(config.complexity, ModelComplexity::Lite);
        assert!((config.min_detection_confidence - 0.7).abs() < f32::EPSILON);
        assert!((config.min_tracking_confidence - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.num_threads, 4);
        assert!(!config.tracking_enabled());
        assert!(!config.smoothing_enabled());
    }

    #[test]
    fn test_smoothing_requires_stream_mode() {
        let config = PoseConfig::new().with_smoothing(true);
        assert!(config.smoothing_enabled());
        let config = config.with_smoothing(false);
        assert!(!config.smoothing_enabled());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = PoseConfig::new().with_detection_confidence(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_complexity() {
        assert_eq!("lite".parse(), Ok(ModelComplexity::Lite));
        assert_eq!("1".parse(), Ok(ModelComplexity::Full));
        assert_eq!("HIGH".parse(), Ok(ModelComplexity::Heavy));
        assert!("ultra".parse::<ModelComplexity>().is_err());
        assert_eq!(
            ModelComplexity::Heavy.default_model(),
            "pose_landmark_heavy.onnx"
        );
    }
}
