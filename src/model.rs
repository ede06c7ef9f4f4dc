// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose landmark model loading and inference.
//!
//! This module provides the [`PoseEstimator`] trait consumed by the capture
//! loop and [`BlazePoseModel`], its implementation over an ONNX Runtime
//! session.

#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

use std::path::{Path, PathBuf};

#[cfg(feature = "coreml")]
use ort::execution_providers::CoreMLExecutionProvider;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::{TensorRef, ValueType};

use crate::error::{PoseError, Result};
use crate::frame::{ChannelOrder, Frame};
use crate::inference::PoseConfig;
use crate::landmark::{Detection, LANDMARK_COUNT, Landmark, LandmarkSet, PoseLandmark};
use crate::preprocessing::{INPUT_SIZE, Roi, TensorLayout, crop_roi, image_to_tensor, sigmoid};
use crate::smoothing::LandmarkSmoother;
use crate::verbose;

/// Values per landmark in the raw model output.
pub const VALUES_PER_LANDMARK: usize = 5;

/// Landmark count including the two alignment points.
pub const LANDMARKS_WITH_ALIGNMENT: usize = LANDMARK_COUNT + 6;

const HIP_CENTER: usize = LANDMARK_COUNT;
const SCALE_POINT: usize = LANDMARK_COUNT + 1;

/// Anything that turns a frame into a pose detection.
pub trait PoseEstimator {
    /// Channel order the estimator expects its input frames in.
    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Rgb
    }

    /// Estimate the pose in one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails. Finding no person is not an error.
    fn estimate(&mut self, frame: &Frame) -> Result<Detection>;
}

/// Raw landmark network output for one crop.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOutput {
    /// Pose presence score in [0, 1].
    pub score: f32,
    /// Flat `[n, 5]` landmark values in crop pixels.
    pub landmarks: Vec<f32>,
}

impl RawOutput {
    /// Pick the landmark and presence tensors out of the session outputs.
    ///
    /// Tensors are told apart by element count: `39 * 5` or `33 * 5` values
    /// hold landmarks, a single value holds the presence score (a logit is
    /// squashed into [0, 1]). Everything else is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if no landmark tensor is found.
    pub fn from_tensors(tensors: Vec<Vec<f32>>) -> Result<Self> {
        let mut landmarks = None;
        let mut score = None;
        for data in tensors {
            match data.len() {
                n if n == LANDMARKS_WITH_ALIGNMENT * VALUES_PER_LANDMARK
                    || n == LANDMARK_COUNT * VALUES_PER_LANDMARK =>
                {
                    if landmarks.as_ref().is_none_or(|l: &Vec<f32>| l.len() < n) {
                        landmarks = Some(data);
                    }
                }
                1 => {
                    let v = data[0];
                    score = Some(if (0.0..=1.0).contains(&v) { v } else { sigmoid(v) });
                }
                _ => {}
            }
        }
        let landmarks = landmarks.ok_or_else(|| {
            PoseError::InferenceError("Model produced no landmark tensor".to_string())
        })?;
        Ok(Self {
            score: score.unwrap_or(1.0),
            landmarks,
        })
    }

    /// Project landmarks from crop pixels back into normalized frame
    /// coordinates.
    ///
    /// Returns the 33 body landmarks and the region to track in the next
    /// frame, if one can be derived.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than 33 landmarks are present.
    pub fn decode(&self, roi: &Roi, width: u32, height: u32) -> Result<(LandmarkSet, Option<Roi>)> {
        let count = self.landmarks.len() / VALUES_PER_LANDMARK;
        if count < LANDMARK_COUNT {
            return Err(PoseError::LandmarkCount {
                expected: LANDMARK_COUNT,
                actual: count,
            });
        }
        let (w, h) = (width as f32, height as f32);
        let z_scale = roi.size / INPUT_SIZE as f32 / w;

        let pixels: Vec<(f32, f32)> = self
            .landmarks
            .chunks_exact(VALUES_PER_LANDMARK)
            .map(|v| roi.to_frame(v[0], v[1]))
            .collect();

        let body: Vec<Landmark> = self
            .landmarks
            .chunks_exact(VALUES_PER_LANDMARK)
            .zip(&pixels)
            .take(LANDMARK_COUNT)
            .map(|(v, &(px, py))| Landmark::new(px / w, py / h, v[2] * z_scale, sigmoid(v[3])))
            .collect();
        let set = LandmarkSet::from_slice(&body)?;

        let next = if count > SCALE_POINT {
            Roi::from_alignment(pixels[HIP_CENTER], pixels[SCALE_POINT])
        } else {
            alignment_from_body(&pixels)
        };
        Ok((set, next.is_valid().then_some(next)))
    }
}

/// Alignment region from the body landmarks alone: centered on the hips,
/// oriented toward the shoulders and large enough to reach every landmark.
fn alignment_from_body(pixels: &[(f32, f32)]) -> Roi {
    let mid = |a: PoseLandmark, b: PoseLandmark| {
        let (pa, pb) = (pixels[a.index()], pixels[b.index()]);
        ((pa.0 + pb.0) / 2.0, (pa.1 + pb.1) / 2.0)
    };
    let hip = mid(PoseLandmark::LeftHip, PoseLandmark::RightHip);
    let neck = mid(PoseLandmark::LeftShoulder, PoseLandmark::RightShoulder);
    let reach = pixels[..LANDMARK_COUNT]
        .iter()
        .map(|p| (p.0 - hip.0).hypot(p.1 - hip.1))
        .fold(0.0_f32, f32::max);
    let (dx, dy) = (neck.0 - hip.0, neck.1 - hip.1);
    let len = dx.hypot(dy);
    if len <= f32::EPSILON {
        return Roi::from_alignment(hip, (hip.0, hip.1 - reach));
    }
    Roi::from_alignment(hip, (hip.0 + dx / len * reach, hip.1 + dy / len * reach))
}

/// BlazePose landmark model for inference.
///
/// Wraps an ONNX Runtime session and keeps the per-stream state: the region
/// tracked from the previous frame and the landmark smoother.
///
/// # Example
///
/// ```no_run
/// use pose_relay::{BlazePoseModel, PoseConfig};
///
/// let model = BlazePoseModel::load_with_config("pose_landmark_full.onnx", PoseConfig::default())?;
/// # Ok::<(), pose_relay::PoseError>(())
/// ```
pub struct BlazePoseModel {
    session: Session,
    path: PathBuf,
    input_name: String,
    output_names: Vec<String>,
    layout: TensorLayout,
    config: PoseConfig,
    track: Option<Roi>,
    smoother: LandmarkSmoother,
}

impl BlazePoseModel {
    /// Load a model with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the model file doesn't exist or can't be loaded.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_config(path, PoseConfig::default())
    }

    /// Load a model with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, or the model file
    /// doesn't exist or can't be loaded.
    pub fn load_with_config<P: AsRef<Path>>(path: P, config: PoseConfig) -> Result<Self> {
        let path = path.as_ref();
        config.validate()?;

        if !path.exists() {
            return Err(PoseError::ModelLoadError(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        #[allow(unused_mut)]
        let mut builder = Session::builder().map_err(|e| {
            PoseError::ModelLoadError(format!("Failed to create session builder: {e}"))
        })?;

        #[cfg(feature = "coreml")]
        {
            builder = builder
                .with_execution_providers([CoreMLExecutionProvider::default().build()])
                .map_err(|e| PoseError::ModelLoadError(format!("Failed to register CoreML EP: {e}")))?;
        }

        let session = builder
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| PoseError::ModelLoadError(format!("Failed to set optimization level: {e}")))?
            .with_intra_threads(config.num_threads)
            .map_err(|e| PoseError::ModelLoadError(format!("Failed to set intra-thread count: {e}")))?
            .commit_from_file(path)
            .map_err(|e| PoseError::ModelLoadError(format!("Failed to load model: {e}")))?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| PoseError::ModelLoadError("Model has no inputs".to_string()))?;
        let input_name = input.name.clone();
        let layout = match &input.input_type {
            ValueType::Tensor { shape, .. } if shape.len() == 4 && shape.get(1) == Some(&3) => {
                TensorLayout::Nchw
            }
            _ => TensorLayout::Nhwc,
        };
        let output_names = session.outputs.iter().map(|o| o.name.clone()).collect();

        verbose!(
            "Loaded {} ({:?} input, {} mode)",
            path.display(),
            layout,
            if config.tracking_enabled() { "stream" } else { "image" }
        );

        Ok(Self {
            session,
            path: path.to_path_buf(),
            input_name,
            output_names,
            layout,
            config,
            track: None,
            smoother: LandmarkSmoother::new(),
        })
    }

    /// Path the model was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &PoseConfig {
        &self.config
    }

    /// Input tensor layout detected from the model.
    #[must_use]
    pub const fn layout(&self) -> TensorLayout {
        self.layout
    }

    /// Forget the tracked region and smoothing history.
    pub fn reset(&mut self) {
        self.track = None;
        self.smoother.reset();
    }

    /// Crop the region, run the network and collect its outputs.
    fn run_roi(&mut self, frame: &Frame, roi: &Roi) -> Result<RawOutput> {
        let crop = crop_roi(frame.pixels(), roi)?;
        let input = image_to_tensor(&crop, self.layout);
        let input = input.as_standard_layout();

        let input_tensor = TensorRef::from_array_view(&input).map_err(|e| {
            PoseError::InferenceError(format!("Failed to create input tensor: {e}"))
        })?;
        let outputs = self
            .session
            .run(ort::inputs![&self.input_name => input_tensor])
            .map_err(|e| PoseError::InferenceError(format!("Inference failed: {e}")))?;

        let mut tensors = Vec::with_capacity(self.output_names.len());
        for name in &self.output_names {
            let output = outputs
                .get(name.as_str())
                .ok_or_else(|| PoseError::InferenceError(format!("Output '{name}' not found")))?;
            if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
                tensors.push(data.to_vec());
            }
        }
        RawOutput::from_tensors(tensors)
    }

    /// Turn an accepted output into a detection and update the stream state.
    fn accept(&mut self, frame: &Frame, raw: &RawOutput, roi: &Roi) -> Result<Detection> {
        let (landmarks, next) = raw.decode(roi, frame.width(), frame.height())?;
        if self.config.tracking_enabled() {
            self.track = next;
        }
        let landmarks = if self.config.smoothing_enabled() {
            self.smoother.apply(frame.timestamp(), &landmarks)
        } else {
            landmarks
        };
        Ok(Detection::Detected(landmarks))
    }
}

impl PoseEstimator for BlazePoseModel {
    fn estimate(&mut self, frame: &Frame) -> Result<Detection> {
        if let Some(roi) = self.track.take() {
            let raw = self.run_roi(frame, &roi)?;
            if raw.score >= self.config.min_tracking_confidence {
                return self.accept(frame, &raw, &roi);
            }
            verbose!("Frame {}: track lost (score {:.2})", frame.index(), raw.score);
        }

        let roi = Roi::full_frame(frame.width(), frame.height());
        let raw = self.run_roi(frame, &roi)?;
        if raw.score >= self.config.min_detection_confidence {
            return self.accept(frame, &raw, &roi);
        }

        self.smoother.reset();
        Ok(Detection::NotDetected)
    }
}

impl std::fmt::Debug for BlazePoseModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlazePoseModel")
            .field("path", &self.path)
            .field("layout", &self.layout)
            .field("config", &self.config)
            .field("tracking", &self.track.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Landmarks all at the crop center, visibility logit 0.
    fn centered(count: usize) -> Vec<f32> {
        let c = INPUT_SIZE as f32 / 2.0;
        (0..count).flat_map(|_| [c, c, 0.0, 0.0, 0.0]).collect()
    }

    #[test]
    fn test_model_not_found() {
        let result = BlazePoseModel::load("nonexistent.onnx");
        assert!(matches!(result.unwrap_err(), PoseError::ModelLoadError(_)));
    }

    #[test]
    fn test_invalid_config_rejected_before_loading() {
        let config = PoseConfig::new().with_tracking_confidence(-0.1);
        let result = BlazePoseModel::load_with_config("nonexistent.onnx", config);
        assert!(matches!(result.unwrap_err(), PoseError::ConfigError(_)));
    }

    #[test]
    fn test_outputs_classified_by_size() {
        let raw = RawOutput::from_tensors(vec![
            vec![0.0; 117],
            centered(LANDMARKS_WITH_ALIGNMENT),
            vec![0.8],
        ])
        .unwrap();
        assert_eq!(raw.landmarks.len(), 195);
        assert!((raw.score - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_presence_logit_is_squashed() {
        let raw = RawOutput::from_tensors(vec![centered(LANDMARK_COUNT), vec![-4.0]]).unwrap();
        assert!(raw.score > 0.0 && raw.score < 0.5);
    }

    #[test]
    fn test_missing_landmarks_is_error() {
        assert!(RawOutput::from_tensors(vec![vec![0.5]]).is_err());
    }

    #[test]
    fn test_decode_centered_landmarks() {
        let raw = RawOutput {
            score: 1.0,
            landmarks: centered(LANDMARK_COUNT),
        };
        let roi = Roi::full_frame(640, 480);
        let (set, _) = raw.decode(&roi, 640, 480).unwrap();

        for lm in set.iter() {
            assert!((lm.x - 0.5).abs() < 1e-4);
            assert!((lm.y - 0.5).abs() < 1e-4);
            assert!((lm.visibility - 0.5).abs() < 1e-4);
        }
    }

    #[test]
    fn test_decode_tracks_alignment_points() {
        let mut values = centered(LANDMARKS_WITH_ALIGNMENT);
        // Scale point straight above the hip center.
        values[SCALE_POINT * VALUES_PER_LANDMARK + 1] = 64.0;
        let raw = RawOutput {
            score: 1.0,
            landmarks: values,
        };
        let roi = Roi::full_frame(512, 512);
        let (_, next) = raw.decode(&roi, 512, 512).unwrap();

        let next = next.unwrap();
        assert!((next.cx - 256.0).abs() < 1e-3);
        assert!((next.cy - 256.0).abs() < 1e-3);
        assert!(next.rotation.abs() < 1e-3);
        assert!((next.size - 2.0 * 128.0 * 1.25).abs() < 1e-2);
    }

    #[test]
    fn test_decode_rejects_short_output() {
        let raw = RawOutput {
            score: 1.0,
            landmarks: centered(10),
        };
        let result = raw.decode(&Roi::full_frame(10, 10), 10, 10);
        assert!(matches!(result, Err(PoseError::LandmarkCount { .. })));
    }
}
