// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose landmark types.
//!
//! The pose model outputs a fixed, ordered list of 33 body landmarks. A
//! landmark's identity is its index in that list, so every consumer indexes
//! through [`PoseLandmark`] rather than searching.

use std::fmt;
use std::ops::Index;

use crate::error::{PoseError, Result};

/// Number of landmarks in a full body pose.
pub const LANDMARK_COUNT: usize = 33;

/// A single body keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    /// Horizontal position normalized to frame width (0.0 = left edge).
    pub x: f32,
    /// Vertical position normalized to frame height (0.0 = top edge).
    pub y: f32,
    /// Depth relative to the hips; smaller is closer to the camera.
    pub z: f32,
    /// Confidence in [0, 1] that the point is visible.
    pub visibility: f32,
}

impl Landmark {
    /// Create a new landmark.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility,
        }
    }

    /// Position in pixel space for a frame of the given size.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_pixel(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }

    /// Whether the landmark's visibility reaches `threshold`.
    #[must_use]
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility >= threshold
    }
}

/// Body landmark indices of the 33-point pose topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PoseLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl PoseLandmark {
    /// All landmarks in canonical index order.
    pub const ALL: [Self; LANDMARK_COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    /// Index of this landmark in a [`LandmarkSet`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up a landmark by index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < LANDMARK_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Upper snake case name used on the wire (e.g. `LEFT_SHOULDER`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nose => "NOSE",
            Self::LeftEyeInner => "LEFT_EYE_INNER",
            Self::LeftEye => "LEFT_EYE",
            Self::LeftEyeOuter => "LEFT_EYE_OUTER",
            Self::RightEyeInner => "RIGHT_EYE_INNER",
            Self::RightEye => "RIGHT_EYE",
            Self::RightEyeOuter => "RIGHT_EYE_OUTER",
            Self::LeftEar => "LEFT_EAR",
            Self::RightEar => "RIGHT_EAR",
            Self::MouthLeft => "MOUTH_LEFT",
            Self::MouthRight => "MOUTH_RIGHT",
            Self::LeftShoulder => "LEFT_SHOULDER",
            Self::RightShoulder => "RIGHT_SHOULDER",
            Self::LeftElbow => "LEFT_ELBOW",
            Self::RightElbow => "RIGHT_ELBOW",
            Self::LeftWrist => "LEFT_WRIST",
            Self::RightWrist => "RIGHT_WRIST",
            Self::LeftPinky => "LEFT_PINKY",
            Self::RightPinky => "RIGHT_PINKY",
            Self::LeftIndex => "LEFT_INDEX",
            Self::RightIndex => "RIGHT_INDEX",
            Self::LeftThumb => "LEFT_THUMB",
            Self::RightThumb => "RIGHT_THUMB",
            Self::LeftHip => "LEFT_HIP",
            Self::RightHip => "RIGHT_HIP",
            Self::LeftKnee => "LEFT_KNEE",
            Self::RightKnee => "RIGHT_KNEE",
            Self::LeftAnkle => "LEFT_ANKLE",
            Self::RightAnkle => "RIGHT_ANKLE",
            Self::LeftHeel => "LEFT_HEEL",
            Self::RightHeel => "RIGHT_HEEL",
            Self::LeftFootIndex => "LEFT_FOOT_INDEX",
            Self::RightFootIndex => "RIGHT_FOOT_INDEX",
        }
    }
}

impl fmt::Display for PoseLandmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The full set of landmarks for one detected person in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkSet {
    landmarks: [Landmark; LANDMARK_COUNT],
}

impl LandmarkSet {
    /// Wrap an already complete landmark array.
    #[must_use]
    pub const fn new(landmarks: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { landmarks }
    }

    /// Build a set from a slice, validating it against [`LANDMARK_COUNT`].
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::LandmarkCount`] if the slice has the wrong length.
    pub fn from_slice(landmarks: &[Landmark]) -> Result<Self> {
        let landmarks: [Landmark; LANDMARK_COUNT] =
            landmarks.try_into().map_err(|_| PoseError::LandmarkCount {
                expected: LANDMARK_COUNT,
                actual: landmarks.len(),
            })?;
        Ok(Self { landmarks })
    }

    /// Get a landmark by name.
    #[must_use]
    pub const fn get(&self, landmark: PoseLandmark) -> &Landmark {
        &self.landmarks[landmark.index()]
    }

    /// Iterate over landmarks in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.landmarks.iter()
    }

    /// Borrow the landmarks as a slice.
    #[must_use]
    pub const fn as_slice(&self) -> &[Landmark] {
        &self.landmarks
    }

    /// Number of landmarks, always [`LANDMARK_COUNT`].
    #[must_use]
    pub const fn len(&self) -> usize {
        LANDMARK_COUNT
    }

    /// Always `false`; kept for API symmetry with collections.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Landmarks as `[x, y, z, visibility]` rows, shape `(33, 4)`.
    #[must_use]
    pub fn to_array(&self) -> ndarray::Array2<f32> {
        ndarray::Array2::from_shape_fn((LANDMARK_COUNT, 4), |(i, j)| {
            let lm = &self.landmarks[i];
            match j {
                0 => lm.x,
                1 => lm.y,
                2 => lm.z,
                _ => lm.visibility,
            }
        })
    }
}

impl Index<PoseLandmark> for LandmarkSet {
    type Output = Landmark;

    fn index(&self, landmark: PoseLandmark) -> &Landmark {
        self.get(landmark)
    }
}

/// Outcome of running the pose model on one frame.
///
/// `NotDetected` is the normal "no person in view" case, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    /// A person was found.
    Detected(LandmarkSet),
    /// Nobody was found in this frame.
    NotDetected,
}

impl Detection {
    /// Borrow the landmarks if a person was detected.
    #[must_use]
    pub const fn landmarks(&self) -> Option<&LandmarkSet> {
        match self {
            Self::Detected(set) => Some(set),
            Self::NotDetected => None,
        }
    }

    /// Whether a person was detected.
    #[must_use]
    pub const fn is_detected(&self) -> bool {
        matches!(self, Self::Detected(_))
    }
}

impl From<Option<LandmarkSet>> for Detection {
    fn from(set: Option<LandmarkSet>) -> Self {
        set.map_or(Self::NotDetected, Self::Detected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_indices_match_contract() {
        for (i, lm) in PoseLandmark::ALL.iter().enumerate() {
            assert_eq!(lm.index(), i);
            assert_eq!(PoseLandmark::from_index(i), Some(*lm));
        }
        assert_eq!(PoseLandmark::LeftShoulder.index(), 11);
        assert_eq!(PoseLandmark::RightHip.index(), 24);
        assert_eq!(PoseLandmark::RightFootIndex.index(), 32);
        assert_eq!(PoseLandmark::from_index(LANDMARK_COUNT), None);
    }

    #[test]
    fn test_landmark_names() {
        assert_eq!(PoseLandmark::LeftWrist.name(), "LEFT_WRIST");
        assert_eq!(PoseLandmark::MouthRight.to_string(), "MOUTH_RIGHT");
    }

    #[test]
    fn test_from_slice_validates_length() {
        let ok = LandmarkSet::from_slice(&[Landmark::default(); LANDMARK_COUNT]);
        assert!(ok.is_ok());

        let err = LandmarkSet::from_slice(&[Landmark::default(); 17]).unwrap_err();
        assert!(matches!(
            err,
            PoseError::LandmarkCount {
                expected: 33,
                actual: 17
            }
        ));
    }

    #[test]
    fn test_index_by_name() {
        let mut raw = [Landmark::default(); LANDMARK_COUNT];
        raw[15] = Landmark::new(0.25, 0.75, -0.1, 0.9);
        let set = LandmarkSet::new(raw);

        assert_eq!(set[PoseLandmark::LeftWrist], raw[15]);
        assert_eq!(set.len(), LANDMARK_COUNT);
    }

    #[test]
    fn test_to_array_shape() {
        let mut raw = [Landmark::default(); LANDMARK_COUNT];
        raw[0] = Landmark::new(0.1, 0.2, 0.3, 0.4);
        let arr = LandmarkSet::new(raw).to_array();

        assert_eq!(arr.shape(), &[33, 4]);
        assert!((arr[[0, 3]] - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn test_detection_from_option() {
        assert_eq!(Detection::from(None), Detection::NotDetected);
        let set = LandmarkSet::new([Landmark::default(); LANDMARK_COUNT]);
        let det = Detection::from(Some(set));
        assert!(det.is_detected());
        assert!(det.landmarks().is_some());
    }

    #[test]
    fn test_to_pixel() {
        let lm = Landmark::new(0.5, 0.25, 0.0, 1.0);
        assert_eq!(lm.to_pixel(800, 400), (400.0, 100.0));
    }
}
