// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Stick-figure geometry derived from a landmark set.
//!
//! Everything here is in pixel space: normalized landmark coordinates are
//! multiplied by the frame dimensions.

use crate::landmark::{LandmarkSet, PoseLandmark};

/// Head radius as a fraction of shoulder width.
pub const HEAD_RADIUS_RATIO: f32 = 0.3;

/// Gap in pixels between the neck point and the bottom of the head circle.
pub const HEAD_GAP_PX: f32 = 10.0;

/// A point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint {
    /// Horizontal pixel coordinate.
    pub x: f32,
    /// Vertical pixel coordinate (downward).
    pub y: f32,
}

impl PixelPoint {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Arithmetic mean of two points.
    #[must_use]
    pub fn midpoint(a: Self, b: Self) -> Self {
        Self::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
    }

    /// Integer pixel position, truncated toward zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn to_i32(self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }
}

/// A line segment of the stick figure.
pub type Segment = (PixelPoint, PixelPoint);

/// Geometry of a stick figure for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct StickFigure {
    /// Midpoint of the shoulders.
    pub neck: PixelPoint,
    /// Midpoint of the hips.
    pub hip: PixelPoint,
    /// Horizontal shoulder distance in pixels.
    pub shoulder_width: f32,
    /// Head circle radius in pixels.
    pub head_radius: f32,
    /// Head circle center, above the neck.
    pub head_center: PixelPoint,
    /// Torso, arms and legs in drawing order.
    pub segments: [Segment; 9],
}

impl StickFigure {
    /// Derive stick-figure geometry for a frame of `width` × `height` pixels.
    ///
    /// A side-on pose where both shoulders share an x coordinate gives a
    /// shoulder width and head radius of zero; the head then collapses to a
    /// point.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_landmarks(landmarks: &LandmarkSet, width: u32, height: u32) -> Self {
        let px = |lm: PoseLandmark| {
            let (x, y) = landmarks[lm].to_pixel(width, height);
            PixelPoint::new(x, y)
        };

        let left_shoulder = &landmarks[PoseLandmark::LeftShoulder];
        let right_shoulder = &landmarks[PoseLandmark::RightShoulder];

        let neck = PixelPoint::midpoint(px(PoseLandmark::LeftShoulder), px(PoseLandmark::RightShoulder));
        let hip = PixelPoint::midpoint(px(PoseLandmark::LeftHip), px(PoseLandmark::RightHip));

        let shoulder_width = (left_shoulder.x - right_shoulder.x).abs() * width as f32;
        let head_radius = HEAD_RADIUS_RATIO * shoulder_width;
        let head_center = PixelPoint::new(neck.x, neck.y - head_radius - HEAD_GAP_PX);

        let left_elbow = px(PoseLandmark::LeftElbow);
        let right_elbow = px(PoseLandmark::RightElbow);
        let left_knee = px(PoseLandmark::LeftKnee);
        let right_knee = px(PoseLandmark::RightKnee);

        let segments = [
            (neck, hip),
            (neck, left_elbow),
            (left_elbow, px(PoseLandmark::LeftWrist)),
            (neck, right_elbow),
            (right_elbow, px(PoseLandmark::RightWrist)),
            (hip, left_knee),
            (left_knee, px(PoseLandmark::LeftAnkle)),
            (hip, right_knee),
            (right_knee, px(PoseLandmark::RightAnkle)),
        ];

        Self {
            neck,
            hip,
            shoulder_width,
            head_radius,
            head_center,
            segments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{LANDMARK_COUNT, Landmark};

    fn set_with(points: &[(PoseLandmark, f32, f32)]) -> LandmarkSet {
        let mut raw = [Landmark::default(); LANDMARK_COUNT];
        for &(lm, x, y) in points {
            raw[lm.index()] = Landmark::new(x, y, 0.0, 1.0);
        }
        LandmarkSet::new(raw)
    }

    #[test]
    fn test_reference_example() {
        let set = set_with(&[
            (PoseLandmark::LeftShoulder, 0.4, 0.5),
            (PoseLandmark::RightShoulder, 0.6, 0.5),
        ]);
        let fig = StickFigure::from_landmarks(&set, 800, 500);

        assert!((fig.shoulder_width - 160.0).abs() < 1e-3);
        assert!((fig.head_radius - 48.0).abs() < 1e-3);
        assert_eq!(fig.neck.to_i32(), (400, 250));
        assert!((fig.head_center.x - 400.0).abs() < 1e-3);
        assert!((fig.head_center.y - (250.0 - 48.0 - 10.0)).abs() < 1e-3);
    }

    #[test]
    fn test_midpoints_are_means() {
        let set = set_with(&[
            (PoseLandmark::LeftShoulder, 0.3, 0.2),
            (PoseLandmark::RightShoulder, 0.7, 0.4),
            (PoseLandmark::LeftHip, 0.35, 0.6),
            (PoseLandmark::RightHip, 0.55, 0.8),
        ]);
        let fig = StickFigure::from_landmarks(&set, 1000, 1000);

        assert!((fig.neck.x - 500.0).abs() < 1e-3);
        assert!((fig.neck.y - 300.0).abs() < 1e-3);
        assert!((fig.hip.x - 450.0).abs() < 1e-3);
        assert!((fig.hip.y - 700.0).abs() < 1e-3);
        assert_eq!(fig.segments[0], (fig.neck, fig.hip));
    }

    #[test]
    fn test_radius_ignores_shoulder_order() {
        let set = set_with(&[
            (PoseLandmark::LeftShoulder, 0.65, 0.5),
            (PoseLandmark::RightShoulder, 0.45, 0.5),
        ]);
        let fig = StickFigure::from_landmarks(&set, 640, 480);

        let expected = HEAD_RADIUS_RATIO * (0.65_f32 - 0.45).abs() * 640.0;
        assert!((fig.head_radius - expected).abs() < 1e-3);
    }

    #[test]
    fn test_zero_shoulder_width() {
        let set = set_with(&[
            (PoseLandmark::LeftShoulder, 0.5, 0.4),
            (PoseLandmark::RightShoulder, 0.5, 0.4),
        ]);
        let fig = StickFigure::from_landmarks(&set, 640, 480);

        assert!(fig.shoulder_width.abs() < f32::EPSILON);
        assert!(fig.head_radius.abs() < f32::EPSILON);
        assert!((fig.head_center.y - (0.4 * 480.0 - HEAD_GAP_PX)).abs() < 1e-3);
    }

    #[test]
    fn test_limb_segments_follow_landmarks() {
        let set = set_with(&[
            (PoseLandmark::LeftElbow, 0.2, 0.4),
            (PoseLandmark::LeftWrist, 0.1, 0.3),
            (PoseLandmark::RightKnee, 0.6, 0.8),
            (PoseLandmark::RightAnkle, 0.6, 0.95),
        ]);
        let fig = StickFigure::from_landmarks(&set, 100, 100);

        assert_eq!(fig.segments[2].0.to_i32(), (20, 40));
        assert_eq!(fig.segments[2].1.to_i32(), (10, 30));
        assert_eq!(fig.segments[8].1.to_i32(), (60, 95));
    }
}
