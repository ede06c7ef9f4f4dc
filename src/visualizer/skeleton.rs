// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use crate::landmark::PoseLandmark::{
    self, LeftAnkle, LeftEar, LeftElbow, LeftEye, LeftEyeInner, LeftEyeOuter, LeftFootIndex,
    LeftHeel, LeftHip, LeftIndex, LeftKnee, LeftPinky, LeftShoulder, LeftThumb, LeftWrist,
    MouthLeft, MouthRight, Nose, RightAnkle, RightEar, RightElbow, RightEye, RightEyeInner,
    RightEyeOuter, RightFootIndex, RightHeel, RightHip, RightIndex, RightKnee, RightPinky,
    RightShoulder, RightThumb, RightWrist,
};

/// A connection between two landmarks.
pub type SkeletonEdge = (PoseLandmark, PoseLandmark);

/// Full-body pose skeleton (35 edges).
pub const POSE_CONNECTIONS: [SkeletonEdge; 35] = [
    // face
    (Nose, LeftEyeInner),
    (LeftEyeInner, LeftEye),
    (LeftEye, LeftEyeOuter),
    (LeftEyeOuter, LeftEar),
    (Nose, RightEyeInner),
    (RightEyeInner, RightEye),
    (RightEye, RightEyeOuter),
    (RightEyeOuter, RightEar),
    (MouthLeft, MouthRight),
    // arms
    (LeftShoulder, RightShoulder),
    (LeftShoulder, LeftElbow),
    (LeftElbow, LeftWrist),
    (LeftWrist, LeftPinky),
    (LeftWrist, LeftIndex),
    (LeftWrist, LeftThumb),
    (LeftPinky, LeftIndex),
    (RightShoulder, RightElbow),
    (RightElbow, RightWrist),
    (RightWrist, RightPinky),
    (RightWrist, RightIndex),
    (RightWrist, RightThumb),
    (RightPinky, RightIndex),
    // torso
    (LeftShoulder, LeftHip),
    (RightShoulder, RightHip),
    (LeftHip, RightHip),
    // legs
    (LeftHip, LeftKnee),
    (RightHip, RightKnee),
    (LeftKnee, LeftAnkle),
    (RightKnee, RightAnkle),
    (LeftAnkle, LeftHeel),
    (RightAnkle, RightHeel),
    (LeftHeel, LeftFootIndex),
    (RightHeel, RightFootIndex),
    (LeftAnkle, LeftFootIndex),
    (RightAnkle, RightFootIndex),
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_connections_are_unique() {
        let edges: HashSet<(usize, usize)> = POSE_CONNECTIONS
            .iter()
            .map(|(a, b)| (a.index().min(b.index()), a.index().max(b.index())))
            .collect();
        assert_eq!(edges.len(), POSE_CONNECTIONS.len());
        assert!(edges.contains(&(11, 12)));
        assert!(edges.contains(&(27, 31)));
        assert!(edges.contains(&(9, 10)));
    }

    #[test]
    fn test_every_landmark_is_connected() {
        let used: HashSet<usize> = POSE_CONNECTIONS
            .iter()
            .flat_map(|(a, b)| [a.index(), b.index()])
            .collect();
        assert_eq!(used.len(), 33);
    }
}
