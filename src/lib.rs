// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Pose Relay
//!
//! Real-time 33-landmark human pose estimation from a camera or recorded
//! frames, with three ways to use the result:
//!
//! - **overlay** - draw the pose skeleton over the video and show it
//! - **stream** - send selected joint positions as UDP datagrams to an
//!   external consumer such as a game engine scene
//! - **stickman** - draw a simplified stick figure on a blank canvas next to
//!   the annotated video
//!
//! The pose model is a BlazePose-style landmark network exported to ONNX and
//! run through ONNX Runtime.
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! use pose_relay::{BlazePoseModel, PoseConfig, PoseSession, Source, StreamSink, UdpEmitter};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = BlazePoseModel::load_with_config("pose_landmark_full.onnx", PoseConfig::default())?;
//!     let source = pose_relay::open_source(&Source::Webcam(0))?;
//!
//!     let emitter = UdpEmitter::new("127.0.0.1:5055".parse()?)?;
//!     let mut sink = StreamSink::new(emitter);
//!
//!     let summary = PoseSession::new(source, model).run(&mut sink)?;
//!     println!("{} frames, {} with a pose", summary.frames, summary.detections);
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Skeleton overlay from webcam 0 (Esc to quit)
//! pose-relay overlay
//!
//! # Stream the 8 tracked joints as JSON to 127.0.0.1:5055
//! pose-relay stream --dest 127.0.0.1:5055
//!
//! # Stick figure next to the video, from a recorded clip
//! pose-relay stickman --source clip.mp4
//! ```
//!
//! ## Wire Format
//!
//! One UTF-8 JSON object per frame with a detected person, mapping the joint
//! names to normalized `[x, y]` image coordinates (origin top-left, y down):
//!
//! ```text
//! {"LEFT_SHOULDER":[0.41,0.38],"RIGHT_SHOULDER":[0.58,0.37], ... ,"RIGHT_HIP":[0.56,0.66]}
//! ```
//!
//! ## Features
//!
//! - `visualize` (default) - windows via `minifb`
//! - `webcam` (default) - camera capture via `nokhwa`
//! - `video` - video file decoding via `video-rs`
//! - `coreml`, `cuda` - ONNX Runtime execution providers

// Modules
pub mod annotate;
pub mod cli;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod inference;
pub mod landmark;
pub mod model;
pub mod packet;
pub mod pipeline;
pub mod preprocessing;
pub mod smoothing;
pub mod source;
pub mod visualizer;

// Re-export main types for convenience
pub use error::{PoseError, Result};
pub use frame::{ChannelOrder, Frame};
pub use geometry::{PixelPoint, StickFigure};
pub use inference::{ModelComplexity, PoseConfig, RunningMode};
pub use landmark::{Detection, LANDMARK_COUNT, Landmark, LandmarkSet, PoseLandmark};
pub use model::{BlazePoseModel, PoseEstimator};
pub use packet::{CoordinateConvention, JointPacket, TrackedJoint, UdpEmitter, WireFormat};
pub use pipeline::{
    Flow, FrameSink, OverlaySink, PoseSession, RunSummary, StickFigureSink, StopReason, StreamSink,
};
pub use source::{FrameSource, ImageSequence, Source, open_source};
pub use visualizer::{POSE_CONNECTIONS, Surface};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "pose-relay");
    }
}
