// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand};

use crate::inference::{ModelComplexity, PoseConfig, RunningMode};
use crate::packet::{CoordinateConvention, DEFAULT_DESTINATION, WireFormat};

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Pose Options (all commands):
    --source, -s <SOURCE>              Webcam index, video file, image or directory [default: 0]
    --model, -m <MODEL>                Path to the ONNX pose landmark model
    --complexity <LEVEL>               lite, full or heavy [default: full]
    --static-image                     Treat every frame as an unrelated image
    --no-smooth                        Disable temporal landmark smoothing
    --min-detection-confidence <CONF>  [default: 0.5]
    --min-tracking-confidence <CONF>   [default: 0.5]
    --threads <N>                      ONNX Runtime intra-op threads [default: 0 = auto]
    --verbose <BOOL>                   Show verbose output [default: true]

Examples:
    pose-relay overlay
    pose-relay overlay --source clip.mp4 --display-size 1280x720
    pose-relay stream --dest 127.0.0.1:5055
    pose-relay stream --format indexed --flip-y --show
    pose-relay stickman -s 1 --complexity heavy"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Draw the pose skeleton over the video and show it (Esc to quit)
    Overlay(DisplayArgs),
    /// Send tracked joint positions over UDP ('q' in the preview or Ctrl-C to quit)
    Stream(StreamArgs),
    /// Show the video next to a stick figure on a white canvas ('q' to quit)
    Stickman(DisplayArgs),
}

impl Commands {
    /// Options shared by every command.
    #[must_use]
    pub const fn pose(&self) -> &PoseArgs {
        match self {
            Self::Overlay(args) | Self::Stickman(args) => &args.pose,
            Self::Stream(args) => &args.pose,
        }
    }
}

/// Options for the capture source and the pose model.
#[derive(Args, Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct PoseArgs {
    /// Webcam index, video file, image or directory
    #[arg(short, long, default_value = "0")]
    pub source: String,

    /// Path to ONNX pose landmark model [default: depends on --complexity]
    #[arg(short, long)]
    pub model: Option<String>,

    /// Model complexity (lite, full, heavy)
    #[arg(long, default_value_t = ModelComplexity::Full)]
    pub complexity: ModelComplexity,

    /// Treat every frame as an unrelated still image
    #[arg(long, default_value_t = false)]
    pub static_image: bool,

    /// Disable temporal landmark smoothing
    #[arg(long, default_value_t = false)]
    pub no_smooth: bool,

    /// Minimum presence score for a fresh detection
    #[arg(long, default_value_t = 0.5)]
    pub min_detection_confidence: f32,

    /// Minimum presence score to keep tracking
    #[arg(long, default_value_t = 0.5)]
    pub min_tracking_confidence: f32,

    /// ONNX Runtime intra-op threads (0 = auto)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

impl PoseArgs {
    /// Build the estimator configuration.
    #[must_use]
    pub fn to_config(&self) -> PoseConfig {
        let mode = if self.static_image {
            RunningMode::Image
        } else {
            RunningMode::Stream
        };
        PoseConfig::new()
            .with_running_mode(mode)
            .with_complexity(self.complexity)
            .with_smoothing(!self.no_smooth)
            .with_detection_confidence(self.min_detection_confidence)
            .with_tracking_confidence(self.min_tracking_confidence)
            .with_threads(self.threads)
    }

    /// Model path, falling back to the default file for the complexity.
    #[must_use]
    pub fn model_path(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.complexity.default_model().to_string())
    }
}

/// Arguments for the windowed commands.
#[derive(Args, Debug, Clone)]
pub struct DisplayArgs {
    #[command(flatten)]
    pub pose: PoseArgs,

    /// Window size as WIDTHxHEIGHT [default: 800x720 for overlay, 640x480 for stickman]
    #[arg(long, value_parser = parse_size)]
    pub display_size: Option<(u32, u32)>,
}

/// Arguments for the stream command.
#[derive(Args, Debug, Clone)]
pub struct StreamArgs {
    #[command(flatten)]
    pub pose: PoseArgs,

    /// Destination address for joint datagrams
    #[arg(long, default_value = DEFAULT_DESTINATION)]
    pub dest: SocketAddr,

    /// Payload format (json, indexed)
    #[arg(long, default_value_t = WireFormat::Json)]
    pub format: WireFormat,

    /// Send y as 1 - y (origin bottom-left)
    #[arg(long, default_value_t = false)]
    pub flip_y: bool,

    /// Show an annotated preview window
    #[arg(long, default_value_t = false)]
    pub show: bool,
}

impl StreamArgs {
    /// Coordinate convention selected by the flags.
    #[must_use]
    pub const fn convention(&self) -> CoordinateConvention {
        if self.flip_y {
            CoordinateConvention::FlipY
        } else {
            CoordinateConvention::Image
        }
    }
}

/// Parse `WIDTHxHEIGHT`.
fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("Expected WIDTHxHEIGHT, got '{s}'"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("Invalid width '{w}': {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("Invalid height '{h}': {e}"))?;
    if w == 0 || h == 0 {
        return Err(format!("Size must be non-zero, got {w}x{h}"));
    }
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overlay_defaults() {
        let args = Cli::parse_from(["app", "overlay"]);
        match args.command {
            Commands::Overlay(display) => {
                let pose = &display.pose;
                assert_eq!(pose.source, "0");
                assert!(pose.model.is_none());
                assert_eq!(pose.model_path(), "pose_landmark_full.onnx");
                assert_eq!(pose.complexity, ModelComplexity::Full);
                assert!(!pose.static_image);
                assert!(!pose.no_smooth);
                assert!((pose.min_detection_confidence - 0.5).abs() < f32::EPSILON);
                assert!((pose.min_tracking_confidence - 0.5).abs() < f32::EPSILON);
                assert!(pose.verbose);
                assert!(display.display_size.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_stream_defaults() {
        let args = Cli::parse_from(["app", "stream"]);
        match args.command {
            Commands::Stream(stream) => {
                assert_eq!(stream.dest, "127.0.0.1:5055".parse().unwrap());
                assert_eq!(stream.format, WireFormat::Json);
                assert_eq!(stream.convention(), CoordinateConvention::Image);
                assert!(!stream.show);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_custom_args() {
        let args = Cli::parse_from([
            "app",
            "stream",
            "--source",
            "clip.mp4",
            "--complexity",
            "heavy",
            "--static-image",
            "--min-detection-confidence",
            "0.7",
            "--dest",
            "10.0.0.2:6000",
            "--format",
            "indexed",
            "--flip-y",
            "--verbose",
            "false",
        ]);
        let Commands::Stream(stream) = args.command else {
            panic!("expected stream command");
        };
        assert_eq!(stream.pose.source, "clip.mp4");
        assert_eq!(stream.pose.model_path(), "pose_landmark_heavy.onnx");
        assert_eq!(stream.format, WireFormat::Indexed);
        assert_eq!(stream.convention(), CoordinateConvention::FlipY);
        assert!(!stream.pose.verbose);

        let config = stream.pose.to_config();
        assert_eq!(config.running_mode, RunningMode::Image);
        assert!(!config.tracking_enabled());
        assert!((config.min_detection_confidence - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_display_size() {
        let args = Cli::parse_from(["app", "stickman", "--display-size", "1280x720"]);
        let Commands::Stickman(display) = args.command else {
            panic!("expected stickman command");
        };
        assert_eq!(display.display_size, Some((1280, 720)));

        assert!(parse_size("1280").is_err());
        assert!(parse_size("0x10").is_err());
    }
}
