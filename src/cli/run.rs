// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Command implementations: wire the model, source and sink together.

use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::cli::args::{Commands, DisplayArgs, PoseArgs, StreamArgs};
use crate::model::BlazePoseModel;
use crate::packet::UdpEmitter;
use crate::pipeline::{FrameSink, PoseSession, RunSummary, StopReason, StreamSink};
use crate::source::{FrameSource, Source, open_source};
use crate::{VERSION, error, info, section, success, verbose, warn};

#[cfg(feature = "visualize")]
use crate::pipeline::{OverlaySink, StickFigureSink};
#[cfg(feature = "visualize")]
use crate::visualizer::{ExitKey, OVERLAY_DISPLAY_SIZE, STICKMAN_DISPLAY_SIZE, Viewer};

/// Window title of the overlay pipeline.
pub const OVERLAY_WINDOW: &str = "Pose Overlay";
/// Window title of the stream preview.
pub const STREAM_WINDOW: &str = "Pose Stream";
/// Window title of the annotated video in the stick-figure pipeline.
pub const REAL_VIDEO_WINDOW: &str = "Real Video";
/// Window title of the stick-figure canvas.
pub const STICK_FIGURE_WINDOW: &str = "Stick Figure";

/// Run a parsed command. Exits the process with status 1 when setup fails.
pub fn run_command(command: &Commands) {
    match command {
        Commands::Overlay(args) => run_overlay(args),
        Commands::Stream(args) => run_stream(args),
        Commands::Stickman(args) => run_stickman(args),
    }
}

/// Everything a run needs besides its sink.
type Prepared = (Box<dyn FrameSource>, BlazePoseModel, Arc<AtomicBool>);

/// Load the model, open the source and install the Ctrl-C handler.
fn prepare(args: &PoseArgs) -> Prepared {
    let config = args.to_config();
    let model_path = args.model_path();
    if args.model.is_none() {
        warn!("'model' argument is missing. Using default '--model={model_path}'.");
    }

    let model = match BlazePoseModel::load_with_config(&model_path, config) {
        Ok(m) => m,
        Err(e) => {
            error!("Error loading model: {e}");
            process::exit(1);
        }
    };
    verbose!("Model: {model:?}");

    let source = Source::from(args.source.as_str());
    let frames = match open_source(&source) {
        Ok(s) => s,
        Err(e) => {
            error!("Error opening {source}: {e}");
            process::exit(1);
        }
    };
    info!("Source: {source}");

    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
        warn!("Failed to install Ctrl-C handler: {e}");
    }

    (frames, model, stop)
}

/// Run the session and report how it ended.
fn execute<K: FrameSink>(prepared: Prepared, sink: &mut K) {
    let (frames, model, stop) = prepared;
    let session = PoseSession::new(frames, model).with_stop_flag(stop);

    match session.run(sink) {
        Ok(summary) => report(&summary),
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn report(summary: &RunSummary) {
    let rate = if summary.frames > 0 {
        summary.detections as f64 / summary.frames as f64 * 100.0
    } else {
        0.0
    };
    success!(
        "{} frames, {} with a pose ({rate:.1}%), {:.1} fps, stopped: {}",
        summary.frames,
        summary.detections,
        summary.fps(),
        summary.stop
    );
    if summary.failed > 0 {
        warn!("{} frames skipped after inference errors", summary.failed);
    }
    if let StopReason::CaptureFailed(msg) = &summary.stop {
        verbose!("Capture ended with: {msg}");
    }
}

/// Skeleton overlay in a window; Esc quits.
#[cfg(feature = "visualize")]
pub fn run_overlay(args: &DisplayArgs) {
    section!("pose-relay {VERSION} overlay");
    let prepared = prepare(&args.pose);
    let size = args.display_size.unwrap_or(OVERLAY_DISPLAY_SIZE);
    let viewer = match Viewer::new(OVERLAY_WINDOW, size, ExitKey::Escape) {
        Ok(v) => v,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };
    execute(prepared, &mut OverlaySink::new(viewer, size));
}

/// Annotated video next to a stick figure; `q` quits.
#[cfg(feature = "visualize")]
pub fn run_stickman(args: &DisplayArgs) {
    section!("pose-relay {VERSION} stickman");
    let prepared = prepare(&args.pose);
    let size = args.display_size.unwrap_or(STICKMAN_DISPLAY_SIZE);
    let windows = Viewer::new(REAL_VIDEO_WINDOW, size, ExitKey::Q)
        .and_then(|video| Ok((video, Viewer::new(STICK_FIGURE_WINDOW, size, ExitKey::Q)?)));
    let (video, canvas) = match windows {
        Ok(w) => w,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };
    execute(prepared, &mut StickFigureSink::new(video, canvas, size));
}

#[cfg(not(feature = "visualize"))]
pub fn run_overlay(_args: &DisplayArgs) {
    error!("The overlay command requires the 'visualize' feature");
    process::exit(1);
}

#[cfg(not(feature = "visualize"))]
pub fn run_stickman(_args: &DisplayArgs) {
    error!("The stickman command requires the 'visualize' feature");
    process::exit(1);
}

/// Joint streaming over UDP.
pub fn run_stream(args: &StreamArgs) {
    section!("pose-relay {VERSION} stream");
    let prepared = prepare(&args.pose);
    let emitter = match UdpEmitter::new(args.dest) {
        Ok(e) => e
            .with_format(args.format)
            .with_convention(args.convention()),
        Err(e) => {
            error!("Error binding UDP socket: {e}");
            process::exit(1);
        }
    };
    info!(
        "Streaming {} datagrams to {} ({:?} coordinates)",
        args.format,
        emitter.destination(),
        args.convention()
    );

    let mut sink = StreamSink::new(emitter);
    if args.show {
        sink = with_stream_preview(sink);
    }
    execute(prepared, &mut sink);
    verbose!(
        "Datagrams sent: {}, failed: {}",
        sink.sent(),
        sink.send_failures()
    );
}

#[cfg(feature = "visualize")]
fn with_stream_preview(sink: StreamSink) -> StreamSink {
    match Viewer::new(STREAM_WINDOW, OVERLAY_DISPLAY_SIZE, ExitKey::Q) {
        Ok(viewer) => sink.with_preview(Box::new(viewer), OVERLAY_DISPLAY_SIZE),
        Err(e) => {
            warn!("Preview disabled: {e}");
            sink
        }
    }
}

#[cfg(not(feature = "visualize"))]
fn with_stream_preview(sink: StreamSink) -> StreamSink {
    warn!("Preview requires the 'visualize' feature");
    sink
}
