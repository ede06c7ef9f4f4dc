// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! The capture, infer and emit loop shared by every pipeline.
//!
//! A [`PoseSession`] owns one frame source and one estimator. Each iteration
//! reads a frame, runs the estimator on a copy in the channel order it
//! expects, and hands the original frame plus the detection to a
//! [`FrameSink`]. The sinks in this module cover the three pipelines: skeleton
//! overlay, UDP streaming and stick figure.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::annotate::{blank_canvas, draw_landmarks, draw_stick_figure};
use crate::error::Result;
use crate::frame::Frame;
use crate::geometry::StickFigure;
use crate::landmark::{Detection, LandmarkSet, PoseLandmark};
use crate::model::PoseEstimator;
use crate::packet::UdpEmitter;
use crate::source::FrameSource;
use crate::visualizer::{Surface, fit_for_display};
use crate::{verbose, warn};

/// Whether the loop should keep going after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next frame.
    Continue,
    /// Stop the loop.
    Exit,
}

/// Receives every frame together with its detection.
pub trait FrameSink {
    /// Handle one frame.
    ///
    /// `frame` is in the order it was captured in, independent of what the
    /// estimator consumed.
    ///
    /// # Errors
    ///
    /// Returns an error that should abort the run (e.g. the window failed).
    fn consume(&mut self, frame: &Frame, detection: &Detection) -> Result<Flow>;
}

/// Why a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The source had no more frames.
    EndOfStream,
    /// The source failed to produce a frame.
    CaptureFailed(String),
    /// The sink asked to stop (exit key or closed window).
    ExitRequested,
    /// The stop flag was raised (Ctrl-C).
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfStream => write!(f, "end of stream"),
            Self::CaptureFailed(msg) => write!(f, "capture failed: {msg}"),
            Self::ExitRequested => write!(f, "exit requested"),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Counters for a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames read from the source.
    pub frames: usize,
    /// Frames with a detected pose.
    pub detections: usize,
    /// Frames skipped because inference failed.
    pub failed: usize,
    /// Why the run ended.
    pub stop: StopReason,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl RunSummary {
    /// Average frames per second over the run.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.frames as f64 / secs } else { 0.0 }
    }
}

/// One run of the capture loop.
///
/// The session owns its source and estimator; both are dropped when
/// [`PoseSession::run`] returns, whatever the outcome.
pub struct PoseSession<S, E> {
    source: S,
    estimator: E,
    stop: Option<Arc<AtomicBool>>,
}

impl<S: FrameSource, E: PoseEstimator> PoseSession<S, E> {
    /// Create a session over a source and an estimator.
    pub const fn new(source: S, estimator: E) -> Self {
        Self {
            source,
            estimator,
            stop: None,
        }
    }

    /// Stop before the next read once `flag` is set.
    #[must_use]
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    /// Run until the source ends, capture fails, the sink exits or the stop
    /// flag is raised.
    ///
    /// Capture failures and the end of the stream are reported in the
    /// summary, not as errors. Inference errors skip the frame.
    ///
    /// # Errors
    ///
    /// Returns an error only if the sink fails.
    pub fn run<K: FrameSink + ?Sized>(mut self, sink: &mut K) -> Result<RunSummary> {
        let start = Instant::now();
        let mut frames = 0;
        let mut detections = 0;
        let mut failed = 0;

        let stop = loop {
            if self
                .stop
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::Relaxed))
            {
                break StopReason::Interrupted;
            }

            let frame = match self.source.read() {
                Ok(Some(frame)) => frame,
                Ok(None) => break StopReason::EndOfStream,
                Err(e) => {
                    warn!("{e}");
                    break StopReason::CaptureFailed(e.to_string());
                }
            };
            frames += 1;

            let input = frame.converted(self.estimator.channel_order());
            let detection = match self.estimator.estimate(&input) {
                Ok(detection) => detection,
                Err(e) => {
                    warn!("Frame {}: {e}", frame.index());
                    failed += 1;
                    Detection::NotDetected
                }
            };
            if detection.is_detected() {
                detections += 1;
            }

            if sink.consume(&frame, &detection)? == Flow::Exit {
                break StopReason::ExitRequested;
            }
        };

        Ok(RunSummary {
            frames,
            detections,
            failed,
            stop,
            elapsed: start.elapsed(),
        })
    }
}

impl<S, E: fmt::Debug> fmt::Debug for PoseSession<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoseSession")
            .field("estimator", &self.estimator)
            .field("has_stop_flag", &self.stop.is_some())
            .finish_non_exhaustive()
    }
}

/// Per-frame debug output for the windowed pipelines.
fn log_pose(landmarks: &LandmarkSet) {
    verbose!("Pose array shape: {:?}", landmarks.to_array().shape());
    verbose!("Left wrist: {:?}", landmarks[PoseLandmark::LeftWrist]);
}

fn present<D: Surface + ?Sized>(surface: &mut D, image: &image::RgbImage, size: (u32, u32)) -> Result<Flow> {
    let shown = fit_for_display(image, size)?;
    Ok(if surface.present(&shown)? { Flow::Continue } else { Flow::Exit })
}

// ================================================================================================
// Overlay
// ================================================================================================

/// Draws the skeleton on each frame and shows it.
pub struct OverlaySink<D> {
    surface: D,
    display_size: (u32, u32),
}

impl<D: Surface> OverlaySink<D> {
    /// Show frames on `surface`, resized to `display_size`.
    pub const fn new(surface: D, display_size: (u32, u32)) -> Self {
        Self {
            surface,
            display_size,
        }
    }
}

impl<D: Surface> FrameSink for OverlaySink<D> {
    fn consume(&mut self, frame: &Frame, detection: &Detection) -> Result<Flow> {
        let mut image = frame.to_rgb_image();
        if let Detection::Detected(landmarks) = detection {
            draw_landmarks(&mut image, landmarks);
            log_pose(landmarks);
        }
        present(&mut self.surface, &image, self.display_size)
    }
}

// ================================================================================================
// Stream
// ================================================================================================

/// Sends the tracked joints of each detected frame over UDP.
///
/// Send failures are logged and the frame is dropped. With a preview surface
/// the annotated frame is shown as well, and closing it ends the run.
pub struct StreamSink {
    emitter: UdpEmitter,
    preview: Option<(Box<dyn Surface>, (u32, u32))>,
    sent: usize,
    send_failures: usize,
}

impl StreamSink {
    /// Stream through `emitter` without a preview window.
    #[must_use]
    pub const fn new(emitter: UdpEmitter) -> Self {
        Self {
            emitter,
            preview: None,
            sent: 0,
            send_failures: 0,
        }
    }

    /// Also show annotated frames on `surface`.
    #[must_use]
    pub fn with_preview(mut self, surface: Box<dyn Surface>, display_size: (u32, u32)) -> Self {
        self.preview = Some((surface, display_size));
        self
    }

    /// Datagrams sent so far.
    #[must_use]
    pub const fn sent(&self) -> usize {
        self.sent
    }

    /// Datagrams that failed to send.
    #[must_use]
    pub const fn send_failures(&self) -> usize {
        self.send_failures
    }
}

impl FrameSink for StreamSink {
    fn consume(&mut self, frame: &Frame, detection: &Detection) -> Result<Flow> {
        if let Detection::Detected(landmarks) = detection {
            match self.emitter.send(landmarks) {
                Ok(payload) => {
                    self.sent += 1;
                    verbose!("Sent: {payload}");
                }
                Err(e) => {
                    self.send_failures += 1;
                    warn!("Failed to send to {}: {e}", self.emitter.destination());
                }
            }
        }

        let Some((surface, size)) = self.preview.as_mut() else {
            return Ok(Flow::Continue);
        };
        let mut image = frame.to_rgb_image();
        if let Detection::Detected(landmarks) = detection {
            draw_landmarks(&mut image, landmarks);
        }
        present(surface, &image, *size)
    }
}

impl fmt::Debug for StreamSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSink")
            .field("emitter", &self.emitter)
            .field("preview", &self.preview.is_some())
            .field("sent", &self.sent)
            .field("send_failures", &self.send_failures)
            .finish()
    }
}

// ================================================================================================
// Stick figure
// ================================================================================================

/// Shows the annotated frame next to a stick figure on a white canvas.
pub struct StickFigureSink<V, C> {
    video: V,
    canvas: C,
    display_size: (u32, u32),
}

impl<V: Surface, C: Surface> StickFigureSink<V, C> {
    /// Show the real video on `video` and the stick figure on `canvas`.
    pub const fn new(video: V, canvas: C, display_size: (u32, u32)) -> Self {
        Self {
            video,
            canvas,
            display_size,
        }
    }
}

impl<V: Surface, C: Surface> FrameSink for StickFigureSink<V, C> {
    fn consume(&mut self, frame: &Frame, detection: &Detection) -> Result<Flow> {
        let (w, h) = (frame.width(), frame.height());
        let mut image = frame.to_rgb_image();
        let mut canvas = blank_canvas(w, h);

        if let Detection::Detected(landmarks) = detection {
            draw_landmarks(&mut image, landmarks);
            draw_stick_figure(&mut canvas, &StickFigure::from_landmarks(landmarks, w, h));
            log_pose(landmarks);
        }

        let video = present(&mut self.video, &image, self.display_size)?;
        let stick = present(&mut self.canvas, &canvas, self.display_size)?;
        Ok(if video == Flow::Exit || stick == Flow::Exit {
            Flow::Exit
        } else {
            Flow::Continue
        })
    }
}
