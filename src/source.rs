// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Frame sources: webcams, video files and still images.
//!
//! Every source yields [`Frame`]s through the [`FrameSource`] trait. A source
//! returns `Ok(None)` once it is exhausted and an error when capture fails;
//! the capture loop treats both as the end of the run.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PoseError, Result};
use crate::frame::{ChannelOrder, Frame};

/// Nominal frame interval used to timestamp still images.
pub const IMAGE_SEQUENCE_INTERVAL: Duration = Duration::from_nanos(33_333_333);

/// Represents the different frame sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Webcam device index.
    Webcam(u32),
    /// Path to a video file.
    Video(PathBuf),
    /// Path to a single image file.
    Image(PathBuf),
    /// Directory of images, read in sorted path order.
    Directory(PathBuf),
}

impl Default for Source {
    fn default() -> Self {
        Self::Webcam(0)
    }
}

impl Source {
    /// Get the path if this source has one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Image(p) | Self::Video(p) | Self::Directory(p) => Some(p),
            Self::Webcam(_) => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Webcam(idx) => write!(f, "webcam {idx}"),
            Self::Video(p) => write!(f, "video {}", p.display()),
            Self::Image(p) => write!(f, "image {}", p.display()),
            Self::Directory(p) => write!(f, "directory {}", p.display()),
        }
    }
}

/// Convert from a CLI string to Source.
impl From<&str> for Source {
    fn from(s: &str) -> Self {
        if let Ok(idx) = s.parse::<u32>() {
            return Self::Webcam(idx);
        }

        let path = PathBuf::from(s);
        if path.is_dir() {
            return Self::Directory(path);
        }

        if let Some(ext) = path.extension() {
            let ext = ext.to_string_lossy().to_lowercase();
            if matches!(
                ext.as_str(),
                "mp4" | "avi" | "mov" | "mkv" | "wmv" | "flv" | "webm" | "m4v" | "mpeg" | "mpg"
            ) {
                return Self::Video(path);
            }
        }

        Self::Image(path)
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<u32> for Source {
    fn from(idx: u32) -> Self {
        Self::Webcam(idx)
    }
}

/// A producer of frames.
pub trait FrameSource {
    /// Read the next frame.
    ///
    /// Returns `Ok(None)` at the end of the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be captured or decoded.
    fn read(&mut self) -> Result<Option<Frame>>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read(&mut self) -> Result<Option<Frame>> {
        (**self).read()
    }
}

/// Open a frame source.
///
/// # Errors
///
/// Returns an error if the device or file cannot be opened, or the source
/// needs a feature this build lacks.
pub fn open_source(source: &Source) -> Result<Box<dyn FrameSource>> {
    match source {
        Source::Image(path) => Ok(Box::new(ImageSequence::single(path)?)),
        Source::Directory(path) => Ok(Box::new(ImageSequence::from_dir(path)?)),
        #[cfg(feature = "webcam")]
        Source::Webcam(idx) => Ok(Box::new(CameraSource::open(*idx)?)),
        #[cfg(not(feature = "webcam"))]
        Source::Webcam(_) => Err(PoseError::FeatureNotEnabled(
            "Webcam capture requires 'webcam' feature".to_string(),
        )),
        #[cfg(feature = "video")]
        Source::Video(path) => Ok(Box::new(VideoSource::open(path)?)),
        #[cfg(not(feature = "video"))]
        Source::Video(_) => Err(PoseError::FeatureNotEnabled(
            "Video support requires 'video' feature".to_string(),
        )),
    }
}

// ================================================================================================
// Still images
// ================================================================================================

/// Still images read one after another.
#[derive(Debug, Clone)]
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageSequence {
    /// A sequence of explicit paths, read in the given order.
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths, next: 0 }
    }

    /// A sequence holding one image.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist.
    pub fn single(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PoseError::ImageError(format!(
                "Image not found: {}",
                path.display()
            )));
        }
        Ok(Self::new(vec![path.to_path_buf()]))
    }

    /// All images in a directory, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a readable directory.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(PoseError::ImageError(format!(
                "Not a directory: {}",
                dir.display()
            )));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| is_image_file(path))
            .collect();
        paths.sort();
        Ok(Self::new(paths))
    }

    /// Number of images in the sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the sequence holds no images.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequence {
    fn read(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        let index = self.next;
        self.next += 1;

        let pixels = image::open(path)
            .map_err(|e| PoseError::ImageError(format!("Failed to load {}: {e}", path.display())))?
            .to_rgb8();
        let timestamp = IMAGE_SEQUENCE_INTERVAL * u32::try_from(index).unwrap_or(u32::MAX);
        Ok(Some(Frame::new(pixels, ChannelOrder::Rgb, index, timestamp)))
    }
}

/// Check if a path is an image file based on extension.
fn is_image_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        let ext = ext.to_string_lossy().to_lowercase();
        matches!(ext.as_str(), "jpg" | "jpeg" | "png" | "bmp")
    })
}

// ================================================================================================
// Webcam
// ================================================================================================

#[cfg(feature = "webcam")]
pub use camera::CameraSource;

#[cfg(feature = "webcam")]
mod camera {
    use std::time::Instant;

    use nokhwa::Camera;
    use nokhwa::pixel_format::RgbFormat;
    use nokhwa::utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    };

    use super::FrameSource;
    use crate::error::{PoseError, Result};
    use crate::frame::{ChannelOrder, Frame};
    use crate::verbose;

    /// Requested capture width.
    pub const CAPTURE_WIDTH: u32 = 640;
    /// Requested capture height.
    pub const CAPTURE_HEIGHT: u32 = 480;
    /// Requested capture rate.
    pub const CAPTURE_FPS: u32 = 30;

    /// A webcam opened through the platform camera driver.
    ///
    /// The stream is stopped when the source is dropped.
    pub struct CameraSource {
        camera: Camera,
        index: usize,
        started: Instant,
    }

    impl CameraSource {
        /// Open device `idx` and start streaming.
        ///
        /// # Errors
        ///
        /// Returns an error if the device cannot be opened or started.
        pub fn open(idx: u32) -> Result<Self> {
            let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
                CameraFormat::new(
                    Resolution::new(CAPTURE_WIDTH, CAPTURE_HEIGHT),
                    FrameFormat::MJPEG,
                    CAPTURE_FPS,
                ),
            ));
            let mut camera = Camera::new(CameraIndex::Index(idx), requested).map_err(|e| {
                PoseError::CaptureError(format!("Failed to open webcam {idx}: {e}"))
            })?;
            camera.open_stream().map_err(|e| {
                PoseError::CaptureError(format!("Failed to start webcam {idx}: {e}"))
            })?;

            let format = camera.camera_format();
            verbose!(
                "Webcam {idx}: {}x{} @ {} fps",
                format.resolution().width(),
                format.resolution().height(),
                format.frame_rate()
            );

            Ok(Self {
                camera,
                index: 0,
                started: Instant::now(),
            })
        }
    }

    impl FrameSource for CameraSource {
        fn read(&mut self) -> Result<Option<Frame>> {
            let buffer = self
                .camera
                .frame()
                .map_err(|e| PoseError::CaptureError(format!("Failed to grab frame: {e}")))?;
            let timestamp = self.started.elapsed();
            let decoded = buffer
                .decode_image::<RgbFormat>()
                .map_err(|e| PoseError::CaptureError(format!("Failed to decode frame: {e}")))?;
            let (width, height) = (decoded.width(), decoded.height());

            let frame = Frame::from_raw(
                width,
                height,
                decoded.into_raw(),
                ChannelOrder::Rgb,
                self.index,
                timestamp,
            )?;
            self.index += 1;
            Ok(Some(frame))
        }
    }

    impl Drop for CameraSource {
        fn drop(&mut self) {
            let _ = self.camera.stop_stream();
        }
    }
}

// ================================================================================================
// Video files
// ================================================================================================

#[cfg(feature = "video")]
pub use video::VideoSource;

#[cfg(feature = "video")]
mod video {
    use std::path::Path;
    use std::time::Duration;

    use video_rs::decode::Decoder;

    use super::FrameSource;
    use crate::error::{PoseError, Result};
    use crate::frame::{ChannelOrder, Frame};

    /// A video file decoded to RGB frames.
    pub struct VideoSource {
        decoder: Decoder,
        index: usize,
    }

    impl VideoSource {
        /// Open a video file.
        ///
        /// # Errors
        ///
        /// Returns an error if the decoder cannot be created.
        pub fn open(path: &Path) -> Result<Self> {
            let decoder = Decoder::new(path)
                .map_err(|e| PoseError::VideoError(format!("Failed to create decoder: {e}")))?;
            Ok(Self { decoder, index: 0 })
        }
    }

    impl FrameSource for VideoSource {
        fn read(&mut self) -> Result<Option<Frame>> {
            let (ts, frame) = match self.decoder.decode() {
                Ok(decoded) => decoded,
                Err(video_rs::Error::DecodeExhausted | video_rs::Error::ReadExhausted) => {
                    return Ok(None);
                }
                Err(e) => return Err(PoseError::VideoError(format!("Failed to decode: {e}"))),
            };

            let shape = frame.shape();
            let height = u32::try_from(shape[0])
                .map_err(|_| PoseError::ImageError("Frame height exceeds u32::MAX".to_string()))?;
            let width = u32::try_from(shape[1])
                .map_err(|_| PoseError::ImageError("Frame width exceeds u32::MAX".to_string()))?;
            let data: Vec<u8> = frame.as_standard_layout().iter().copied().collect();
            let timestamp = Duration::try_from_secs_f64(ts.as_secs_f64()).unwrap_or_default();

            let frame = Frame::from_raw(width, height, data, ChannelOrder::Rgb, self.index, timestamp)?;
            self.index += 1;
            Ok(Some(frame))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_source_from_string() {
        assert_eq!(Source::from("0"), Source::Webcam(0));
        assert_eq!(Source::from("2"), Source::Webcam(2));
        assert!(matches!(Source::from("clip.MP4"), Source::Video(_)));
        assert!(matches!(Source::from("person.jpg"), Source::Image(_)));
        assert_eq!(Source::default(), Source::Webcam(0));
    }

    #[test]
    fn test_source_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = Source::from(dir.path().to_string_lossy().as_ref());
        assert!(matches!(source, Source::Directory(_)));
    }

    #[test]
    fn test_image_sequence_reads_sorted() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(4, 2, Rgb([1, 2, 3]))
            .save(dir.path().join("b.png"))
            .unwrap();
        RgbImage::from_pixel(6, 5, Rgb([9, 9, 9]))
            .save(dir.path().join("a.png"))
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();

        let mut seq = ImageSequence::from_dir(dir.path()).unwrap();
        assert_eq!(seq.len(), 2);

        let first = seq.read().unwrap().unwrap();
        assert_eq!((first.width(), first.height()), (6, 5));
        assert_eq!(first.index(), 0);
        assert_eq!(first.order(), ChannelOrder::Rgb);

        let second = seq.read().unwrap().unwrap();
        assert_eq!((second.width(), second.height()), (4, 2));
        assert!(second.timestamp() > first.timestamp());

        assert!(seq.read().unwrap().is_none());
    }

    #[test]
    fn test_missing_image_fails_to_open() {
        let result = open_source(&Source::Image(PathBuf::from("does/not/exist.png")));
        assert!(matches!(result, Err(PoseError::ImageError(_))));
    }

    #[test]
    fn test_unreadable_image_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        let mut seq = ImageSequence::single(&path).unwrap();
        assert!(seq.read().is_err());
    }
}
