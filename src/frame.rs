// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Captured frames and channel-order conversion.

use std::time::Duration;

use image::RgbImage;

use crate::error::{PoseError, Result};

/// Byte order of the three color channels in a [`Frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    /// Red, green, blue.
    #[default]
    Rgb,
    /// Blue, green, red.
    Bgr,
}

/// One captured frame.
///
/// The pixel buffer is an `RgbImage` used as a plain 3-channel container; the
/// actual channel layout is given by [`Frame::order`].
#[derive(Debug, Clone)]
pub struct Frame {
    pixels: RgbImage,
    order: ChannelOrder,
    index: usize,
    timestamp: Duration,
}

impl Frame {
    /// Create a frame from a pixel buffer in the given channel order.
    #[must_use]
    pub const fn new(
        pixels: RgbImage,
        order: ChannelOrder,
        index: usize,
        timestamp: Duration,
    ) -> Self {
        Self {
            pixels,
            order,
            index,
            timestamp,
        }
    }

    /// Create a frame from raw interleaved bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is not `width * height * 3` bytes long.
    pub fn from_raw(
        width: u32,
        height: u32,
        data: Vec<u8>,
        order: ChannelOrder,
        index: usize,
        timestamp: Duration,
    ) -> Result<Self> {
        let len = data.len();
        let pixels = RgbImage::from_raw(width, height, data).ok_or_else(|| {
            PoseError::ImageError(format!(
                "Frame buffer of {len} bytes does not match {width}x{height}x3"
            ))
        })?;
        Ok(Self::new(pixels, order, index, timestamp))
    }

    /// Frame width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Frame height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Channel order of the pixel buffer.
    #[must_use]
    pub const fn order(&self) -> ChannelOrder {
        self.order
    }

    /// Zero-based position of the frame in its source.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Capture time relative to the start of the source.
    #[must_use]
    pub const fn timestamp(&self) -> Duration {
        self.timestamp
    }

    /// Borrow the raw pixel buffer (layout given by [`Frame::order`]).
    #[must_use]
    pub const fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Return a copy of this frame with its channels in `order`.
    ///
    /// The frame is not modified and the result always has the same
    /// dimensions.
    #[must_use]
    pub fn converted(&self, order: ChannelOrder) -> Self {
        let pixels = if order == self.order {
            self.pixels.clone()
        } else {
            swap_red_blue(&self.pixels)
        };
        Self {
            pixels,
            order,
            index: self.index,
            timestamp: self.timestamp,
        }
    }

    /// Copy of the pixels in true RGB order, ready for drawing and display.
    #[must_use]
    pub fn to_rgb_image(&self) -> RgbImage {
        match self.order {
            ChannelOrder::Rgb => self.pixels.clone(),
            ChannelOrder::Bgr => swap_red_blue(&self.pixels),
        }
    }
}

/// Swap the first and third channel of every pixel.
fn swap_red_blue(image: &RgbImage) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0.swap(0, 2);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn bgr_frame() -> Frame {
        let mut pixels = RgbImage::new(4, 3);
        pixels.put_pixel(1, 2, Rgb([10, 20, 30]));
        Frame::new(pixels, ChannelOrder::Bgr, 7, Duration::from_millis(33))
    }

    #[test]
    fn test_conversion_preserves_shape() {
        let frame = bgr_frame();
        let rgb = frame.converted(ChannelOrder::Rgb);

        assert_eq!((rgb.width(), rgb.height()), (4, 3));
        assert_eq!(rgb.order(), ChannelOrder::Rgb);
        assert_eq!(rgb.index(), 7);
        assert_eq!(rgb.pixels().get_pixel(1, 2), &Rgb([30, 20, 10]));
    }

    #[test]
    fn test_conversion_leaves_source_untouched() {
        let frame = bgr_frame();
        let _ = frame.converted(ChannelOrder::Rgb);
        assert_eq!(frame.pixels().get_pixel(1, 2), &Rgb([10, 20, 30]));
        assert_eq!(frame.order(), ChannelOrder::Bgr);
    }

    #[test]
    fn test_conversion_round_trip() {
        let frame = bgr_frame();
        let back = frame
            .converted(ChannelOrder::Rgb)
            .converted(ChannelOrder::Bgr);
        assert_eq!(back.pixels(), frame.pixels());
    }

    #[test]
    fn test_same_order_is_identity() {
        let frame = bgr_frame();
        assert_eq!(frame.converted(ChannelOrder::Bgr).pixels(), frame.pixels());
    }

    #[test]
    fn test_from_raw_rejects_bad_length() {
        let result = Frame::from_raw(
            2,
            2,
            vec![0; 5],
            ChannelOrder::Rgb,
            0,
            Duration::ZERO,
        );
        assert!(matches!(result, Err(PoseError::ImageError(_))));
    }
}
