// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Visualization tools for pose results.

use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbImage;

use crate::error::{PoseError, Result};

/// Color definitions.
pub mod color;

/// Pose skeleton connections.
pub mod skeleton;

#[cfg(feature = "visualize")]
pub mod viewer;

pub use color::Color;
pub use skeleton::{POSE_CONNECTIONS, SkeletonEdge};

#[cfg(feature = "visualize")]
pub use viewer::{ExitKey, Viewer};

/// Default size of the overlay window.
pub const OVERLAY_DISPLAY_SIZE: (u32, u32) = (800, 720);

/// Default size of the stick-figure windows.
pub const STICKMAN_DISPLAY_SIZE: (u32, u32) = (640, 480);

/// Something an annotated image can be shown on.
pub trait Surface {
    /// Show an image.
    ///
    /// Returns `false` once the user asked to stop (window closed or exit key
    /// pressed).
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be displayed.
    fn present(&mut self, image: &RgbImage) -> Result<bool>;
}

impl<S: Surface + ?Sized> Surface for Box<S> {
    fn present(&mut self, image: &RgbImage) -> Result<bool> {
        (**self).present(image)
    }
}

/// Resize an image to exactly `size` for display.
///
/// Returns a copy when the image already has that size. The result is only
/// meant for showing; drawing and landmark math use the original frame.
///
/// # Errors
///
/// Returns an error if the target size is zero or resizing fails.
pub fn fit_for_display(image: &RgbImage, size: (u32, u32)) -> Result<RgbImage> {
    let (dst_w, dst_h) = size;
    if dst_w == 0 || dst_h == 0 {
        return Err(PoseError::VisualizerError(format!(
            "Invalid display size {dst_w}x{dst_h}"
        )));
    }
    if image.dimensions() == size {
        return Ok(image.clone());
    }

    let src = Image::from_vec_u8(
        image.width(),
        image.height(),
        image.as_raw().clone(),
        PixelType::U8x3,
    )
    .map_err(|e| PoseError::VisualizerError(format!("Failed to wrap frame: {e}")))?;
    let mut dst = Image::new(dst_w, dst_h, PixelType::U8x3);

    let mut resizer = Resizer::new();
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
    resizer
        .resize(&src, &mut dst, Some(&options))
        .map_err(|e| PoseError::VisualizerError(format!("Failed to resize frame: {e}")))?;

    RgbImage::from_raw(dst_w, dst_h, dst.into_vec())
        .ok_or_else(|| PoseError::VisualizerError("Failed to create display buffer".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_fit_for_display_size() {
        let image = RgbImage::from_pixel(640, 480, Rgb([200, 10, 10]));
        let shown = fit_for_display(&image, OVERLAY_DISPLAY_SIZE).unwrap();
        assert_eq!(shown.dimensions(), (800, 720));
        assert_eq!(image.dimensions(), (640, 480));
    }

    #[test]
    fn test_fit_for_display_same_size_is_copy() {
        let image = RgbImage::from_pixel(640, 480, Rgb([1, 2, 3]));
        let shown = fit_for_display(&image, STICKMAN_DISPLAY_SIZE).unwrap();
        assert_eq!(shown, image);
    }

    #[test]
    fn test_fit_for_display_rejects_zero() {
        let image = RgbImage::new(4, 4);
        assert!(fit_for_display(&image, (0, 10)).is_err());
    }
}
