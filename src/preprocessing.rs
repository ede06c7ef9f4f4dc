// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Region-of-interest cropping and tensor preparation for the landmark model.
//!
//! The landmark network sees a square, rotated crop of the frame. This module
//! computes that crop, warps it to the network input size, converts it to a
//! normalized tensor and maps network outputs back into frame coordinates.

#![allow(
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::suboptimal_flops
)]

use std::f32::consts::{FRAC_PI_2, PI};

use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use ndarray::Array4;

use crate::error::{PoseError, Result};

// ================================================================================================
// Constants
// ================================================================================================

/// Side length of the square landmark model input.
pub const INPUT_SIZE: u32 = 256;

/// Enlargement applied to the alignment box.
pub const ROI_SCALE: f32 = 1.25;

/// Reciprocal of 255 for normalization.
const INV_255: f32 = 1.0 / 255.0;

// ================================================================================================
// Types
// ================================================================================================

/// Memory layout of the model input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TensorLayout {
    /// `[1, H, W, 3]`
    #[default]
    Nhwc,
    /// `[1, 3, H, W]`
    Nchw,
}

/// A rotated square region of a frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Roi {
    /// Center x.
    pub cx: f32,
    /// Center y.
    pub cy: f32,
    /// Side length.
    pub size: f32,
    /// Rotation in radians, applied around the center.
    pub rotation: f32,
}

impl Roi {
    /// The whole frame, centered, unrotated and padded to a square.
    #[must_use]
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self {
            cx: width as f32 / 2.0,
            cy: height as f32 / 2.0,
            size: width.max(height) as f32,
            rotation: 0.0,
        }
    }

    /// Region aligned on the hip center and the body scale point.
    ///
    /// The box is centered on `center`, spans twice the distance to `scale`
    /// enlarged by [`ROI_SCALE`], and is rotated so that the body axis points
    /// up in the crop.
    #[must_use]
    pub fn from_alignment(center: (f32, f32), scale: (f32, f32)) -> Self {
        let dx = scale.0 - center.0;
        let dy = scale.1 - center.1;
        let size = 2.0 * dx.hypot(dy) * ROI_SCALE;
        let rotation = normalize_radians(FRAC_PI_2 - (-dy).atan2(dx));
        Self {
            cx: center.0,
            cy: center.1,
            size,
            rotation,
        }
    }

    /// Whether the region has a usable extent.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.size.is_finite() && self.size > 1.0 && self.cx.is_finite() && self.cy.is_finite()
    }

    /// Affine matrix mapping crop pixels to frame pixels, row-major 3×3.
    #[must_use]
    pub fn source_from_crop(&self) -> [f32; 9] {
        let (s, c) = self.rotation.sin_cos();
        let k = self.size / INPUT_SIZE as f32;
        let half = self.size / 2.0;
        [
            k * c,
            -k * s,
            self.cx - half * (c - s),
            k * s,
            k * c,
            self.cy - half * (s + c),
            0.0,
            0.0,
            1.0,
        ]
    }

    /// Map a point given in crop pixels back to frame pixels.
    #[must_use]
    pub fn to_frame(&self, x: f32, y: f32) -> (f32, f32) {
        let u = x / INPUT_SIZE as f32 - 0.5;
        let v = y / INPUT_SIZE as f32 - 0.5;
        let (s, c) = self.rotation.sin_cos();
        (
            self.cx + self.size * (u * c - v * s),
            self.cy + self.size * (u * s + v * c),
        )
    }
}

/// Wrap an angle into `[-PI, PI)`.
#[must_use]
pub fn normalize_radians(angle: f32) -> f32 {
    angle - 2.0 * PI * ((angle + PI) / (2.0 * PI)).floor()
}

/// Logistic function.
#[inline]
#[must_use]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

// ================================================================================================
// Cropping
// ================================================================================================

/// Warp the region of `image` into an `INPUT_SIZE`² crop.
///
/// Pixels outside the frame are filled with black.
///
/// # Errors
///
/// Returns an error if the region is degenerate.
pub fn crop_roi(image: &RgbImage, roi: &Roi) -> Result<RgbImage> {
    if !roi.is_valid() {
        return Err(PoseError::ImageError(format!(
            "Degenerate region of interest: {roi:?}"
        )));
    }
    let projection = Projection::from_matrix(roi.source_from_crop())
        .ok_or_else(|| PoseError::ImageError("Region transform is not invertible".to_string()))?
        .invert();
    let mut out = RgbImage::new(INPUT_SIZE, INPUT_SIZE);
    warp_into(
        image,
        &projection,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut out,
    );
    Ok(out)
}

/// Convert an RGB image to a normalized `[0, 1]` tensor with a batch of one.
#[must_use]
pub fn image_to_tensor(image: &RgbImage, layout: TensorLayout) -> Array4<f32> {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let mut tensor = match layout {
        TensorLayout::Nhwc => Array4::<f32>::zeros((1, h, w, 3)),
        TensorLayout::Nchw => Array4::<f32>::zeros((1, 3, h, w)),
    };
    for (x, y, pixel) in image.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for (ch, &value) in pixel.0.iter().enumerate() {
            let v = f32::from(value) * INV_255;
            match layout {
                TensorLayout::Nhwc => tensor[[0, y, x, ch]] = v,
                TensorLayout::Nchw => tensor[[0, ch, y, x]] = v,
            }
        }
    }
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    #[test]
    fn test_full_frame_roi() {
        let roi = Roi::full_frame(640, 480);
        assert!((roi.cx - 320.0).abs() < EPS);
        assert!((roi.cy - 240.0).abs() < EPS);
        assert!((roi.size - 640.0).abs() < EPS);
        assert!(roi.rotation.abs() < EPS);
    }

    #[test]
    fn test_upright_alignment_has_no_rotation() {
        let roi = Roi::from_alignment((100.0, 200.0), (100.0, 120.0));
        assert!(roi.rotation.abs() < EPS);
        assert!((roi.size - 2.0 * 80.0 * ROI_SCALE).abs() < EPS);
    }

    #[test]
    fn test_sideways_alignment_rotates() {
        let roi = Roi::from_alignment((100.0, 100.0), (150.0, 100.0));
        assert!((roi.rotation - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_crop_corners_map_to_roi_corners() {
        let roi = Roi::full_frame(512, 512);
        let (x0, y0) = roi.to_frame(0.0, 0.0);
        let (x1, y1) = roi.to_frame(256.0, 256.0);
        assert!(x0.abs() < EPS && y0.abs() < EPS);
        assert!((x1 - 512.0).abs() < EPS && (y1 - 512.0).abs() < EPS);
    }

    #[test]
    fn test_matrix_agrees_with_to_frame() {
        let roi = Roi {
            cx: 210.0,
            cy: 150.0,
            size: 180.0,
            rotation: 0.4,
        };
        let m = roi.source_from_crop();
        for (x, y) in [(0.0, 0.0), (64.0, 200.0), (255.0, 17.0)] {
            let (fx, fy) = roi.to_frame(x, y);
            assert!((m[0] * x + m[1] * y + m[2] - fx).abs() < EPS);
            assert!((m[3] * x + m[4] * y + m[5] - fy).abs() < EPS);
        }
    }

    #[test]
    fn test_crop_uniform_image() {
        let image = RgbImage::from_pixel(300, 300, Rgb([40, 80, 120]));
        let roi = Roi {
            cx: 150.0,
            cy: 150.0,
            size: 100.0,
            rotation: 0.3,
        };
        let crop = crop_roi(&image, &roi).unwrap();
        assert_eq!(crop.dimensions(), (INPUT_SIZE, INPUT_SIZE));
        let center = crop.get_pixel(128, 128).0;
        for (got, want) in center.iter().zip([40u8, 80, 120]) {
            assert!(got.abs_diff(want) <= 1);
        }
    }

    #[test]
    fn test_crop_outside_frame_is_black() {
        let image = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        let roi = Roi {
            cx: 1000.0,
            cy: 1000.0,
            size: 50.0,
            rotation: 0.0,
        };
        let crop = crop_roi(&image, &roi).unwrap();
        assert_eq!(crop.get_pixel(128, 128), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_degenerate_roi_is_rejected() {
        let image = RgbImage::new(10, 10);
        let roi = Roi::from_alignment((5.0, 5.0), (5.0, 5.0));
        assert!(crop_roi(&image, &roi).is_err());
    }

    #[test]
    fn test_image_to_tensor_layouts() {
        let mut image = RgbImage::new(4, 2);
        image.put_pixel(3, 1, Rgb([255, 0, 51]));

        let nhwc = image_to_tensor(&image, TensorLayout::Nhwc);
        assert_eq!(nhwc.shape(), &[1, 2, 4, 3]);
        assert!((nhwc[[0, 1, 3, 0]] - 1.0).abs() < 1e-6);
        assert!((nhwc[[0, 1, 3, 2]] - 0.2).abs() < 1e-6);

        let nchw = image_to_tensor(&image, TensorLayout::Nchw);
        assert_eq!(nchw.shape(), &[1, 3, 2, 4]);
        assert!((nchw[[0, 0, 1, 3]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sigmoid_and_angle_wrap() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(10.0) > 0.99);
        assert!((normalize_radians(2.5 * PI) - FRAC_PI_2).abs() < EPS);
        assert!((normalize_radians(0.5) - 0.5).abs() < 1e-6);
    }
}
