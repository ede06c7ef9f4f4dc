// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Drawing of pose overlays and stick figures.

#![allow(clippy::cast_possible_truncation)]

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

use crate::geometry::{PixelPoint, StickFigure};
use crate::landmark::LandmarkSet;
use crate::visualizer::{Color, POSE_CONNECTIONS};

/// Minimum visibility for a landmark or connection to be drawn.
pub const VISIBILITY_THRESHOLD: f32 = 0.5;

/// Width of skeleton connection lines in pixels.
pub const CONNECTION_THICKNESS: f32 = 2.0;

/// Radius of landmark dots in pixels.
pub const LANDMARK_RADIUS: i32 = 3;

/// Width of stick-figure limbs in pixels.
pub const STICK_THICKNESS: f32 = 15.0;

/// Draw the pose skeleton onto a full-resolution frame.
///
/// Connections are drawn first, then landmark dots on top. Landmarks below
/// [`VISIBILITY_THRESHOLD`] and edges touching them are skipped.
pub fn draw_landmarks(image: &mut RgbImage, landmarks: &LandmarkSet) {
    let (w, h) = image.dimensions();
    let px = |i: usize| {
        let (x, y) = landmarks.as_slice()[i].to_pixel(w, h);
        PixelPoint::new(x, y)
    };

    for (a, b) in POSE_CONNECTIONS {
        if landmarks[a].is_visible(VISIBILITY_THRESHOLD)
            && landmarks[b].is_visible(VISIBILITY_THRESHOLD)
        {
            draw_thick_line(
                image,
                px(a.index()),
                px(b.index()),
                CONNECTION_THICKNESS,
                Color::CONNECTION.into(),
            );
        }
    }

    for (i, lm) in landmarks.iter().enumerate() {
        if !lm.is_visible(VISIBILITY_THRESHOLD) {
            continue;
        }
        let center = px(i).to_i32();
        draw_filled_circle_mut(image, center, LANDMARK_RADIUS + 1, Color::LANDMARK_RING.into());
        draw_filled_circle_mut(image, center, LANDMARK_RADIUS, Color::LANDMARK.into());
    }
}

/// Draw a line of the given width with round caps.
pub fn draw_thick_line(
    image: &mut RgbImage,
    a: PixelPoint,
    b: PixelPoint,
    thickness: f32,
    color: Rgb<u8>,
) {
    let (ax, ay) = a.to_i32();
    let (bx, by) = b.to_i32();

    if thickness <= 1.0 {
        draw_line_segment_mut(image, (ax as f32, ay as f32), (bx as f32, by as f32), color);
        return;
    }

    let half = thickness / 2.0;
    let radius = half as i32;
    draw_filled_circle_mut(image, (ax, ay), radius, color);
    draw_filled_circle_mut(image, (bx, by), radius, color);

    let (dx, dy) = ((bx - ax) as f32, (by - ay) as f32);
    let len = dx.hypot(dy);
    if len < 1.0 {
        return;
    }
    let nx = (-dy / len * half).round() as i32;
    let ny = (dx / len * half).round() as i32;
    if nx == 0 && ny == 0 {
        draw_line_segment_mut(image, (ax as f32, ay as f32), (bx as f32, by as f32), color);
        return;
    }

    let poly = [
        Point::new(ax + nx, ay + ny),
        Point::new(bx + nx, by + ny),
        Point::new(bx - nx, by - ny),
        Point::new(ax - nx, ay - ny),
    ];
    draw_polygon_mut(image, &poly, color);
}

/// Draw a stick figure: nine limb segments and a filled head circle.
///
/// A zero head radius still draws a single point.
pub fn draw_stick_figure(image: &mut RgbImage, figure: &StickFigure) {
    let color: Rgb<u8> = Color::STICK.into();
    for &(a, b) in &figure.segments {
        draw_thick_line(image, a, b, STICK_THICKNESS, color);
    }
    draw_filled_circle_mut(
        image,
        figure.head_center.to_i32(),
        figure.head_radius as i32,
        color,
    );
}

/// A white canvas of the given size.
#[must_use]
pub fn blank_canvas(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Color::WHITE.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{LANDMARK_COUNT, Landmark, PoseLandmark};

    fn set_with(points: &[(PoseLandmark, f32, f32, f32)]) -> LandmarkSet {
        let mut raw = [Landmark::default(); LANDMARK_COUNT];
        for &(lm, x, y, vis) in points {
            raw[lm.index()] = Landmark::new(x, y, 0.0, vis);
        }
        LandmarkSet::new(raw)
    }

    #[test]
    fn test_draws_visible_landmarks_only() {
        let mut image = RgbImage::new(100, 100);
        let set = set_with(&[
            (PoseLandmark::Nose, 0.2, 0.2, 0.9),
            (PoseLandmark::LeftHip, 0.8, 0.8, 0.1),
        ]);
        draw_landmarks(&mut image, &set);

        assert_eq!(image.get_pixel(20, 20), &Rgb::from(Color::LANDMARK));
        assert_eq!(image.get_pixel(80, 80), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_connection_drawn_between_visible_pair() {
        let mut image = RgbImage::new(100, 100);
        let set = set_with(&[
            (PoseLandmark::LeftShoulder, 0.1, 0.5, 0.9),
            (PoseLandmark::RightShoulder, 0.9, 0.5, 0.9),
        ]);
        draw_landmarks(&mut image, &set);

        assert_eq!(image.get_pixel(50, 50), &Rgb::from(Color::CONNECTION));
    }

    #[test]
    fn test_connection_skipped_when_one_end_hidden() {
        let mut image = RgbImage::new(100, 100);
        let set = set_with(&[
            (PoseLandmark::LeftShoulder, 0.1, 0.5, 0.9),
            (PoseLandmark::RightShoulder, 0.9, 0.5, 0.2),
        ]);
        draw_landmarks(&mut image, &set);

        assert_eq!(image.get_pixel(50, 50), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_stick_figure_on_canvas() {
        let set = set_with(&[
            (PoseLandmark::LeftShoulder, 0.4, 0.3, 1.0),
            (PoseLandmark::RightShoulder, 0.6, 0.3, 1.0),
            (PoseLandmark::LeftHip, 0.45, 0.6, 1.0),
            (PoseLandmark::RightHip, 0.55, 0.6, 1.0),
        ]);
        let figure = StickFigure::from_landmarks(&set, 640, 480);
        let mut canvas = blank_canvas(640, 480);
        draw_stick_figure(&mut canvas, &figure);

        let (hx, hy) = figure.head_center.to_i32();
        let head = canvas.get_pixel(hx as u32, hy as u32);
        assert_eq!(head, &Rgb::from(Color::STICK));
        assert_eq!(canvas.get_pixel(635, 475), &Rgb::from(Color::WHITE));
        // Torso runs from neck (320, 144) to hip (320, 288).
        assert_eq!(canvas.get_pixel(320, 200), &Rgb::from(Color::STICK));
    }

    #[test]
    fn test_zero_radius_does_not_panic() {
        let set = set_with(&[
            (PoseLandmark::LeftShoulder, 0.5, 0.5, 1.0),
            (PoseLandmark::RightShoulder, 0.5, 0.5, 1.0),
        ]);
        let figure = StickFigure::from_landmarks(&set, 640, 480);
        assert!(figure.head_radius.abs() < f32::EPSILON);

        let mut canvas = blank_canvas(640, 480);
        draw_stick_figure(&mut canvas, &figure);
    }

    #[test]
    fn test_off_canvas_points_do_not_panic() {
        let mut canvas = blank_canvas(50, 50);
        draw_thick_line(
            &mut canvas,
            PixelPoint::new(-500.0, -20.0),
            PixelPoint::new(900.0, 4000.0),
            STICK_THICKNESS,
            Color::STICK.into(),
        );
        draw_thick_line(
            &mut canvas,
            PixelPoint::new(10.0, 10.0),
            PixelPoint::new(10.0, 10.0),
            CONNECTION_THICKNESS,
            Color::CONNECTION.into(),
        );
    }
}
