// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Window output for annotated frames.

use image::RgbImage;
use minifb::{Key, Window, WindowOptions};

use super::Surface;
use super::color::Color;
use crate::error::{PoseError, Result};

/// Key that closes a pipeline window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitKey {
    /// The Escape key.
    #[default]
    Escape,
    /// The `q` key.
    Q,
}

impl ExitKey {
    const fn key(self) -> Key {
        match self {
            Self::Escape => Key::Escape,
            Self::Q => Key::Q,
        }
    }
}

/// A simple image viewer using minifb.
pub struct Viewer {
    window: Window,
    exit_key: ExitKey,
    width: usize,
    height: usize,
    buffer: Vec<u32>,
}

impl Viewer {
    /// Create a new viewer window.
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be created.
    pub fn new(title: &str, size: (u32, u32), exit_key: ExitKey) -> Result<Self> {
        let (width, height) = (size.0 as usize, size.1 as usize);
        let mut window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| PoseError::VisualizerError(format!("Failed to create window: {e}")))?;

        window.set_target_fps(60);

        Ok(Self {
            window,
            exit_key,
            width,
            height,
            buffer: Vec::new(),
        })
    }

    /// Whether the window is open and the exit key is up.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(self.exit_key.key())
    }
}

impl Surface for Viewer {
    fn present(&mut self, image: &RgbImage) -> Result<bool> {
        if !self.is_active() {
            return Ok(false);
        }

        let (img_width, img_height) = (image.width() as usize, image.height() as usize);
        self.buffer.clear();
        self.buffer.extend(image.pixels().map(|p| {
            let [r, g, b] = p.0;
            Color(r, g, b).to_u32()
        }));
        self.width = img_width;
        self.height = img_height;

        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .map_err(|e| PoseError::VisualizerError(format!("Failed to update window: {e}")))?;

        Ok(self.is_active())
    }
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("exit_key", &self.exit_key)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
