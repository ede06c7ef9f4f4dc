// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use image::Rgb;

/// Color type for visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    /// Red color.
    pub const RED: Self = Self(255, 0, 0);
    /// White color.
    pub const WHITE: Self = Self(255, 255, 255);
    /// Skeleton connection lines.
    pub const CONNECTION: Self = Self(224, 224, 224);
    /// Landmark dots.
    pub const LANDMARK: Self = Self::RED;
    /// Landmark dot outline.
    pub const LANDMARK_RING: Self = Self::WHITE;
    /// Stick figure limbs and head.
    pub const STICK: Self = Self(255, 100, 0);

    /// Pack as `0x00RRGGBB`.
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        ((self.0 as u32) << 16) | ((self.1 as u32) << 8) | self.2 as u32
    }
}

impl From<Color> for Rgb<u8> {
    fn from(c: Color) -> Self {
        Self([c.0, c.1, c.2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing() {
        assert_eq!(Color::STICK.to_u32(), 0x00FF_6400);
        assert_eq!(Rgb::from(Color::CONNECTION), Rgb([224, 224, 224]));
    }
}
