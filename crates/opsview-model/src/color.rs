//! RGBA color value with the brighten/darken transforms used for widget
//! press feedback.

use serde::{Deserialize, Serialize};

const SCALE_FACTOR: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0, 255);
    pub const GREEN: Color = Color::new(0, 255, 0, 255);
    pub const BLUE: Color = Color::new(0, 0, 255, 255);
    pub const YELLOW: Color = Color::new(255, 255, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Lighter shade of this color; alpha is preserved. Fully black channels
    /// are seeded with a small value so repeated calls still brighten.
    pub fn brighter(self) -> Self {
        let lift = |c: u8| -> u8 {
            if c == 0 {
                3
            } else {
                ((c as f32 / SCALE_FACTOR).min(255.0)) as u8
            }
        };
        Self::new(lift(self.r), lift(self.g), lift(self.b), self.a)
    }

    /// Darker shade of this color; alpha is preserved.
    pub fn darker(self) -> Self {
        let drop = |c: u8| (c as f32 * SCALE_FACTOR) as u8;
        Self::new(drop(self.r), drop(self.g), drop(self.b), self.a)
    }

    /// Look up one of the small set of well-known color names.
    pub fn for_name(name: &str) -> Option<Color> {
        match name {
            "black" => Some(Self::BLACK),
            "white" => Some(Self::WHITE),
            "red" => Some(Self::RED),
            "green" => Some(Self::GREEN),
            "blue" => Some(Self::BLUE),
            "yellow" => Some(Self::YELLOW),
            _ => None,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_rendering() {
        assert_eq!(Color::new(212, 4, 0, 255).to_string(), "rgba(212,4,0,255)");
    }

    #[test]
    fn test_brighter_darker_round() {
        let c = Color::new(140, 70, 35, 200);
        let b = c.brighter();
        assert!(b.r > c.r && b.g > c.g && b.b > c.b);
        assert_eq!(b.a, 200);

        let d = c.darker();
        assert_eq!(d, Color::new(97, 48, 24, 200));
    }

    #[test]
    fn test_brighter_escapes_black() {
        let b = Color::BLACK.brighter();
        assert!(b.r > 0 && b.g > 0 && b.b > 0);
    }

    #[test]
    fn test_named_lookup() {
        assert_eq!(Color::for_name("yellow"), Some(Color::YELLOW));
        assert_eq!(Color::for_name("chartreuse"), None);
    }
}
