#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// RGBA color of a marker mesh.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from_hex(&value).ok_or_else(|| format!("invalid color '{value}'"))
    }
}

impl From<Color> for String {
    fn from(val: Color) -> Self {
        val.to_hex()
    }
}

impl Color {
    /// Transparent color: `#00000000`
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    /// Red color: `#FF0000FF`
    pub const RED: Color = Color::rgba(255, 0, 0, 255);
    /// Green color: `#00FF00FF`
    pub const GREEN: Color = Color::rgba(0, 255, 0, 255);
    /// Blue color: `#0000FFFF`
    pub const BLUE: Color = Color::rgba(0, 0, 255, 255);
    /// White color: `#FFFFFFFF`
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    /// Black color: `#000000FF`
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);

    /// Constructs color from its RGBA channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Converts the color into f32 array as stored in mesh vertices.
    pub fn to_f32_array(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }

    /// Converts the color into HEX8 string: `#RRGGBBAA`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }

    /// Parses a color from the hex string. Hex string can be either HEX6 (`#RRGGBB`) or HEX8 (`#RRGGBBAA`).
    pub fn try_from_hex(hex_string: &str) -> Option<Self> {
        if !hex_string.is_ascii()
            || hex_string.len() != 7 && hex_string.len() != 9
            || !hex_string.starts_with('#')
        {
            return None;
        }

        let r = u8::from_str_radix(&hex_string[1..3], 16).ok()?;
        let g = u8::from_str_radix(&hex_string[3..5], 16).ok()?;
        let b = u8::from_str_radix(&hex_string[5..7], 16).ok()?;
        let a = if hex_string.len() == 9 {
            u8::from_str_radix(&hex_string[7..9], 16).ok()?
        } else {
            255
        };

        Some(Self { r, g, b, a })
    }

    /// Returns true if the color is fully transparent (`a == 0`).
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Linear interpolation between `self` (at `k = 0`) and `other` (at `k = 1`), channel by channel.
    pub fn lerp(&self, other: Color, k: f64) -> Color {
        let k = k.clamp(0.0, 1.0);
        let channel = |from: u8, to: u8| (from as f64 + (to as f64 - from as f64) * k).round() as u8;
        Color {
            r: channel(self.r, other.r),
            g: channel(self.g, other.g),
            b: channel(self.b, other.b),
            a: channel(self.a, other.a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        let hex = "#FF1000AA";
        let color = Color::try_from_hex(hex).unwrap();
        assert_eq!(&color.to_hex(), hex);
        assert_eq!(Color::try_from_hex("#00ff00"), Some(Color::GREEN));

        assert_eq!(Color::try_from_hex("red"), None);
        assert_eq!(Color::try_from_hex("#GG0000"), None);
        assert_eq!(Color::try_from_hex("#FF00"), None);
    }

    #[test]
    fn lerp_channels() {
        assert_eq!(Color::BLACK.lerp(Color::WHITE, 0.0), Color::BLACK);
        assert_eq!(Color::BLACK.lerp(Color::WHITE, 1.0), Color::WHITE);
        assert_eq!(
            Color::BLACK.lerp(Color::WHITE, 0.5),
            Color::rgba(128, 128, 128, 255)
        );
        assert_eq!(Color::RED.lerp(Color::BLUE, 2.0), Color::BLUE);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serialized_as_hex_string() {
        let json = serde_json::to_string(&Color::rgba(255, 16, 0, 170)).unwrap();
        assert_eq!(json, r##""#FF1000AA""##);

        let parsed: Color = serde_json::from_str(r##""#00ff00""##).unwrap();
        assert_eq!(parsed, Color::GREEN);

        assert!(serde_json::from_str::<Color>(r#""red""#).is_err());
        assert!(serde_json::from_str::<Color>("255").is_err());
    }
}
