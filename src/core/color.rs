//! RGB colour values and hex parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Linear RGB triple with channels in `[0, 1]`.
///
/// Serialized as a `#rrggbb` hex string so it reads naturally in config files.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Per-channel linear interpolation, `t` clamped to `[0, 1]`.
    #[inline]
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        Rgb::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn from_array(c: [f32; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }

    pub fn to_u8(self) -> [u8; 3] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_u8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Parses `text`, substituting `fallback` (with a warning) when it is
    /// not a valid hex colour.
    pub fn parse_or(text: &str, fallback: Rgb) -> Rgb {
        text.parse().unwrap_or_else(|err: ColorParseError| {
            warn!("{err}, using {}", fallback.to_hex());
            fallback
        })
    }

    /// Lenient field deserializer for config structs: a malformed string
    /// yields `fallback` instead of failing the whole document.
    pub fn deserialize_or<'de, D>(deserializer: D, fallback: Rgb) -> Result<Rgb, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse_or(&text, fallback))
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::from_u8(0x00, 0xcc, 0xff)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorParseError {
    pub input: String,
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid hex color {:?}", self.input)
    }
}

impl std::error::Error for ColorParseError {}

impl FromStr for Rgb {
    type Err = ColorParseError;

    /// Accepts `#rrggbb`, `rrggbb`, `#rgb` and `rgb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError {
            input: s.to_string(),
        };
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| err());
        match hex.len() {
            6 => Ok(Rgb::from_u8(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                // #abc expands to #aabbcc
                let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Rgb::from_u8(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn parses_long_and_short_hex() {
        let c: Rgb = "#ff8000".parse().unwrap();
        assert_eq!(c.to_u8(), [255, 128, 0]);
        let short: Rgb = "0f0".parse().unwrap();
        assert_eq!(short.to_u8(), [0, 255, 0]);
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#gg0000".parse::<Rgb>().is_err());
        assert!("".parse::<Rgb>().is_err());
        assert!("#ffé".parse::<Rgb>().is_err());
    }

    #[test]
    fn lerp_endpoints_and_midpoint() {
        let a = Rgb::BLACK;
        let b = Rgb::WHITE;
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_abs_diff_eq!(a.lerp(b, 0.25).g, 0.25, epsilon = 1e-6);
        assert_eq!(a.lerp(b, 7.0), b);
    }

    #[test]
    fn parse_or_substitutes_fallback() {
        assert_eq!(Rgb::parse_or("#zzzzzz", Rgb::WHITE), Rgb::WHITE);
        assert_eq!(Rgb::parse_or("#000000", Rgb::WHITE), Rgb::BLACK);
    }

    #[test]
    fn hex_is_stable_through_to_hex() {
        let c: Rgb = "#00ccff".parse().unwrap();
        assert_eq!(c.to_hex(), "#00ccff");
    }
}
