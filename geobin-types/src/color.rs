use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An 8-bit RGB color. Serializes as a `[r, g, b]` array, the form map
/// renderers accept for fill and line colors.
///
/// # Examples
///
/// ```
/// use geobin_types::color::Rgb;
///
/// let c: Rgb = "#24BFF2".parse().unwrap();
/// assert_eq!(c, Rgb::new(0x24, 0xbf, 0xf2));
/// assert_eq!("orange".parse::<Rgb>().unwrap(), Rgb::new(255, 165, 0));
/// assert_eq!(c.to_string(), "#24bff2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`, `rrggbb` or the short `#rgb` form.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::new(r, g, b))
            }
            3 => {
                let mut channels = [0u8; 3];
                for (slot, ch) in channels.iter_mut().zip(hex.chars()) {
                    let v = ch.to_digit(16)? as u8;
                    *slot = v * 17;
                }
                Some(Self::new(channels[0], channels[1], channels[2]))
            }
            _ => None,
        }
    }

    /// Look up a CSS color name (case-insensitive). Covers the names used by
    /// the built-in schemes and map styles.
    pub fn from_name(name: &str) -> Option<Self> {
        let rgb = match name.to_ascii_lowercase().as_str() {
            "black" => (0, 0, 0),
            "white" => (255, 255, 255),
            "gray" | "grey" => (128, 128, 128),
            "red" | "r" => (255, 0, 0),
            "green" | "g" => (0, 128, 0),
            "blue" | "b" => (0, 0, 255),
            "yellow" | "y" => (255, 255, 0),
            "cyan" | "c" => (0, 255, 255),
            "magenta" | "m" => (255, 0, 255),
            "orange" => (255, 165, 0),
            "purple" => (128, 0, 128),
            "pink" => (255, 192, 203),
            "lightblue" => (173, 216, 230),
            "lemonchiffon" => (255, 250, 205),
            "aquamarine" => (127, 255, 212),
            _ => return None,
        };
        Some(Self::new(rgb.0, rgb.1, rgb.2))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channels scaled to `[0, 1]`.
    pub fn to_unit(&self) -> [f64; 3] {
        [
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        ]
    }

    /// Inverse of [`Rgb::to_unit`]; channels outside `[0, 1]` are clamped.
    pub fn from_unit(channels: [f64; 3]) -> Self {
        let byte = |c: f64| (c.clamp(0.0, 1.0) * 255.9999) as u8;
        Self::new(byte(channels[0]), byte(channels[1]), byte(channels[2]))
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Error returned when a string is neither a hex color nor a known name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColorError(pub String);

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized color: {:?}", self.0)
    }
}

impl std::error::Error for ParseColorError {}

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.starts_with('#') {
            return Rgb::from_hex(trimmed).ok_or_else(|| ParseColorError(s.to_string()));
        }
        Rgb::from_name(trimmed)
            .or_else(|| Rgb::from_hex(trimmed))
            .ok_or_else(|| ParseColorError(s.to_string()))
    }
}
