/*
 *  color.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Configurable layer colors that adapt to the target pixel format
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use embedded_graphics::pixelcolor::{Gray4, Rgb888};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Color as written in the config, either a name or `#rrggbb`.
///
/// Defined once and converted to whatever the framebuffer uses at
/// render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Color {
    Black,
    /// the daylight shade, #323232
    Charcoal,
    Gray,
    White,
    Red,
    Blue,
    Rgb(u8, u8, u8),
}

impl Color {
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Color::Black => (0, 0, 0),
            Color::Charcoal => (0x32, 0x32, 0x32),
            Color::Gray => (0x80, 0x80, 0x80),
            Color::White => (0xff, 0xff, 0xff),
            Color::Red => (0xff, 0x00, 0x00),
            Color::Blue => (0x00, 0x00, 0xff),
            Color::Rgb(r, g, b) => (*r, *g, *b),
        }
    }

    pub fn to_rgb888(&self) -> Rgb888 {
        let (r, g, b) = self.rgb();
        Rgb888::new(r, g, b)
    }

    /// Luminance value (0-255), Rec. 601 weights
    pub fn luminance(&self) -> u8 {
        let (r, g, b) = self.rgb();
        ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
    }

    /// 4-bit grayscale (0-15) for grayscale panels
    pub fn to_gray4(&self) -> Gray4 {
        Gray4::new(((self.luminance() as u16 * 15) / 255) as u8)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(format!("color '{s}' must be #rrggbb"));
            }
            let channel = |i: usize| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .map_err(|_| format!("color '{s}' has a bad hex digit"))
            };
            return Ok(Color::Rgb(channel(0)?, channel(2)?, channel(4)?));
        }
        match s.to_ascii_lowercase().as_str() {
            "black" => Ok(Color::Black),
            "charcoal" => Ok(Color::Charcoal),
            "gray" | "grey" => Ok(Color::Gray),
            "white" => Ok(Color::White),
            "red" => Ok(Color::Red),
            "blue" => Ok(Color::Blue),
            _ => Err(format!("unknown color '{s}'")),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "black"),
            Color::Charcoal => write!(f, "charcoal"),
            Color::Gray => write!(f, "gray"),
            Color::White => write!(f, "white"),
            Color::Red => write!(f, "red"),
            Color::Blue => write!(f, "blue"),
            Color::Rgb(r, g, b) => write!(f, "#{:02x}{:02x}{:02x}", r, g, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::GrayColor;
    use embedded_graphics::pixelcolor::RgbColor;

    #[test]
    fn test_named_colors() {
        assert_eq!("blue".parse::<Color>().unwrap(), Color::Blue);
        assert_eq!("Grey".parse::<Color>().unwrap(), Color::Gray);
        assert!("mauve".parse::<Color>().is_err());
    }

    #[test]
    fn test_hex_colors() {
        let c: Color = "#323232".parse().unwrap();
        assert_eq!(c.rgb(), Color::Charcoal.rgb());
        assert_eq!(c.to_string(), "#323232");
        assert!("#32323".parse::<Color>().is_err());
        assert!("#zz3232".parse::<Color>().is_err());
    }

    #[test]
    fn test_rgb888_conversion() {
        let c = Color::Red.to_rgb888();
        assert_eq!((c.r(), c.g(), c.b()), (255, 0, 0));
    }

    #[test]
    fn test_gray4_conversion() {
        assert_eq!(Color::Black.to_gray4().luma(), 0);
        assert_eq!(Color::White.to_gray4().luma(), 15);
        assert!(Color::Charcoal.to_gray4().luma() < Color::Gray.to_gray4().luma());
    }

    #[test]
    fn test_yaml_round_trip() {
        let c: Color = serde_yaml::from_str("\"#00ff80\"").unwrap();
        assert_eq!(c, Color::Rgb(0, 255, 128));
        let s = serde_yaml::to_string(&Color::Blue).unwrap();
        assert_eq!(s.trim(), "blue");
    }
}
