use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Color representation.
///
/// Colors are (de)serialized as strings. Parsing accepts the CSS forms used in styles:
/// `#RRGGBB`, `#RRGGBBAA`, `rgb(r, g, b)`, `rgba(r, g, b, a)` with `a` in `0..=1`, and a set of
/// named colors. Serialization always produces `#RRGGBBAA`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse_css(&value).ok_or_else(|| format!("invalid color '{value}'"))
    }
}

impl From<Color> for String {
    fn from(val: Color) -> Self {
        val.to_hex()
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse_css(s).ok_or_else(|| format!("invalid color '{s}'"))
    }
}

static RGB_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*([0-9]*\.?[0-9]+)\s*)?\)$",
    )
    .expect("valid regex")
});

impl Color {
    /// Transparent color: `#00000000`
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    /// Red color: `#FF0000FF`
    pub const RED: Color = Color::rgba(255, 0, 0, 255);
    /// Green color as CSS defines it: `#008000FF`
    pub const GREEN: Color = Color::rgba(0, 128, 0, 255);
    /// Blue color: `#0000FFFF`
    pub const BLUE: Color = Color::rgba(0, 0, 255, 255);
    /// Yellow color: `#FFFF00FF`
    pub const YELLOW: Color = Color::rgba(255, 255, 0, 255);
    /// Magenta color: `#FF00FFFF`
    pub const MAGENTA: Color = Color::rgba(255, 0, 255, 255);
    /// Orange color: `#FFA500FF`
    pub const ORANGE: Color = Color::rgba(255, 165, 0, 255);
    /// White color: `#FFFFFFFF`
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    /// Black color: `#000000FF`
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    /// Gray color: `#808080FF`
    pub const GRAY: Color = Color::rgba(128, 128, 128, 255);
    /// Dark gray color: `#404040FF`
    pub const DARK_GRAY: Color = Color::rgba(64, 64, 64, 255);

    /// Constructs color from its RGBA channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Converts the color into HEX8 string: `#RRGGBBAA`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }

    /// Parses a color from the hex string. Hex string can be either HEX6 (`#RRGGBB`) or HEX8 (`#RRGGBBAA`).
    pub fn try_from_hex(hex_string: &str) -> Option<Self> {
        if hex_string.len() != 7 && hex_string.len() != 9 || !hex_string.starts_with('#') {
            return None;
        }

        let r = u8::from_str_radix(hex_string.get(1..3)?, 16).ok()?;
        let g = u8::from_str_radix(hex_string.get(3..5)?, 16).ok()?;
        let b = u8::from_str_radix(hex_string.get(5..7)?, 16).ok()?;
        let a = if hex_string.len() == 9 {
            u8::from_str_radix(hex_string.get(7..9)?, 16).ok()?
        } else {
            255
        };

        Some(Self { r, g, b, a })
    }

    /// Parses a color in one of the supported CSS forms.
    pub fn parse_css(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.starts_with('#') {
            return Self::try_from_hex(value);
        }

        let lower = value.to_ascii_lowercase();
        if let Some(captures) = RGB_FUNCTION.captures(&lower) {
            let channel = |i: usize| captures[i].parse::<u8>().ok();
            let alpha = match captures.get(4) {
                Some(a) => {
                    let a = a.as_str().parse::<f64>().ok()?;
                    if !(0.0..=1.0).contains(&a) {
                        return None;
                    }
                    (a * 255.0).round() as u8
                }
                None => 255,
            };
            return Some(Self::rgba(channel(1)?, channel(2)?, channel(3)?, alpha));
        }

        named_color(&lower)
    }

    /// Red component of the color in RGBA space.
    pub fn r(&self) -> u8 {
        self.r
    }

    /// Green component of the color in RGBA space.
    pub fn g(&self) -> u8 {
        self.g
    }

    /// Blue component of the color in RGBA space.
    pub fn b(&self) -> u8 {
        self.b
    }

    /// Opacity component of the color.
    pub fn a(&self) -> u8 {
        self.a
    }
}

fn named_color(name: &str) -> Option<Color> {
    Some(match name {
        "transparent" => Color::TRANSPARENT,
        "red" => Color::RED,
        "green" => Color::GREEN,
        "lime" => Color::rgba(0, 255, 0, 255),
        "blue" => Color::BLUE,
        "navy" => Color::rgba(0, 0, 128, 255),
        "yellow" => Color::YELLOW,
        "magenta" | "fuchsia" => Color::MAGENTA,
        "cyan" | "aqua" => Color::rgba(0, 255, 255, 255),
        "orange" => Color::ORANGE,
        "darkorange" => Color::rgba(255, 140, 0, 255),
        "orangered" => Color::rgba(255, 69, 0, 255),
        "white" => Color::WHITE,
        "black" => Color::BLACK,
        "gray" | "grey" => Color::GRAY,
        "darkgray" | "darkgrey" => Color::rgba(169, 169, 169, 255),
        "dimgray" | "dimgrey" => Color::rgba(105, 105, 105, 255),
        "purple" => Color::rgba(128, 0, 128, 255),
        _ => return None,
    })
}
