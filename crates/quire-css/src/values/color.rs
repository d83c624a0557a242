//! Color values and hex color codes.

use std::fmt;

use serde::Serialize;

/// An RGBA color. Channels are `0.0..=255.0`, alpha is `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorValue {
    /// Red channel.
    pub red: f64,
    /// Green channel.
    pub green: f64,
    /// Blue channel.
    pub blue: f64,
    /// Alpha (opacity).
    pub alpha: f64,
}

impl ColorValue {
    /// Black (#000000)
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// White (#ffffff)
    pub const WHITE: Self = Self::new(255.0, 255.0, 255.0, 1.0);

    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Text color used when nothing is declared: a slightly translucent
    /// near-black.
    pub const DEFAULT_TEXT: Self = Self::new(27.0, 25.0, 23.0, 0.8);

    /// Build a color from its channels.
    #[must_use]
    pub const fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Channels scaled to `0.0..=1.0`, as drawing backends expect them.
    #[must_use]
    pub fn normalized(&self) -> [f64; 4] {
        [
            self.red / 255.0,
            self.green / 255.0,
            self.blue / 255.0,
            self.alpha,
        ]
    }

    /// Channels as bytes, alpha scaled to `0..=255`.
    #[must_use]
    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            channel_byte(self.red),
            channel_byte(self.green),
            channel_byte(self.blue),
            channel_byte(self.alpha * 255.0),
        ]
    }

    /// The `#rrggbb` code for this color. Alpha is not encoded.
    #[must_use]
    pub fn to_colorcode(&self) -> ColorCode {
        let [r, g, b, _] = self.to_rgba8();
        ColorCode(format!("#{r:02x}{g:02x}{b:02x}"))
    }

    /// Parse any supported color notation: `#rgb`, `#rrggbb`, `rgb(...)`,
    /// `rgba(...)`, or a named color.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.starts_with('#') {
            return ColorCode::new(text).to_rgba();
        }
        if let Some(args) = text
            .strip_prefix("rgba(")
            .or_else(|| text.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return Self::from_rgb_function(args);
        }
        Self::from_named(text)
    }

    /// Parse the argument list of `rgb()`/`rgba()`.
    fn from_rgb_function(args: &str) -> Option<Self> {
        let parts: Vec<f64> = args
            .split(',')
            .map(|p| p.trim().parse::<f64>().ok())
            .collect::<Option<_>>()?;
        match parts.as_slice() {
            [r, g, b] => Some(Self::new(*r, *g, *b, 1.0)),
            [r, g, b, a] => Some(Self::new(*r, *g, *b, *a)),
            _ => None,
        }
    }

    /// The basic named colors.
    #[must_use]
    pub fn from_named(name: &str) -> Option<Self> {
        let (r, g, b) = match name.to_ascii_lowercase().as_str() {
            "transparent" => return Some(Self::TRANSPARENT),
            "black" => (0, 0, 0),
            "white" => (255, 255, 255),
            "red" => (255, 0, 0),
            "green" => (0, 128, 0),
            "blue" => (0, 0, 255),
            "yellow" => (255, 255, 0),
            "gray" | "grey" => (128, 128, 128),
            "aqua" | "cyan" => (0, 255, 255),
            "fuchsia" | "magenta" => (255, 0, 255),
            "lime" => (0, 255, 0),
            "maroon" => (128, 0, 0),
            "navy" => (0, 0, 128),
            "olive" => (128, 128, 0),
            "purple" => (128, 0, 128),
            "silver" => (192, 192, 192),
            "teal" => (0, 128, 128),
            "orange" => (255, 165, 0),
            _ => return None,
        };
        Some(Self::new(f64::from(r), f64::from(g), f64::from(b), 1.0))
    }
}

impl Default for ColorValue {
    fn default() -> Self {
        Self::DEFAULT_TEXT
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel_byte(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// A `#rrggbb` (or `#rgb`) hex color code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ColorCode(String);

impl ColorCode {
    /// Wrap a hex code. Not validated until [`ColorCode::to_rgba`].
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The code as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode into an opaque color; `None` if the code is not `#rgb` or
    /// `#rrggbb` hex.
    #[must_use]
    pub fn to_rgba(&self) -> Option<ColorValue> {
        let hex = self.0.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(f64::from);
        match hex.len() {
            // "#rgb" doubles each digit.
            3 => Some(ColorValue::new(
                channel(&hex[0..1].repeat(2))?,
                channel(&hex[1..2].repeat(2))?,
                channel(&hex[2..3].repeat(2))?,
                1.0,
            )),
            6 => Some(ColorValue::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                1.0,
            )),
            _ => None,
        }
    }
}

impl fmt::Display for ColorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
