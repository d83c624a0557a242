//! Border values.

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

use super::color::ColorValue;
use super::length::parse_length;

/// Line style of a border side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BorderStyle {
    /// No border; the side has no width.
    #[default]
    None,
    /// Like `none`.
    Hidden,
    /// A single solid line.
    Solid,
    /// Short dashes.
    Dashed,
    /// Dots.
    Dotted,
    /// Two parallel lines.
    Double,
    /// Carved-in look.
    Groove,
    /// Extruded look.
    Ridge,
    /// Embedded look.
    Inset,
    /// Raised look.
    Outset,
}

impl BorderStyle {
    /// Whether this style draws anything.
    #[must_use]
    pub const fn is_visible(self) -> bool {
        !matches!(self, Self::None | Self::Hidden)
    }
}

/// One side of a border.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BorderSide {
    /// Thickness in pixels.
    pub width: f64,
    /// Line style.
    pub style: BorderStyle,
    /// Line color.
    pub color: ColorValue,
}

impl Default for BorderSide {
    fn default() -> Self {
        Self::NONE
    }
}

impl BorderSide {
    /// A side that is not drawn and takes no space.
    pub const NONE: Self = Self {
        width: 0.0,
        style: BorderStyle::None,
        color: ColorValue::BLACK,
    };

    /// Build a side.
    #[must_use]
    pub const fn new(width: f64, style: BorderStyle, color: ColorValue) -> Self {
        Self {
            width,
            style,
            color,
        }
    }

    /// Thickness this side actually occupies: zero unless visible.
    #[must_use]
    pub const fn used_width(&self) -> f64 {
        if self.style.is_visible() { self.width } else { 0.0 }
    }

    /// Apply a `border` shorthand such as `2px solid red` on top of `self`.
    /// Fragments may appear in any order; unrecognized ones are ignored.
    ///
    /// A style given without a width gets a 1px line.
    #[must_use]
    pub fn with_shorthand(mut self, fragments: &[&str], base: f64) -> Self {
        let mut width_given = false;
        for fragment in fragments {
            if let Ok(style) = fragment.parse::<BorderStyle>() {
                self.style = style;
            } else if let Some(color) = ColorValue::parse(fragment) {
                self.color = color;
            } else if let Some(width) = parse_length(fragment, base) {
                self.width = width.max(0.0);
                width_given = true;
            }
        }
        if !width_given && self.style.is_visible() && self.width == 0.0 {
            self.width = 1.0;
        }
        self
    }
}
