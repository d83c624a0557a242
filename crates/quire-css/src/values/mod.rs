//! Declaration values and their typed interpretations.

mod border;
mod color;
mod font;
mod length;

use std::fmt;

use serde::Serialize;

use quire_common::text::split_tokens;

pub use border::{BorderSide, BorderStyle};
pub use color::{ColorCode, ColorValue};
pub use font::{DEFAULT_FONT_SIZE, FontDescriptor, FontFamily, FontStyle};
pub use length::{parse_length, parse_number, resolve_length};

/// The raw value of a declaration, e.g. `1px solid #333`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CssValue(String);

impl CssValue {
    /// Wrap raw value text, trimmed.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    /// The value as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whitespace-separated fragments; `rgb(1, 2, 3)` stays one fragment.
    #[must_use]
    pub fn fragments(&self) -> Vec<Fragment<'_>> {
        split_tokens(&self.0).into_iter().map(Fragment).collect()
    }

    /// The whole value as a color.
    #[must_use]
    pub fn as_color(&self) -> Option<ColorValue> {
        ColorValue::parse(&self.0)
    }

    /// The whole value as a length against `base`.
    #[must_use]
    pub fn as_length(&self, base: f64) -> Option<f64> {
        parse_length(&self.0, base)
    }
}

impl fmt::Display for CssValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One fragment of a [`CssValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment<'a>(&'a str);

impl<'a> Fragment<'a> {
    /// Interpret as a color.
    #[must_use]
    pub fn as_color(&self) -> Option<ColorValue> {
        ColorValue::parse(self.0)
    }

    /// Interpret as an absolute pixel length: `12px` or a bare number.
    #[must_use]
    pub fn as_px(&self) -> Option<f64> {
        let number = self.0.strip_suffix("px").unwrap_or(self.0);
        parse_number(number)
    }

    /// The fragment text.
    #[must_use]
    pub const fn as_token(&self) -> &'a str {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragments() {
        let value = CssValue::new("  1px solid rgb(1, 2, 3) ");
        assert_eq!(value.as_str(), "1px solid rgb(1, 2, 3)");
        let fragments = value.fragments();
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[0].as_px(), Some(1.0));
        assert_eq!(fragments[1].as_token(), "solid");
        assert_eq!(fragments[1].as_color(), None);
        assert_eq!(fragments[2].as_color(), Some(ColorValue::new(1.0, 2.0, 3.0, 1.0)));
    }

    #[test]
    fn test_whole_value_interpretations() {
        assert_eq!(CssValue::new("#fff").as_color(), Some(ColorValue::WHITE));
        assert_eq!(CssValue::new("2em").as_length(8.0), Some(16.0));
        assert_eq!(CssValue::new("2em").fragments()[0].as_px(), None);
    }
}
