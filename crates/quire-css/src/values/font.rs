//! Font descriptors.
//!
//! A font is assembled from `font-style`, `font-size`, and `font-family`,
//! concatenated into one synthetic `font` value and read token by token.
//! The family is a keyword; any text after the keyword and a comma names a
//! concrete font, e.g. `sans-serif, DejaVu Sans`.

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

use quire_common::text::unquote;

use super::color::ColorValue;
use super::length::parse_length;

/// Font size used when nothing is declared.
pub const DEFAULT_FONT_SIZE: f64 = 13.0;

/// Generic font family keyword.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize)]
#[strum(ascii_case_insensitive)]
pub enum FontFamily {
    /// `serif`
    #[default]
    #[strum(serialize = "serif")]
    Serif,
    /// `sans-serif`
    #[strum(serialize = "sans-serif")]
    SansSerif,
    /// `sans`
    #[strum(serialize = "sans")]
    Sans,
    /// `monospace`
    #[strum(serialize = "monospace")]
    Monospace,
    /// `cursive`
    #[strum(serialize = "cursive")]
    Cursive,
}

/// Every combination of italic, bold, and underline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum FontStyle {
    /// Upright, regular weight.
    #[default]
    Normal,
    /// Italic.
    Italic,
    /// Bold.
    Bold,
    /// Bold and italic.
    BoldItalic,
    /// Underlined.
    Underline,
    /// Italic, underlined.
    ItalicUnderline,
    /// Bold, underlined.
    BoldUnderline,
    /// Bold, italic, and underlined.
    BoldItalicUnderline,
}

impl FontStyle {
    /// Combine the three style flags.
    #[must_use]
    pub const fn from_flags(italic: bool, bold: bool, underline: bool) -> Self {
        match (italic, bold, underline) {
            (false, false, false) => Self::Normal,
            (true, false, false) => Self::Italic,
            (false, true, false) => Self::Bold,
            (true, true, false) => Self::BoldItalic,
            (false, false, true) => Self::Underline,
            (true, false, true) => Self::ItalicUnderline,
            (false, true, true) => Self::BoldUnderline,
            (true, true, true) => Self::BoldItalicUnderline,
        }
    }

    /// Whether the style is italic.
    #[must_use]
    pub const fn is_italic(self) -> bool {
        matches!(
            self,
            Self::Italic | Self::BoldItalic | Self::ItalicUnderline | Self::BoldItalicUnderline
        )
    }

    /// Whether the style is bold.
    #[must_use]
    pub const fn is_bold(self) -> bool {
        matches!(
            self,
            Self::Bold | Self::BoldItalic | Self::BoldUnderline | Self::BoldItalicUnderline
        )
    }

    /// Whether the style is underlined.
    #[must_use]
    pub const fn is_underline(self) -> bool {
        matches!(
            self,
            Self::Underline | Self::ItalicUnderline | Self::BoldUnderline | Self::BoldItalicUnderline
        )
    }
}

/// Everything a backend needs to draw text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontDescriptor {
    /// Concrete font name; empty to let the backend pick one for the family.
    pub name: String,
    /// Generic family.
    pub family: FontFamily,
    /// Style flags.
    pub style: FontStyle,
    /// Size in pixels.
    pub size: f64,
    /// Text color.
    pub color: ColorValue,
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            family: FontFamily::default(),
            style: FontStyle::default(),
            size: DEFAULT_FONT_SIZE,
            color: ColorValue::DEFAULT_TEXT,
        }
    }
}

impl FontDescriptor {
    /// Read a synthetic `font` value on top of `inherited`.
    ///
    /// Sizes resolve against the inherited size. Anything the value does not
    /// mention (style, size, family) keeps its inherited setting; the color
    /// is always inherited.
    #[must_use]
    pub fn parse(value: &str, inherited: &Self) -> Self {
        let mut font = inherited.clone();
        let (mut italic, mut bold, mut underline, mut normal) = (false, false, false, false);
        let mut size = None;
        let tokens: Vec<&str> = value.split_ascii_whitespace().collect();

        for (i, raw) in tokens.iter().enumerate() {
            let token = raw.trim_end_matches(',');
            match token.to_ascii_lowercase().as_str() {
                "italic" | "oblique" => italic = true,
                "bold" | "bolder" => bold = true,
                "underline" => underline = true,
                "normal" => normal = true,
                _ => {
                    if let Ok(family) = unquote(token).parse::<FontFamily>() {
                        font.family = family;
                        font.name = font_name_after(token, &tokens[i..]);
                        break;
                    }
                    if size.is_none() {
                        size = parse_length(token, inherited.size);
                    }
                }
            }
        }

        if italic || bold || underline || normal {
            font.style = FontStyle::from_flags(italic, bold, underline);
        }
        if let Some(size) = size.filter(|s| *s > 0.0) {
            font.size = size;
        }
        font
    }
}

/// Text following the family keyword and a comma: `sans, Noto Sans` gives
/// `Noto Sans`.
fn font_name_after(keyword: &str, tokens: &[&str]) -> String {
    let rest = tokens.join(" ");
    rest[keyword.len()..]
        .trim_start()
        .strip_prefix(',')
        .map(|name| unquote(name.trim()).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_keywords() {
        assert_eq!("sans-serif".parse::<FontFamily>(), Ok(FontFamily::SansSerif));
        assert_eq!("Monospace".parse::<FontFamily>(), Ok(FontFamily::Monospace));
        assert!("fantasy".parse::<FontFamily>().is_err());
        assert_eq!(FontFamily::Cursive.to_string(), "cursive");
    }

    #[test]
    fn test_style_flags() {
        assert_eq!(FontStyle::from_flags(true, true, false), FontStyle::BoldItalic);
        assert!(FontStyle::BoldItalicUnderline.is_underline());
        assert!(!FontStyle::Italic.is_bold());
        assert_eq!(FontStyle::BoldUnderline.to_string(), "bold-underline");
    }

    #[test]
    fn test_parse_full_value() {
        let font = FontDescriptor::parse("italic bold 2em sans-serif, DejaVu Sans", &FontDescriptor::default());
        assert_eq!(font.style, FontStyle::BoldItalic);
        assert_eq!(font.size, 26.0);
        assert_eq!(font.family, FontFamily::SansSerif);
        assert_eq!(font.name, "DejaVu Sans");
    }

    #[test]
    fn test_parse_keeps_inherited_parts() {
        let parent = FontDescriptor {
            name: "Mono One".to_string(),
            family: FontFamily::Monospace,
            style: FontStyle::Italic,
            size: 20.0,
            color: ColorValue::BLACK,
        };
        let font = FontDescriptor::parse("150%", &parent);
        assert_eq!(font.size, 30.0);
        assert_eq!(font.family, FontFamily::Monospace);
        assert_eq!(font.style, FontStyle::Italic);
        assert_eq!(font.color, ColorValue::BLACK);

        let reset = FontDescriptor::parse("normal", &parent);
        assert_eq!(reset.style, FontStyle::Normal);
    }

    #[test]
    fn test_font_name_forms() {
        let base = FontDescriptor::default();
        assert_eq!(FontDescriptor::parse("serif", &base).name, "");
        assert_eq!(FontDescriptor::parse("serif , Liberation Serif", &base).name, "Liberation Serif");
        assert_eq!(FontDescriptor::parse("serif ,Liberation Serif", &base).name, "Liberation Serif");
        assert_eq!(FontDescriptor::parse("serif, \"Gentium\"", &base).name, "Gentium");
    }
}
