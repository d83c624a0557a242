//! Text measurement.

use fontdue::Font;
use quire_css::Size;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Average glyph advance as a multiple of the font size, used when no real
/// font is available.
pub const APPROXIMATE_ADVANCE: f64 = 0.6;

/// Height of one line of text at `font_size`.
#[must_use]
pub fn line_height(font_size: f64) -> f64 {
    font_size * LINE_HEIGHT_FACTOR
}

/// Extent of `text` assuming every glyph advances by
/// [`APPROXIMATE_ADVANCE`] times the size.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn approximate_text_size(text: &str, font_size: f64) -> Size {
    let glyphs = text.chars().filter(|ch| !ch.is_control()).count();
    Size::new(
        glyphs as f64 * font_size * APPROXIMATE_ADVANCE,
        line_height(font_size),
    )
}

/// Extent of `text` from the per-glyph advance widths of `font`.
///
/// Uses `Font::metrics` rather than `Font::rasterize`, so no bitmaps are
/// generated.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn font_text_size(font: &Font, text: &str, font_size: f64) -> Size {
    let px = font_size as f32;
    let width: f32 = text
        .chars()
        .filter(|ch| !ch.is_control())
        .map(|ch| font.metrics(ch, px).advance_width)
        .sum();
    Size::new(f64::from(width), line_height(font_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approximate_size() {
        let size = approximate_text_size("abcd", 10.0);
        assert_eq!(size.width, 24.0);
        assert_eq!(size.height, 12.0);
        assert_eq!(approximate_text_size("a\nb", 10.0).width, 12.0);
    }
}
