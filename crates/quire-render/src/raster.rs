//! Software backend for headless screenshots.
//!
//! Draws into an RGBA buffer using fontdue for text rasterization and the
//! `image` crate for decoding and PNG output. Every draw is clipped to the
//! innermost open region.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};
use image::{ImageBuffer, Rgba, RgbaImage};

use quire_common::cache::ImageCache;
use quire_common::warning::warn_once;
use quire_css::{ColorValue, FontDescriptor, FontFamily, Point, Rect, Size};

use crate::backend::{Backend, BackendError, LineCap, LineStyle, RegionHandle};
use crate::metrics::{approximate_text_size, font_text_size};
use crate::pipeline::RenderOptions;
use crate::region::RegionStack;

/// Directories searched for a font named in a stylesheet.
const FONT_DIRS: &[&str] = &[
    // macOS
    "/System/Library/Fonts",
    "/System/Library/Fonts/Supplemental",
    "/Library/Fonts",
    // Linux
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/TTF",
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/freefont",
    // Windows
    "C:\\Windows\\Fonts",
];

/// Common system font paths for a sans-serif regular face.
const SANS_PATHS: &[&str] = &[
    "/System/Library/Fonts/Helvetica.ttc",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const SANS_BOLD_PATHS: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

const SANS_ITALIC_PATHS: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial Italic.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Oblique.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Oblique.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Italic.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansOblique.ttf",
    "C:\\Windows\\Fonts\\ariali.ttf",
];

const SANS_BOLD_ITALIC_PATHS: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial Bold Italic.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-BoldOblique.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-BoldOblique.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-BoldItalic.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBoldOblique.ttf",
    "C:\\Windows\\Fonts\\arialbi.ttf",
];

const SERIF_PATHS: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Times New Roman.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
    "/usr/share/fonts/TTF/DejaVuSerif.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSerif-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSerif.ttf",
    "C:\\Windows\\Fonts\\times.ttf",
];

const SERIF_BOLD_PATHS: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Times New Roman Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSerif-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSerif-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSerif-Bold.ttf",
    "C:\\Windows\\Fonts\\timesbd.ttf",
];

const SERIF_ITALIC_PATHS: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Times New Roman Italic.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSerif-Italic.ttf",
    "/usr/share/fonts/TTF/DejaVuSerif-Italic.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSerif-Italic.ttf",
    "C:\\Windows\\Fonts\\timesi.ttf",
];

const MONO_PATHS: &[&str] = &[
    "/System/Library/Fonts/Menlo.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeMono.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
];

const MONO_BOLD_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Bold.ttf",
    "C:\\Windows\\Fonts\\consolab.ttf",
];

/// File name suffixes tried after a font name, per `(bold, italic)`.
fn variant_suffixes(bold: bool, italic: bool) -> &'static [&'static str] {
    match (bold, italic) {
        (false, false) => &["", "-Regular", " Regular"],
        (true, false) => &["-Bold", " Bold", "Bold"],
        (false, true) => &["-Italic", "-Oblique", " Italic", "Italic"],
        (true, true) => &["-BoldItalic", "-BoldOblique", " Bold Italic"],
    }
}

/// Candidate paths for a generic family in one variant. Missing variants
/// fall back to the regular face of the family.
fn family_paths(family: FontFamily, bold: bool, italic: bool) -> Vec<&'static str> {
    let (regular, bold_paths, italic_paths, bold_italic): (&[&str], &[&str], &[&str], &[&str]) =
        match family {
            FontFamily::SansSerif | FontFamily::Sans | FontFamily::Cursive => (
                SANS_PATHS,
                SANS_BOLD_PATHS,
                SANS_ITALIC_PATHS,
                SANS_BOLD_ITALIC_PATHS,
            ),
            FontFamily::Serif => (SERIF_PATHS, SERIF_BOLD_PATHS, SERIF_ITALIC_PATHS, &[]),
            FontFamily::Monospace => (MONO_PATHS, MONO_BOLD_PATHS, &[], &[]),
        };
    let preferred: &[&str] = match (bold, italic) {
        (false, false) => &[],
        (true, false) => bold_paths,
        (false, true) => italic_paths,
        (true, true) => bold_italic,
    };
    let mut paths: Vec<&str> = preferred.to_vec();
    if bold && italic {
        paths.extend_from_slice(bold_paths);
    }
    paths.extend_from_slice(regular);
    // Any sans face beats no text at all.
    paths.extend_from_slice(SANS_PATHS);
    paths
}

fn load_font(path: &Path) -> Option<Font> {
    let data = std::fs::read(path).ok()?;
    Font::from_bytes(data, FontSettings::default()).ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FontKey {
    name: String,
    family: FontFamily,
    bold: bool,
    italic: bool,
}

impl FontKey {
    fn of(font: &FontDescriptor) -> Self {
        Self {
            name: font.name.clone(),
            family: font.family,
            bold: font.style.is_bold(),
            italic: font.style.is_italic(),
        }
    }

    /// Locate and load the face: the named font first, then the family.
    fn load(&self) -> Option<Font> {
        if !self.name.is_empty() {
            let stem = self.name.replace(' ', "");
            for dir in FONT_DIRS {
                for suffix in variant_suffixes(self.bold, self.italic) {
                    for base in [stem.as_str(), self.name.as_str()] {
                        for ext in ["ttf", "otf", "ttc"] {
                            let path = Path::new(dir).join(format!("{base}{suffix}.{ext}"));
                            if let Some(font) = load_font(&path) {
                                return Some(font);
                            }
                        }
                    }
                }
            }
            warn_once("Render", &format!("font '{}' not found, using {}", self.name, self.family));
        }
        family_paths(self.family, self.bold, self.italic)
            .into_iter()
            .find_map(|path| load_font(Path::new(path)))
    }
}

/// Software backend that draws into a pixel buffer.
pub struct RasterBackend {
    buffer: RgbaImage,
    width: u32,
    height: u32,
    regions: RegionStack,
    cache: ImageCache,
    /// Loaded faces; `None` records a lookup that found nothing.
    fonts: HashMap<FontKey, Option<Font>>,
}

impl RasterBackend {
    /// A white page of `width` by `height` pixels.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buffer: ImageBuffer::from_pixel(width, height, Rgba([255, 255, 255, 255])),
            width,
            height,
            regions: RegionStack::new(Size::new(f64::from(width), f64::from(height))),
            cache: ImageCache::default(),
            fonts: HashMap::new(),
        }
    }

    /// A page sized and cached as `options` says.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn with_options(options: &RenderOptions) -> Self {
        Self {
            cache: options.image_cache(),
            ..Self::new(
                options.viewport.width.max(1.0) as u32,
                options.viewport.height.max(1.0) as u32,
            )
        }
    }

    /// The pixels drawn so far.
    #[must_use]
    pub const fn image(&self) -> &RgbaImage {
        &self.buffer
    }

    /// Save the page as an image file; the format follows the extension.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Save`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), BackendError> {
        self.buffer.save(path).map_err(|source| BackendError::Save {
            path: path.to_path_buf(),
            source,
        })
    }

    fn font(&mut self, descriptor: &FontDescriptor) -> Option<&Font> {
        let key = FontKey::of(descriptor);
        self.fonts
            .entry(key)
            .or_insert_with_key(|key| {
                let font = key.load();
                if font.is_none() {
                    warn_once("Render", "no system font found; text will not be drawn");
                }
                font
            })
            .as_ref()
    }

    /// Pixel bounds of the innermost region intersected with the buffer,
    /// as `[x0, y0, x1, y1)`.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    fn clip_bounds(&self) -> [i64; 4] {
        let clip = self.regions.clip();
        [
            clip.x.floor().max(0.0) as i64,
            clip.y.floor().max(0.0) as i64,
            ((clip.x + clip.width).ceil() as i64).min(i64::from(self.width)),
            ((clip.y + clip.height).ceil() as i64).min(i64::from(self.height)),
        ]
    }

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn blend_pixel(&mut self, bounds: [i64; 4], px: i64, py: i64, color: Rgba<u8>, alpha: u8) {
        if alpha == 0 || px < bounds[0] || py < bounds[1] || px >= bounds[2] || py >= bounds[3] {
            return;
        }
        let (x, y) = (px as u32, py as u32);
        if alpha == 255 {
            self.buffer.put_pixel(x, y, color);
        } else {
            let bg = *self.buffer.get_pixel(x, y);
            self.buffer.put_pixel(x, y, alpha_blend(color, bg, alpha));
        }
    }
}

impl Backend for RasterBackend {
    fn current_position(&self) -> Point {
        self.regions.cursor()
    }

    fn available_size(&self) -> Size {
        self.regions.available()
    }

    fn create_subregion(&mut self, rect: Rect) -> Result<RegionHandle, BackendError> {
        self.regions.open(rect)
    }

    fn close_subregion(&mut self, handle: RegionHandle) -> Result<Rect, BackendError> {
        self.regions.close(handle)
    }

    fn advance(&mut self, dx: f64, dy: f64) {
        self.regions.advance(dx, dy);
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    fn draw_text(&mut self, text: &str, font: &FontDescriptor) -> Result<Size, BackendError> {
        let bounds = self.clip_bounds();
        let origin = self.regions.cursor();
        let (rgba, opacity) = pixel_color(font.color);
        let px_size = font.size as f32;

        let Some(face) = self.font(font) else {
            return Ok(approximate_text_size(text, font.size));
        };
        let extent = font_text_size(face, text, font.size);

        let mut glyphs = Vec::new();
        let mut cursor_x = origin.x as f32;
        for ch in text.chars().filter(|ch| !ch.is_control()) {
            let (metrics, bitmap) = face.rasterize(ch, px_size);
            let glyph_x = i64::from(cursor_x as i32 + metrics.xmin);
            let glyph_y = origin.y as i64
                + i64::from(px_size as i32 - metrics.ymin - metrics.height as i32);
            glyphs.push((glyph_x, glyph_y, metrics.width, metrics.height, bitmap));
            cursor_x += metrics.advance_width;
        }

        for (gx0, gy0, w, h, bitmap) in glyphs {
            for gy in 0..h {
                for gx in 0..w {
                    let coverage = u16::from(bitmap[gy * w + gx]);
                    let alpha = (coverage * u16::from(opacity) / 255) as u8;
                    self.blend_pixel(bounds, gx0 + gx as i64, gy0 + gy as i64, rgba, alpha);
                }
            }
        }
        Ok(extent)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss
    )]
    fn draw_line(&mut self, dx: f64, dy: f64, style: &LineStyle) -> Result<(), BackendError> {
        let from = self.regions.cursor();
        self.regions.advance(dx, dy);

        let length = dx.hypot(dy);
        let half = style.width / 2.0;
        if style.width <= 0.0 || (length == 0.0 && style.cap == LineCap::Butt) {
            return Ok(());
        }
        let (ux, uy) = if length == 0.0 { (1.0, 0.0) } else { (dx / length, dy / length) };
        let extend = if style.cap == LineCap::Butt { 0.0 } else { half };

        let bounds = self.clip_bounds();
        let (rgba, opacity) = pixel_color(style.color);
        let x0 = (from.x.min(from.x + dx) - half - 1.0).floor() as i64;
        let x1 = (from.x.max(from.x + dx) + half + 1.0).ceil() as i64;
        let y0 = (from.y.min(from.y + dy) - half - 1.0).floor() as i64;
        let y1 = (from.y.max(from.y + dy) + half + 1.0).ceil() as i64;

        for py in y0.max(bounds[1])..y1.min(bounds[3]) {
            for px in x0.max(bounds[0])..x1.min(bounds[2]) {
                // Pixel centre in the line's frame: `along` from the start
                // point, `across` from the centre line.
                let cx = px as f64 + 0.5 - from.x;
                let cy = py as f64 + 0.5 - from.y;
                let along = cx.mul_add(ux, cy * uy);
                let across = cx.mul_add(-uy, cy * ux);

                let inside = match style.cap {
                    LineCap::Round => {
                        let t = along.clamp(0.0, length);
                        (along - t).hypot(across) <= half
                    }
                    LineCap::Butt | LineCap::Square => {
                        across.abs() <= half && along >= -extend && along <= length + extend
                    }
                };
                let on_dash = style.dash.is_none_or(|(on, off)| {
                    let period = on + off;
                    period <= 0.0 || (along + extend).rem_euclid(period) < on
                });
                if inside && on_dash {
                    self.blend_pixel(bounds, px, py, rgba, opacity);
                }
            }
        }
        Ok(())
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    fn draw_image(&mut self, bytes: &[u8], rect: Rect) -> Result<(), BackendError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (src_w, src_h) = img.dimensions();
        let dest_x = rect.x.round() as i64;
        let dest_y = rect.y.round() as i64;
        let dest_w = rect.width.round().max(0.0) as u32;
        let dest_h = rect.height.round().max(0.0) as u32;
        if src_w == 0 || src_h == 0 || dest_w == 0 || dest_h == 0 {
            return Ok(());
        }

        let bounds = self.clip_bounds();
        for dy in 0..dest_h {
            for dx in 0..dest_w {
                // Nearest-neighbor sampling
                let sx = ((u64::from(dx) * u64::from(src_w)) / u64::from(dest_w))
                    .min(u64::from(src_w) - 1) as u32;
                let sy = ((u64::from(dy) * u64::from(src_h)) / u64::from(dest_h))
                    .min(u64::from(src_h) - 1) as u32;
                let fg = *img.get_pixel(sx, sy);
                self.blend_pixel(
                    bounds,
                    dest_x + i64::from(dx),
                    dest_y + i64::from(dy),
                    fg,
                    fg[3],
                );
            }
        }
        Ok(())
    }

    fn fetch_and_cache(&mut self, url: &str) -> Result<PathBuf, BackendError> {
        Ok(self.cache.fetch_and_cache(url)?)
    }
}

/// Opaque pixel color plus the alpha to blend it with.
fn pixel_color(color: ColorValue) -> (Rgba<u8>, u8) {
    let [r, g, b, a] = color.to_rgba8();
    (Rgba([r, g, b, 255]), a)
}

/// Alpha blend a foreground color onto a background color.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn alpha_blend(fg: Rgba<u8>, bg: Rgba<u8>, alpha: u8) -> Rgba<u8> {
    let a = f32::from(alpha) / 255.0;
    let inv_a = 1.0 - a;

    Rgba([
        f32::from(fg[0]).mul_add(a, f32::from(bg[0]) * inv_a) as u8,
        f32::from(fg[1]).mul_add(a, f32::from(bg[1]) * inv_a) as u8,
        f32::from(fg[2]).mul_add(a, f32::from(bg[2]) * inv_a) as u8,
        255,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LineJoin;
    use std::io::Cursor;

    fn red_line(width: f64) -> LineStyle {
        LineStyle {
            width,
            color: ColorValue::new(255.0, 0.0, 0.0, 1.0),
            cap: LineCap::Butt,
            join: LineJoin::Bevel,
            dash: None,
        }
    }

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn test_horizontal_line() {
        let mut backend = RasterBackend::new(20, 10);
        backend.advance(2.0, 5.0);
        backend.draw_line(10.0, 0.0, &red_line(2.0)).unwrap();

        assert_eq!(backend.current_position(), Point::new(12.0, 5.0));
        assert_eq!(*backend.image().get_pixel(2, 4), RED);
        assert_eq!(*backend.image().get_pixel(11, 5), RED);
        assert_eq!(*backend.image().get_pixel(12, 5), WHITE);
        assert_eq!(*backend.image().get_pixel(5, 7), WHITE);
    }

    #[test]
    fn test_square_cap_extends_line() {
        let mut backend = RasterBackend::new(20, 10);
        backend.advance(4.0, 5.0);
        let style = LineStyle {
            cap: LineCap::Square,
            ..red_line(4.0)
        };
        backend.draw_line(4.0, 0.0, &style).unwrap();
        assert_eq!(*backend.image().get_pixel(2, 5), RED);
        assert_eq!(*backend.image().get_pixel(9, 5), RED);
        assert_eq!(*backend.image().get_pixel(10, 5), WHITE);
    }

    #[test]
    fn test_dashed_line_has_gaps() {
        let mut backend = RasterBackend::new(20, 4);
        backend.advance(0.0, 2.0);
        let style = LineStyle {
            dash: Some((3.0, 2.0)),
            ..red_line(2.0)
        };
        backend.draw_line(20.0, 0.0, &style).unwrap();
        assert_eq!(*backend.image().get_pixel(1, 2), RED);
        assert_eq!(*backend.image().get_pixel(3, 2), WHITE);
        assert_eq!(*backend.image().get_pixel(5, 2), RED);
    }

    #[test]
    fn test_drawing_is_clipped_to_region() {
        let mut backend = RasterBackend::new(20, 10);
        let region = backend.create_subregion(Rect::new(5.0, 0.0, 5.0, 10.0)).unwrap();
        backend.advance(-5.0, 5.0);
        backend.draw_line(20.0, 0.0, &red_line(2.0)).unwrap();
        let _ = backend.close_subregion(region).unwrap();

        assert_eq!(*backend.image().get_pixel(4, 5), WHITE);
        assert_eq!(*backend.image().get_pixel(5, 5), RED);
        assert_eq!(*backend.image().get_pixel(9, 5), RED);
        assert_eq!(*backend.image().get_pixel(10, 5), WHITE);
    }

    #[test]
    fn test_image_is_scaled_nearest_neighbor() {
        let mut source = RgbaImage::from_pixel(2, 1, RED);
        source.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
        let mut png = Vec::new();
        source
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let mut backend = RasterBackend::new(10, 10);
        backend.draw_image(&png, Rect::new(0.0, 0.0, 4.0, 2.0)).unwrap();
        assert_eq!(*backend.image().get_pixel(1, 1), RED);
        assert_eq!(*backend.image().get_pixel(2, 0), Rgba([0, 0, 255, 255]));
        assert_eq!(*backend.image().get_pixel(4, 0), WHITE);
    }

    #[test]
    fn test_alpha_blend() {
        let half = alpha_blend(Rgba([0, 0, 0, 255]), WHITE, 128);
        assert!(half[0] > 120 && half[0] < 135);
        assert_eq!(half[3], 255);
    }

    #[test]
    fn test_family_paths_fall_back_to_regular() {
        let paths = family_paths(FontFamily::Monospace, true, true);
        assert!(paths.contains(&"/usr/share/fonts/truetype/dejavu/DejaVuSansMono-Bold.ttf"));
        assert!(paths.contains(&"/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf"));
    }
}
