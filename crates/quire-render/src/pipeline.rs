//! Walks a styled document into a [`Backend`].
//!
//! Layout is a single vertical flow. Each tagged element gets its own
//! sub-region, the content rectangle its box metrics leave at the cursor;
//! children and text lines stack top to bottom inside it. Once the content
//! height is known the region is closed, the visible border sides are
//! stroked around it, and the cursor moves below the element's margin box.

use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::rc::Rc;

use serde::Serialize;

use quire_common::cache::ImageCache;
use quire_common::warning::warn_once;
use quire_css::{
    BoxMetrics, CssValue, ElementStyle, FontDescriptor, Point, Rect, RuleId, Size, StyledElement,
    Stylesheet, compute_styles, matching_rules,
};
use quire_markup::{Document, Element};

use crate::backend::{Backend, BackendError, LineCap, LineStyle};
use crate::metrics::line_height;

/// Page size used when none is given.
pub const DEFAULT_VIEWPORT: Size = Size::new(800.0, 600.0);

/// Settings for one rendering run.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Page size in pixels.
    pub viewport: Size,
    /// Font of the top-level elements before any rule applies.
    pub font: FontDescriptor,
    /// Where fetched images are cached; the system temporary directory
    /// when `None`.
    pub cache_dir: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            viewport: DEFAULT_VIEWPORT,
            font: FontDescriptor::default(),
            cache_dir: None,
        }
    }
}

impl RenderOptions {
    /// The image cache these options describe.
    #[must_use]
    pub fn image_cache(&self) -> ImageCache {
        self.cache_dir
            .as_ref()
            .map_or_else(ImageCache::in_temp_dir, ImageCache::new)
    }
}

/// What a rendering run drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RenderSummary {
    /// Tagged elements laid out.
    pub elements: usize,
    /// Text lines drawn.
    pub text_lines: usize,
    /// Images drawn.
    pub images: usize,
    /// Bottom of the flow in page coordinates.
    pub height: f64,
}

/// Draw `document` styled by `sheet` onto `backend`.
///
/// # Errors
///
/// Any [`BackendError`] aborts the run and is returned as is; the backend
/// may hold a partly drawn page.
pub fn render_document<B: Backend + ?Sized>(
    document: &Document,
    sheet: &Stylesheet,
    backend: &mut B,
    options: &RenderOptions,
) -> Result<RenderSummary, BackendError> {
    let styles = compute_styles(document, sheet);
    render_styled(document, sheet, &styles, backend, options)
}

/// Like [`render_document`], reusing rule matches already computed by
/// [`compute_styles`]. Elements missing from `styles` are matched on the
/// fly.
///
/// # Errors
///
/// See [`render_document`].
pub fn render_styled<B: Backend + ?Sized>(
    document: &Document,
    sheet: &Stylesheet,
    styles: &[StyledElement],
    backend: &mut B,
    options: &RenderOptions,
) -> Result<RenderSummary, BackendError> {
    let mut painter = Painter {
        sheet,
        top_level: document.elements(),
        matches: styles
            .iter()
            .map(|styled| (Rc::as_ptr(&styled.element), styled.rules.as_slice()))
            .collect(),
        backend,
        summary: RenderSummary::default(),
    };
    for element in document.elements() {
        painter.element(element, &options.font)?;
    }
    painter.summary.height = painter.backend.current_position().y;
    Ok(painter.summary)
}

struct Painter<'a, B: Backend + ?Sized> {
    sheet: &'a Stylesheet,
    top_level: &'a [Rc<Element>],
    matches: HashMap<*const Element, &'a [RuleId]>,
    backend: &'a mut B,
    summary: RenderSummary,
}

impl<B: Backend + ?Sized> Painter<'_, B> {
    fn element(&mut self, element: &Rc<Element>, inherited: &FontDescriptor) -> Result<(), BackendError> {
        if let Some(text) = element.text() {
            return self.text(text, inherited);
        }

        let rules = self.matches.get(&Rc::as_ptr(element)).map_or_else(
            || matching_rules(self.sheet, element, self.top_level),
            |rules| rules.to_vec(),
        );
        let style = ElementStyle::new(self.sheet, rules);
        let font = style.font(inherited);
        let metrics = style.box_metrics(font.size);
        let origin = self.backend.current_position();
        let available = self.backend.available_size();
        let content = metrics.content_rect(origin, available);

        let region = self.backend.create_subregion(content)?;
        if element.tag_name().eq_ignore_ascii_case("img") {
            self.image(element, &style, &font, content)?;
        } else if element.grammar().is_void(element.tag_name()) {
            self.backend.advance(0.0, line_height(font.size));
        } else {
            for child in element.children() {
                self.element(child, &font)?;
            }
        }
        let content_height = (self.backend.current_position().y - content.y).max(0.0);
        let _ = self.backend.close_subregion(region)?;
        self.summary.elements += 1;

        self.borders(&metrics, origin, available, content_height)?;
        self.move_to(origin);
        self.backend.advance(0.0, metrics.outer_height(content_height));
        Ok(())
    }

    fn text(&mut self, text: &str, font: &FontDescriptor) -> Result<(), BackendError> {
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let size = self.backend.draw_text(line, font)?;
            if font.style.is_underline() {
                self.underline(size.width, font)?;
            }
            self.backend.advance(0.0, size.height);
            self.summary.text_lines += 1;
        }
        Ok(())
    }

    fn underline(&mut self, width: f64, font: &FontDescriptor) -> Result<(), BackendError> {
        let start = self.backend.current_position();
        let style = LineStyle {
            width: (font.size / 13.0).max(1.0),
            color: font.color,
            cap: LineCap::Butt,
            ..LineStyle::default()
        };
        self.backend.advance(0.0, font.size + 1.0);
        self.backend.draw_line(width, 0.0, &style)?;
        self.move_to(start);
        Ok(())
    }

    fn image(
        &mut self,
        element: &Rc<Element>,
        style: &ElementStyle<'_>,
        font: &FontDescriptor,
        content: Rect,
    ) -> Result<(), BackendError> {
        let Some(src) = element.attribute("src") else {
            warn_once("Render", &format!("<img> on line {} has no src", element.line()));
            return Ok(());
        };
        let path = self.backend.fetch_and_cache(src)?;
        let bytes = fs::read(&path).map_err(|source| BackendError::Io {
            path: path.clone(),
            source,
        })?;
        let (natural_w, natural_h) = image::ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|source| BackendError::Io { path, source })?
            .into_dimensions()?;

        let dimension = |key: &str| {
            element
                .attribute(key)
                .and_then(|v| CssValue::new(v).as_length(font.size))
                .or_else(|| style.length(key, font.size))
                .filter(|v| *v >= 0.0)
        };
        let size = image_size(
            Size::new(f64::from(natural_w), f64::from(natural_h)),
            dimension("width"),
            dimension("height"),
            content.width,
        );

        let at = self.backend.current_position();
        self.backend
            .draw_image(&bytes, Rect::new(at.x, at.y, size.width, size.height))?;
        self.backend.advance(0.0, size.height);
        self.summary.images += 1;
        Ok(())
    }

    /// Stroke each visible side along the middle of its band.
    fn borders(
        &mut self,
        metrics: &BoxMetrics,
        origin: Point,
        available: Size,
        content_height: f64,
    ) -> Result<(), BackendError> {
        if !metrics.has_visible_border() {
            return Ok(());
        }
        let b = metrics.border_widths();
        let outer = metrics.border_rect(origin, available);
        let (x, y, w) = (outer.x, outer.y, outer.width);
        let h = content_height + b.top + b.bottom;

        let sides = [
            (metrics.top, Point::new(x, y + b.top / 2.0), (w, 0.0)),
            (metrics.right, Point::new(x + w - b.right / 2.0, y), (0.0, h)),
            (metrics.bottom, Point::new(x + w, y + h - b.bottom / 2.0), (-w, 0.0)),
            (metrics.left, Point::new(x + b.left / 2.0, y + h), (0.0, -h)),
        ];
        for (side, start, (dx, dy)) in sides {
            if side.used_width() <= 0.0 {
                continue;
            }
            self.move_to(start);
            let stroke = LineStyle::for_border(side.width, side.style, side.color);
            self.backend.draw_line(dx, dy, &stroke)?;
        }
        Ok(())
    }

    fn move_to(&mut self, target: Point) {
        let at = self.backend.current_position();
        self.backend.advance(target.x - at.x, target.y - at.y);
    }
}

/// Displayed image size: explicit dimensions win, a single one keeps the
/// aspect ratio, and the result is scaled down to fit `max_width`.
fn image_size(natural: Size, width: Option<f64>, height: Option<f64>, max_width: f64) -> Size {
    let ratio = if natural.width > 0.0 {
        natural.height / natural.width
    } else {
        1.0
    };
    let mut size = match (width, height) {
        (Some(w), Some(h)) => Size::new(w, h),
        (Some(w), None) => Size::new(w, w * ratio),
        (None, Some(h)) if ratio > 0.0 => Size::new(h / ratio, h),
        _ => natural,
    };
    if size.width > max_width && size.width > 0.0 {
        let scale = max_width / size.width;
        size = Size::new(max_width, size.height * scale);
    }
    size
}
