//! The drawing contract the rendering pipeline consumes.
//!
//! A backend owns a cursor and a stack of regions. Every region is an
//! absolute rectangle on the page; the cursor lives inside the innermost
//! open region and [`Backend::available_size`] is what is left of that
//! region to the right of and below the cursor.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

use quire_common::net::FetchError;
use quire_css::{BorderStyle, ColorValue, FontDescriptor, Point, Rect, Size};

/// Stroke width used when nothing else is specified.
pub const DEFAULT_LINE_WIDTH: f64 = 8.2;

/// Identifies an open sub-region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RegionHandle(pub usize);

impl fmt::Display for RegionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shape of a stroke's two ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LineCap {
    /// Stops exactly at the end points.
    Butt,
    /// Half-disc past each end point.
    Round,
    /// Half-square past each end point.
    #[default]
    Square,
}

/// Shape where two strokes meet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LineJoin {
    /// Sharp corner.
    Miter,
    /// Rounded corner.
    Round,
    /// Cut-off corner.
    #[default]
    Bevel,
}

/// How a line is stroked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineStyle {
    /// Stroke width in pixels.
    pub width: f64,
    /// Stroke color.
    pub color: ColorValue,
    /// End shape.
    pub cap: LineCap,
    /// Corner shape.
    pub join: LineJoin,
    /// `(on, off)` lengths of a dash pattern; `None` for a solid stroke.
    pub dash: Option<(f64, f64)>,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            width: DEFAULT_LINE_WIDTH,
            color: ColorValue::DEFAULT_TEXT,
            cap: LineCap::default(),
            join: LineJoin::default(),
            dash: None,
        }
    }
}

impl LineStyle {
    /// Stroke for one border side.
    ///
    /// Dashed and dotted borders get a dash pattern scaled to the width.
    /// Dotted borders use round caps.
    #[must_use]
    pub fn for_border(width: f64, style: BorderStyle, color: ColorValue) -> Self {
        let (cap, dash) = match style {
            BorderStyle::Dashed => (LineCap::Butt, Some((width * 3.0, width * 2.0))),
            BorderStyle::Dotted => (LineCap::Round, Some((width.max(1.0), width * 2.0))),
            _ => (LineCap::Butt, None),
        };
        Self {
            width,
            color,
            cap,
            join: LineJoin::default(),
            dash,
        }
    }
}

/// A drawing call that could not be carried out.
#[derive(Debug, Error)]
pub enum BackendError {
    /// A sub-region with a negative or non-finite extent was requested.
    #[error("invalid region {width}x{height} at ({x}, {y})")]
    InvalidRegion {
        /// Left edge.
        x: f64,
        /// Top edge.
        y: f64,
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },
    /// A region was closed while another one was innermost.
    #[error("cannot close region {found}: region {expected} is still open")]
    RegionMismatch {
        /// The innermost open region.
        expected: RegionHandle,
        /// The region the caller tried to close.
        found: RegionHandle,
    },
    /// Only the page region is open.
    #[error("no open region to close")]
    NoOpenRegion,
    /// Image bytes could not be decoded.
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
    /// An image could not be fetched into the cache.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// A cached file could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The finished page could not be written.
    #[error("failed to save '{path}': {source}")]
    Save {
        /// Output path.
        path: PathBuf,
        /// Underlying encoder error.
        #[source]
        source: image::ImageError,
    },
}

/// A surface the pipeline draws on.
pub trait Backend {
    /// Cursor position in page coordinates.
    fn current_position(&self) -> Point;

    /// Space left in the innermost region from the cursor to its right and
    /// bottom edges.
    fn available_size(&self) -> Size;

    /// Open a sub-region covering `rect` and move the cursor to its origin.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidRegion`] for a negative or non-finite
    /// extent.
    fn create_subregion(&mut self, rect: Rect) -> Result<RegionHandle, BackendError>;

    /// Close the innermost region and restore the cursor to where it was
    /// when the region was opened. Returns the closed region's rectangle.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::RegionMismatch`] if `handle` is not the
    /// innermost region, or [`BackendError::NoOpenRegion`] if only the page
    /// is open.
    fn close_subregion(&mut self, handle: RegionHandle) -> Result<Rect, BackendError>;

    /// Move the cursor by `(dx, dy)`.
    fn advance(&mut self, dx: f64, dy: f64);

    /// Draw one line of `text` with its top-left corner at the cursor and
    /// return the extent it occupies. The cursor does not move.
    ///
    /// # Errors
    ///
    /// Backend specific.
    fn draw_text(&mut self, text: &str, font: &FontDescriptor) -> Result<Size, BackendError>;

    /// Stroke a line from the cursor to the cursor plus `(dx, dy)` and move
    /// the cursor to the end point.
    ///
    /// # Errors
    ///
    /// Backend specific.
    fn draw_line(&mut self, dx: f64, dy: f64, style: &LineStyle) -> Result<(), BackendError>;

    /// Decode `bytes` and draw them scaled into `rect`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Image`] if the bytes are not a supported
    /// image.
    fn draw_image(&mut self, bytes: &[u8], rect: Rect) -> Result<(), BackendError>;

    /// Make the image at `url` available locally and return its path.
    /// Blocks until the fetch completes.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Fetch`] if the resource cannot be fetched or
    /// cached.
    fn fetch_and_cache(&mut self, url: &str) -> Result<PathBuf, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_line_style() {
        let style = LineStyle::default();
        assert_eq!(style.width, DEFAULT_LINE_WIDTH);
        assert_eq!(style.cap, LineCap::Square);
        assert_eq!(style.join, LineJoin::Bevel);
        assert_eq!(style.color, ColorValue::DEFAULT_TEXT);
    }

    #[test]
    fn test_border_strokes() {
        let dashed = LineStyle::for_border(2.0, BorderStyle::Dashed, ColorValue::BLACK);
        assert_eq!(dashed.dash, Some((6.0, 4.0)));
        assert_eq!(dashed.cap, LineCap::Butt);

        let solid = LineStyle::for_border(2.0, BorderStyle::Solid, ColorValue::BLACK);
        assert!(solid.dash.is_none());
    }

    #[test]
    fn test_cap_keywords() {
        assert_eq!("ROUND".parse::<LineCap>(), Ok(LineCap::Round));
        assert_eq!(LineJoin::Miter.to_string(), "miter");
    }
}
