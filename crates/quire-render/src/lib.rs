//! Drawing backends and the rendering pipeline for the Quire styling engine.
//!
//! # Scope
//!
//! This crate provides:
//! - **Backend contract** - the cursor/region/drawing calls the pipeline
//!   needs from a surface ([`Backend`])
//! - **Recording backend** - keeps a list of drawing commands; used by tests
//!   and JSON dumps
//! - **Raster backend** - headless screenshots via fontdue and `image`
//! - **Pipeline** - loads markup and stylesheets, then walks the styled
//!   tree into a backend
//!
//! # Not Yet Implemented
//!
//! - Inline flow and line wrapping (every element and text line is a block)
//! - Background fills

/// The drawing contract.
pub mod backend;
/// Text measurement.
pub mod metrics;
/// Document walk.
pub mod pipeline;
/// Pixel output.
pub mod raster;
/// Command recording.
pub mod recording;
/// Cursor and region stack.
pub mod region;

pub use backend::{Backend, BackendError, DEFAULT_LINE_WIDTH, LineCap, LineJoin, LineStyle, RegionHandle};
pub use pipeline::{DEFAULT_VIEWPORT, RenderOptions, RenderSummary, render_document, render_styled};
pub use raster::RasterBackend;
pub use recording::{DisplayCommand, RecordingBackend};

use std::path::Path;
use std::rc::Rc;

use thiserror::Error;

use quire_common::warning::clear_warnings;
use quire_css::{StyledElement, Stylesheet, StylesheetError, compute_styles};
use quire_markup::{Document, Grammar, MarkupError};

/// A parsed document with its stylesheet and matched rules.
#[derive(Debug)]
pub struct LoadedDocument {
    /// Parsed markup.
    pub document: Document,
    /// All stylesheets merged in the order given.
    pub stylesheet: Stylesheet,
    /// Every tagged element with its matching rules, in document order.
    pub styles: Vec<StyledElement>,
    /// Inheritance links created while merging the stylesheets.
    pub links: usize,
}

impl LoadedDocument {
    /// Draw the document onto `backend`.
    ///
    /// # Errors
    ///
    /// Returns the first [`BackendError`] the backend reports.
    pub fn render<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        options: &RenderOptions,
    ) -> Result<RenderSummary, BackendError> {
        render_styled(&self.document, &self.stylesheet, &self.styles, backend, options)
    }
}

/// Failure of a pipeline run.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The markup could not be read or parsed.
    #[error(transparent)]
    Markup(#[from] MarkupError),
    /// A stylesheet could not be read or parsed.
    #[error(transparent)]
    Stylesheet(#[from] StylesheetError),
    /// Drawing failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Load the markup at `markup_path` and merge every stylesheet in
/// `stylesheet_paths`, in order, then match rules to elements.
///
/// Warnings from a previous run are cleared first.
///
/// # Errors
///
/// Returns [`LoadError::Markup`] or [`LoadError::Stylesheet`] for the
/// first file that cannot be read or parsed.
pub fn load_document<P: AsRef<Path>>(
    markup_path: impl AsRef<Path>,
    stylesheet_paths: &[P],
) -> Result<LoadedDocument, LoadError> {
    clear_warnings();
    let grammar = Rc::new(Grammar::html());
    let document = Document::load(markup_path, grammar)?;

    let mut stylesheet = Stylesheet::new();
    let mut links = 0;
    for path in stylesheet_paths {
        links += stylesheet.load(path)?;
    }
    let styles = compute_styles(&document, &stylesheet);

    Ok(LoadedDocument {
        document,
        stylesheet,
        styles,
        links,
    })
}
