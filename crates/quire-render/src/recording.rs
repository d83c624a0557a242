//! A backend that records drawing calls instead of producing pixels.
//!
//! Text is measured with [`approximate_text_size`], so the recorded layout
//! does not depend on which fonts the machine has installed.

use std::path::PathBuf;

use serde::Serialize;

use quire_common::cache::ImageCache;
use quire_css::{FontDescriptor, Point, Rect, Size};

use crate::backend::{Backend, BackendError, LineStyle, RegionHandle};
use crate::metrics::approximate_text_size;
use crate::pipeline::RenderOptions;
use crate::region::RegionStack;

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayCommand {
    /// A sub-region was opened.
    OpenRegion {
        /// Its handle.
        handle: RegionHandle,
        /// Its rectangle.
        rect: Rect,
    },
    /// A sub-region was closed.
    CloseRegion {
        /// Its handle.
        handle: RegionHandle,
    },
    /// A line of text.
    Text {
        /// Top-left corner.
        at: Point,
        /// The text.
        text: String,
        /// Font it was drawn with.
        font: FontDescriptor,
        /// Measured extent.
        size: Size,
    },
    /// A stroked line.
    Line {
        /// Start point.
        from: Point,
        /// End point.
        to: Point,
        /// Stroke.
        style: LineStyle,
    },
    /// A decoded image.
    Image {
        /// Destination rectangle.
        rect: Rect,
        /// Intrinsic width in pixels.
        width: u32,
        /// Intrinsic height in pixels.
        height: u32,
    },
    /// A resource made available locally.
    Fetch {
        /// Requested URL.
        url: String,
        /// Local file.
        path: PathBuf,
    },
}

/// Backend that keeps a list of [`DisplayCommand`]s.
#[derive(Debug, Clone)]
pub struct RecordingBackend {
    regions: RegionStack,
    cache: ImageCache,
    commands: Vec<DisplayCommand>,
}

impl RecordingBackend {
    /// A recorder for a page of size `page` caching images in the system
    /// temporary directory.
    #[must_use]
    pub fn new(page: Size) -> Self {
        Self {
            regions: RegionStack::new(page),
            cache: ImageCache::default(),
            commands: Vec::new(),
        }
    }

    /// A recorder sized and cached as `options` says.
    #[must_use]
    pub fn with_options(options: &RenderOptions) -> Self {
        Self {
            cache: options.image_cache(),
            ..Self::new(options.viewport)
        }
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn commands(&self) -> &[DisplayCommand] {
        &self.commands
    }

    /// Take the recorded commands.
    #[must_use]
    pub fn into_commands(self) -> Vec<DisplayCommand> {
        self.commands
    }

    /// Recorded text lines, in drawing order.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DisplayCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Backend for RecordingBackend {
    fn current_position(&self) -> Point {
        self.regions.cursor()
    }

    fn available_size(&self) -> Size {
        self.regions.available()
    }

    fn create_subregion(&mut self, rect: Rect) -> Result<RegionHandle, BackendError> {
        let handle = self.regions.open(rect)?;
        self.commands.push(DisplayCommand::OpenRegion { handle, rect });
        Ok(handle)
    }

    fn close_subregion(&mut self, handle: RegionHandle) -> Result<Rect, BackendError> {
        let rect = self.regions.close(handle)?;
        self.commands.push(DisplayCommand::CloseRegion { handle });
        Ok(rect)
    }

    fn advance(&mut self, dx: f64, dy: f64) {
        self.regions.advance(dx, dy);
    }

    fn draw_text(&mut self, text: &str, font: &FontDescriptor) -> Result<Size, BackendError> {
        let size = approximate_text_size(text, font.size);
        self.commands.push(DisplayCommand::Text {
            at: self.regions.cursor(),
            text: text.to_string(),
            font: font.clone(),
            size,
        });
        Ok(size)
    }

    fn draw_line(&mut self, dx: f64, dy: f64, style: &LineStyle) -> Result<(), BackendError> {
        let from = self.regions.cursor();
        self.regions.advance(dx, dy);
        self.commands.push(DisplayCommand::Line {
            from,
            to: self.regions.cursor(),
            style: *style,
        });
        Ok(())
    }

    fn draw_image(&mut self, bytes: &[u8], rect: Rect) -> Result<(), BackendError> {
        let decoded = image::load_from_memory(bytes)?;
        self.commands.push(DisplayCommand::Image {
            rect,
            width: decoded.width(),
            height: decoded.height(),
        });
        Ok(())
    }

    fn fetch_and_cache(&mut self, url: &str) -> Result<PathBuf, BackendError> {
        let path = self.cache.fetch_and_cache(url)?;
        self.commands.push(DisplayCommand::Fetch {
            url: url.to_string(),
            path: path.clone(),
        });
        Ok(path)
    }
}
