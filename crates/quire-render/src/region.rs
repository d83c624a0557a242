//! Cursor and region bookkeeping shared by the backends.

use quire_css::{Point, Rect, Size};

use crate::backend::{BackendError, RegionHandle};

#[derive(Debug, Clone, Copy)]
struct Frame {
    handle: RegionHandle,
    rect: Rect,
    /// Cursor of the enclosing region when this one was opened.
    resume: Point,
}

/// A stack of nested regions with a cursor in the innermost one.
///
/// The bottom frame is the page itself and can never be closed.
#[derive(Debug, Clone)]
pub struct RegionStack {
    frames: Vec<Frame>,
    cursor: Point,
    next: usize,
}

impl RegionStack {
    /// A stack holding only the page region of size `page`.
    #[must_use]
    pub fn new(page: Size) -> Self {
        let rect = Rect::new(0.0, 0.0, page.width, page.height);
        Self {
            frames: vec![Frame {
                handle: RegionHandle(0),
                rect,
                resume: rect.origin(),
            }],
            cursor: rect.origin(),
            next: 1,
        }
    }

    /// Cursor in page coordinates.
    #[must_use]
    pub const fn cursor(&self) -> Point {
        self.cursor
    }

    /// Rectangle of the innermost region.
    #[must_use]
    pub fn clip(&self) -> Rect {
        self.frames.last().map_or_else(Rect::default, |f| f.rect)
    }

    /// Number of open regions, the page included.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Space left in the innermost region from the cursor.
    #[must_use]
    pub fn available(&self) -> Size {
        let clip = self.clip();
        Size::new(
            (clip.x + clip.width - self.cursor.x).max(0.0),
            (clip.y + clip.height - self.cursor.y).max(0.0),
        )
    }

    /// Open a region and move the cursor to its origin.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidRegion`] for a negative or non-finite
    /// extent.
    pub fn open(&mut self, rect: Rect) -> Result<RegionHandle, BackendError> {
        let valid = [rect.x, rect.y, rect.width, rect.height]
            .iter()
            .all(|v| v.is_finite())
            && rect.width >= 0.0
            && rect.height >= 0.0;
        if !valid {
            return Err(BackendError::InvalidRegion {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
            });
        }

        let handle = RegionHandle(self.next);
        self.next += 1;
        self.frames.push(Frame {
            handle,
            rect,
            resume: self.cursor,
        });
        self.cursor = rect.origin();
        Ok(handle)
    }

    /// Close the innermost region, restoring the cursor it interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::RegionMismatch`] or
    /// [`BackendError::NoOpenRegion`].
    pub fn close(&mut self, handle: RegionHandle) -> Result<Rect, BackendError> {
        if self.frames.len() < 2 {
            return Err(BackendError::NoOpenRegion);
        }
        let Some(top) = self.frames.last().copied() else {
            return Err(BackendError::NoOpenRegion);
        };
        if top.handle != handle {
            return Err(BackendError::RegionMismatch {
                expected: top.handle,
                found: handle,
            });
        }
        let _ = self.frames.pop();
        self.cursor = top.resume;
        Ok(top.rect)
    }

    /// Move the cursor by `(dx, dy)`.
    pub fn advance(&mut self, dx: f64, dy: f64) {
        self.cursor = Point::new(self.cursor.x + dx, self.cursor.y + dy);
    }
}
