//! Box geometry.

/// Borders, margins, and the content rectangle.
pub mod box_model;

pub use box_model::{BorderConfig, BoxMetrics, EdgeSizes, Point, Rect, Size};
