//! Box metrics: four border sides plus margins around a content area.
//!
//! ```text
//! ┌───────────────────────────────┐
//! │          margin-top           │
//! │   ┌───────────────────────┐   │
//! │ m │      border-top       │ m │
//! │ a │   ┌───────────────┐   │ a │
//! │ r │ b │    CONTENT    │ b │ r │
//! │ g │   └───────────────┘   │ g │
//! │   │     border-bottom     │   │
//! │   └───────────────────────┘   │
//! │         margin-bottom         │
//! └───────────────────────────────┘
//! ```

use serde::Serialize;

use crate::values::{BorderSide, BorderStyle, ColorValue, CssValue, Fragment, parse_length};

/// A point in drawing coordinates, y growing downwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Build a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width and height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Size {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Size {
    /// Build a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A rectangle positioned in 2D space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    /// Horizontal position of the top-left corner.
    pub x: f64,
    /// Vertical position of the top-left corner.
    pub y: f64,
    /// Width of the rectangle.
    pub width: f64,
    /// Height of the rectangle.
    pub height: f64,
}

impl Rect {
    /// Build a rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top-left corner.
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Width and height.
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Edge sizes for margins or border widths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EdgeSizes {
    /// Top edge size.
    pub top: f64,
    /// Right edge size.
    pub right: f64,
    /// Bottom edge size.
    pub bottom: f64,
    /// Left edge size.
    pub left: f64,
}

impl EdgeSizes {
    /// Expand the usual 1 to 4 value shorthand: `all`, `vertical
    /// horizontal`, `top horizontal bottom`, `top right bottom left`.
    /// Returns `None` for any other count.
    #[must_use]
    pub fn from_shorthand(values: &[f64]) -> Option<Self> {
        let (top, right, bottom, left) = match *values {
            [all] => (all, all, all, all),
            [vertical, horizontal] => (vertical, horizontal, vertical, horizontal),
            [top, horizontal, bottom] => (top, horizontal, bottom, horizontal),
            [top, right, bottom, left] => (top, right, bottom, left),
            _ => return None,
        };
        Some(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

/// Which sides to set when building [`BoxMetrics`]. Omitted sides use
/// `default`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BorderConfig {
    /// Top side.
    pub top: Option<BorderSide>,
    /// Bottom side.
    pub bottom: Option<BorderSide>,
    /// Left side.
    pub left: Option<BorderSide>,
    /// Right side.
    pub right: Option<BorderSide>,
    /// Used for every omitted side.
    pub default: BorderSide,
    /// Outer margins.
    pub margin: EdgeSizes,
}

/// Resolved borders and margins of one element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BoxMetrics {
    /// Top border.
    pub top: BorderSide,
    /// Bottom border.
    pub bottom: BorderSide,
    /// Left border.
    pub left: BorderSide,
    /// Right border.
    pub right: BorderSide,
    /// Outer margins.
    pub margin: EdgeSizes,
}

impl BoxMetrics {
    /// Build metrics from an explicit configuration.
    #[must_use]
    pub fn new(config: BorderConfig) -> Self {
        Self {
            top: config.top.unwrap_or(config.default),
            bottom: config.bottom.unwrap_or(config.default),
            left: config.left.unwrap_or(config.default),
            right: config.right.unwrap_or(config.default),
            margin: config.margin,
        }
    }

    /// The same border on all four sides.
    #[must_use]
    pub fn uniform(side: BorderSide) -> Self {
        Self::new(BorderConfig {
            default: side,
            ..BorderConfig::default()
        })
    }

    /// Read `border`, `border-<side>`, `border-width`, `border-style`,
    /// `border-color`, `margin`, and `margin-<side>` through `lookup`.
    /// Lengths resolve against `base`.
    ///
    /// Per-side declarations override the shorthands; `border-width`,
    /// `border-style`, and `border-color` then apply to all four sides.
    #[must_use]
    pub fn from_declarations<'a>(lookup: impl Fn(&str) -> Option<&'a CssValue>, base: f64) -> Self {
        let shorthand = |side: BorderSide, value: &CssValue| {
            let fragments: Vec<&str> = value.fragments().iter().map(Fragment::as_token).collect();
            side.with_shorthand(&fragments, base)
        };

        let default = lookup("border").map_or(BorderSide::NONE, |v| shorthand(BorderSide::NONE, v));
        let side = |name: &str| lookup(&format!("border-{name}")).map(|v| shorthand(default, v));
        let mut metrics = Self::new(BorderConfig {
            top: side("top"),
            bottom: side("bottom"),
            left: side("left"),
            right: side("right"),
            default,
            margin: EdgeSizes::default(),
        });

        if let Some(widths) = lookup("border-width").and_then(|v| edge_lengths(v, base)) {
            metrics.top.width = widths.top;
            metrics.right.width = widths.right;
            metrics.bottom.width = widths.bottom;
            metrics.left.width = widths.left;
        }
        if let Some(style) = lookup("border-style").and_then(|v| v.as_str().parse::<BorderStyle>().ok()) {
            for side in metrics.sides_mut() {
                side.style = style;
                if side.width == 0.0 && style.is_visible() {
                    side.width = 1.0;
                }
            }
        }
        if let Some(color) = lookup("border-color").and_then(CssValue::as_color) {
            for side in metrics.sides_mut() {
                side.color = color;
            }
        }

        if let Some(margin) = lookup("margin").and_then(|v| edge_lengths(v, base)) {
            metrics.margin = margin;
        }
        let margin_side = |name: &str| lookup(&format!("margin-{name}")).and_then(|v| v.as_length(base));
        if let Some(top) = margin_side("top") {
            metrics.margin.top = top;
        }
        if let Some(right) = margin_side("right") {
            metrics.margin.right = right;
        }
        if let Some(bottom) = margin_side("bottom") {
            metrics.margin.bottom = bottom;
        }
        if let Some(left) = margin_side("left") {
            metrics.margin.left = left;
        }
        metrics
    }

    fn sides_mut(&mut self) -> [&mut BorderSide; 4] {
        [&mut self.top, &mut self.right, &mut self.bottom, &mut self.left]
    }

    /// Space each border side occupies.
    #[must_use]
    pub const fn border_widths(&self) -> EdgeSizes {
        EdgeSizes {
            top: self.top.used_width(),
            right: self.right.used_width(),
            bottom: self.bottom.used_width(),
            left: self.left.used_width(),
        }
    }

    /// The area inside the margins where borders are drawn, for a box placed
    /// at `origin` with `available` space.
    #[must_use]
    pub fn border_rect(&self, origin: Point, available: Size) -> Rect {
        let m = self.margin;
        Rect::new(
            origin.x + m.left,
            origin.y + m.top,
            (available.width - m.left - m.right).max(0.0),
            (available.height - m.top - m.bottom).max(0.0),
        )
    }

    /// The content area: `origin` moved right by the left margin and border
    /// and down by the top margin and border; `available` shrunk by the
    /// margins and borders on both axes. Never negative.
    #[must_use]
    pub fn content_rect(&self, origin: Point, available: Size) -> Rect {
        let outer = self.border_rect(origin, available);
        let b = self.border_widths();
        Rect::new(
            outer.x + b.left,
            outer.y + b.top,
            (outer.width - b.left - b.right).max(0.0),
            (outer.height - b.top - b.bottom).max(0.0),
        )
    }

    /// Vertical space taken by a box whose content is `content_height` tall.
    #[must_use]
    pub fn outer_height(&self, content_height: f64) -> f64 {
        let b = self.border_widths();
        content_height + b.top + b.bottom + self.margin.top + self.margin.bottom
    }

    /// Whether any side is drawn.
    #[must_use]
    pub const fn has_visible_border(&self) -> bool {
        self.top.style.is_visible()
            || self.bottom.style.is_visible()
            || self.left.style.is_visible()
            || self.right.style.is_visible()
    }

    /// Color of the top side, used when a single border color is needed.
    #[must_use]
    pub const fn primary_color(&self) -> ColorValue {
        self.top.color
    }
}

/// A 1 to 4 value list of lengths.
fn edge_lengths(value: &CssValue, base: f64) -> Option<EdgeSizes> {
    let lengths: Vec<f64> = value
        .fragments()
        .iter()
        .map(|f| parse_length(f.as_token(), base))
        .collect::<Option<_>>()?;
    EdgeSizes::from_shorthand(&lengths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: f64) -> BorderSide {
        BorderSide::new(width, BorderStyle::Solid, ColorValue::BLACK)
    }

    #[test]
    fn test_config_defaults_omitted_sides() {
        let metrics = BoxMetrics::new(BorderConfig {
            top: Some(solid(4.0)),
            default: solid(1.0),
            ..BorderConfig::default()
        });
        assert_eq!(metrics.top.width, 4.0);
        assert_eq!(metrics.bottom.width, 1.0);
        assert_eq!(metrics.left, metrics.right);
    }

    #[test]
    fn test_content_rect_subtracts_all_borders() {
        let metrics = BoxMetrics::new(BorderConfig {
            top: Some(solid(1.0)),
            bottom: Some(solid(2.0)),
            left: Some(solid(3.0)),
            right: Some(solid(4.0)),
            ..BorderConfig::default()
        });
        let rect = metrics.content_rect(Point::new(10.0, 20.0), Size::new(100.0, 50.0));
        assert_eq!(rect, Rect::new(13.0, 21.0, 93.0, 47.0));
    }

    #[test]
    fn test_content_rect_never_negative() {
        let metrics = BoxMetrics::uniform(solid(30.0));
        let rect = metrics.content_rect(Point::default(), Size::new(10.0, 10.0));
        assert_eq!((rect.width, rect.height), (0.0, 0.0));
    }

    #[test]
    fn test_shorthand_expansion() {
        let two = EdgeSizes::from_shorthand(&[1.0, 2.0]).unwrap();
        assert_eq!((two.top, two.right, two.bottom, two.left), (1.0, 2.0, 1.0, 2.0));
        let three = EdgeSizes::from_shorthand(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(three.left, 2.0);
        assert!(EdgeSizes::from_shorthand(&[]).is_none());
    }

    #[test]
    fn test_invisible_borders_take_no_space() {
        let metrics = BoxMetrics::uniform(BorderSide::new(5.0, BorderStyle::None, ColorValue::BLACK));
        assert!(!metrics.has_visible_border());
        assert_eq!(metrics.outer_height(10.0), 10.0);
    }
}
