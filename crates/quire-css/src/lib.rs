//! Stylesheet parsing, selector evaluation, cascade, and box metrics for the
//! Quire styling engine.
//!
//! # Scope
//!
//! This crate implements:
//! - **Stylesheet parser** - a line-based reader of `.class tag { key: value; }`
//!   blocks into [`StyleRule`]s
//! - **Rule links** - rules sharing a class token are linked when merged into
//!   a [`Stylesheet`], forming the graph the cascade walks
//! - **Selectors** - class tokens, a tag filter, attribute conditions
//!   (`=`, `|=`, `~=`, `^=`, `$=`, `*=`) and structural pseudo-classes
//! - **Cascade** - first-found resolution over the rule links, breadth-first
//! - **Values** - lengths (`px`, `em`, `%` with one arithmetic operand),
//!   colors, fonts, and borders
//! - **Box metrics** - four border sides plus margins, and the content
//!   rectangle they leave
//!
//! # Example
//!
//! ```
//! use quire_css::{Stylesheet, compute_styles};
//! use quire_markup::Document;
//!
//! let doc = Document::parse("<p class=\"note\">hi</p>\n").unwrap();
//! let sheet = Stylesheet::parse(".note p {\n  font-size: 2em;\n}\n").unwrap();
//! let styled = compute_styles(&doc, &sheet);
//! assert_eq!(styled[0].style(&sheet).length("font-size", 10.0), Some(20.0));
//! ```
//!
//! # Not Implemented
//!
//! - Specificity ordering
//! - Descendant and sibling combinators
//! - At-rules and media queries

/// Cascade resolution and per-element styles.
pub mod cascade;
/// Box geometry: borders, margins, content rectangle.
pub mod layout;
/// Stylesheet parser and rule registry.
pub mod parser;
/// Rule selectors, attribute conditions, structural pseudo-classes.
pub mod selector;
/// Typed declaration values.
pub mod values;

pub use cascade::{ElementStyle, StyleDump, StyledElement, compute_styles, matching_rules, resolve};
pub use layout::{BorderConfig, BoxMetrics, EdgeSizes, Point, Rect, Size};
pub use parser::{Declaration, RuleId, StyleRule, Stylesheet, StylesheetError, parse_rules};
pub use selector::{AttrOperator, AttributeSelector, PseudoClass, Selector, SelectorError};
pub use values::{
    BorderSide, BorderStyle, ColorCode, ColorValue, CssValue, DEFAULT_FONT_SIZE, FontDescriptor,
    FontFamily, FontStyle, resolve_length,
};
