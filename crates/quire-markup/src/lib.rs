//! Markup tokenizer and element tree for the Quire styling engine.
//!
//! # Scope
//!
//! This crate implements:
//! - **Grammar table** - the tag/comment/indentation markers the scanner
//!   recognizes, built once per pipeline run and shared by every scan
//! - **Tag lines** - `<name attr="v" ...>` parsing into a tag name and raw
//!   attribute strings
//! - **Tree builder** - a line-oriented scan in which an element ends at the
//!   first closing-tag line with the same indentation as its opening line
//! - **Elements** - immutable nodes whose children are derived lazily from
//!   their inner content on first request, with weak parent back-references
//! - **Documents** - the ordered top-level elements plus the original source
//!
//! # Example
//!
//! ```
//! use quire_markup::Document;
//!
//! let doc = Document::parse("<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>\n").unwrap();
//! let list = &doc.elements()[0];
//! assert_eq!(list.tag_name(), "ul");
//! assert_eq!(list.children().len(), 2);
//! ```

/// Documents and tree dumps.
pub mod document;
/// Elements, attributes and identity sets.
pub mod element;
/// Parse errors.
pub mod error;
/// The explicit grammar table.
pub mod grammar;
/// Line-oriented tree builder.
pub mod scanner;
/// Single tag-line parsing.
pub mod tag;

pub use document::{Document, TreeDump, print_tree, write_tree};
pub use element::{Attribute, Element, ElementSet, TagName};
pub use error::MarkupError;
pub use grammar::Grammar;
pub use scanner::Scanner;
pub use tag::TagLine;
