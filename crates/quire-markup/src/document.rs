use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Serialize;

use crate::element::{Attribute, Element};
use crate::error::MarkupError;
use crate::grammar::Grammar;
use crate::scanner::Scanner;

/// A parsed markup document: its top-level elements plus the original source.
///
/// The source is kept for diagnostics and dumps; it is never re-parsed.
#[derive(Debug)]
pub struct Document {
    source: String,
    path: Option<PathBuf>,
    grammar: Rc<Grammar>,
    elements: Vec<Rc<Element>>,
}

impl Document {
    /// Parse `source` with the default grammar.
    ///
    /// # Errors
    ///
    /// Returns [`MarkupError::UnterminatedTag`] if any tag line lacks `>`.
    pub fn parse(source: &str) -> Result<Self, MarkupError> {
        Self::parse_with_grammar(source, Rc::new(Grammar::html()))
    }

    /// Parse `source` with an explicit grammar table.
    ///
    /// # Errors
    ///
    /// Returns [`MarkupError::UnterminatedTag`] if any tag line lacks `>`.
    pub fn parse_with_grammar(source: &str, grammar: Rc<Grammar>) -> Result<Self, MarkupError> {
        let elements = Scanner::new(Rc::clone(&grammar)).scan(source)?;
        Ok(Self {
            source: source.to_string(),
            path: None,
            grammar,
            elements,
        })
    }

    /// Read and parse the markup file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MarkupError::Io`] if the file cannot be read, or a parse
    /// error as for [`Document::parse`].
    pub fn load(path: impl AsRef<Path>, grammar: Rc<Grammar>) -> Result<Self, MarkupError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| MarkupError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut doc = Self::parse_with_grammar(&source, grammar)?;
        doc.path = Some(path.to_path_buf());
        Ok(doc)
    }

    /// The original markup text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Path the document was loaded from, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The grammar the document was scanned with.
    #[must_use]
    pub fn grammar(&self) -> &Rc<Grammar> {
        &self.grammar
    }

    /// Top-level elements in source order.
    #[must_use]
    pub fn elements(&self) -> &[Rc<Element>] {
        &self.elements
    }

    /// Every element of the document in depth-first document order,
    /// text runs included.
    #[must_use]
    pub fn descendants(&self) -> Vec<Rc<Element>> {
        self.elements.iter().flat_map(Element::subtree).collect()
    }

    /// Every tagged element (text runs skipped), in document order.
    #[must_use]
    pub fn tagged_elements(&self) -> Vec<Rc<Element>> {
        self.descendants()
            .into_iter()
            .filter(|e| !e.is_text())
            .collect()
    }

    /// Top-level elements that are tags (text runs skipped).
    #[must_use]
    pub fn top_level_tags(&self) -> Vec<Rc<Element>> {
        self.elements
            .iter()
            .filter(|e| !e.is_text())
            .cloned()
            .collect()
    }

    /// A serializable snapshot of the whole tree.
    #[must_use]
    pub fn dump(&self) -> Vec<TreeDump> {
        self.elements.iter().map(TreeDump::from_element).collect()
    }
}

/// Serializable view of an element and its derived children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeDump {
    /// Tag name; empty for text runs.
    pub tag: String,
    /// `(key, value)` pairs in source order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
    /// Text of a text run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Source line.
    pub line: usize,
    /// Derived children.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeDump>,
}

impl TreeDump {
    /// Snapshot `element`, deriving children as needed.
    #[must_use]
    pub fn from_element(element: &Rc<Element>) -> Self {
        Self {
            tag: element.tag_name().to_string(),
            attributes: element
                .attributes()
                .iter()
                .map(|a| (a.key().to_string(), a.value().to_string()))
                .collect(),
            text: element.text().map(str::to_string),
            line: element.line(),
            children: element.children().iter().map(Self::from_element).collect(),
        }
    }
}

/// Append an indented outline of `element` and its subtree to `out`.
pub fn write_tree(out: &mut String, element: &Rc<Element>, indent: usize) {
    let prefix = "  ".repeat(indent);
    if let Some(text) = element.text() {
        let display = text.replace('\n', "\\n").replace(' ', "\u{00B7}");
        let _ = writeln!(out, "{prefix}\"{display}\"");
    } else if element.attributes().is_empty() {
        let _ = writeln!(out, "{prefix}<{}>", element.tag_name());
    } else {
        let attrs: Vec<&str> = element.attributes().iter().map(Attribute::raw).collect();
        let _ = writeln!(out, "{prefix}<{} {}>", element.tag_name(), attrs.join(" "));
    }
    for child in element.children() {
        write_tree(out, child, indent + 1);
    }
}

/// Print an indented outline of the document to stdout.
pub fn print_tree(document: &Document) {
    let mut out = String::new();
    for element in document.elements() {
        write_tree(&mut out, element, 0);
    }
    print!("{out}");
}
