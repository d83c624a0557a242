use std::cell::OnceCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use quire_common::text::unquote;
use quire_common::warning::warn_once;

use crate::grammar::Grammar;
use crate::scanner::Scanner;

/// A tag name. Empty for a pure text run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TagName(String);

impl TagName {
    /// Wrap a tag name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The tag name as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this names a text run rather than a tag.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.0.is_empty()
    }

    /// ASCII case-insensitive comparison against `name`.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One raw attribute string from a tag, e.g. `class="a b"` or `hidden`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    raw: String,
}

impl Attribute {
    /// Wrap a raw attribute token.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The attribute exactly as it appeared in the tag.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Text before the first `=`, or the whole token for a boolean attribute.
    #[must_use]
    pub fn key(&self) -> &str {
        self.raw
            .split_once('=')
            .map_or(self.raw.as_str(), |(k, _)| k)
            .trim()
    }

    /// Text after the first `=` with surrounding quotes removed; empty for a
    /// boolean attribute.
    #[must_use]
    pub fn value(&self) -> &str {
        self.raw
            .split_once('=')
            .map_or("", |(_, v)| unquote(v.trim()))
    }
}

/// One node of the parsed markup tree.
///
/// Elements are immutable once scanned. Their children are derived from the
/// stored inner content the first time [`Element::children`] is called and
/// memoized from then on, so repeated calls return the very same `Rc`s. Each
/// derived child gets a weak reference back to this element at that time.
pub struct Element {
    tag: TagName,
    attributes: Vec<Attribute>,
    closed: bool,
    content: String,
    line: usize,
    grammar: Rc<Grammar>,
    children: OnceCell<Vec<Rc<Element>>>,
    parent: OnceCell<Weak<Element>>,
}

impl Element {
    pub(crate) fn new(
        tag: TagName,
        attributes: Vec<Attribute>,
        closed: bool,
        content: String,
        line: usize,
        grammar: Rc<Grammar>,
    ) -> Rc<Self> {
        Rc::new(Self {
            tag,
            attributes,
            closed,
            content,
            line,
            grammar,
            children: OnceCell::new(),
            parent: OnceCell::new(),
        })
    }

    /// Create a content-only text run.
    pub(crate) fn text_run(content: String, line: usize, grammar: Rc<Grammar>) -> Rc<Self> {
        Self::new(TagName::default(), Vec::new(), true, content, line, grammar)
    }

    /// The tag name; empty for a text run.
    #[must_use]
    pub fn tag_name(&self) -> &str {
        self.tag.as_str()
    }

    /// The tag name as a typed value.
    #[must_use]
    pub const fn tag(&self) -> &TagName {
        &self.tag
    }

    /// Whether this element is a pure text run.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.tag.is_text()
    }

    /// Text content of a text run; `None` for tagged elements.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.is_text().then_some(self.content.as_str())
    }

    /// Raw attributes in source order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Value of the first attribute whose key is `key`.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key() == key)
            .map(Attribute::value)
    }

    /// Whether the element carries attribute `key` at all.
    #[must_use]
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.iter().any(|a| a.key() == key)
    }

    /// Whitespace-separated tokens of the `class` attribute.
    #[must_use]
    pub fn classes(&self) -> Vec<&str> {
        self.attribute("class")
            .map(|c| c.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    /// Whether the element was terminated by an end tag, an inline end tag,
    /// or a self-closing form. `false` only when input ended while it was
    /// still open.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Raw inner content, unparsed.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// 1-based source line the element starts on.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Child elements, derived from the inner content on first request.
    ///
    /// Text runs never have children.
    #[must_use]
    pub fn children(self: &Rc<Self>) -> &[Rc<Self>] {
        self.children.get_or_init(|| {
            if self.is_text() || self.content.trim().is_empty() {
                return Vec::new();
            }
            let scanner = Scanner::new(Rc::clone(&self.grammar));
            match scanner.scan_from(&self.content, self.line) {
                Ok(children) => {
                    for child in &children {
                        let _ = child.parent.set(Rc::downgrade(self));
                    }
                    children
                }
                Err(err) => {
                    warn_once("markup", &format!("<{}>: {err}", self.tag));
                    Vec::new()
                }
            }
        })
    }

    /// Whether [`Element::children`] has already been derived.
    #[must_use]
    pub fn children_derived(&self) -> bool {
        self.children.get().is_some()
    }

    /// Child elements that are tags (text runs skipped).
    #[must_use]
    pub fn element_children(self: &Rc<Self>) -> Vec<Rc<Self>> {
        self.children()
            .iter()
            .filter(|c| !c.is_text())
            .cloned()
            .collect()
    }

    /// The parent element, if this element was derived as a child and the
    /// parent is still alive.
    #[must_use]
    pub fn parent(&self) -> Option<Rc<Self>> {
        self.parent.get().and_then(Weak::upgrade)
    }

    /// Walk parent references to the top.
    #[must_use]
    pub fn root(self: &Rc<Self>) -> Rc<Self> {
        let mut current = Rc::clone(self);
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// All descendants in document order (depth-first), deriving children as
    /// needed. Does not include `self`.
    #[must_use]
    pub fn descendants(self: &Rc<Self>) -> Vec<Rc<Self>> {
        let mut out = Vec::new();
        collect_descendants(self, &mut out);
        out
    }

    /// `self` followed by [`Element::descendants`].
    #[must_use]
    pub fn subtree(self: &Rc<Self>) -> Vec<Rc<Self>> {
        let mut out = vec![Rc::clone(self)];
        collect_descendants(self, &mut out);
        out
    }

    /// The grammar this element was scanned with.
    #[must_use]
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Identity comparison.
    #[must_use]
    pub fn same(a: &Rc<Self>, b: &Rc<Self>) -> bool {
        Rc::ptr_eq(a, b)
    }
}

fn collect_descendants(element: &Rc<Element>, out: &mut Vec<Rc<Element>>) {
    for child in element.children() {
        out.push(Rc::clone(child));
        collect_descendants(child, out);
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag.as_str())
            .field("attributes", &self.attributes)
            .field("closed", &self.closed)
            .field("line", &self.line)
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}

/// An insertion-ordered set of elements, deduplicated by identity.
///
/// Two structurally equal elements at different places in the tree are
/// distinct members.
#[derive(Debug, Clone, Default)]
pub struct ElementSet {
    items: Vec<Rc<Element>>,
    seen: HashSet<*const Element>,
}

impl ElementSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `element`; returns `false` if it was already present.
    pub fn insert(&mut self, element: Rc<Element>) -> bool {
        if self.seen.insert(Rc::as_ptr(&element)) {
            self.items.push(element);
            true
        } else {
            false
        }
    }

    /// Identity membership test.
    #[must_use]
    pub fn contains(&self, element: &Rc<Element>) -> bool {
        self.seen.contains(&Rc::as_ptr(element))
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First member in insertion order.
    #[must_use]
    pub fn first(&self) -> Option<&Rc<Element>> {
        self.items.first()
    }

    /// Members in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Rc<Element>> {
        self.items.iter()
    }

    /// Members as a slice, in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[Rc<Element>] {
        &self.items
    }

    /// Consume the set into its ordered members.
    #[must_use]
    pub fn into_vec(self) -> Vec<Rc<Element>> {
        self.items
    }
}

impl FromIterator<Rc<Element>> for ElementSet {
    fn from_iter<I: IntoIterator<Item = Rc<Element>>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<Rc<Element>> for ElementSet {
    fn extend<I: IntoIterator<Item = Rc<Element>>>(&mut self, iter: I) {
        for element in iter {
            let _ = self.insert(element);
        }
    }
}

impl IntoIterator for ElementSet {
    type Item = Rc<Element>;
    type IntoIter = std::vec::IntoIter<Rc<Element>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ElementSet {
    type Item = &'a Rc<Element>;
    type IntoIter = std::slice::Iter<'a, Rc<Element>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_accessors() {
        let a = Attribute::new(r#"lang="en-US""#);
        assert_eq!(a.key(), "lang");
        assert_eq!(a.value(), "en-US");

        let b = Attribute::new("disabled");
        assert_eq!(b.key(), "disabled");
        assert_eq!(b.value(), "");

        let c = Attribute::new("data-x=a=b");
        assert_eq!(c.key(), "data-x");
        assert_eq!(c.value(), "a=b");
    }

    #[test]
    fn test_tag_name() {
        assert!(TagName::default().is_text());
        assert!(TagName::new("DIV").matches("div"));
        assert_eq!(TagName::new("p").to_string(), "p");
    }

    #[test]
    fn test_element_set_dedups_by_identity() {
        let grammar = Rc::new(Grammar::html());
        let a = Element::text_run("x".to_string(), 1, Rc::clone(&grammar));
        let b = Element::text_run("x".to_string(), 1, grammar);

        let mut set = ElementSet::new();
        assert!(set.insert(Rc::clone(&a)));
        assert!(!set.insert(Rc::clone(&a)));
        assert!(set.insert(Rc::clone(&b)));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
    }
}
