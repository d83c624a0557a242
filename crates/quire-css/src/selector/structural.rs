//! Structural pseudo-classes as plain functions over the element tree.
//!
//! Positions are 1-based and count element children only; text runs are
//! skipped. A position of 0 or past the end yields `None`.

use std::rc::Rc;

use quire_markup::{Element, ElementSet};

use super::attribute::{AttrOperator, AttributeSelector, evaluate_attribute};
use super::{NotArgument, SelectorError, tag_filter_matches};

/// The topmost ancestor of `element` (itself if it has no parent).
#[must_use]
pub fn root(element: &Rc<Element>) -> Rc<Element> {
    element.root()
}

/// `list[n - 1]`, 1-based.
pub(crate) fn nth(list: &[Rc<Element>], n: usize) -> Option<Rc<Element>> {
    n.checked_sub(1).and_then(|i| list.get(i)).cloned()
}

/// The `n`-th element from the end, 1-based.
pub(crate) fn nth_last(list: &[Rc<Element>], n: usize) -> Option<Rc<Element>> {
    n.checked_sub(1)
        .and_then(|i| list.iter().rev().nth(i))
        .cloned()
}

fn children_of_type(parent: &Rc<Element>, tag: &str) -> Vec<Rc<Element>> {
    parent
        .element_children()
        .into_iter()
        .filter(|c| tag_filter_matches(tag, c))
        .collect()
}

/// The `n`-th element child of `parent`.
#[must_use]
pub fn nth_child(parent: &Rc<Element>, n: usize) -> Option<Rc<Element>> {
    nth(&parent.element_children(), n)
}

/// The `n`-th element child of `parent`, counting from the last.
#[must_use]
pub fn nth_last_child(parent: &Rc<Element>, n: usize) -> Option<Rc<Element>> {
    nth_last(&parent.element_children(), n)
}

/// `nth_child(parent, 1)`
#[must_use]
pub fn first_child(parent: &Rc<Element>) -> Option<Rc<Element>> {
    nth_child(parent, 1)
}

/// `nth_last_child(parent, 1)`
#[must_use]
pub fn last_child(parent: &Rc<Element>) -> Option<Rc<Element>> {
    nth_last_child(parent, 1)
}

/// The `n`-th child of `parent` whose tag is `tag`.
#[must_use]
pub fn nth_of_type(parent: &Rc<Element>, tag: &str, n: usize) -> Option<Rc<Element>> {
    nth(&children_of_type(parent, tag), n)
}

/// The `n`-th child of `parent` whose tag is `tag`, counting from the last.
#[must_use]
pub fn nth_last_of_type(parent: &Rc<Element>, tag: &str, n: usize) -> Option<Rc<Element>> {
    nth_last(&children_of_type(parent, tag), n)
}

/// `nth_of_type(parent, tag, 1)`
#[must_use]
pub fn first_of_type(parent: &Rc<Element>, tag: &str) -> Option<Rc<Element>> {
    nth_of_type(parent, tag, 1)
}

/// `nth_last_of_type(parent, tag, 1)`
#[must_use]
pub fn last_of_type(parent: &Rc<Element>, tag: &str) -> Option<Rc<Element>> {
    nth_last_of_type(parent, tag, 1)
}

/// Whether `element` is its parent's single element child. An element
/// without a parent is never an only child.
#[must_use]
pub fn only_child(element: &Rc<Element>) -> bool {
    element.parent().is_some_and(|parent| {
        let children = parent.element_children();
        children.len() == 1 && Element::same(&children[0], element)
    })
}

/// Every element with tag `tag` anywhere in `root`'s subtree, `root`
/// included.
#[must_use]
pub fn only_of_type(root: &Rc<Element>, tag: &str) -> ElementSet {
    root.subtree()
        .into_iter()
        .filter(|e| !e.is_text() && e.tag().matches(tag))
        .collect()
}

/// Whether `element` has tag `tag` and no content (or only a single
/// comment), or is a void element of its grammar.
#[must_use]
pub fn empty(element: &Element, tag: &str) -> bool {
    if element.is_text() {
        return false;
    }
    let grammar = element.grammar();
    let content = element.content().trim();
    (tag_filter_matches(tag, element) && (content.is_empty() || grammar.is_single_comment(content)))
        || grammar.is_void(element.tag_name())
}

/// Elements of `root`'s subtree passing `filter` whose `lang` equals `lang`.
#[must_use]
pub fn lang(root: &Rc<Element>, filter: &str, lang: &str) -> ElementSet {
    evaluate_attribute(AttrOperator::Exact, filter, "lang", lang, root)
}

/// Elements of `root`'s subtree passing `filter`, minus those matched by
/// `expr`: a bracketed attribute condition, a `.class`, or a bare tag name.
///
/// # Errors
///
/// Returns a [`SelectorError`] if `expr` is empty or a malformed attribute
/// condition.
pub fn not(root: &Rc<Element>, filter: &str, expr: &str) -> Result<ElementSet, SelectorError> {
    let excluded = match NotArgument::parse(expr)? {
        NotArgument::Attribute(AttributeSelector { key, op, value }) => {
            evaluate_attribute(op, filter, &key, &value, root)
        }
        argument => root
            .subtree()
            .into_iter()
            .filter(|e| argument.matches(e))
            .collect(),
    };
    Ok(root
        .subtree()
        .into_iter()
        .filter(|e| tag_filter_matches(filter, e) && !excluded.contains(e))
        .collect())
}
