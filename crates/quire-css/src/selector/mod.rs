//! Rule selectors and their evaluation against the element tree.
//!
//! A rule selector is one or more `.class` tokens followed by at most one
//! tag token. The tag token may carry attribute conditions and
//! pseudo-classes: `.nav li[lang|=en]:nth-child(2)`.
//!
//! The structural pseudo-classes are also exposed as free functions in
//! [`structural`]; attribute conditions in [`attribute`].

/// Attribute conditions and operators.
pub mod attribute;
/// Structural pseudo-classes as functions.
pub mod structural;

use std::rc::Rc;

use thiserror::Error;

use quire_common::text::{split_tokens, unquote};
use quire_markup::{Document, Element, ElementSet};

pub use attribute::{AttrOperator, AttributeSelector, evaluate_attribute};

/// Marker that starts a class token.
pub const CLASS_MARKER: char = '.';

/// Selector syntax errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The selector text does not follow the selector grammar.
    #[error("malformed selector '{text}': {reason}")]
    Malformed {
        /// Offending text.
        text: String,
        /// What was wrong with it.
        reason: String,
    },
    /// A `:name` that is not a supported pseudo-class.
    #[error("unknown pseudo-class ':{0}'")]
    UnknownPseudoClass(String),
    /// A pseudo-class argument that does not fit its pseudo-class.
    #[error("bad argument '{argument}' for ':{name}'")]
    BadArgument {
        /// Pseudo-class name.
        name: String,
        /// The argument as written.
        argument: String,
    },
}

/// Whether `element` is a tag whose name appears in the space-separated
/// `filter`. `*` or an empty filter accepts any tag.
#[must_use]
pub fn tag_filter_matches(filter: &str, element: &Element) -> bool {
    if element.is_text() {
        return false;
    }
    let mut names = filter.split_ascii_whitespace().peekable();
    if names.peek().is_none() {
        return true;
    }
    names.any(|name| name == "*" || element.tag().matches(name))
}

/// Argument of `:not(...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotArgument {
    /// `[key op value]`
    Attribute(AttributeSelector),
    /// `.class`
    Class(String),
    /// A bare tag name.
    Tag(String),
}

impl NotArgument {
    /// Parse the text between the parentheses of `:not(...)`.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorError`] for an empty argument or a malformed
    /// attribute condition.
    pub fn parse(text: &str) -> Result<Self, SelectorError> {
        let text = text.trim();
        if text.starts_with('[') {
            return AttributeSelector::parse(text).map(Self::Attribute);
        }
        if let Some(class) = text.strip_prefix(CLASS_MARKER) {
            if !class.is_empty() {
                return Ok(Self::Class(class.to_string()));
            }
        } else if !text.is_empty() && !text.contains(char::is_whitespace) {
            return Ok(Self::Tag(text.to_string()));
        }
        Err(SelectorError::BadArgument {
            name: "not".to_string(),
            argument: text.to_string(),
        })
    }

    /// Whether `element` is matched by the argument.
    #[must_use]
    pub fn matches(&self, element: &Element) -> bool {
        match self {
            Self::Attribute(attr) => attr.matches(element),
            Self::Class(class) => element.classes().contains(&class.as_str()),
            Self::Tag(tag) => !element.is_text() && element.tag().matches(tag),
        }
    }
}

/// A pseudo-class attached to a tag token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoClass {
    /// `:root`: the element has no parent.
    Root,
    /// `:nth-child(n)`
    NthChild(usize),
    /// `:nth-last-child(n)`
    NthLastChild(usize),
    /// `:first-child`
    FirstChild,
    /// `:last-child`
    LastChild,
    /// `:nth-of-type(n)`
    NthOfType(usize),
    /// `:nth-last-of-type(n)`
    NthLastOfType(usize),
    /// `:first-of-type`
    FirstOfType,
    /// `:last-of-type`
    LastOfType,
    /// `:only-child`
    OnlyChild,
    /// `:only-of-type`: no other element of the same tag in the parent's
    /// subtree.
    OnlyOfType,
    /// `:empty`
    Empty,
    /// `:lang(l)`: the `lang` attribute equals `l`.
    Lang(String),
    /// `:not(x)`
    Not(NotArgument),
}

impl PseudoClass {
    /// Parse a pseudo-class name and its optional parenthesized argument.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::UnknownPseudoClass`] for an unsupported name
    /// and [`SelectorError::BadArgument`] for a missing or invalid argument.
    pub fn parse(name: &str, argument: Option<&str>) -> Result<Self, SelectorError> {
        let bad = || SelectorError::BadArgument {
            name: name.to_string(),
            argument: argument.unwrap_or_default().to_string(),
        };
        let position = || {
            argument
                .and_then(|a| a.trim().parse::<usize>().ok())
                .filter(|n| *n > 0)
                .ok_or_else(bad)
        };
        let bare = |pc: Self| if argument.is_some() { Err(bad()) } else { Ok(pc) };

        match name.to_ascii_lowercase().as_str() {
            "root" => bare(Self::Root),
            "first-child" => bare(Self::FirstChild),
            "last-child" => bare(Self::LastChild),
            "first-of-type" => bare(Self::FirstOfType),
            "last-of-type" => bare(Self::LastOfType),
            "only-child" => bare(Self::OnlyChild),
            "only-of-type" => bare(Self::OnlyOfType),
            "empty" => bare(Self::Empty),
            "nth-child" => position().map(Self::NthChild),
            "nth-last-child" => position().map(Self::NthLastChild),
            "nth-of-type" => position().map(Self::NthOfType),
            "nth-last-of-type" => position().map(Self::NthLastOfType),
            "lang" => argument
                .map(|a| unquote(a.trim()))
                .filter(|a| !a.is_empty())
                .map(|a| Self::Lang(a.to_string()))
                .ok_or_else(bad),
            "not" => NotArgument::parse(argument.ok_or_else(bad)?).map(Self::Not),
            _ => Err(SelectorError::UnknownPseudoClass(name.to_string())),
        }
    }

    /// Match against `element`, whose siblings are `siblings` (element
    /// children of its parent, or the document's top-level elements).
    fn matches(&self, element: &Rc<Element>, siblings: &[Rc<Element>]) -> bool {
        let is = |found: Option<Rc<Element>>| found.is_some_and(|e| Element::same(&e, element));
        let of_type = || -> Vec<Rc<Element>> {
            siblings
                .iter()
                .filter(|s| s.tag().matches(element.tag_name()))
                .cloned()
                .collect()
        };

        match self {
            Self::Root => element.parent().is_none(),
            Self::NthChild(n) => is(structural::nth(siblings, *n)),
            Self::NthLastChild(n) => is(structural::nth_last(siblings, *n)),
            Self::FirstChild => is(structural::nth(siblings, 1)),
            Self::LastChild => is(structural::nth_last(siblings, 1)),
            Self::NthOfType(n) => is(structural::nth(&of_type(), *n)),
            Self::NthLastOfType(n) => is(structural::nth_last(&of_type(), *n)),
            Self::FirstOfType => is(structural::nth(&of_type(), 1)),
            Self::LastOfType => is(structural::nth_last(&of_type(), 1)),
            Self::OnlyChild => structural::only_child(element),
            Self::OnlyOfType => {
                let scope = element.parent().unwrap_or_else(|| Rc::clone(element));
                let same = structural::only_of_type(&scope, element.tag_name());
                same.len() == 1 && same.contains(element)
            }
            Self::Empty => structural::empty(element, element.tag_name()),
            Self::Lang(lang) => element
                .attribute("lang")
                .is_some_and(|actual| AttrOperator::Exact.compare(actual, lang)),
            Self::Not(argument) => !argument.matches(element),
        }
    }
}

/// A condition on the tag token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `[key op value]`
    Attribute(AttributeSelector),
    /// `:name` or `:name(argument)`
    Pseudo(PseudoClass),
}

/// A parsed rule selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    /// Selector text as written.
    pub text: String,
    /// Class names, without the marker.
    pub classes: Vec<String>,
    /// Tag name; `None` for class-only selectors.
    pub tag: Option<String>,
    /// Conditions attached to the tag token.
    pub predicates: Vec<Predicate>,
}

impl Selector {
    /// Parse a selector such as `.card .wide div[lang|=en]:first-child`.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorError`] if a class token is empty, a token
    /// follows the tag token, or a predicate is malformed.
    pub fn parse(text: &str) -> Result<Self, SelectorError> {
        let text = text.trim();
        let malformed = |reason: &str| SelectorError::Malformed {
            text: text.to_string(),
            reason: reason.to_string(),
        };

        let mut selector = Self {
            text: text.to_string(),
            ..Self::default()
        };
        let mut tokens = split_tokens(text).into_iter().peekable();

        while let Some(token) = tokens.next_if(|t| t.starts_with(CLASS_MARKER)) {
            for class in token.split(CLASS_MARKER).skip(1) {
                if class.is_empty() {
                    return Err(malformed("empty class name"));
                }
                selector.classes.push(class.to_string());
            }
        }

        if let Some(token) = tokens.next() {
            let (tag, predicates) = parse_compound(token)?;
            selector.tag = tag;
            selector.predicates = predicates;
        }
        if let Some(extra) = tokens.next() {
            return Err(malformed(&format!("unexpected token '{extra}' after the tag")));
        }
        Ok(selector)
    }

    /// Class names shared with `other`.
    #[must_use]
    pub fn shared_classes<'a>(&'a self, other: &Self) -> Vec<&'a str> {
        self.classes
            .iter()
            .filter(|c| other.classes.contains(c))
            .map(String::as_str)
            .collect()
    }

    /// Whether `element` satisfies the selector.
    ///
    /// Class tokens must all be present on the element; the tag (if any)
    /// must match; every predicate must hold. Structural predicates use the
    /// element's siblings, or `top_level` for an element without a parent.
    #[must_use]
    pub fn matches(&self, element: &Rc<Element>, top_level: &[Rc<Element>]) -> bool {
        if element.is_text() {
            return false;
        }
        let classes = element.classes();
        if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !tag_filter_matches(tag, element) {
                return false;
            }
        }
        if self.predicates.is_empty() {
            return true;
        }

        let siblings: Vec<Rc<Element>> = element.parent().map_or_else(
            || top_level.iter().filter(|e| !e.is_text()).cloned().collect(),
            |parent| parent.element_children(),
        );
        self.predicates.iter().all(|predicate| match predicate {
            Predicate::Attribute(attr) => attr.matches(element),
            Predicate::Pseudo(pc) => pc.matches(element, &siblings),
        })
    }

    /// Every element of `document` that satisfies the selector, in document
    /// order.
    #[must_use]
    pub fn select(&self, document: &Document) -> ElementSet {
        document
            .tagged_elements()
            .into_iter()
            .filter(|e| self.matches(e, document.elements()))
            .collect()
    }

    /// Every element of `root`'s subtree (root included) that satisfies the
    /// selector.
    #[must_use]
    pub fn select_in(&self, root: &Rc<Element>) -> ElementSet {
        let top_level = [Rc::clone(&root.root())];
        root.subtree()
            .into_iter()
            .filter(|e| self.matches(e, &top_level))
            .collect()
    }
}

/// Split a tag token into its name and predicates.
fn parse_compound(token: &str) -> Result<(Option<String>, Vec<Predicate>), SelectorError> {
    let malformed = |reason: &str| SelectorError::Malformed {
        text: token.to_string(),
        reason: reason.to_string(),
    };

    let name_end = token.find(['[', ':']).unwrap_or(token.len());
    let name = &token[..name_end];
    if name.contains(CLASS_MARKER) {
        return Err(malformed("class tokens must precede the tag"));
    }
    let tag = (!name.is_empty()).then(|| name.to_string());

    let mut predicates = Vec::new();
    let mut rest = &token[name_end..];
    while !rest.is_empty() {
        if rest.starts_with('[') {
            let end = closing(rest, '[', ']').ok_or_else(|| malformed("unclosed '['"))?;
            predicates.push(Predicate::Attribute(AttributeSelector::parse(&rest[..=end])?));
            rest = &rest[end + 1..];
        } else if let Some(after) = rest.strip_prefix(':') {
            let name_len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
                .unwrap_or(after.len());
            let name = &after[..name_len];
            if name.is_empty() {
                return Err(malformed("empty pseudo-class name"));
            }
            let tail = &after[name_len..];
            if tail.starts_with('(') {
                let end = closing(tail, '(', ')').ok_or_else(|| malformed("unclosed '('"))?;
                predicates.push(Predicate::Pseudo(PseudoClass::parse(name, Some(&tail[1..end]))?));
                rest = &tail[end + 1..];
            } else {
                predicates.push(Predicate::Pseudo(PseudoClass::parse(name, None)?));
                rest = tail;
            }
        } else {
            return Err(malformed(&format!("unexpected '{rest}'")));
        }
    }
    Ok((tag, predicates))
}

/// Byte index of the bracket closing the one that opens `text`, skipping
/// quoted runs.
fn closing(text: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, c) if c == open => depth += 1,
            (None, c) if c == close => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classes_and_tag() {
        let sel = Selector::parse(".card .wide div").unwrap();
        assert_eq!(sel.classes, vec!["card", "wide"]);
        assert_eq!(sel.tag.as_deref(), Some("div"));
        assert!(sel.predicates.is_empty());

        let joined = Selector::parse(".a.b").unwrap();
        assert_eq!(joined.classes, vec!["a", "b"]);
        assert_eq!(joined.tag, None);
    }

    #[test]
    fn test_parse_predicates() {
        let sel = Selector::parse(".x li[lang|=\"en\"]:nth-child(2):not([hidden])").unwrap();
        assert_eq!(sel.tag.as_deref(), Some("li"));
        assert_eq!(sel.predicates.len(), 3);
        assert!(matches!(&sel.predicates[0], Predicate::Attribute(a) if a.op == AttrOperator::DashMatch));
        assert_eq!(sel.predicates[1], Predicate::Pseudo(PseudoClass::NthChild(2)));
        assert!(matches!(
            &sel.predicates[2],
            Predicate::Pseudo(PseudoClass::Not(NotArgument::Attribute(_)))
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Selector::parse(". p"), Err(SelectorError::Malformed { .. })));
        assert!(matches!(Selector::parse(".a p span"), Err(SelectorError::Malformed { .. })));
        assert!(matches!(Selector::parse(".a p:hover"), Err(SelectorError::UnknownPseudoClass(_))));
        assert!(matches!(Selector::parse(".a p:nth-child(0)"), Err(SelectorError::BadArgument { .. })));
        assert!(matches!(Selector::parse(".a p:root(1)"), Err(SelectorError::BadArgument { .. })));
        assert!(matches!(Selector::parse(".a p[lang"), Err(SelectorError::Malformed { .. })));
    }

    #[test]
    fn test_shared_classes() {
        let a = Selector::parse(".one .two").unwrap();
        let b = Selector::parse(".two .three p").unwrap();
        assert_eq!(a.shared_classes(&b), vec!["two"]);
    }

    #[test]
    fn test_closing_skips_quotes() {
        assert_eq!(closing("[a=\"]\"]", '[', ']'), Some(6));
        assert_eq!(closing("(a(b))x", '(', ')'), Some(5));
        assert_eq!(closing("(a", '(', ')'), None);
    }
}
