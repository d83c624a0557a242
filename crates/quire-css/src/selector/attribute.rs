//! Attribute selectors: `[key]`, `[key=value]`, `[key|=value]`, and so on.

use std::rc::Rc;

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use quire_common::text::unquote;
use quire_markup::{Element, ElementSet};

use super::{SelectorError, tag_filter_matches};

/// How an attribute value is compared against the selector's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
pub enum AttrOperator {
    /// The attribute is present; its value is ignored.
    #[strum(serialize = "any")]
    Any,
    /// Exact equality.
    #[strum(serialize = "=")]
    Exact,
    /// Equal, or a prefix followed by `-` (`en` matches `en-US`).
    #[strum(serialize = "|=")]
    DashMatch,
    /// One whitespace-separated word equals the value.
    #[strum(serialize = "~=")]
    Includes,
    /// Starts with.
    #[strum(serialize = "^=")]
    Prefix,
    /// Ends with.
    #[strum(serialize = "$=")]
    Suffix,
    /// Contains.
    #[strum(serialize = "*=")]
    Substring,
}

impl AttrOperator {
    /// Compare an element's `actual` attribute value against `expected`.
    #[must_use]
    pub fn compare(self, actual: &str, expected: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact => actual == expected,
            Self::DashMatch => {
                actual == expected
                    || actual
                        .strip_prefix(expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            Self::Includes => actual.split_ascii_whitespace().any(|word| word == expected),
            Self::Prefix => actual.starts_with(expected),
            Self::Suffix => actual.ends_with(expected),
            Self::Substring => actual.contains(expected),
        }
    }
}

/// A parsed `[key op value]` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    /// Attribute key.
    pub key: String,
    /// Comparison.
    pub op: AttrOperator,
    /// Expected value; empty for [`AttrOperator::Any`].
    pub value: String,
}

impl AttributeSelector {
    /// Parse a bracketed condition such as `[lang|="en"]` or `[href]`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::Malformed`] if the brackets are missing or
    /// the key is empty.
    pub fn parse(text: &str) -> Result<Self, SelectorError> {
        let malformed = |reason: &str| SelectorError::Malformed {
            text: text.to_string(),
            reason: reason.to_string(),
        };
        let inner = text
            .trim()
            .strip_prefix('[')
            .and_then(|t| t.strip_suffix(']'))
            .ok_or_else(|| malformed("expected [key op value]"))?;

        let (key, op, value) = match inner.find('=') {
            None => (inner, AttrOperator::Any, ""),
            Some(eq) => {
                let (key_end, op) = match inner[..eq].chars().last() {
                    Some(c @ ('|' | '~' | '^' | '$' | '*')) => {
                        let op = format!("{c}=")
                            .parse::<AttrOperator>()
                            .map_err(|_| malformed("unknown operator"))?;
                        (eq - c.len_utf8(), op)
                    }
                    _ => (eq, AttrOperator::Exact),
                };
                (&inner[..key_end], op, unquote(inner[eq + 1..].trim()))
            }
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(malformed("empty attribute key"));
        }
        Ok(Self {
            key: key.to_string(),
            op,
            value: value.to_string(),
        })
    }

    /// Whether `element` carries the key and its first value satisfies the
    /// comparison.
    #[must_use]
    pub fn matches(&self, element: &Element) -> bool {
        element
            .attribute(&self.key)
            .is_some_and(|actual| self.op.compare(actual, &self.value))
    }
}

/// Every element of `root`'s subtree (root included) whose tag passes
/// `filter` and whose attribute `key` satisfies `op` against `value`.
///
/// `filter` is a space-separated list of tag names; `*` or an empty filter
/// accepts any tag.
#[must_use]
pub fn evaluate_attribute(
    op: AttrOperator,
    filter: &str,
    key: &str,
    value: &str,
    root: &Rc<Element>,
) -> ElementSet {
    root.subtree()
        .into_iter()
        .filter(|e| tag_filter_matches(filter, e))
        .filter(|e| e.attribute(key).is_some_and(|actual| op.compare(actual, value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_operator_symbols() {
        let symbols: Vec<String> = AttrOperator::iter().map(|op| op.to_string()).collect();
        assert_eq!(symbols, vec!["any", "=", "|=", "~=", "^=", "$=", "*="]);
        assert_eq!("~=".parse::<AttrOperator>(), Ok(AttrOperator::Includes));
    }

    #[test]
    fn test_dash_match() {
        assert!(AttrOperator::DashMatch.compare("en-US", "en"));
        assert!(AttrOperator::DashMatch.compare("en", "en"));
        assert!(!AttrOperator::DashMatch.compare("english", "en"));
    }

    #[test]
    fn test_includes() {
        assert!(AttrOperator::Includes.compare("a b c", "b"));
        assert!(!AttrOperator::Includes.compare("a bc", "b"));
    }

    #[test]
    fn test_affix_operators() {
        assert!(AttrOperator::Prefix.compare("https://x", "https"));
        assert!(AttrOperator::Suffix.compare("photo.png", ".png"));
        assert!(AttrOperator::Substring.compare("my-dark-mode", "dark"));
        assert!(!AttrOperator::Exact.compare("a", "b"));
    }

    #[test]
    fn test_parse() {
        let sel = AttributeSelector::parse("[lang|=\"en\"]").unwrap();
        assert_eq!(sel.key, "lang");
        assert_eq!(sel.op, AttrOperator::DashMatch);
        assert_eq!(sel.value, "en");

        let any = AttributeSelector::parse("[href]").unwrap();
        assert_eq!(any.op, AttrOperator::Any);

        let exact = AttributeSelector::parse("[type=text]").unwrap();
        assert_eq!((exact.op, exact.value.as_str()), (AttrOperator::Exact, "text"));

        assert!(AttributeSelector::parse("[=x]").is_err());
        assert!(AttributeSelector::parse("lang=x").is_err());
    }
}
