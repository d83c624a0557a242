use quire_common::text::split_tokens;

use crate::element::Attribute;
use crate::error::MarkupError;
use crate::grammar::Grammar;

/// One parsed `<name attr ...>` / `</name>` / `<name ... />` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLine {
    /// Tag name (first token inside the brackets).
    pub name: String,
    /// Remaining tokens, split on whitespace (quote-aware).
    pub attributes: Vec<Attribute>,
    /// `</name>` form.
    pub end_tag: bool,
    /// `<name ... />` form.
    pub self_closing: bool,
    /// Byte offset just past the terminating `>`.
    pub end: usize,
}

impl TagLine {
    /// Parse the tag at the start of `text` (leading whitespace allowed).
    ///
    /// # Errors
    ///
    /// Returns [`MarkupError::UnterminatedTag`] if no `>` follows the tag
    /// opener.
    pub fn parse(text: &str, grammar: &Grammar, line: usize) -> Result<Self, MarkupError> {
        let leading = text.len() - text.trim_start().len();
        let text_trimmed = text.trim_start();

        let Some(close) = text_trimmed.find(grammar.tag_close) else {
            return Err(MarkupError::UnterminatedTag {
                line,
                text: text.trim().to_string(),
            });
        };

        let inner = text_trimmed[..close]
            .strip_prefix(grammar.tag_open)
            .unwrap_or(&text_trimmed[..close]);

        let end_tag = inner.starts_with(grammar.end_marker);
        let inner = inner.trim_start_matches(grammar.end_marker).trim();
        let self_closing = inner.ends_with(grammar.end_marker);
        let inner = inner.trim_end_matches(grammar.end_marker).trim_end();

        let mut tokens = split_tokens(inner).into_iter();
        let name = tokens.next().unwrap_or_default().to_string();
        let attributes = tokens.map(Attribute::new).collect();

        Ok(Self {
            name,
            attributes,
            end_tag,
            self_closing,
            end: leading + close + grammar.tag_close.len_utf8(),
        })
    }
}
