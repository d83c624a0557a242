/// Markers and keyword tables the scanner works from.
///
/// Built once at pipeline start and shared (via `Rc`) by the top-level scan
/// and every lazy child derivation, so a document is always re-scanned with
/// the grammar it was first parsed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    /// Opens a tag: `<`.
    pub tag_open: char,
    /// Closes a tag: `>`.
    pub tag_close: char,
    /// Follows `tag_open` in an end tag and precedes `tag_close` in a
    /// self-closing tag: `/`.
    pub end_marker: char,
    /// Starts a comment: `<!--`.
    pub comment_open: String,
    /// Ends a comment: `-->`.
    pub comment_close: String,
    /// Character counted for indentation.
    pub indent_char: char,
    /// Tags that never have content and complete on their own line.
    pub void_elements: Vec<String>,
}

impl Grammar {
    /// The HTML-like grammar used by default.
    #[must_use]
    pub fn html() -> Self {
        Self {
            tag_open: '<',
            tag_close: '>',
            end_marker: '/',
            comment_open: "<!--".to_string(),
            comment_close: "-->".to_string(),
            indent_char: ' ',
            void_elements: ["br", "input", "!DOCTYPE", "meta"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    /// Whether `name` is one of the void (self-closing) tag names.
    #[must_use]
    pub fn is_void(&self, name: &str) -> bool {
        self.void_elements
            .iter()
            .any(|v| v.eq_ignore_ascii_case(name))
    }

    /// Whether a trimmed line is a comment.
    #[must_use]
    pub fn is_comment(&self, trimmed: &str) -> bool {
        trimmed.starts_with(self.comment_open.as_str())
    }

    /// Whether `text` consists of exactly one comment and nothing else.
    #[must_use]
    pub fn is_single_comment(&self, text: &str) -> bool {
        let trimmed = text.trim();
        trimmed.starts_with(self.comment_open.as_str())
            && trimmed.ends_with(self.comment_close.as_str())
            && trimmed.len() >= self.comment_open.len() + self.comment_close.len()
            && trimmed[self.comment_open.len()..].find(self.comment_close.as_str())
                == Some(trimmed.len() - self.comment_open.len() - self.comment_close.len())
    }

    /// Whether a trimmed line starts with an end tag (`</`).
    #[must_use]
    pub fn is_end_tag_line(&self, trimmed: &str) -> bool {
        let mut chars = trimmed.chars();
        chars.next() == Some(self.tag_open) && chars.next() == Some(self.end_marker)
    }

    /// Whether a trimmed line starts with a start tag (`<name`).
    #[must_use]
    pub fn is_start_tag_line(&self, trimmed: &str) -> bool {
        trimmed.starts_with(self.tag_open)
            && !self.is_end_tag_line(trimmed)
            && !self.is_comment(trimmed)
    }

    /// The end-tag prefix for `name`, e.g. `</p`.
    #[must_use]
    pub fn end_tag_prefix(&self, name: &str) -> String {
        format!("{}{}{name}", self.tag_open, self.end_marker)
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::html()
    }
}
