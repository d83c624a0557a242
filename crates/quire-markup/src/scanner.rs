use std::borrow::Cow;
use std::rc::Rc;

use quire_common::text::indentation;
use quire_common::warning::warn_once;

use crate::element::{Element, TagName};
use crate::error::MarkupError;
use crate::grammar::Grammar;
use crate::tag::TagLine;

/// An element whose end tag has not been seen yet.
struct OpenElement {
    tag: TagLine,
    indent: usize,
    line: usize,
    content: String,
}

/// Output of one scan level: finished elements, the pending text run and
/// whether a comment is still open.
#[derive(Default)]
struct Level {
    elements: Vec<Rc<Element>>,
    text: String,
    text_line: usize,
    in_comment: bool,
}

/// Line-oriented tree builder.
///
/// A start-tag line at the current nesting level opens an element; every
/// following line is appended verbatim to that element's inner content until
/// an end-tag line appears with exactly the same indentation as the start tag.
/// The end tag's name is not compared: indentation alone decides where an
/// element ends, and an end tag at a different depth is ordinary content.
///
/// Only one level is built per scan. Nested elements stay inside their
/// parent's content and are produced by a fresh scan when
/// [`Element::children`] is first called.
#[derive(Debug, Clone)]
pub struct Scanner {
    grammar: Rc<Grammar>,
}

impl Scanner {
    /// Create a scanner over `grammar`.
    #[must_use]
    pub const fn new(grammar: Rc<Grammar>) -> Self {
        Self { grammar }
    }

    /// The grammar this scanner uses.
    #[must_use]
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Scan `source` into its top-level elements.
    ///
    /// # Errors
    ///
    /// Returns [`MarkupError::UnterminatedTag`] if any tag line in `source`,
    /// at any depth, lacks its closing `>`.
    pub fn scan(&self, source: &str) -> Result<Vec<Rc<Element>>, MarkupError> {
        self.scan_from(source, 0)
    }

    /// Like [`Scanner::scan`], numbering lines after `base_line`.
    ///
    /// # Errors
    ///
    /// See [`Scanner::scan`].
    pub fn scan_from(
        &self,
        source: &str,
        base_line: usize,
    ) -> Result<Vec<Rc<Element>>, MarkupError> {
        let grammar = &*self.grammar;
        let mut level = Level::default();
        let mut open: Option<OpenElement> = None;

        for (idx, raw) in source.split_inclusive('\n').enumerate() {
            let line_no = base_line + idx + 1;
            let body = raw.trim_end_matches(['\n', '\r']);
            let trimmed = body.trim();
            let indent = indentation(body, grammar.indent_char);

            if open.is_none() && level.in_comment {
                self.push_text(body, line_no, &mut level);
                continue;
            }

            // Tag lines are validated at every depth so that a later lazy
            // child scan of accepted content cannot fail.
            self.validate_chain(trimmed, line_no)?;

            if let Some(current) = open.as_mut() {
                if grammar.is_end_tag_line(trimmed) && indent == current.indent {
                    let tag = TagLine::parse(trimmed, grammar, line_no)?;
                    if let Some(done) = open.take() {
                        level.elements.push(self.finish(done, true));
                    }
                    open = self.scan_segment(&trimmed[tag.end..], indent, line_no, &mut level)?;
                } else {
                    current.content.push_str(raw);
                }
                continue;
            }

            if grammar.is_start_tag_line(trimmed) {
                open = self.scan_segment(trimmed, indent, line_no, &mut level)?;
            } else if grammar.is_end_tag_line(trimmed) {
                warn_once(
                    "markup",
                    &format!("line {line_no}: ignoring end tag '{trimmed}' with no open element"),
                );
            } else {
                self.push_text(body, line_no, &mut level);
            }
        }

        if let Some(unclosed) = open.take() {
            warn_once(
                "markup",
                &format!(
                    "line {}: <{}> is never closed at its indentation",
                    unclosed.line, unclosed.tag.name
                ),
            );
            level.elements.push(self.finish(unclosed, false));
        }
        self.flush_text(&mut level);

        Ok(level.elements)
    }

    /// Scan what remains of a line: a chain of complete inline or void
    /// elements, then either trailing text or a start tag whose content
    /// continues on the following lines.
    fn scan_segment(
        &self,
        segment: &str,
        indent: usize,
        line: usize,
        level: &mut Level,
    ) -> Result<Option<OpenElement>, MarkupError> {
        let grammar = &*self.grammar;
        let mut segment = segment.trim();

        while grammar.is_start_tag_line(segment) {
            self.flush_text(level);
            let tag = TagLine::parse(segment, grammar, line)?;
            let rest = &segment[tag.end..];

            if tag.self_closing || grammar.is_void(&tag.name) {
                level.elements.push(self.build(tag, true, String::new(), line));
                segment = rest.trim();
            } else if let Some((inner, tail)) = self.split_inline(&tag.name, rest) {
                let inner = inner.to_string();
                level.elements.push(self.build(tag, true, inner, line));
                segment = tail.trim();
            } else {
                let mut content = String::new();
                if !rest.trim().is_empty() {
                    content.push_str(rest.trim());
                    content.push('\n');
                }
                return Ok(Some(OpenElement {
                    tag,
                    indent,
                    line,
                    content,
                }));
            }
        }

        if !segment.is_empty() {
            self.push_text(segment, line, level);
        }
        Ok(None)
    }

    /// Parse every tag [`Scanner::scan_segment`] would read from `segment`,
    /// including those inside inline elements.
    fn validate_chain(&self, segment: &str, line: usize) -> Result<(), MarkupError> {
        let grammar = &*self.grammar;
        let mut segment = segment.trim();
        loop {
            if grammar.is_end_tag_line(segment) {
                let tag = TagLine::parse(segment, grammar, line)?;
                segment = segment[tag.end..].trim();
            } else if grammar.is_start_tag_line(segment) {
                let tag = TagLine::parse(segment, grammar, line)?;
                let rest = &segment[tag.end..];
                if tag.self_closing || grammar.is_void(&tag.name) {
                    segment = rest.trim();
                } else if let Some((inner, tail)) = self.split_inline(&tag.name, rest) {
                    self.validate_chain(inner, line)?;
                    segment = tail.trim();
                } else {
                    return self.validate_chain(rest, line);
                }
            } else {
                return Ok(());
            }
        }
    }

    /// Split `rest` of a start-tag line at the end tag matching `name`,
    /// returning the inner text and whatever follows the end tag.
    ///
    /// Nested start tags of the same name must be closed first; a name only
    /// matches when followed by whitespace, `/` or `>`.
    fn split_inline<'a>(&self, name: &str, rest: &'a str) -> Option<(&'a str, &'a str)> {
        let grammar = &*self.grammar;
        let start_prefix = format!("{}{name}", grammar.tag_open);
        let end_prefix = grammar.end_tag_prefix(name);
        let mut depth = 0usize;

        for (i, _) in rest.match_indices(grammar.tag_open) {
            let at = &rest[i..];
            if let Some(after) = at.strip_prefix(end_prefix.as_str()).filter(|a| self.ends_name(a)) {
                if depth == 0 {
                    let close = after.find(grammar.tag_close)?;
                    let consumed = rest.len() - after.len() + close + grammar.tag_close.len_utf8();
                    return Some((&rest[..i], &rest[consumed..]));
                }
                depth -= 1;
            } else if let Some(after) =
                at.strip_prefix(start_prefix.as_str()).filter(|a| self.ends_name(a))
            {
                let self_closing = after
                    .find(grammar.tag_close)
                    .is_some_and(|close| after[..close].trim_end().ends_with(grammar.end_marker));
                if !self_closing {
                    depth += 1;
                }
            }
        }
        None
    }

    fn ends_name(&self, after: &str) -> bool {
        after.chars().next().is_some_and(|c| {
            c == self.grammar.tag_close || c == self.grammar.end_marker || c.is_whitespace()
        })
    }

    /// Append a line of text to the pending run with its comments removed.
    fn push_text(&self, line_text: &str, line: usize, level: &mut Level) {
        let visible = self.strip_comments(line_text, &mut level.in_comment);
        if visible.trim().is_empty() && (level.text.is_empty() || !line_text.trim().is_empty()) {
            return;
        }
        if level.text.is_empty() {
            level.text_line = line;
        }
        level.text.push_str(&visible);
        level.text.push('\n');
    }

    /// Remove comment spans from `line_text`. A comment left open at the end
    /// of the line sets `in_comment` and swallows the following lines until
    /// its close marker.
    fn strip_comments<'a>(&self, line_text: &'a str, in_comment: &mut bool) -> Cow<'a, str> {
        let open = self.grammar.comment_open.as_str();
        let close = self.grammar.comment_close.as_str();
        if !*in_comment && !line_text.contains(open) {
            return Cow::Borrowed(line_text);
        }

        let mut visible = String::new();
        let mut rest = line_text;
        loop {
            if *in_comment {
                let Some(end) = rest.find(close) else { break };
                rest = &rest[end + close.len()..];
                *in_comment = false;
            } else if let Some(start) = rest.find(open) {
                visible.push_str(&rest[..start]);
                rest = &rest[start + open.len()..];
                *in_comment = true;
            } else {
                visible.push_str(rest);
                break;
            }
        }
        Cow::Owned(visible)
    }

    fn flush_text(&self, level: &mut Level) {
        let run = level.text.trim();
        if !run.is_empty() {
            level.elements.push(Element::text_run(
                run.to_string(),
                level.text_line,
                Rc::clone(&self.grammar),
            ));
        }
        level.text.clear();
    }

    fn finish(&self, open: OpenElement, closed: bool) -> Rc<Element> {
        self.build(open.tag, closed, open.content, open.line)
    }

    fn build(&self, tag: TagLine, closed: bool, content: String, line: usize) -> Rc<Element> {
        Element::new(
            TagName::new(tag.name),
            tag.attributes,
            closed,
            content,
            line,
            Rc::clone(&self.grammar),
        )
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(Rc::new(Grammar::html()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Vec<Rc<Element>> {
        Scanner::default().scan(source).unwrap()
    }

    #[test]
    fn test_plain_text_is_single_text_run() {
        let elements = scan("just some words\nacross two lines\n");
        assert_eq!(elements.len(), 1);
        assert!(elements[0].is_text());
        assert_eq!(elements[0].content(), "just some words\nacross two lines");
    }

    #[test]
    fn test_block_element_content_is_verbatim() {
        let elements = scan("<div>\n  <p>a</p>\n  text\n</div>\n");
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].tag_name(), "div");
        assert!(elements[0].is_closed());
        assert_eq!(elements[0].content(), "  <p>a</p>\n  text\n");
        assert!(!elements[0].children_derived());
    }

    #[test]
    fn test_end_tag_at_other_indent_is_content() {
        let source = "<div>\n  <section>\n  </div>\n  </section>\n</div>\n";
        let elements = scan(source);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].tag_name(), "div");
        assert!(elements[0].content().contains("  </div>\n"));
    }

    #[test]
    fn test_end_tag_name_is_not_checked() {
        let elements = scan("<div>\n  x\n</span>\n<p>y</p>\n");
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].tag_name(), "div");
        assert_eq!(elements[1].tag_name(), "p");
    }

    #[test]
    fn test_inline_element_and_tail_text() {
        let elements = scan("<b>bold</b> and more\n");
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].tag_name(), "b");
        assert_eq!(elements[0].content(), "bold");
        assert_eq!(elements[1].text(), Some("and more"));
    }

    #[test]
    fn test_elements_chained_on_one_line() {
        let elements = scan("<li>a</li><li>b</li> <br> tail\n");
        assert_eq!(elements.len(), 4);
        assert_eq!(elements[0].content(), "a");
        assert_eq!(elements[1].tag_name(), "li");
        assert_eq!(elements[1].content(), "b");
        assert_eq!(elements[2].tag_name(), "br");
        assert_eq!(elements[3].text(), Some("tail"));
    }

    #[test]
    fn test_inline_end_tag_respects_nesting_and_name_boundary() {
        let elements = scan("<div><div>x</div></div>\n<p>a</pre>b</p>\n");
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].content(), "<div>x</div>");
        assert_eq!(elements[1].content(), "a</pre>b");
    }

    #[test]
    fn test_comments_are_dropped_from_text_runs() {
        let elements = scan("<!-- note -->\nbefore <!-- a --> after\n<!--\n<p>gone</p>\n-->\nlast\n");
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].text(), Some("before  after\nlast"));
    }

    #[test]
    fn test_comment_line_alone_yields_nothing() {
        assert!(scan("  <!-- hidden -->\n").is_empty());
    }

    #[test]
    fn test_void_and_self_closing_elements() {
        let elements = scan("<!DOCTYPE html>\n<br>\n<img src=\"a.png\"/>\n");
        assert_eq!(elements.len(), 3);
        assert!(elements.iter().all(|e| e.is_closed() && e.content().is_empty()));
        assert_eq!(elements[2].attribute("src"), Some("a.png"));
    }

    #[test]
    fn test_unclosed_element_is_kept_open() {
        let elements = scan("<div>\n  never closed\n");
        assert_eq!(elements.len(), 1);
        assert!(!elements[0].is_closed());
    }

    #[test]
    fn test_unterminated_tag_after_inline_element_fails() {
        let err = Scanner::default()
            .scan("<ul>\n  <li>a</li><li b\n</ul>\n")
            .unwrap_err();
        assert!(matches!(err, MarkupError::UnterminatedTag { line: 2, .. }));
    }

    #[test]
    fn test_nested_unterminated_tag_fails_whole_scan() {
        let err = Scanner::default()
            .scan("<div>\n  <p class=\"x\"\n</div>\n")
            .unwrap_err();
        assert!(matches!(err, MarkupError::UnterminatedTag { line: 2, .. }));
    }
}
