use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use quire_common::warning::warn_once;

use crate::selector::{CLASS_MARKER, Selector, SelectorError};
use crate::values::CssValue;

/// Stylesheet errors.
#[derive(Debug, Error)]
pub enum StylesheetError {
    /// A rule block was opened but never closed by a lone `}` line.
    #[error("line {line}: block for '{selector}' is never closed")]
    UnterminatedBlock {
        /// Line of the selector that opened the block.
        line: usize,
        /// The selector text.
        selector: String,
    },
    /// A selector line that does not parse.
    #[error("line {line}: {source}")]
    MalformedSelector {
        /// Line of the selector.
        line: usize,
        /// Why it failed.
        source: SelectorError,
    },
    /// The stylesheet file could not be read.
    #[error("failed to read stylesheet {}: {source}", path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
}

/// Index of a rule within its [`Stylesheet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RuleId(pub usize);

/// A `key: value;` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    /// Property name, trimmed.
    pub key: String,
    /// Raw value, trimmed.
    pub value: CssValue,
}

impl Declaration {
    /// Build a declaration from raw text.
    #[must_use]
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.trim().to_string(),
            value: CssValue::new(value),
        }
    }
}

/// One selector block with its declarations and its links to rules that
/// share a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    /// The selector.
    pub selector: Selector,
    /// Declarations in block order.
    pub declarations: Vec<Declaration>,
    /// 1-based line of the selector.
    pub line: usize,
    inherits: Vec<RuleId>,
    inheriting: Vec<RuleId>,
}

impl StyleRule {
    /// A rule with no links yet.
    #[must_use]
    pub const fn new(selector: Selector, declarations: Vec<Declaration>, line: usize) -> Self {
        Self {
            selector,
            declarations,
            line,
            inherits: Vec::new(),
            inheriting: Vec::new(),
        }
    }

    /// First declaration for `key`.
    #[must_use]
    pub fn declaration(&self, key: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.key == key)
    }

    /// Rules registered before this one that share a class with it.
    #[must_use]
    pub fn inherits(&self) -> &[RuleId] {
        &self.inherits
    }

    /// Rules registered after this one that share a class with it.
    #[must_use]
    pub fn inheriting(&self) -> &[RuleId] {
        &self.inheriting
    }

    /// Whether the two selectors have a class token in common.
    #[must_use]
    pub fn shares_class_with(&self, other: &Self) -> bool {
        !self.selector.shared_classes(&other.selector).is_empty()
    }
}

/// All registered rules, in registration order, and the files they came
/// from.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    rules: Vec<StyleRule>,
    sources: Vec<PathBuf>,
}

impl Stylesheet {
    /// An empty stylesheet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text` into a fresh stylesheet.
    ///
    /// # Errors
    ///
    /// See [`parse_rules`].
    pub fn parse(text: &str) -> Result<Self, StylesheetError> {
        let mut sheet = Self::new();
        let _ = sheet.merge_source(text, None)?;
        Ok(sheet)
    }

    /// Parse the file at `path` and merge its rules.
    ///
    /// Returns the number of links created.
    ///
    /// # Errors
    ///
    /// Returns [`StylesheetError::Io`] if the file cannot be read, or a parse
    /// error as for [`parse_rules`]. Nothing is merged on error.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<usize, StylesheetError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| StylesheetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.merge_source(&text, Some(path))
    }

    /// Parse `text` and merge its rules, recording `path` as a source.
    ///
    /// # Errors
    ///
    /// See [`parse_rules`]. Nothing is merged on error.
    pub fn merge_source(&mut self, text: &str, path: Option<&Path>) -> Result<usize, StylesheetError> {
        let rules = parse_rules(text)?;
        if let Some(path) = path {
            self.sources.push(path.to_path_buf());
        }
        Ok(self.merge(rules))
    }

    /// Register `rules` after the existing ones.
    ///
    /// Each new rule is compared with every rule registered before it,
    /// including earlier rules of the same batch. For each pair sharing a
    /// class the new rule inherits the old one, and the old rule records the
    /// new one as inheriting from it. Returns the number of links created.
    pub fn merge(&mut self, rules: Vec<StyleRule>) -> usize {
        let mut links = 0;
        for mut rule in rules {
            let id = RuleId(self.rules.len());
            for (index, existing) in self.rules.iter_mut().enumerate() {
                if existing.shares_class_with(&rule) {
                    rule.inherits.push(RuleId(index));
                    existing.inheriting.push(id);
                    links += 1;
                }
            }
            self.rules.push(rule);
        }
        links
    }

    /// Rules in registration order.
    #[must_use]
    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    /// The rule with `id`.
    #[must_use]
    pub fn rule(&self, id: RuleId) -> Option<&StyleRule> {
        self.rules.get(id.0)
    }

    /// Ids of all rules in registration order.
    pub fn ids(&self) -> impl Iterator<Item = RuleId> + use<> {
        (0..self.rules.len()).map(RuleId)
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Files merged so far.
    #[must_use]
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}

/// Parse stylesheet text into unlinked rules.
///
/// The format is line based. A line starting with `.` is a selector; its
/// block runs to the next line holding only `}`. The opening `{` may end the
/// selector line or sit alone on the following line. Each block line holds
/// one or more `key: value;` declarations. Lines starting with `/*` are
/// comments, up to the line containing `*/`. A selector, block, and closing
/// brace on one line (`.a p { color: red; }`) is also accepted.
///
/// # Errors
///
/// Returns [`StylesheetError::UnterminatedBlock`] when a selector line
/// appears while a block is still open, or input ends inside a block, and
/// [`StylesheetError::MalformedSelector`] for a selector that does not parse.
pub fn parse_rules(text: &str) -> Result<Vec<StyleRule>, StylesheetError> {
    let mut rules = Vec::new();
    let mut open: Option<(usize, &str)> = None;
    let mut block: Vec<(usize, &str)> = Vec::new();
    let mut in_comment = false;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if in_comment || line.starts_with("/*") {
            in_comment = !line.contains("*/");
            continue;
        }

        if line.starts_with(CLASS_MARKER) {
            if let Some((start, selector)) = open {
                return Err(StylesheetError::UnterminatedBlock {
                    line: start,
                    selector: selector_text(selector).to_string(),
                });
            }
            if let Some((selector, body)) = one_line_rule(line) {
                rules.push(build_rule(selector, &[(line_no, body)], line_no)?);
            } else {
                open = Some((line_no, line));
            }
        } else if line == "}" {
            match open.take() {
                Some((start, selector)) => {
                    rules.push(build_rule(selector_text(selector), &block, start)?);
                    block.clear();
                }
                None => warn_once("CSS", &format!("line {line_no}: ignoring stray '}}'")),
            }
        } else if open.is_some() {
            if line != "{" && !line.is_empty() {
                block.push((line_no, line));
            }
        } else if !line.is_empty() {
            warn_once("CSS", &format!("line {line_no}: ignoring '{line}' outside any block"));
        }
    }

    if let Some((start, selector)) = open {
        return Err(StylesheetError::UnterminatedBlock {
            line: start,
            selector: selector_text(selector).to_string(),
        });
    }
    Ok(rules)
}

/// Selector line with any trailing `{` removed.
fn selector_text(line: &str) -> &str {
    line.split_once('{').map_or(line, |(selector, _)| selector).trim()
}

/// `.a p { color: red; }` split into selector and block body.
fn one_line_rule(line: &str) -> Option<(&str, &str)> {
    let (selector, rest) = line.split_once('{')?;
    let body = rest.trim_end().strip_suffix('}')?;
    Some((selector.trim(), body))
}

fn build_rule(selector: &str, block: &[(usize, &str)], line: usize) -> Result<StyleRule, StylesheetError> {
    let selector = Selector::parse(selector)
        .map_err(|source| StylesheetError::MalformedSelector { line, source })?;
    let mut declarations = Vec::new();
    for (line_no, text) in block {
        parse_declarations(text, *line_no, &mut declarations);
    }
    Ok(StyleRule::new(selector, declarations, line))
}

/// Every `key: value;` pair on one block line. Text without a complete pair
/// is skipped.
fn parse_declarations(text: &str, line: usize, out: &mut Vec<Declaration>) {
    let mut rest = text;
    loop {
        let pair = rest
            .split_once(':')
            .and_then(|(key, after)| after.split_once(';').map(|(value, tail)| (key, value, tail)));
        match pair {
            Some((key, value, tail)) if !key.trim().is_empty() => {
                out.push(Declaration::new(key, value));
                rest = tail;
            }
            _ => {
                if !rest.trim().is_empty() {
                    warn_once("CSS", &format!("line {line}: skipping '{}'", rest.trim()));
                }
                return;
            }
        }
    }
}
