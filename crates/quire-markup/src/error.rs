use std::path::PathBuf;

use thiserror::Error;

/// Structural markup failure. Fatal for the parse call that produced it.
#[derive(Debug, Error)]
pub enum MarkupError {
    /// A line opens a tag but never closes it with `>`.
    #[error("line {line}: unterminated tag '{text}'")]
    UnterminatedTag {
        /// 1-based line number in the parsed text.
        line: usize,
        /// The offending line, trimmed.
        text: String,
    },

    /// The markup file could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
