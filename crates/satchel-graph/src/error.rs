//! Errors raised while building the module graph.

use std::path::PathBuf;

/// Result alias used throughout the graph crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot resolve '{specifier}' imported from '{}'", .importer.display())]
    Resolution {
        specifier: String,
        importer: PathBuf,
    },

    #[error("entry '{name}' not found: {}", .path.display())]
    EntryNotFound { name: String, path: PathBuf },

    #[error("unsupported module type '{}' (imported from '{}')", .path.display(), .importer.display())]
    Unsupported { path: PathBuf, importer: PathBuf },

    #[error("circular dependency: {}", .cycle.join(" -> "))]
    Cycle { cycle: Vec<String> },

    /// Source text that could not be parsed. `line` and `column` are 1-based.
    #[error("{}:{line}:{column}: {message}", .file.display())]
    Parse {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// Style preprocessing (SCSS compilation) failed.
    #[error("failed to preprocess '{}': {message}", .file.display())]
    Preprocess { file: PathBuf, message: String },

    #[error("invalid require.context call in '{}': {reason}", .file.display())]
    InvalidContext { file: PathBuf, reason: String },

    #[error("failed to read '{}': {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Build a [`Error::Parse`] from a byte offset into `source`.
    pub fn parse_at(
        file: impl Into<PathBuf>,
        source: &str,
        offset: usize,
        message: impl Into<String>,
    ) -> Self {
        let (line, column) = line_column(source, offset);
        Self::Parse {
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }
}

/// 1-based line and column of a byte offset. Columns count characters.
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
