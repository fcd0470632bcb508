//! Error types for configuration loading and validation.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    // Filesystem validation errors
    #[error("project root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("entry '{name}' not found: {}", .path.display())]
    EntryNotFound { name: String, path: PathBuf },

    // Schema validation errors (no filesystem checks)
    #[error("no entries specified")]
    NoEntries,

    #[error("invalid entry name '{0}': names must be non-empty, contain no path separators and not be 'runtime' or 'vendors'")]
    InvalidEntryName(String),

    #[error("invalid config value for '{field}': {hint}")]
    InvalidValue { field: String, hint: String },

    // Layered loading errors
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to load configuration: {0}")]
    Load(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
