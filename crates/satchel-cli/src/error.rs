//! CLI error types.
//!
//! Library errors keep their own types ([`satchel_config::ConfigError`],
//! [`satchel_bundler::Error`]) and are wrapped here. Bundler errors carry
//! `miette::Diagnostic` codes and are reported as-is.

use std::path::PathBuf;

use miette::Report;
use thiserror::Error;

/// Top-level CLI error.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] satchel_config::ConfigError),

    #[error(transparent)]
    Build(#[from] satchel_bundler::Error),

    /// The manifest has no entry for a logical name.
    #[error("'{name}' is not in {}\n\nHint: names look like main.js, main.css or img/logo.png", .manifest.display())]
    NotInManifest { name: String, manifest: PathBuf },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Attach context to errors on their way out of a command.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            other => other,
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{err}\n\nHint: {hint}"))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{msg}: {err}"))
        })
    }
}

/// Convert a CLI error into a miette report for `main`.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(e) => Report::new(e),
        other => miette::miette!("{}", other),
    }
}
