//! # satchel-bundler
//!
//! Turns a tree of scripts, style sheets, fonts and images into a
//! content-addressed output directory plus a `manifest.json` that maps logical
//! names (`main.js`, `main.css`, `img/logo.png`) to hashed public URLs.
//!
//! ## Pipeline
//!
//! ```text
//! BuildConfig
//!     │
//!     ▼
//! resolve (satchel-graph) ──► static resources ──► scripts (rewrite + lower)
//!                                   │                     │
//!                                   ▼                     ▼
//!                              style sheets ──────► chunks + hashes
//!                                                         │
//!                                                         ▼
//!                                            write artifacts, then manifest
//! ```
//!
//! Scripts, styles and resources are processed in parallel with rayon; results
//! are always collected in graph order, so the output is byte-for-byte
//! reproducible.
//!
//! ## Output
//!
//! | artifact | file name | manifest key |
//! |---|---|---|
//! | module loader | `js/runtime.[hash].js` | `runtime.js` |
//! | third-party scripts | `js/vendors.[hash].js` | `vendors.js` |
//! | entry scripts | `js/[entry].[hash].js` | `[entry].js` |
//! | extracted styles | `css/[entry].[hash].css` | `[entry].css` |
//! | emitted resources | `[path][name].[hash].[ext]` | root-relative path |
//!
//! ## Example
//!
//! ```rust,no_run
//! use satchel_bundler::build;
//! use satchel_config::BuildConfig;
//!
//! # fn main() -> satchel_bundler::Result<()> {
//! let config = BuildConfig::new("app/static/src")
//!     .entry("main", "application.js")
//!     .output_dir("../dist");
//!
//! let report = build(&config)?;
//! println!("{}", report.manifest.url_for("main.js").unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod assets;
mod build;
pub mod chunks;
pub mod hash;
pub mod html;
#[cfg(feature = "logging")]
pub mod logging;
pub mod manifest;
pub mod output;
pub mod rewrite;
pub mod runtime;
pub mod styles;
pub mod transform;

use std::path::PathBuf;

pub use build::{ArtifactInfo, BuildReport, build};
pub use manifest::Manifest;
pub use output::{Artifact, ArtifactKind};

/// Errors that abort a build. No build is ever partially written.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A specifier could not be resolved.
    #[error("cannot resolve '{specifier}' imported from '{}'", .importer.display())]
    Resolution {
        specifier: String,
        importer: PathBuf,
    },

    /// A forbidden import cycle; the path starts and ends with the same module.
    #[error("circular dependency: {}", .cycle.join(" -> "))]
    Cycle { cycle: Vec<String> },

    /// Malformed source. `line` and `column` are 1-based; 0 when unknown.
    #[error("failed to transform {}: {message}", location(.file, *.line, *.column))]
    Transform {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// An artifact or the manifest could not be written.
    #[error("failed to write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid output path: {0}")]
    InvalidOutputPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other graph construction failure (unreadable file, bad
    /// `require.context` call, missing entry).
    #[error(transparent)]
    Graph(satchel_graph::Error),
}

/// Result type alias for satchel-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

fn location(file: &std::path::Path, line: usize, column: usize) -> String {
    if line == 0 {
        file.display().to_string()
    } else {
        format!("{}:{line}:{column}", file.display())
    }
}

impl From<satchel_graph::Error> for Error {
    fn from(err: satchel_graph::Error) -> Self {
        use satchel_graph::Error as G;
        match err {
            G::Resolution {
                specifier,
                importer,
            } => Error::Resolution {
                specifier,
                importer,
            },
            G::Cycle { cycle } => Error::Cycle { cycle },
            G::Parse {
                file,
                line,
                column,
                message,
            } => Error::Transform {
                file,
                line,
                column,
                message,
            },
            G::Preprocess { file, message } => Error::Transform {
                file,
                line: 0,
                column: 0,
                message,
            },
            other => Error::Graph(other),
        }
    }
}

impl From<satchel_config::ConfigError> for Error {
    fn from(err: satchel_config::ConfigError) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Resolution { .. } => "RESOLUTION_ERROR",
            Error::Cycle { .. } => "CYCLE_ERROR",
            Error::Transform { .. } => "TRANSFORM_ERROR",
            Error::Write { .. } => "WRITE_ERROR",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::InvalidOutputPath(_) => "INVALID_OUTPUT_PATH",
            Error::Io(_) => "IO_ERROR",
            Error::Graph(_) => "GRAPH_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Resolution { specifier, .. } => Some(Box::new(format!(
                "Check that '{specifier}' exists relative to the importing file, the project root, or one of the search roots."
            ))),
            Error::Cycle { .. } => Some(Box::new(
                "Break the cycle, or set `allow_cycles = true` to permit cycles between scripts. Style sheet @import cycles are never allowed.",
            )),
            Error::Write { .. } => Some(Box::new(
                "No manifest was written and files from this build were rolled back. Check disk space and permissions.",
            )),
            Error::InvalidOutputPath(_) => Some(Box::new(
                "The output directory must not contain the project root, and emitted files must stay inside it.",
            )),
            Error::InvalidConfig(msg) => Some(Box::new(format!(
                "Check satchel.toml, SATCHEL_* variables and command-line flags.\nError: {msg}"
            ))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn graph_errors_map_to_build_error_kinds() {
        let err: Error = satchel_graph::Error::Parse {
            file: PathBuf::from("app.js"),
            line: 3,
            column: 7,
            message: "Unexpected token".into(),
        }
        .into();
        assert!(matches!(err, Error::Transform { line: 3, column: 7, .. }));
        assert_eq!(err.to_string(), "failed to transform app.js:3:7: Unexpected token");
        assert_eq!(err.code().unwrap().to_string(), "TRANSFORM_ERROR");

        let err: Error = satchel_graph::Error::Resolution {
            specifier: "./x".into(),
            importer: PathBuf::from("a.js"),
        }
        .into();
        assert_eq!(err.code().unwrap().to_string(), "RESOLUTION_ERROR");
    }

    #[test]
    fn preprocess_errors_have_no_position() {
        let err: Error = satchel_graph::Error::Preprocess {
            file: PathBuf::from("a.scss"),
            message: "Undefined variable.".into(),
        }
        .into();
        assert_eq!(err.to_string(), "failed to transform a.scss: Undefined variable.");
    }
}
