//! Satchel CLI - build content-addressed asset bundles from the command line.
//!
//! - [`cli`] - argument definitions (clap derive)
//! - [`commands`] - `build`, `manifest` and `check`
//! - [`error`] - [`CliError`] and its conversion to miette reports
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - status lines and the build summary

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result, ResultExt};
