//! # satchel-config
//!
//! Build configuration for the satchel asset bundler.
//!
//! A build is described by one explicit [`BuildConfig`] value that is handed to
//! the pipeline's entry function. Nothing is read from process-wide state once
//! the config has been loaded.
//!
//! Configuration is layered (lowest priority first):
//!
//! 1. Built-in defaults ([`BuildConfig::default`])
//! 2. `satchel.toml` in the project directory (or an explicit `--config` path)
//! 3. `SATCHEL_*` environment variables (`SATCHEL_STYLES__MINIFY=true`)
//! 4. `ASSET_PATH`, which overrides only the public path
//! 5. Command-line overrides ([`ConfigOverrides`])
//!
//! ```no_run
//! use satchel_config::{BuildConfig, ConfigOverrides};
//!
//! let config = BuildConfig::load(Some("satchel.toml".as_ref()), &ConfigOverrides::default())?;
//! config.validate()?;
//! # Ok::<(), satchel_config::ConfigError>(())
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod loading;
pub mod validation;

pub use config::{BuildConfig, DEFAULT_INLINE_THRESHOLD, DEFAULT_PUBLIC_PATH, StyleOptions};
pub use discovery::{CONFIG_FILE_NAME, find_config};
pub use error::{ConfigError, Result};
pub use loading::{ASSET_PATH_ENV, ConfigOverrides, ENV_PREFIX, StyleOverrides};
pub use validation::{validate_fs, validate_schema};
