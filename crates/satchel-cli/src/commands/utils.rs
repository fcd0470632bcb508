//! Configuration loading shared by every command.

use std::path::{Path, PathBuf};

use satchel_config::{BuildConfig, ConfigOverrides, find_config};

use crate::cli::ConfigArgs;
use crate::error::Result;

/// Resolve `path` against `cwd` unless it is already absolute.
pub(crate) fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Load the layered configuration.
///
/// Without `--config`, `satchel.toml` is searched from `--root` (or the
/// current directory) upwards. Paths given on the command line are relative
/// to the current directory.
pub(crate) fn load_config(args: &ConfigArgs, mut overrides: ConfigOverrides) -> Result<BuildConfig> {
    let cwd = std::env::current_dir()?;
    let root = args.root.as_deref().map(|root| absolute(&cwd, root));

    let config_file = match &args.config {
        Some(path) => Some(absolute(&cwd, path)),
        None => find_config(root.as_deref().unwrap_or(&cwd)),
    };
    match &config_file {
        Some(path) => tracing::debug!(config = %path.display(), "using configuration file"),
        None => tracing::debug!("no satchel.toml found, using defaults"),
    }

    overrides.root = root;
    Ok(BuildConfig::load(config_file.as_deref(), &overrides)?)
}
