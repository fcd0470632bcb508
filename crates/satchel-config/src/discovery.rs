//! Config file discovery.

use std::path::{Path, PathBuf};

/// Conventional configuration file name.
pub const CONFIG_FILE_NAME: &str = "satchel.toml";

/// Look for `satchel.toml` in `dir` and its ancestors.
///
/// Returns the first match, closest directory first.
pub fn find_config(dir: impl AsRef<Path>) -> Option<PathBuf> {
    dir.as_ref()
        .ancestors()
        .map(|d| d.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}
