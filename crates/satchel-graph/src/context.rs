//! Build-time expansion of `require.context` directory globs.

use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::module::ModuleKind;
use crate::scanner::ContextCall;

/// Compile a JavaScript regular expression for use as a context filter.
///
/// Supports the `i`, `m` and `s` flags; `g`, `u` and `y` do not affect matching here.
pub fn compile_filter(pattern: &str, flags: &str) -> std::result::Result<Regex, String> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'g' | 'u' | 'y' | 'd' => {}
            other => return Err(format!("unsupported regular expression flag '{other}'")),
        }
    }
    builder.build().map_err(|e| e.to_string())
}

/// List the files a context call matches, sorted by key.
///
/// Keys are `./`-prefixed paths relative to `directory` with `/` separators,
/// exactly what the filter is tested against.
pub fn expand(
    directory: &Path,
    call: &ContextCall,
    importer: &Path,
) -> Result<Vec<(String, PathBuf)>> {
    let invalid = |reason: String| Error::InvalidContext {
        file: importer.to_path_buf(),
        reason,
    };

    let filter = compile_filter(&call.pattern, &call.flags).map_err(invalid)?;

    let mut walker = WalkDir::new(directory).min_depth(1).sort_by_file_name();
    if !call.recursive {
        walker = walker.max_depth(1);
    }

    let mut matches = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| invalid(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(directory) else {
            continue;
        };
        let key = format!(
            "./{}",
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        );
        if !filter.is_match(&key) {
            continue;
        }
        if ModuleKind::from_path(entry.path()).is_none() {
            tracing::debug!(key = %key, "skipping context match with unsupported extension");
            continue;
        }
        matches.push((key, entry.path().to_path_buf()));
    }

    matches.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(matches)
}
