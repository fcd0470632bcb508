//! Stable module identifiers.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use path_clean::PathClean;
use serde::{Deserialize, Serialize};

/// Identifier of a module: its path relative to the project root, with `/`
/// separators. Identical on every machine that checks out the same tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    /// Derive the id of `path` relative to `root`.
    ///
    /// Paths outside the root keep `..` segments so that ids stay unique.
    pub fn from_path(root: &Path, path: &Path) -> Self {
        let root = root.clean();
        let path = path.clean();
        let relative = relative_to(&root, &path);
        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                Component::ParentDir => Some("..".to_string()),
                _ => None,
            })
            .collect();
        Self(parts.join("/"))
    }

    /// Wrap an id string that is already normalized.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModuleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn relative_to(base: &Path, path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix(base) {
        return stripped.to_path_buf();
    }

    let base_parts: Vec<_> = base.components().collect();
    let path_parts: Vec<_> = path.components().collect();
    let common = base_parts
        .iter()
        .zip(&path_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[common..] {
        relative.push(part.as_os_str());
    }
    relative
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_root_relative_with_forward_slashes() {
        let id = ModuleId::from_path(
            Path::new("/srv/app"),
            Path::new("/srv/app/assets/controllers/modal_controller.js"),
        );
        assert_eq!(id.as_str(), "assets/controllers/modal_controller.js");
        assert_eq!(id.file_name(), "modal_controller.js");
    }

    #[test]
    fn paths_outside_root_keep_parent_segments() {
        let id = ModuleId::from_path(
            Path::new("/srv/app/assets"),
            Path::new("/srv/app/node_modules/lib/index.js"),
        );
        assert_eq!(id.as_str(), "../node_modules/lib/index.js");
    }

    #[test]
    fn dot_segments_are_normalized() {
        let id = ModuleId::from_path(Path::new("/p"), Path::new("/p/a/./b/../c.js"));
        assert_eq!(id.as_str(), "a/c.js");
    }
}
