//! The manifest: logical name → public URL.
//!
//! Server-side templates look URLs up here instead of hard-coding hashed
//! file names.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Flat JSON object mapping logical names (`main.js`, `img/logo.png`) to URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: IndexMap<String, String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a mapping. Returns the previous URL, if any.
    pub fn insert(&mut self, name: impl Into<String>, url: impl Into<String>) -> Option<String> {
        self.entries.insert(name.into(), url.into())
    }

    /// URL for a logical name.
    pub fn url_for(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Order keys alphabetically so the serialized manifest is stable.
    pub fn sort(&mut self) {
        self.entries.sort_keys();
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .map_err(|e| Error::Io(e.into()))
    }

    /// Read a manifest written by a previous build.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| Error::Transform {
            file: path.to_path_buf(),
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_flat_object_with_sorted_keys() {
        let mut manifest = Manifest::new();
        manifest.insert("runtime.js", "/static/dist/js/runtime.1.js");
        manifest.insert("main.js", "/static/dist/js/main.2.js");
        manifest.insert("img/logo.png", "/static/dist/img/logo.3.png");
        manifest.sort();

        let json = manifest.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["img/logo.png", "main.js", "runtime.js"]);
    }

    #[test]
    fn load_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, r#"{"main.css": "/static/dist/css/main.abc.css"}"#).unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.url_for("main.css"), Some("/static/dist/css/main.abc.css"));
        assert_eq!(manifest.url_for("main.js"), None);
    }

    #[test]
    fn malformed_manifest_reports_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, "{\n  \"a\": }").unwrap();
        assert!(matches!(
            Manifest::load(&path),
            Err(Error::Transform { line: 2, .. })
        ));
    }
}
