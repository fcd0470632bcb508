//! Config validation.
//!
//! Schema checks need nothing but the value itself; filesystem checks look at
//! the project root and every entry on disk.

use std::path::{Component, Path};

use crate::config::BuildConfig;
use crate::error::{ConfigError, Result};

/// Names of generated chunks; an entry cannot use them.
pub const RESERVED_CHUNK_NAMES: &[&str] = &["runtime", "vendors"];

/// A validation strategy.
pub trait ConfigValidator {
    fn validate(&self, config: &BuildConfig) -> Result<()>;
}

/// Checks that do not touch the filesystem.
pub struct SchemaValidator;

impl ConfigValidator for SchemaValidator {
    fn validate(&self, config: &BuildConfig) -> Result<()> {
        if config.entries.is_empty() {
            return Err(ConfigError::NoEntries);
        }

        for name in config.entries.keys() {
            if !is_plain_name(name) || RESERVED_CHUNK_NAMES.contains(&name.as_str()) {
                return Err(ConfigError::InvalidEntryName(name.clone()));
            }
        }

        if !(8..=64).contains(&config.hash_length) {
            return Err(invalid(
                "hash_length",
                format!("{} is outside 8..=64", config.hash_length),
            ));
        }

        if !is_plain_name(&config.manifest_name) {
            return Err(invalid(
                "manifest_name",
                "must be a file name without directories",
            ));
        }

        if config.target.trim().is_empty() {
            return Err(invalid("target", "must name a syntax baseline such as es2015"));
        }

        if config.vendor_dir.trim().is_empty() || config.vendor_dir.contains(['/', '\\']) {
            return Err(invalid("vendor_dir", "must be a single path component"));
        }

        if config.search_roots.is_empty() {
            return Err(invalid("search_roots", "at least one search root is required"));
        }

        if config.styles.browsers.iter().any(|q| q.trim().is_empty()) {
            return Err(invalid("styles.browsers", "queries cannot be empty"));
        }

        Ok(())
    }
}

/// Schema checks followed by existence checks for the root and every entry.
pub struct FsValidator;

impl ConfigValidator for FsValidator {
    fn validate(&self, config: &BuildConfig) -> Result<()> {
        SchemaValidator.validate(config)?;

        let root = config.root_dir();
        if !root.is_dir() {
            return Err(ConfigError::RootNotFound(root));
        }

        for (name, path) in config.entry_paths() {
            if !path.is_file() {
                return Err(ConfigError::EntryNotFound { name, path });
            }
        }

        Ok(())
    }
}

pub fn validate_schema(config: &BuildConfig) -> Result<()> {
    SchemaValidator.validate(config)
}

pub fn validate_fs(config: &BuildConfig) -> Result<()> {
    FsValidator.validate(config)
}

impl BuildConfig {
    /// Schema-only validation. See [`validate_fs`] for the on-disk checks.
    pub fn validate(&self) -> Result<()> {
        validate_schema(self)
    }
}

fn invalid(field: &str, hint: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        hint: hint.into(),
    }
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn valid() -> BuildConfig {
        BuildConfig::new("/p").entry("main", "application.js")
    }

    #[test]
    fn accepts_minimal_config() {
        validate_schema(&valid()).unwrap();
    }

    #[test]
    fn rejects_missing_entries() {
        let err = validate_schema(&BuildConfig::new("/p")).unwrap_err();
        assert!(matches!(err, ConfigError::NoEntries));
    }

    #[test]
    fn rejects_invalid_entry_names() {
        for bad in ["", "a/b", "..", "c\\d", "runtime", "vendors"] {
            let config = BuildConfig::new("/p").entry(bad, "x.js");
            let err = validate_schema(&config).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEntryName(_)), "{bad:?}");
        }
    }

    #[test]
    fn rejects_out_of_range_hash_length() {
        let mut config = valid();
        config.hash_length = 4;
        let err = validate_schema(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "hash_length"));
    }

    #[test]
    fn rejects_nested_manifest_name() {
        let mut config = valid();
        config.manifest_name = "../manifest.json".to_string();
        assert!(validate_schema(&config).is_err());
    }

    #[test]
    fn fs_validation_reports_missing_entry() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("application.js"), "").unwrap();

        let config = BuildConfig::new(dir.path())
            .entry("main", "application.js")
            .entry("admin", "admin.js");
        let err = validate_fs(&config).unwrap_err();
        match err {
            ConfigError::EntryNotFound { name, path } => {
                assert_eq!(name, "admin");
                assert_eq!(path, dir.path().join("admin.js"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn fs_validation_reports_missing_root() {
        let dir = TempDir::new().unwrap();
        let config = BuildConfig::new(dir.path().join("nope")).entry("main", "a.js");
        assert!(matches!(
            validate_fs(&config).unwrap_err(),
            ConfigError::RootNotFound(_)
        ));
    }
}
