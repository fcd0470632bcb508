//! Layered configuration loading.
//!
//! Priority: CLI overrides > `ASSET_PATH` > `SATCHEL_*` environment > config file > defaults

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use indexmap::IndexMap;
use serde::Serialize;

use crate::config::BuildConfig;
use crate::error::{ConfigError, Result};

/// Environment variable that overrides the public path (kept for compatibility
/// with existing deployment scripts).
pub const ASSET_PATH_ENV: &str = "ASSET_PATH";

/// Prefix for environment overrides. Nested keys use `__`.
pub const ENV_PREFIX: &str = "SATCHEL_";

/// Values supplied on the command line. Unset fields leave lower layers untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub entries: IndexMap<String, PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_roots: Option<Vec<PathBuf>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_threshold_bytes: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean_output_dir: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<bool>,

    #[serde(skip_serializing_if = "StyleOverrides::is_empty")]
    pub styles: StyleOverrides,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StyleOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scss: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,
}

impl StyleOverrides {
    fn is_empty(&self) -> bool {
        self.scss.is_none() && self.minify.is_none()
    }
}

impl BuildConfig {
    /// Assemble every configuration layer without extracting it.
    pub fn figment(config_file: Option<&Path>, overrides: &ConfigOverrides) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(BuildConfig::default()));

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        if let Ok(asset_path) = std::env::var(ASSET_PATH_ENV) {
            figment = figment.merge(Serialized::default("public_path", asset_path));
        }

        figment.merge(Serialized::defaults(overrides))
    }

    /// Load configuration from every layer.
    ///
    /// A relative `root` read from the config file is anchored at the file's
    /// directory; a `root` given as an override stays relative to the current
    /// working directory.
    pub fn load(config_file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        if let Some(path) = config_file {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
        }

        let config: BuildConfig = Self::figment(config_file, overrides)
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        let config = match (config_file.and_then(Path::parent), &overrides.root) {
            (Some(base), None) => config.with_base_dir(base),
            _ => config,
        };

        tracing::debug!(
            root = %config.root.display(),
            entries = config.entries.len(),
            "configuration loaded"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_when_nothing_is_configured() {
        Jail::expect_with(|_jail| {
            let config = BuildConfig::load(None, &ConfigOverrides::default())
                .map_err(|e| e.to_string())?;
            assert_eq!(config, BuildConfig::default());
            Ok(())
        });
    }

    #[test]
    fn file_then_env_then_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "satchel.toml",
                r#"
                    root = "assets"
                    output_dir = "../public/dist"
                    inline_threshold_bytes = 1024

                    [entries]
                    main = "application.js"

                    [styles]
                    minify = true
                "#,
            )?;
            jail.set_env("SATCHEL_INLINE_THRESHOLD_BYTES", "2048");
            jail.set_env("SATCHEL_STYLES__SCSS", "false");

            let overrides = ConfigOverrides {
                output_dir: Some(PathBuf::from("build")),
                ..Default::default()
            };
            let file = jail.directory().join("satchel.toml");
            let config = BuildConfig::load(Some(&file), &overrides).map_err(|e| e.to_string())?;

            assert_eq!(config.root, jail.directory().join("assets"));
            assert_eq!(config.entries["main"], PathBuf::from("application.js"));
            assert_eq!(config.inline_threshold_bytes, 2048);
            assert_eq!(config.output_dir, PathBuf::from("build"));
            assert!(config.styles.minify);
            assert!(!config.styles.scss);
            Ok(())
        });
    }

    #[test]
    fn asset_path_env_overrides_public_path() {
        Jail::expect_with(|jail| {
            jail.create_file("satchel.toml", "public_path = \"/assets/\"")?;
            jail.set_env(ASSET_PATH_ENV, "https://cdn.example.com/dist/");

            let file = jail.directory().join("satchel.toml");
            let config = BuildConfig::load(Some(&file), &ConfigOverrides::default())
                .map_err(|e| e.to_string())?;
            assert_eq!(config.public_path, "https://cdn.example.com/dist/");
            Ok(())
        });
    }

    #[test]
    fn cli_public_path_beats_asset_path() {
        Jail::expect_with(|jail| {
            jail.set_env(ASSET_PATH_ENV, "/from-env/");
            let overrides = ConfigOverrides {
                public_path: Some("/from-cli/".to_string()),
                ..Default::default()
            };
            let config = BuildConfig::load(None, &overrides).map_err(|e| e.to_string())?;
            assert_eq!(config.public_path, "/from-cli/");
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = BuildConfig::load(
            Some(Path::new("/definitely/not/here/satchel.toml")),
            &ConfigOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn malformed_value_reports_load_error() {
        Jail::expect_with(|jail| {
            jail.create_file("satchel.toml", "inline_threshold_bytes = \"lots\"")?;
            let file = jail.directory().join("satchel.toml");
            let err = BuildConfig::load(Some(&file), &ConfigOverrides::default()).unwrap_err();
            assert!(matches!(err, ConfigError::Load(_)));
            Ok(())
        });
    }
}
