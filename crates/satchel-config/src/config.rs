//! The build configuration struct passed into the pipeline.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use path_clean::PathClean;
use serde::{Deserialize, Serialize};

/// URL prefix under which emitted files are served unless overridden.
pub const DEFAULT_PUBLIC_PATH: &str = "/static/dist/";

/// Resources smaller than this many bytes are inlined as data URIs.
pub const DEFAULT_INLINE_THRESHOLD: u64 = 4096;

/// Complete description of one build.
///
/// Relative paths are interpreted as follows: `root` against the directory the
/// configuration was loaded from (see [`BuildConfig::with_base_dir`]), every
/// other path against `root`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Project root; module ids and first-party asset paths are relative to it.
    pub root: PathBuf,

    /// Logical bundle name → entry module path.
    pub entries: IndexMap<String, PathBuf>,

    /// Directory that receives emitted artifacts and the manifest.
    pub output_dir: PathBuf,

    /// URL prefix prepended to every manifest value.
    pub public_path: String,

    /// Roots searched, in order, for bare specifiers.
    pub search_roots: Vec<PathBuf>,

    /// Size (bytes) at which a static resource is emitted as a file instead of inlined.
    pub inline_threshold_bytes: u64,

    /// Remove everything under `output_dir` before writing.
    pub clean_output_dir: bool,

    /// Syntax baseline scripts are lowered to (`es2015`, `es2020`, ...).
    pub target: String,

    pub styles: StyleOptions,

    /// Path component that marks third-party modules.
    pub vendor_dir: String,

    /// Number of hex characters of the content hash kept in file names.
    pub hash_length: usize,

    /// Permit import cycles between script modules.
    pub allow_cycles: bool,

    /// Emit an `index.html` that loads every entry.
    pub html: bool,

    /// File name of the manifest inside `output_dir`.
    pub manifest_name: String,
}

/// Style pipeline options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleOptions {
    /// Compile `.scss` modules. When disabled, importing one fails the build.
    pub scss: bool,

    /// Minify the extracted style sheets.
    pub minify: bool,

    /// Browserslist queries used for vendor prefixing.
    pub browsers: Vec<String>,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            scss: true,
            minify: false,
            browsers: vec!["defaults".to_string()],
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            entries: IndexMap::new(),
            output_dir: PathBuf::from("dist"),
            public_path: DEFAULT_PUBLIC_PATH.to_string(),
            search_roots: vec![PathBuf::from("."), PathBuf::from("node_modules")],
            inline_threshold_bytes: DEFAULT_INLINE_THRESHOLD,
            clean_output_dir: true,
            target: "es2015".to_string(),
            styles: StyleOptions::default(),
            vendor_dir: "node_modules".to_string(),
            hash_length: 20,
            allow_cycles: true,
            html: false,
            manifest_name: "manifest.json".to_string(),
        }
    }
}

impl BuildConfig {
    /// Create a config rooted at `root` with default options and no entries.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Add (or replace) an entry.
    pub fn entry(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.entries.insert(name.into(), path.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn public_path(mut self, public_path: impl Into<String>) -> Self {
        self.public_path = public_path.into();
        self
    }

    pub fn search_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_roots = roots.into_iter().map(Into::into).collect();
        self
    }

    pub fn inline_threshold(mut self, bytes: u64) -> Self {
        self.inline_threshold_bytes = bytes;
        self
    }

    pub fn clean(mut self, clean: bool) -> Self {
        self.clean_output_dir = clean;
        self
    }

    /// Anchor a relative `root` at `base` (usually the config file's directory).
    pub fn with_base_dir(mut self, base: &Path) -> Self {
        if self.root.is_relative() {
            self.root = base.join(&self.root).clean();
        }
        self
    }

    /// Absolute, normalized project root.
    pub fn root_dir(&self) -> PathBuf {
        if self.root.is_absolute() {
            self.root.clean()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&self.root).clean())
                .unwrap_or_else(|_| self.root.clean())
        }
    }

    /// Resolve a root-relative path.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.clean()
        } else {
            self.root_dir().join(path).clean()
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.output_dir)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_path().join(&self.manifest_name)
    }

    pub fn search_root_paths(&self) -> Vec<PathBuf> {
        self.search_roots.iter().map(|p| self.resolve(p)).collect()
    }

    /// Entries with absolute paths, in declaration order.
    pub fn entry_paths(&self) -> Vec<(String, PathBuf)> {
        self.entries
            .iter()
            .map(|(name, path)| (name.clone(), self.resolve(path)))
            .collect()
    }

    /// Public URL of a file name relative to the output directory.
    pub fn public_url(&self, file_name: &str) -> String {
        if self.public_path.is_empty() {
            return file_name.to_string();
        }
        format!(
            "{}/{}",
            self.public_path.trim_end_matches('/'),
            file_name.trim_start_matches('/')
        )
    }
}
