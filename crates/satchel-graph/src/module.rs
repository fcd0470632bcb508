use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ModuleId;

/// Style sheet flavour of a style module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleLang {
    Css,
    Scss,
}

/// What a module is, derived from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    Script,
    Json,
    Style(StyleLang),
    /// Fonts and images; handled as opaque bytes.
    Asset,
}

/// Extensions treated as static resources.
pub const ASSET_EXTENSIONS: &[&str] = &[
    "ttf", "eot", "woff", "woff2", "png", "jpg", "jpeg", "gif", "svg", "ico", "webp",
];

impl ModuleKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        match ext.as_str() {
            "js" | "mjs" | "cjs" => Some(Self::Script),
            "json" => Some(Self::Json),
            "css" => Some(Self::Style(StyleLang::Css)),
            "scss" => Some(Self::Style(StyleLang::Scss)),
            other if ASSET_EXTENSIONS.contains(&other) => Some(Self::Asset),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn is_style(&self) -> bool {
        matches!(self, Self::Style(_))
    }
}

/// Loaded module contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Scripts, JSON, and style sheets (already compiled to CSS).
    Text(String),
    Bytes(Vec<u8>),
}

impl Source {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How a dependency was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    /// `import ... from` and `export ... from`
    Import,
    Require,
    DynamicImport,
    /// Member of a `require.context` expansion.
    Context,
    /// Style sheet `@import`
    StyleImport,
    /// Style sheet `url(...)`
    StyleUrl,
}

/// A resolved edge of the module graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Specifier exactly as written in the source (context members use their key).
    pub specifier: String,
    pub kind: DependencyKind,
    pub target: ModuleId,
}

/// A statically expanded `require.context(directory, recursive, /pattern/flags)` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMap {
    pub directory: String,
    pub recursive: bool,
    pub pattern: String,
    pub flags: String,
    /// `./relative/path` key → module id, sorted by key.
    pub entries: IndexMap<String, ModuleId>,
}

impl ContextMap {
    /// Whether this expansion belongs to the call with the given arguments.
    pub fn matches(&self, directory: &str, recursive: bool, pattern: &str, flags: &str) -> bool {
        self.directory == directory
            && self.recursive == recursive
            && self.pattern == pattern
            && self.flags == flags
    }
}

/// A node of the module graph.
#[derive(Debug, Clone)]
pub struct Module {
    pub id: ModuleId,
    pub path: PathBuf,
    pub kind: ModuleKind,
    pub source: Source,
    /// Outgoing edges in source order.
    pub dependencies: Vec<Dependency>,
    pub contexts: Vec<ContextMap>,
    /// Whether the module lives under the vendor directory.
    pub is_vendor: bool,
    pub is_entry: bool,
    /// Whether the script uses ES module syntax (`import`/`export`).
    pub is_esm: bool,
}

impl Module {
    pub fn builder(id: ModuleId, path: PathBuf, kind: ModuleKind) -> ModuleBuilder {
        ModuleBuilder {
            module: Self {
                id,
                path,
                kind,
                source: Source::Text(String::new()),
                dependencies: Vec::new(),
                contexts: Vec::new(),
                is_vendor: false,
                is_entry: false,
                is_esm: false,
            },
        }
    }

    /// Target of a specifier as written in this module.
    pub fn resolved(&self, specifier: &str) -> Option<&ModuleId> {
        self.dependencies
            .iter()
            .find(|dep| dep.specifier == specifier && dep.kind != DependencyKind::Context)
            .map(|dep| &dep.target)
    }

    /// Expansion recorded for a `require.context` call.
    pub fn context(
        &self,
        directory: &str,
        recursive: bool,
        pattern: &str,
        flags: &str,
    ) -> Option<&ContextMap> {
        self.contexts
            .iter()
            .find(|ctx| ctx.matches(directory, recursive, pattern, flags))
    }

    pub fn dependency_ids(&self) -> impl Iterator<Item = &ModuleId> {
        self.dependencies.iter().map(|dep| &dep.target)
    }

    pub fn text(&self) -> &str {
        self.source.as_text().unwrap_or_default()
    }
}

/// Builder for [`Module`].
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn source(mut self, source: Source) -> Self {
        self.module.source = source;
        self
    }

    pub fn dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.module.dependencies = dependencies;
        self
    }

    pub fn contexts(mut self, contexts: Vec<ContextMap>) -> Self {
        self.module.contexts = contexts;
        self
    }

    pub fn vendor(mut self, is_vendor: bool) -> Self {
        self.module.is_vendor = is_vendor;
        self
    }

    pub fn entry(mut self, is_entry: bool) -> Self {
        self.module.is_entry = is_entry;
        self
    }

    pub fn esm(mut self, is_esm: bool) -> Self {
        self.module.is_esm = is_esm;
        self
    }

    pub fn build(self) -> Module {
        self.module
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(ModuleKind::from_path(Path::new("a.mjs")), Some(ModuleKind::Script));
        assert_eq!(
            ModuleKind::from_path(Path::new("a.SCSS")),
            Some(ModuleKind::Style(StyleLang::Scss))
        );
        assert_eq!(ModuleKind::from_path(Path::new("f.woff2")), Some(ModuleKind::Asset));
        assert_eq!(ModuleKind::from_path(Path::new("README.md")), None);
        assert_eq!(ModuleKind::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn resolved_ignores_context_members() {
        let module = Module::builder(
            ModuleId::new("app.js"),
            PathBuf::from("/p/app.js"),
            ModuleKind::Script,
        )
        .dependencies(vec![
            Dependency {
                specifier: "./a.js".into(),
                kind: DependencyKind::Context,
                target: ModuleId::new("controllers/a.js"),
            },
            Dependency {
                specifier: "./a.js".into(),
                kind: DependencyKind::Import,
                target: ModuleId::new("a.js"),
            },
        ])
        .build();

        assert_eq!(module.resolved("./a.js"), Some(&ModuleId::new("a.js")));
        assert_eq!(module.resolved("./b.js"), None);
    }
}
