//! Specifier resolution.
//!
//! Relative specifiers resolve against the importing file, absolute ones
//! against the project root, and bare ones against the search roots in order.
//! A search root given as a single directory name (`node_modules`) is looked up
//! in every ancestor of the importer, nearest first.
//!
//! Package lookups (`exports`, `browser`, main fields, directory indexes) go
//! through `oxc_resolver`. Style requests add two rules on top: webpack's
//! `~package` prefix and Sass `_partial` file names.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use oxc_resolver::{ResolveError, ResolveOptions};
use path_clean::PathClean;

use crate::error::{Error, Result};

/// Extensions tried, in order, when a script specifier does not name a file.
pub const EXTENSIONS: &[&str] = &[".js", ".mjs", ".cjs", ".json", ".scss", ".css"];

const STYLE_EXTENSIONS: &[&str] = &[".scss", ".css"];

const SCRIPT_MAIN_FIELDS: &[&str] = &["browser", "module", "main"];
const STYLE_MAIN_FIELDS: &[&str] = &["sass", "style", "main"];

const SCRIPT_CONDITIONS: &[&str] = &["browser", "import", "module", "default"];
const STYLE_CONDITIONS: &[&str] = &["sass", "style", "default"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum SearchRoot {
    Dir(PathBuf),
    /// Looked up in each ancestor of the importing file.
    Hierarchical(String),
}

impl SearchRoot {
    fn module_dir(&self) -> String {
        match self {
            SearchRoot::Dir(dir) => dir.to_string_lossy().into_owned(),
            SearchRoot::Hierarchical(name) => name.clone(),
        }
    }
}

pub struct Resolver {
    root: PathBuf,
    search_roots: Vec<SearchRoot>,
    scripts: oxc_resolver::Resolver,
    styles: oxc_resolver::Resolver,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("root", &self.root)
            .field("search_roots", &self.search_roots)
            .finish_non_exhaustive()
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

impl Resolver {
    /// `search_roots` are relative to `root` unless absolute.
    pub fn new(root: impl Into<PathBuf>, search_roots: &[PathBuf]) -> Self {
        let root = root.into().clean();
        let search_roots: Vec<SearchRoot> = search_roots
            .iter()
            .map(|p| {
                let mut components = p.components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(name)), None) => {
                        SearchRoot::Hierarchical(name.to_string_lossy().into_owned())
                    }
                    _ => SearchRoot::Dir(root.join(p).clean()),
                }
            })
            .collect();

        let modules: Vec<String> = search_roots.iter().map(SearchRoot::module_dir).collect();
        // Paths stay as written so module ids remain relative to the root.
        let scripts = oxc_resolver::Resolver::new(ResolveOptions {
            modules: modules.clone(),
            extensions: strings(EXTENSIONS),
            main_fields: strings(SCRIPT_MAIN_FIELDS),
            condition_names: strings(SCRIPT_CONDITIONS),
            alias_fields: vec![vec!["browser".to_string()]],
            symlinks: false,
            ..ResolveOptions::default()
        });
        let styles = oxc_resolver::Resolver::new(ResolveOptions {
            modules,
            extensions: strings(STYLE_EXTENSIONS),
            main_fields: strings(STYLE_MAIN_FIELDS),
            main_files: strings(&["index", "_index"]),
            condition_names: strings(STYLE_CONDITIONS),
            symlinks: false,
            ..ResolveOptions::default()
        });

        Self {
            root,
            search_roots,
            scripts,
            styles,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `specifier` as written in `importer`.
    ///
    /// Style requests also accept webpack's `~package` prefix, treat an
    /// unprefixed path as relative first, and try `_partial` names.
    pub fn resolve(&self, specifier: &str, importer: &Path, style: bool) -> Result<PathBuf> {
        let (request, force_bare) = match specifier.strip_prefix('~') {
            Some(rest) if style => (rest, true),
            _ => (specifier, false),
        };
        let importer_dir = importer.parent().unwrap_or(&self.root);

        let found = if !force_bare && is_relative(request) {
            self.lookup(importer_dir, request, style)
        } else if !force_bare && request.starts_with('/') {
            let from_root = format!("./{}", request.trim_start_matches('/'));
            self.lookup(&self.root, &from_root, style)
        } else if style && !force_bare {
            match self.lookup(importer_dir, &format!("./{request}"), style) {
                Ok(None) => self.lookup(importer_dir, request, style),
                other => other,
            }
        } else {
            self.lookup(importer_dir, request, style)
        };

        match found {
            Ok(Some(path)) => Ok(path),
            Ok(None) => Err(unresolved(specifier, importer, None)),
            Err(err) => Err(unresolved(specifier, importer, Some(err))),
        }
    }

    /// Resolve a directory specifier (used by `require.context`).
    pub fn resolve_dir(&self, specifier: &str, importer: &Path) -> Option<PathBuf> {
        let importer_dir = importer.parent().unwrap_or(&self.root);
        if is_relative(specifier) {
            let dir = importer_dir.join(specifier).clean();
            return dir.is_dir().then_some(dir);
        }
        if specifier.starts_with('/') {
            let dir = self.root.join(specifier.trim_start_matches('/')).clean();
            return dir.is_dir().then_some(dir);
        }
        self.bases_for(importer_dir)
            .into_iter()
            .map(|base| base.join(specifier).clean())
            .find(|dir| dir.is_dir())
    }

    /// Directories handed to the SCSS compiler for `@use`/`@import` lookups.
    pub fn style_load_paths(&self) -> Vec<PathBuf> {
        self.bases_for(&self.root)
            .into_iter()
            .filter(|dir| dir.is_dir())
            .collect()
    }

    fn bases_for(&self, importer_dir: &Path) -> Vec<PathBuf> {
        let mut bases = Vec::new();
        for root in &self.search_roots {
            match root {
                SearchRoot::Dir(dir) => bases.push(dir.clone()),
                SearchRoot::Hierarchical(name) => {
                    bases.extend(importer_dir.ancestors().map(|a| a.join(name)));
                }
            }
        }
        bases
    }

    /// `Ok(None)` when nothing matches; `Err` when a package is unusable
    /// (malformed `package.json`, subpath not exported, ignored by `browser`).
    fn lookup(
        &self,
        dir: &Path,
        request: &str,
        style: bool,
    ) -> std::result::Result<Option<PathBuf>, ResolveError> {
        let resolver = if style { &self.styles } else { &self.scripts };
        match resolver.resolve(dir, request) {
            Ok(resolution) => Ok(Some(resolution.path().clean())),
            Err(ResolveError::NotFound(_)) if style => match partial(request) {
                Some(partial) => match resolver.resolve(dir, &partial) {
                    Ok(resolution) => Ok(Some(resolution.path().clean())),
                    Err(ResolveError::NotFound(_)) => Ok(None),
                    Err(err) => Err(err),
                },
                None => Ok(None),
            },
            Err(ResolveError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

}

fn unresolved(specifier: &str, importer: &Path, cause: Option<ResolveError>) -> Error {
    if let Some(cause) = cause {
        tracing::warn!(
            specifier,
            importer = %importer.display(),
            reason = %cause,
            "package resolution failed"
        );
    }
    Error::Resolution {
        specifier: specifier.to_string(),
        importer: importer.to_path_buf(),
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// `a/b/name` becomes `a/b/_name`. `None` when the last segment is already a
/// partial or is not a file name.
fn partial(request: &str) -> Option<String> {
    let (dir, name) = match request.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, request),
    };
    if name.is_empty() || name.starts_with('_') || name == "." || name == ".." {
        return None;
    }
    Some(match dir {
        Some(dir) => format!("{dir}/_{name}"),
        None => format!("_{name}"),
    })
}
