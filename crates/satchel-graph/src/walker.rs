//! Graph walker.
//!
//! Starting from the entries, loads each module, scans it for requests,
//! resolves them and queues newly discovered modules (breadth-first, in source
//! order). Once the graph is complete the cycle policy is applied.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::context;
use crate::css;
use crate::cycles::find_cycles;
use crate::error::{Error, Result};
use crate::loader::{self, LoadOptions};
use crate::module::{ContextMap, Dependency, DependencyKind, Module, ModuleKind, Source};
use crate::resolver::Resolver;
use crate::scanner::{self, Request};
use crate::{ModuleGraph, ModuleId};

/// Everything the walker needs to know about the project.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub root: PathBuf,
    /// Relative to `root` unless absolute. A bare directory name is looked up
    /// in every ancestor of the importer.
    pub search_roots: Vec<PathBuf>,
    /// Path component that marks third-party modules.
    pub vendor_dir: String,
    pub scss: bool,
    /// Permit import cycles between scripts. Style cycles are always rejected.
    pub allow_cycles: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            search_roots: vec![PathBuf::from("."), PathBuf::from("node_modules")],
            vendor_dir: "node_modules".to_string(),
            scss: true,
            allow_cycles: true,
        }
    }
}

pub struct GraphWalker {
    options: WalkOptions,
    resolver: Resolver,
    load_options: LoadOptions,
}

impl GraphWalker {
    pub fn new(options: WalkOptions) -> Self {
        let resolver = Resolver::new(&options.root, &options.search_roots);
        let load_options = LoadOptions {
            scss: options.scss,
            load_paths: resolver.style_load_paths(),
        };
        Self {
            options,
            resolver,
            load_options,
        }
    }

    /// Build the graph for `entries` (name → absolute path), in order.
    pub fn walk(&self, entries: &[(String, PathBuf)]) -> Result<ModuleGraph> {
        let mut graph = ModuleGraph::new();
        let mut queue: VecDeque<(PathBuf, ModuleId)> = VecDeque::new();
        let mut seen: FxHashSet<ModuleId> = FxHashSet::default();
        let mut entry_ids: FxHashSet<ModuleId> = FxHashSet::default();

        for (name, path) in entries {
            if !path.is_file() {
                return Err(Error::EntryNotFound {
                    name: name.clone(),
                    path: path.clone(),
                });
            }
            let id = self.module_id(path);
            graph.add_entry(name.clone(), id.clone());
            entry_ids.insert(id.clone());
            if seen.insert(id.clone()) {
                queue.push_back((path.clone(), id));
            }
        }

        while let Some((path, id)) = queue.pop_front() {
            let (module, discovered) = self.build_module(&path, id, &entry_ids)?;
            for (target_path, target) in discovered {
                if seen.insert(target.clone()) {
                    queue.push_back((target_path, target));
                }
            }
            graph.add_module(module);
        }

        self.check_cycles(&graph)?;

        tracing::info!(
            modules = graph.len(),
            entries = graph.entries().len(),
            "module graph built"
        );
        Ok(graph)
    }

    fn module_id(&self, path: &Path) -> ModuleId {
        ModuleId::from_path(self.resolver.root(), path)
    }

    fn is_vendor(&self, path: &Path) -> bool {
        path.components()
            .any(|c| c.as_os_str() == self.options.vendor_dir.as_str())
    }

    /// Load and scan one module. Also returns the resolved path of every target.
    fn build_module(
        &self,
        path: &Path,
        id: ModuleId,
        entry_ids: &FxHashSet<ModuleId>,
    ) -> Result<(Module, Vec<(PathBuf, ModuleId)>)> {
        let kind = ModuleKind::from_path(path).ok_or_else(|| Error::Unsupported {
            path: path.to_path_buf(),
            importer: self.resolver.root().to_path_buf(),
        })?;
        let source = loader::load(path, kind, &self.load_options)?;

        let mut dependencies = Vec::new();
        let mut discovered = Vec::new();
        let mut contexts = Vec::new();
        let mut is_esm = false;

        match (&kind, &source) {
            (ModuleKind::Script, Source::Text(text)) => {
                let scan = scanner::scan_script(text, path)?;
                is_esm = scan.is_esm;
                for request in &scan.requests {
                    let (dep, resolved) = self.resolve_request(request, path, false)?;
                    discovered.push((resolved, dep.target.clone()));
                    dependencies.push(dep);
                }
                for call in &scan.contexts {
                    let (map, members) = self.expand_context(call, path)?;
                    for (key, resolved) in members {
                        let target = self.module_id(&resolved);
                        discovered.push((resolved, target.clone()));
                        dependencies.push(Dependency {
                            specifier: key,
                            kind: DependencyKind::Context,
                            target,
                        });
                    }
                    contexts.push(map);
                }
            }
            (ModuleKind::Style(_), Source::Text(text)) => {
                for request in css::scan_style(text, path)? {
                    let (dep, resolved) = self.resolve_request(&request, path, true)?;
                    discovered.push((resolved, dep.target.clone()));
                    dependencies.push(dep);
                }
            }
            _ => {}
        }

        tracing::debug!(
            module = %id,
            kind = ?kind,
            dependencies = dependencies.len(),
            "module loaded"
        );

        let module = Module::builder(id.clone(), path.to_path_buf(), kind)
            .source(source)
            .dependencies(dependencies)
            .contexts(contexts)
            .vendor(self.is_vendor(path))
            .entry(entry_ids.contains(&id))
            .esm(is_esm)
            .build();
        Ok((module, discovered))
    }

    fn resolve_request(
        &self,
        request: &Request,
        importer: &Path,
        style: bool,
    ) -> Result<(Dependency, PathBuf)> {
        let resolved = self.resolver.resolve(&request.specifier, importer, style)?;
        if ModuleKind::from_path(&resolved).is_none() {
            return Err(Error::Unsupported {
                path: resolved,
                importer: importer.to_path_buf(),
            });
        }
        let dep = Dependency {
            specifier: request.specifier.clone(),
            kind: request.kind,
            target: self.module_id(&resolved),
        };
        Ok((dep, resolved))
    }

    fn expand_context(
        &self,
        call: &scanner::ContextCall,
        importer: &Path,
    ) -> Result<(ContextMap, Vec<(String, PathBuf)>)> {
        let directory = self
            .resolver
            .resolve_dir(&call.directory, importer)
            .ok_or_else(|| Error::InvalidContext {
                file: importer.to_path_buf(),
                reason: format!("directory '{}' not found", call.directory),
            })?;

        let members = context::expand(&directory, call, importer)?;
        let entries = members
            .iter()
            .map(|(key, path)| (key.clone(), self.module_id(path)))
            .collect();

        let map = ContextMap {
            directory: call.directory.clone(),
            recursive: call.recursive,
            pattern: call.pattern.clone(),
            flags: call.flags.clone(),
            entries,
        };
        Ok((map, members))
    }

    fn check_cycles(&self, graph: &ModuleGraph) -> Result<()> {
        for cycle in find_cycles(graph) {
            if cycle.through_styles || !self.options.allow_cycles {
                return Err(Error::Cycle {
                    cycle: cycle.path(),
                });
            }
            tracing::warn!(cycle = %cycle.path().join(" -> "), "circular dependency between scripts");
        }
        Ok(())
    }
}
