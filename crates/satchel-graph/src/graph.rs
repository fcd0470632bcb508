use indexmap::{IndexMap, IndexSet};

use crate::{Dependency, Module, ModuleId};

/// The module graph of one build.
///
/// Modules are kept in discovery order (entries first, then breadth-first in
/// source order), which is the deterministic order every later stage uses.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: IndexMap<ModuleId, Module>,
    entries: IndexMap<String, ModuleId>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(&mut self, module: Module) {
        self.modules.insert(module.id.clone(), module);
    }

    pub fn add_entry(&mut self, name: impl Into<String>, id: ModuleId) {
        self.entries.insert(name.into(), id);
    }

    pub fn get(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.get(id)
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.modules.contains_key(id)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// Position of a module in discovery order.
    pub fn index_of(&self, id: &ModuleId) -> Option<usize> {
        self.modules.get_index_of(id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Entry name → entry module, in configuration order.
    pub fn entries(&self) -> &IndexMap<String, ModuleId> {
        &self.entries
    }

    pub fn dependencies(&self, id: &ModuleId) -> Vec<&ModuleId> {
        self.get(id)
            .map(|m| m.dependency_ids().collect())
            .unwrap_or_default()
    }

    /// Modules reachable from `start` (inclusive) in dependency-first
    /// depth-first post-order, following edges in source order.
    ///
    /// This is the order in which a runtime evaluates the modules; styles are
    /// concatenated in it.
    pub fn execution_order(&self, start: &ModuleId) -> Vec<ModuleId> {
        self.execution_order_filtered(start, |_| true)
    }

    /// [`execution_order`](Self::execution_order) following only the edges
    /// accepted by `follow`.
    pub fn execution_order_filtered<F>(&self, start: &ModuleId, follow: F) -> Vec<ModuleId>
    where
        F: Fn(&Dependency) -> bool,
    {
        let mut visited: IndexSet<&ModuleId> = IndexSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<(&ModuleId, usize)> = Vec::new();

        if self.contains(start) {
            visited.insert(start);
            stack.push((start, 0));
        }

        while let Some(&(id, next)) = stack.last() {
            let deps = self.get(id).map(|m| m.dependencies.as_slice()).unwrap_or_default();
            if let Some(dep) = deps.get(next) {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                let target = &dep.target;
                if follow(dep) && self.contains(target) && visited.insert(target) {
                    stack.push((target, 0));
                }
            } else {
                order.push(id.clone());
                stack.pop();
            }
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dependency, DependencyKind, ModuleKind};
    use std::path::PathBuf;

    fn module(id: &str, deps: &[&str]) -> Module {
        Module::builder(ModuleId::new(id), PathBuf::from(id), ModuleKind::Script)
            .dependencies(
                deps.iter()
                    .map(|d| Dependency {
                        specifier: format!("./{d}"),
                        kind: DependencyKind::Import,
                        target: ModuleId::new(*d),
                    })
                    .collect(),
            )
            .build()
    }

    #[test]
    fn execution_order_is_dependency_first() {
        let mut graph = ModuleGraph::new();
        graph.add_module(module("app.js", &["a.js", "b.js"]));
        graph.add_module(module("a.js", &["c.js"]));
        graph.add_module(module("b.js", &["c.js"]));
        graph.add_module(module("c.js", &[]));

        let order: Vec<_> = graph
            .execution_order(&ModuleId::new("app.js"))
            .into_iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(order, vec!["c.js", "a.js", "b.js", "app.js"]);
    }

    #[test]
    fn filtered_order_skips_rejected_edges() {
        let mut graph = ModuleGraph::new();
        graph.add_module(module("app.js", &["a.js", "b.js"]));
        graph.add_module(module("a.js", &[]));
        graph.add_module(module("b.js", &[]));

        let order = graph.execution_order_filtered(&ModuleId::new("app.js"), |dep| {
            dep.target.as_str() != "b.js"
        });
        assert_eq!(order, vec![ModuleId::new("a.js"), ModuleId::new("app.js")]);
    }

    #[test]
    fn execution_order_terminates_on_cycles() {
        let mut graph = ModuleGraph::new();
        graph.add_module(module("a.js", &["b.js"]));
        graph.add_module(module("b.js", &["a.js"]));

        let order = graph.execution_order(&ModuleId::new("a.js"));
        assert_eq!(order, vec![ModuleId::new("b.js"), ModuleId::new("a.js")]);
    }
}
