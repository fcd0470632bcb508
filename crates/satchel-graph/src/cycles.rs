//! Cycle detection over a finished graph.

use rustc_hash::FxHashMap;

use crate::{ModuleGraph, ModuleId};

/// A dependency cycle. The first module is repeated at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub modules: Vec<ModuleId>,
    /// The cycle runs through style sheet `@import`s.
    pub through_styles: bool,
}

impl Cycle {
    pub fn path(&self) -> Vec<String> {
        self.modules.iter().map(ToString::to_string).collect()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Find every back edge reachable from the graph's modules, in discovery order.
pub fn find_cycles(graph: &ModuleGraph) -> Vec<Cycle> {
    let mut marks: FxHashMap<&ModuleId, Mark> = FxHashMap::default();
    let mut cycles: Vec<Cycle> = Vec::new();

    for start in graph.modules().map(|m| &m.id) {
        if marks.contains_key(start) {
            continue;
        }

        let mut stack: Vec<(&ModuleId, usize)> = vec![(start, 0)];
        marks.insert(start, Mark::InProgress);

        while let Some(&(id, next)) = stack.last() {
            let deps = graph
                .get(id)
                .map(|m| m.dependencies.as_slice())
                .unwrap_or_default();

            let Some(dep) = deps.get(next) else {
                marks.insert(id, Mark::Done);
                stack.pop();
                continue;
            };
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            let target = &dep.target;
            if !graph.contains(target) {
                continue;
            }
            match marks.get(target) {
                None => {
                    marks.insert(target, Mark::InProgress);
                    stack.push((target, 0));
                }
                Some(Mark::InProgress) => {
                    if let Some(pos) = stack.iter().position(|(m, _)| *m == target) {
                        let mut modules: Vec<ModuleId> =
                            stack[pos..].iter().map(|(m, _)| (*m).clone()).collect();
                        modules.push(target.clone());
                        let through_styles = modules
                            .iter()
                            .any(|m| graph.get(m).is_some_and(|m| m.kind.is_style()));
                        let cycle = Cycle {
                            modules,
                            through_styles,
                        };
                        if !cycles.contains(&cycle) {
                            cycles.push(cycle);
                        }
                    }
                }
                Some(Mark::Done) => {}
            }
        }
    }

    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dependency, DependencyKind, Module, ModuleKind, StyleLang};
    use std::path::PathBuf;

    fn module(id: &str, kind: ModuleKind, deps: &[&str]) -> Module {
        Module::builder(ModuleId::new(id), PathBuf::from(id), kind)
            .dependencies(
                deps.iter()
                    .map(|d| Dependency {
                        specifier: (*d).to_string(),
                        kind: DependencyKind::Import,
                        target: ModuleId::new(*d),
                    })
                    .collect(),
            )
            .build()
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let mut graph = ModuleGraph::new();
        graph.add_module(module("a.js", ModuleKind::Script, &["b.js", "c.js"]));
        graph.add_module(module("b.js", ModuleKind::Script, &["c.js"]));
        graph.add_module(module("c.js", ModuleKind::Script, &[]));
        assert!(find_cycles(&graph).is_empty());
    }

    #[test]
    fn reports_full_cycle_path() {
        let mut graph = ModuleGraph::new();
        graph.add_module(module("a.js", ModuleKind::Script, &["b.js"]));
        graph.add_module(module("b.js", ModuleKind::Script, &["c.js"]));
        graph.add_module(module("c.js", ModuleKind::Script, &["a.js"]));

        let cycles = find_cycles(&graph);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].path(), vec!["a.js", "b.js", "c.js", "a.js"]);
        assert!(!cycles[0].through_styles);
    }

    #[test]
    fn style_cycles_are_flagged() {
        let css = ModuleKind::Style(StyleLang::Css);
        let mut graph = ModuleGraph::new();
        graph.add_module(module("a.css", css, &["b.css"]));
        graph.add_module(module("b.css", css, &["a.css"]));

        let cycles = find_cycles(&graph);
        assert!(cycles[0].through_styles);
    }
}
