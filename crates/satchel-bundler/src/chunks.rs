//! Chunk planning and rendering.
//!
//! | chunk | contents |
//! |---|---|
//! | `runtime` | the module loader only |
//! | `vendors` | every script-side module under the vendor directory |
//! | one per entry | first-party modules reachable from that entry |
//!
//! A first-party module reachable from two entries is placed in both entry
//! chunks. Within a chunk, modules are ordered by their graph position.
//! Chunks refer to each other by name only, so a chunk's bytes depend on
//! nothing but its own modules.

use rustc_hash::FxHashSet;
use satchel_graph::{DependencyKind, ModuleGraph, ModuleId};

use crate::rewrite::js_string;
use crate::runtime::{CHUNK_QUEUE, REQUIRE};

/// Name of the shared third-party chunk.
pub const VENDOR_CHUNK: &str = "vendors";

/// Script and style membership of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryChunk {
    pub name: String,
    pub entry: ModuleId,
    /// First-party script-side modules, in graph order.
    pub modules: Vec<ModuleId>,
    /// Whether the entry needs modules from the vendor chunk.
    pub needs_vendor: bool,
    /// First-party style modules, in execution order.
    pub styles: Vec<ModuleId>,
}

/// How the graph is split into chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkPlan {
    /// In configuration order.
    pub entries: Vec<EntryChunk>,
    /// Vendor script-side modules, in graph order.
    pub vendor: Vec<ModuleId>,
    /// Vendor style modules, in execution order of first appearance.
    pub vendor_styles: Vec<ModuleId>,
}

impl ChunkPlan {
    /// Every module that needs a factory, each once, in graph order.
    pub fn script_modules(&self, graph: &ModuleGraph) -> Vec<ModuleId> {
        let mut seen: FxHashSet<&ModuleId> = FxHashSet::default();
        let mut ids: Vec<ModuleId> = self
            .entries
            .iter()
            .flat_map(|chunk| &chunk.modules)
            .chain(&self.vendor)
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect();
        sort_by_graph(&mut ids, graph);
        ids
    }

    /// Every style module, each once, in graph order.
    pub fn style_modules(&self, graph: &ModuleGraph) -> Vec<ModuleId> {
        let mut seen: FxHashSet<&ModuleId> = FxHashSet::default();
        let mut ids: Vec<ModuleId> = self
            .entries
            .iter()
            .flat_map(|chunk| &chunk.styles)
            .chain(&self.vendor_styles)
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect();
        sort_by_graph(&mut ids, graph);
        ids
    }
}

fn sort_by_graph(ids: &mut [ModuleId], graph: &ModuleGraph) {
    ids.sort_by_key(|id| graph.index_of(id).unwrap_or(usize::MAX));
}

/// Whether an edge makes its target part of the script side.
fn is_script_edge(kind: DependencyKind) -> bool {
    !matches!(kind, DependencyKind::StyleImport | DependencyKind::StyleUrl)
}

/// Split the graph into runtime, vendor and entry chunks.
pub fn plan(graph: &ModuleGraph) -> ChunkPlan {
    let mut plan = ChunkPlan::default();
    let mut vendor: FxHashSet<ModuleId> = FxHashSet::default();
    let mut vendor_styles: FxHashSet<ModuleId> = FxHashSet::default();

    for (name, entry) in graph.entries() {
        let reachable = graph.execution_order_filtered(entry, |dep| is_script_edge(dep.kind));

        let mut modules = Vec::new();
        let mut needs_vendor = false;
        for id in reachable {
            let Some(module) = graph.get(&id) else {
                continue;
            };
            if module.is_vendor {
                needs_vendor = true;
                vendor.insert(id);
            } else {
                modules.push(id);
            }
        }
        sort_by_graph(&mut modules, graph);

        let mut styles = Vec::new();
        for id in graph.execution_order(entry) {
            let Some(module) = graph.get(&id) else {
                continue;
            };
            if !module.kind.is_style() {
                continue;
            }
            if module.is_vendor {
                if vendor_styles.insert(id.clone()) {
                    plan.vendor_styles.push(id);
                }
            } else {
                styles.push(id);
            }
        }

        plan.entries.push(EntryChunk {
            name: name.clone(),
            entry: entry.clone(),
            modules,
            needs_vendor,
            styles,
        });
    }

    plan.vendor = vendor.into_iter().collect();
    sort_by_graph(&mut plan.vendor, graph);
    plan
}

/// Wrap a compiled module body into a factory.
pub fn wrap_factory(body: &str, strict: bool) -> String {
    let mut out = String::with_capacity(body.len() + 80);
    out.push_str("function (module, exports, ");
    out.push_str(REQUIRE);
    out.push_str(") {\n");
    if strict {
        out.push_str("\"use strict\";\n");
    }
    out.push_str(body);
    if !body.ends_with('\n') {
        out.push('\n');
    }
    out.push('}');
    out
}

/// Render a chunk record that the runtime installs.
///
/// `entries` lists entry module ids with the chunk names they wait for.
pub fn render_chunk<'a>(
    names: &[&str],
    factories: impl IntoIterator<Item = (&'a ModuleId, &'a str)>,
    entries: &[(ModuleId, Vec<String>)],
) -> String {
    let names = names.iter().map(|n| js_string(n)).collect::<Vec<_>>().join(",");
    let factories = factories
        .into_iter()
        .map(|(id, factory)| format!("{}: {factory}", js_string(id.as_str())))
        .collect::<Vec<_>>()
        .join(",\n");

    let mut out = format!("({CHUNK_QUEUE} = {CHUNK_QUEUE} || []).push([[{names}], {{\n{factories}\n}}");
    if !entries.is_empty() {
        let records = entries
            .iter()
            .map(|(id, chunks)| {
                let mut parts = vec![js_string(id.as_str())];
                parts.extend(chunks.iter().map(|c| js_string(c)));
                format!("[{}]", parts.join(","))
            })
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&format!(", [{records}]"));
    }
    out.push_str("]);\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use satchel_graph::{Dependency, Module, ModuleKind};
    use std::path::PathBuf;
    use DependencyKind::{Import, StyleImport, StyleUrl};

    struct GraphBuilder {
        graph: ModuleGraph,
    }

    impl GraphBuilder {
        fn new() -> Self {
            Self {
                graph: ModuleGraph::new(),
            }
        }

        fn module(mut self, id: &str, deps: &[(&str, DependencyKind)]) -> Self {
            let kind = ModuleKind::from_path(std::path::Path::new(id)).unwrap();
            let module = Module::builder(ModuleId::new(id), PathBuf::from(id), kind)
                .dependencies(
                    deps.iter()
                        .map(|(d, kind)| Dependency {
                            specifier: (*d).to_string(),
                            kind: *kind,
                            target: ModuleId::new(*d),
                        })
                        .collect(),
                )
                .vendor(id.contains("node_modules/"))
                .build();
            self.graph.add_module(module);
            self
        }

        fn entry(mut self, name: &str, id: &str) -> Self {
            self.graph.add_entry(name, ModuleId::new(id));
            self
        }
    }

    fn ids(list: &[ModuleId]) -> Vec<&str> {
        list.iter().map(ModuleId::as_str).collect()
    }

    #[test]
    fn vendor_modules_are_isolated() {
        let graph = GraphBuilder::new()
            .entry("main", "app.js")
            .module(
                "app.js",
                &[("../node_modules/lib/index.js", Import), ("util.js", Import)],
            )
            .module("../node_modules/lib/index.js", &[])
            .module("util.js", &[])
            .graph;

        let plan = plan(&graph);
        assert_eq!(ids(&plan.vendor), vec!["../node_modules/lib/index.js"]);
        assert_eq!(ids(&plan.entries[0].modules), vec!["app.js", "util.js"]);
        assert!(plan.entries[0].needs_vendor);
    }

    #[test]
    fn shared_first_party_module_is_in_both_entries() {
        let graph = GraphBuilder::new()
            .entry("main", "main.js")
            .entry("admin", "admin.js")
            .module("main.js", &[("shared.js", Import)])
            .module("admin.js", &[("shared.js", Import)])
            .module("shared.js", &[])
            .graph;

        let plan = plan(&graph);
        assert_eq!(ids(&plan.entries[0].modules), vec!["main.js", "shared.js"]);
        assert_eq!(ids(&plan.entries[1].modules), vec!["admin.js", "shared.js"]);
        assert!(!plan.entries[1].needs_vendor);
        assert_eq!(ids(&plan.script_modules(&graph)), vec!["main.js", "admin.js", "shared.js"]);
    }

    #[test]
    fn styles_follow_execution_order() {
        let graph = GraphBuilder::new()
            .entry("main", "app.js")
            .module("app.js", &[("a.scss", Import), ("b.css", Import)])
            .module("a.scss", &[("base.css", StyleImport), ("img/x.png", StyleUrl)])
            .module("b.css", &[])
            .module("base.css", &[])
            .module("img/x.png", &[])
            .graph;

        let plan = plan(&graph);
        assert_eq!(ids(&plan.entries[0].styles), vec!["base.css", "a.scss", "b.css"]);
        // Style-only edges stay out of the script side.
        assert_eq!(ids(&plan.entries[0].modules), vec!["app.js", "a.scss", "b.css"]);
        assert!(plan.vendor_styles.is_empty());
    }

    #[test]
    fn vendor_styles_go_to_vendor_sheet() {
        let graph = GraphBuilder::new()
            .entry("main", "app.js")
            .module("app.js", &[("../node_modules/x/x.css", Import), ("own.css", Import)])
            .module("../node_modules/x/x.css", &[])
            .module("own.css", &[])
            .graph;

        let plan = plan(&graph);
        assert_eq!(ids(&plan.vendor_styles), vec!["../node_modules/x/x.css"]);
        assert_eq!(ids(&plan.entries[0].styles), vec!["own.css"]);
    }

    #[test]
    fn chunk_record_format() {
        let a = ModuleId::new("app.js");
        let factory = wrap_factory("console.log(1);", true);
        let chunk = render_chunk(
            &["main"],
            [(&a, factory.as_str())],
            &[(a.clone(), vec!["vendors".into(), "main".into()])],
        );
        assert_eq!(
            chunk,
            "(self.satchelChunks = self.satchelChunks || []).push([[\"main\"], {\n\"app.js\": function (module, exports, __satchel_require__) {\n\"use strict\";\nconsole.log(1);\n}\n}, [[\"app.js\",\"vendors\",\"main\"]]]);\n"
        );
    }

    #[test]
    fn vendor_chunk_has_no_entry_records() {
        let id = ModuleId::new("../node_modules/x/index.js");
        let factory = wrap_factory("module.exports = 1;", false);
        let chunk = render_chunk(&[VENDOR_CHUNK], [(&id, factory.as_str())], &[]);
        assert!(chunk.ends_with("}\n}]);\n"));
        assert!(!chunk.contains("use strict"));
    }
}
