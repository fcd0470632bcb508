//! # satchel-graph
//!
//! Module graph construction for the satchel asset bundler.
//!
//! Given a project root and a set of entry files, [`GraphWalker`] loads every
//! reachable script, style sheet and static resource, resolves the requests
//! they make and records the result as a [`ModuleGraph`]:
//!
//! ```text
//!   entries ──► load ──► scan ──► resolve ──► queue ─┐
//!                ▲                                   │
//!                └───────────────────────────────────┘
//!                              │
//!                              ▼
//!                    cycle policy ──► ModuleGraph
//! ```
//!
//! - Scripts are scanned with oxc for `import`/`export ... from`, `require`,
//!   dynamic `import()` and `require.context` (expanded at build time).
//! - SCSS is compiled while loading, so graph edges come from the compiled CSS.
//!   Style sheets are parsed with lightningcss for `@import` and `url()`.
//! - Module ids are root-relative paths, identical on every machine.
//!
//! ```rust,no_run
//! use satchel_graph::{GraphWalker, WalkOptions};
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), satchel_graph::Error> {
//! let walker = GraphWalker::new(WalkOptions {
//!     root: PathBuf::from("/srv/app/assets"),
//!     ..WalkOptions::default()
//! });
//! let graph = walker.walk(&[("main".into(), PathBuf::from("/srv/app/assets/application.js"))])?;
//! for module in graph.modules() {
//!     println!("{} ({:?})", module.id, module.kind);
//! }
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod css;
pub mod cycles;
pub mod error;
mod graph;
pub mod loader;
pub mod module;
mod module_id;
pub mod resolver;
pub mod scanner;
mod walker;

pub use cycles::{Cycle, find_cycles};
pub use error::{Error, Result};
pub use graph::ModuleGraph;
pub use module::{
    ASSET_EXTENSIONS, ContextMap, Dependency, DependencyKind, Module, ModuleKind, Source,
    StyleLang,
};
pub use module_id::ModuleId;
pub use resolver::Resolver;
pub use walker::{GraphWalker, WalkOptions};

/// oxc types used by downstream crates, pinned to the version this crate parses with.
pub mod oxc {
    pub use oxc_allocator::Allocator;
    pub use oxc_span::{GetSpan, SourceType, Span};
}
