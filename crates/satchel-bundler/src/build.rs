//! The `build()` pipeline.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use satchel_config::BuildConfig;
use satchel_graph::oxc::SourceType;
use satchel_graph::{GraphWalker, Module, ModuleGraph, ModuleId, ModuleKind, WalkOptions};

use crate::assets::{self, ResourceOutput};
use crate::chunks::{self, ChunkPlan, VENDOR_CHUNK, render_chunk, wrap_factory};
use crate::hash::{content_hash, hashed_name};
use crate::html::{PAGE_NAME, render_page};
use crate::manifest::Manifest;
use crate::output::{Artifact, ArtifactKind, write_build};
use crate::rewrite::{js_string, rewrite_module};
use crate::runtime::{RUNTIME_NAME, RUNTIME_SOURCE};
use crate::styles::{ProcessedStyle, StyleProcessor};
use crate::transform::Lowering;
use crate::{Error, Result};

/// Summary of one emitted file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ArtifactInfo {
    pub name: String,
    pub file_name: String,
    pub size: usize,
    pub kind: ArtifactKind,
}

/// What a successful build produced.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// In write order.
    pub artifacts: Vec<ArtifactInfo>,
    pub manifest: Manifest,
    pub module_count: usize,
    pub duration: Duration,
}

impl BuildReport {
    pub fn artifact(&self, name: &str) -> Option<&ArtifactInfo> {
        self.artifacts.iter().find(|a| a.name == name)
    }
}

/// Run a complete build: resolve, transform, extract styles, handle
/// resources, chunk, hash, then write artifacts and finally the manifest.
///
/// Either every artifact and the manifest are written, or no manifest is.
pub fn build(config: &BuildConfig) -> Result<BuildReport> {
    let started = Instant::now();
    config.validate()?;

    check_output_dir(config)?;
    let root = config.root_dir();
    let out_dir = config.output_path();

    let lowering = Lowering::new(&config.target)?;
    let style_processor = StyleProcessor::new(&config.styles)?;

    let graph = GraphWalker::new(WalkOptions {
        root,
        search_roots: config.search_roots.clone(),
        vendor_dir: config.vendor_dir.clone(),
        scss: config.styles.scss,
        allow_cycles: config.allow_cycles,
    })
    .walk(&config.entry_paths())?;

    let plan = chunks::plan(&graph);
    let resources = assets::process_resources(&graph, config);
    let factories = compile_factories(&graph, &plan, &lowering, &resources)?;
    let sheets = process_styles(&graph, &plan, &style_processor, &resources)?;

    let mut artifacts = vec![hashed(
        RUNTIME_NAME,
        "js/runtime.js",
        RUNTIME_SOURCE.to_string(),
        ArtifactKind::Runtime,
        config.hash_length,
    )];
    artifacts.extend(script_chunks(&plan, &factories, config.hash_length));
    artifacts.extend(style_sheets(&plan, &sheets, &style_processor, config.hash_length));
    artifacts.extend(resources.artifacts);

    let mut manifest = Manifest::new();
    for artifact in &artifacts {
        manifest.insert(artifact.name.clone(), config.public_url(&artifact.file_name));
    }
    if config.html {
        let page = page(&plan, &manifest);
        manifest.insert(PAGE_NAME, config.public_url(PAGE_NAME));
        artifacts.push(Artifact::new(PAGE_NAME, PAGE_NAME, page, ArtifactKind::Page));
    }
    manifest.sort();

    for artifact in &artifacts {
        tracing::debug!(
            name = %artifact.name,
            file = %artifact.file_name,
            bytes = artifact.size(),
            "artifact ready"
        );
    }

    write_build(
        &out_dir,
        &artifacts,
        &manifest,
        &config.manifest_name,
        config.clean_output_dir,
    )?;

    let report = BuildReport {
        artifacts: artifacts
            .iter()
            .map(|a| ArtifactInfo {
                name: a.name.clone(),
                file_name: a.file_name.clone(),
                size: a.size(),
                kind: a.kind,
            })
            .collect(),
        manifest,
        module_count: graph.len(),
        duration: started.elapsed(),
    };

    tracing::info!(
        modules = report.module_count,
        artifacts = report.artifacts.len(),
        out_dir = %out_dir.display(),
        elapsed_ms = report.duration.as_millis() as u64,
        "build complete"
    );
    Ok(report)
}

fn hashed(
    name: &str,
    logical_path: &str,
    contents: String,
    kind: ArtifactKind,
    hash_length: usize,
) -> Artifact {
    let hash = content_hash(contents.as_bytes(), hash_length);
    Artifact::new(name, hashed_name(logical_path, &hash), contents, kind)
}

/// Factory source of every script-side module.
fn compile_factories(
    graph: &ModuleGraph,
    plan: &ChunkPlan,
    lowering: &Lowering,
    resources: &ResourceOutput,
) -> Result<FxHashMap<ModuleId, String>> {
    let modules: Vec<&Module> = plan
        .script_modules(graph)
        .iter()
        .filter_map(|id| graph.get(id))
        .collect();

    // Collected in graph order so the reported error does not depend on scheduling.
    let compiled: Vec<Result<(ModuleId, String)>> = modules
        .par_iter()
        .map(|module| {
            compile_module(module, lowering, resources).map(|factory| (module.id.clone(), factory))
        })
        .collect();

    let mut factories = FxHashMap::default();
    for result in compiled {
        let (id, factory) = result?;
        factories.insert(id, factory);
    }
    Ok(factories)
}

fn compile_module(module: &Module, lowering: &Lowering, resources: &ResourceOutput) -> Result<String> {
    let body = match module.kind {
        ModuleKind::Script => {
            let rewritten = rewrite_module(module)?;
            let source_type = if module.is_esm {
                SourceType::mjs()
            } else {
                SourceType::cjs()
            };
            lowering.lower(&rewritten, &module.path, source_type)?
        }
        ModuleKind::Json => format!("module.exports = {};\n", module.text().trim()),
        // Styles are extracted; the script side only needs the module to exist.
        ModuleKind::Style(_) => String::new(),
        ModuleKind::Asset => {
            let url = resources.url(&module.id).unwrap_or_default();
            format!("module.exports = {};\n", js_string(url))
        }
    };

    tracing::debug!(module = %module.id, bytes = body.len(), "module compiled");
    Ok(wrap_factory(&body, module.is_esm))
}

fn process_styles(
    graph: &ModuleGraph,
    plan: &ChunkPlan,
    processor: &StyleProcessor,
    resources: &ResourceOutput,
) -> Result<FxHashMap<ModuleId, ProcessedStyle>> {
    let modules: Vec<&Module> = plan
        .style_modules(graph)
        .iter()
        .filter_map(|id| graph.get(id))
        .collect();

    let processed: Vec<Result<(ModuleId, ProcessedStyle)>> = modules
        .par_iter()
        .map(|module| {
            processor
                .process(module, resources)
                .map(|style| (module.id.clone(), style))
        })
        .collect();

    let mut sheets = FxHashMap::default();
    for result in processed {
        let (id, style) = result?;
        sheets.insert(id, style);
    }
    Ok(sheets)
}

fn script_chunks(
    plan: &ChunkPlan,
    factories: &FxHashMap<ModuleId, String>,
    hash_length: usize,
) -> Vec<Artifact> {
    let members = |ids: &'_ [ModuleId]| -> Vec<(&ModuleId, &str)> {
        ids.iter()
            .filter_map(|id| factories.get_key_value(id).map(|(id, f)| (id, f.as_str())))
            .collect()
    };

    let mut artifacts = Vec::new();
    if !plan.vendor.is_empty() {
        let code = render_chunk(&[VENDOR_CHUNK], members(&plan.vendor), &[]);
        artifacts.push(hashed(
            &format!("{VENDOR_CHUNK}.js"),
            &format!("js/{VENDOR_CHUNK}.js"),
            code,
            ArtifactKind::Script,
            hash_length,
        ));
    }

    for chunk in &plan.entries {
        let mut waits = Vec::new();
        if chunk.needs_vendor {
            waits.push(VENDOR_CHUNK.to_string());
        }
        waits.push(chunk.name.clone());

        let code = render_chunk(
            &[chunk.name.as_str()],
            members(&chunk.modules),
            &[(chunk.entry.clone(), waits)],
        );
        artifacts.push(hashed(
            &format!("{}.js", chunk.name),
            &format!("js/{}.js", chunk.name),
            code,
            ArtifactKind::Script,
            hash_length,
        ));
    }
    artifacts
}

fn style_sheets(
    plan: &ChunkPlan,
    sheets: &FxHashMap<ModuleId, ProcessedStyle>,
    processor: &StyleProcessor,
    hash_length: usize,
) -> Vec<Artifact> {
    let mut artifacts = Vec::new();
    let mut sheet = |name: &str, ids: &[ModuleId]| {
        if ids.is_empty() {
            return;
        }
        let css = processor.concat(ids.iter().filter_map(|id| sheets.get(id)));
        artifacts.push(hashed(
            &format!("{name}.css"),
            &format!("css/{name}.css"),
            css,
            ArtifactKind::Style,
            hash_length,
        ));
    };

    sheet(VENDOR_CHUNK, &plan.vendor_styles);
    for chunk in &plan.entries {
        sheet(&chunk.name, &chunk.styles);
    }
    artifacts
}

/// Vendor styles first, then entry styles; runtime, vendor and entry scripts.
/// Cleaning the output directory must never reach a source path.
fn check_output_dir(config: &BuildConfig) -> Result<()> {
    let out_dir = config.output_path();
    let sources = std::iter::once(("project root", config.root_dir()))
        .chain(config.entry_paths().into_iter().map(|(_, path)| ("entry", path)))
        .chain(config.search_root_paths().into_iter().map(|path| ("search root", path)));

    for (what, path) in sources {
        if path.starts_with(&out_dir) {
            return Err(Error::InvalidOutputPath(format!(
                "output directory '{}' contains the {what} '{}'",
                out_dir.display(),
                path.display()
            )));
        }
    }
    Ok(())
}

fn page(plan: &ChunkPlan, manifest: &Manifest) -> String {
    let url = |name: String| manifest.url_for(&name).map(str::to_string);

    let stylesheets: Vec<String> = std::iter::once(VENDOR_CHUNK)
        .chain(plan.entries.iter().map(|c| c.name.as_str()))
        .filter_map(|name| url(format!("{name}.css")))
        .collect();
    let scripts: Vec<String> = [RUNTIME_NAME.to_string(), format!("{VENDOR_CHUNK}.js")]
        .into_iter()
        .chain(plan.entries.iter().map(|c| format!("{}.js", c.name)))
        .filter_map(url)
        .collect();

    render_page(&stylesheets, &scripts)
}
