//! Static resources: fonts and images.
//!
//! A resource smaller than the inline threshold becomes a base64 `data:` URI;
//! anything at or above it is emitted as a content-hashed file.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use satchel_config::BuildConfig;
use satchel_graph::{Module, ModuleGraph, ModuleId, ModuleKind};

use crate::hash::{content_hash, hashed_name};
use crate::output::{Artifact, ArtifactKind};

/// Result of the resource stage.
#[derive(Debug, Default)]
pub struct ResourceOutput {
    /// Public URL or data URI of every resource module.
    pub urls: FxHashMap<ModuleId, String>,
    /// Emitted files in graph order. `Artifact::name` is the manifest key.
    pub artifacts: Vec<Artifact>,
}

impl ResourceOutput {
    pub fn url(&self, id: &ModuleId) -> Option<&str> {
        self.urls.get(id).map(String::as_str)
    }
}

/// How one resource is referenced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Inline(String),
    Emitted { url: String, artifact: Artifact },
}

impl Resource {
    pub fn url(&self) -> &str {
        match self {
            Resource::Inline(uri) => uri,
            Resource::Emitted { url, .. } => url,
        }
    }
}

/// Process every resource module of the graph in parallel.
pub fn process_resources(graph: &ModuleGraph, config: &BuildConfig) -> ResourceOutput {
    let modules: Vec<&Module> = graph
        .modules()
        .filter(|m| m.kind == ModuleKind::Asset)
        .collect();

    let processed: Vec<(ModuleId, Resource)> = modules
        .par_iter()
        .map(|module| (module.id.clone(), process_resource(module, config)))
        .collect();

    let mut output = ResourceOutput::default();
    let mut keys: FxHashMap<String, ModuleId> = FxHashMap::default();
    let mut files: FxHashSet<String> = FxHashSet::default();
    for (id, resource) in processed {
        output.urls.insert(id.clone(), resource.url().to_string());
        let Resource::Emitted { artifact, .. } = resource else {
            continue;
        };
        // Same hashed file name means same bytes; one copy on disk serves both.
        if !files.insert(artifact.file_name.clone()) {
            continue;
        }
        // Every referenced file is written. Only the manifest key is shared,
        // and the manifest keeps the later resource under it.
        if let Some(previous) = keys.insert(artifact.name.clone(), id.clone()) {
            tracing::warn!(
                key = %artifact.name,
                first = %previous,
                second = %id,
                "two resources share a manifest key; the later one wins"
            );
        }
        output.artifacts.push(artifact);
    }

    tracing::debug!(
        resources = modules.len(),
        emitted = output.artifacts.len(),
        "static resources processed"
    );
    output
}

pub fn process_resource(module: &Module, config: &BuildConfig) -> Resource {
    let bytes = module.source.as_bytes();
    let ext = extension(module.id.file_name());

    if (bytes.len() as u64) < config.inline_threshold_bytes {
        return Resource::Inline(data_uri(mime_for(ext), bytes));
    }

    let hash = content_hash(bytes, config.hash_length);
    let (key, file_name) = if module.is_vendor {
        let name = module.id.file_name();
        (name.to_string(), hashed_name(name, &hash))
    } else {
        let path = sanitize(module.id.as_str());
        (module.id.to_string(), hashed_name(&path, &hash))
    };
    let url = config.public_url(&file_name);

    Resource::Emitted {
        url,
        artifact: Artifact::new(key, file_name, bytes, ArtifactKind::Asset),
    }
}

/// `data:<mime>;base64,<payload>`
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

pub fn mime_for(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "ttf" => "font/ttf",
        "eot" => "application/vnd.ms-fontobject",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

fn extension(file_name: &str) -> &str {
    file_name.rsplit_once('.').map_or("", |(_, ext)| ext)
}

/// Keep emitted paths inside the output directory: `..` segments become `_`.
fn sanitize(id: &str) -> String {
    id.split('/')
        .map(|part| if part == ".." { "_" } else { part })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use satchel_graph::Source;
    use std::path::PathBuf;

    fn resource(id: &str, size: usize, vendor: bool) -> Module {
        Module::builder(ModuleId::new(id), PathBuf::from(id), ModuleKind::Asset)
            .source(Source::Bytes(vec![b'x'; size]))
            .vendor(vendor)
            .build()
    }

    #[test]
    fn threshold_boundary() {
        let config = BuildConfig::default().inline_threshold(4096);

        let below = process_resource(&resource("img/a.png", 4095, false), &config);
        assert!(below.url().starts_with("data:image/png;base64,"));

        let at = process_resource(&resource("img/a.png", 4096, false), &config);
        match at {
            Resource::Emitted { url, artifact } => {
                assert!(artifact.file_name.starts_with("img/a."));
                assert!(artifact.file_name.ends_with(".png"));
                assert_eq!(artifact.name, "img/a.png");
                assert_eq!(url, format!("/static/dist/{}", artifact.file_name));
            }
            Resource::Inline(_) => panic!("resource at the threshold must be emitted"),
        }
    }

    #[test]
    fn vendor_resources_are_flattened() {
        let config = BuildConfig::default().inline_threshold(0);
        let id = "../node_modules/font-awesome/fonts/fontawesome-webfont.woff2";
        let Resource::Emitted { artifact, .. } = process_resource(&resource(id, 10, true), &config)
        else {
            panic!("expected emitted resource");
        };
        assert_eq!(artifact.name, "fontawesome-webfont.woff2");
        assert!(!artifact.file_name.contains('/'));
        assert!(artifact.file_name.ends_with(".woff2"));
    }

    #[test]
    fn first_party_parent_segments_are_sanitized() {
        assert_eq!(sanitize("../shared/img/x.png"), "_/shared/img/x.png");
    }

    #[test]
    fn svg_data_uri() {
        assert_eq!(data_uri(mime_for("SVG"), b"<svg/>"), "data:image/svg+xml;base64,PHN2Zy8+");
    }
}
