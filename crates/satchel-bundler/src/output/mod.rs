//! Emitted artifacts and the writer that puts them on disk.

pub mod writer;

pub use writer::write_build;

/// Category of an emitted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Runtime,
    Script,
    Style,
    Asset,
    /// The optional `index.html`; the only unhashed artifact.
    Page,
}

/// One file of the build output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Manifest key (`main.js`, `img/logo.png`).
    pub name: String,
    /// Path relative to the output directory, `/`-separated.
    pub file_name: String,
    pub contents: Vec<u8>,
    pub kind: ArtifactKind,
}

impl Artifact {
    pub fn new(
        name: impl Into<String>,
        file_name: impl Into<String>,
        contents: impl Into<Vec<u8>>,
        kind: ArtifactKind,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            contents: contents.into(),
            kind,
        }
    }

    pub fn size(&self) -> usize {
        self.contents.len()
    }
}
