//! Reading module sources from disk.
//!
//! Style sheets are preprocessed here so that the references of the compiled
//! CSS (not the SCSS source) become graph edges.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::module::{ModuleKind, Source, StyleLang};

/// Options that affect how sources are loaded.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Compile `.scss` modules. When false, loading one is an error.
    pub scss: bool,
    /// Extra directories searched by SCSS `@use`/`@import`.
    pub load_paths: Vec<PathBuf>,
}

pub fn load(path: &Path, kind: ModuleKind, options: &LoadOptions) -> Result<Source> {
    match kind {
        ModuleKind::Script => read_text(path).map(Source::Text),
        ModuleKind::Json => {
            let text = read_text(path)?;
            if let Err(err) = serde_json::from_str::<serde_json::Value>(&text) {
                return Err(Error::Parse {
                    file: path.to_path_buf(),
                    line: err.line(),
                    column: err.column(),
                    message: err.to_string(),
                });
            }
            Ok(Source::Text(text))
        }
        ModuleKind::Style(StyleLang::Css) => read_text(path).map(Source::Text),
        ModuleKind::Style(StyleLang::Scss) => {
            if !options.scss {
                return Err(Error::Preprocess {
                    file: path.to_path_buf(),
                    message: "SCSS compilation is disabled (styles.scss = false)".to_string(),
                });
            }
            compile_scss(path, &options.load_paths).map(Source::Text)
        }
        ModuleKind::Asset => fs::read(path).map(Source::Bytes).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

fn compile_scss(path: &Path, load_paths: &[PathBuf]) -> Result<String> {
    let mut options = grass::Options::default();
    if let Some(dir) = path.parent() {
        options = options.load_path(dir);
    }
    options = options.load_paths(load_paths);

    tracing::debug!(file = %path.display(), "compiling scss");

    grass::from_path(path, &options).map_err(|err| scss_error(path, *err))
}

/// Located Sass errors become parse errors pointing into the offending file,
/// which may be a partial rather than `path`.
fn scss_error(path: &Path, err: grass::Error) -> Error {
    let rendered = err.to_string();
    match err.kind() {
        grass::ErrorKind::ParseError { message, loc, .. } => {
            let name = loc.file.name();
            Error::Parse {
                file: if name.is_empty() {
                    path.to_path_buf()
                } else {
                    PathBuf::from(name)
                },
                line: loc.begin.line + 1,
                column: loc.begin.column + 1,
                message,
            }
        }
        _ => Error::Preprocess {
            file: path.to_path_buf(),
            message: rendered.trim_end().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scss_options() -> LoadOptions {
        LoadOptions {
            scss: true,
            load_paths: Vec::new(),
        }
    }

    #[test]
    fn compiles_scss_variables_and_nesting() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("styles.scss");
        fs::write(
            &path,
            "$primary: #336699;\n.modal { .close { color: $primary; } }\n",
        )
        .unwrap();

        let source = load(&path, ModuleKind::Style(StyleLang::Scss), &scss_options()).unwrap();
        let css = source.as_text().unwrap();
        assert!(css.contains(".modal .close"), "{css}");
        assert!(css.contains("#336699"), "{css}");
        assert!(!css.contains('$'));
    }

    #[test]
    fn scss_partials_are_inlined() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_variables.scss"), "$gap: 4px;\n").unwrap();
        let path = dir.path().join("main.scss");
        fs::write(&path, "@import 'variables';\n.a { margin: $gap; }\n").unwrap();

        let source = load(&path, ModuleKind::Style(StyleLang::Scss), &scss_options()).unwrap();
        assert!(source.as_text().unwrap().contains("margin: 4px"));
    }

    #[test]
    fn disabled_scss_is_a_preprocess_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.scss");
        fs::write(&path, ".a { color: red; }").unwrap();

        let err = load(&path, ModuleKind::Style(StyleLang::Scss), &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Preprocess { .. }));
    }

    #[test]
    fn invalid_scss_reports_location() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.scss");
        fs::write(&path, ".a {\n  color: $undefined;\n}\n").unwrap();

        let err = load(&path, ModuleKind::Style(StyleLang::Scss), &scss_options()).unwrap_err();
        match err {
            Error::Parse {
                file,
                line,
                column,
                message,
            } => {
                assert!(file.ends_with("a.scss"), "{}", file.display());
                assert_eq!(line, 2);
                assert_eq!(column, 10);
                assert!(message.contains("Undefined variable"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn scss_error_in_partial_names_the_partial() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_broken.scss"), "\n.b { width: 1px +; }\n").unwrap();
        let path = dir.path().join("main.scss");
        fs::write(&path, "@import 'broken';\n").unwrap();

        let err = load(&path, ModuleKind::Style(StyleLang::Scss), &scss_options()).unwrap_err();
        match err {
            Error::Parse { file, line, .. } => {
                assert!(file.ends_with("_broken.scss"), "{}", file.display());
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_json_reports_position() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{\n  \"a\": ,\n}").unwrap();

        match load(&path, ModuleKind::Json, &LoadOptions::default()).unwrap_err() {
            Error::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn assets_are_loaded_as_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logo.png");
        fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let source = load(&path, ModuleKind::Asset, &LoadOptions::default()).unwrap();
        assert_eq!(source, Source::Bytes(vec![0x89, b'P', b'N', b'G']));
    }
}
