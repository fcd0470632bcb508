//! Syntax lowering with oxc.
//!
//! Runs on module source that has already been through [`crate::rewrite`], so
//! the input contains no `import`/`export` statements. Public class fields
//! are lowered to plain assignments and helper calls are routed to the
//! `babelHelpers` object the runtime chunk defines.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{HelperLoaderMode, TransformOptions, Transformer};
use satchel_graph::error::line_column;

use crate::{Error, Result};

/// Lowers scripts to one syntax target.
#[derive(Debug, Clone)]
pub struct Lowering {
    target: String,
}

impl Lowering {
    /// Validates `target` (`es2015`, `es2020`, `esnext`, `chrome80`, ...).
    pub fn new(target: &str) -> Result<Self> {
        Self::options_for(target)?;
        Ok(Self {
            target: target.to_string(),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn options_for(target: &str) -> Result<TransformOptions> {
        let mut options = TransformOptions::from_target(target)
            .map_err(|e| Error::InvalidConfig(format!("invalid target '{target}': {e}")))?;
        options.assumptions.set_public_class_fields = true;
        options.helper_loader.mode = HelperLoaderMode::External;
        Ok(options)
    }

    /// Parse, lower and print one script.
    pub fn lower(&self, source: &str, path: &Path, source_type: SourceType) -> Result<String> {
        let options = Self::options_for(&self.target)?;
        let allocator = Allocator::default();

        let parsed = Parser::new(&allocator, source, source_type).parse();
        if let Some(err) = parsed.errors.first() {
            let offset = err.labels.as_ref().and_then(|l| l.first()).map(|l| l.offset());
            return Err(transform_error(path, source, offset, err.message.to_string()));
        }
        let mut program = parsed.program;

        let scoping = SemanticBuilder::new()
            .build(&program)
            .semantic
            .into_scoping();
        let ret = Transformer::new(&allocator, path, &options).build_with_scoping(scoping, &mut program);
        if let Some(err) = ret.errors.first() {
            let offset = err.labels.as_ref().and_then(|l| l.first()).map(|l| l.offset());
            return Err(transform_error(path, source, offset, err.message.to_string()));
        }

        Ok(Codegen::new().build(&program).code)
    }
}

fn transform_error(path: &Path, source: &str, offset: Option<usize>, message: String) -> Error {
    let (line, column) = offset.map_or((0, 0), |offset| line_column(source, offset));
    Error::Transform {
        file: path.to_path_buf(),
        line,
        column,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower(src: &str) -> String {
        Lowering::new("es2015")
            .unwrap()
            .lower(src, Path::new("test.js"), SourceType::mjs())
            .unwrap()
    }

    #[test]
    fn unknown_target_is_invalid_config() {
        assert!(matches!(
            Lowering::new("netscape4"),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn lowers_modern_syntax() {
        let out = lower("const b = a ?? 1;\nconst c = a?.b;\nconst d = { ...a };\n");
        assert!(!out.contains("??"));
        assert!(!out.contains("?."));
        assert!(out.contains("babelHelpers.objectSpread2"));
    }

    #[test]
    fn public_class_fields_become_assignments() {
        let out = lower("class Modal { static targets = ['body']; open = false; }\n");
        assert!(!out.contains("babelHelpers.defineProperty"));
        assert!(out.contains(".targets = ["));
        assert!(out.contains("this.open = false"));
    }

    #[test]
    fn esnext_leaves_syntax_alone() {
        let out = Lowering::new("esnext")
            .unwrap()
            .lower("const b = a ?? 1;\n", Path::new("a.js"), SourceType::mjs())
            .unwrap();
        assert!(out.contains("??"));
    }

    #[test]
    fn syntax_error_has_position() {
        let err = Lowering::new("es2015")
            .unwrap()
            .lower("let a = 1;\nlet b = ;\n", Path::new("bad.js"), SourceType::mjs())
            .unwrap_err();
        match err {
            Error::Transform { line, column, .. } => {
                assert_eq!(line, 2);
                assert!(column > 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
