//! Dependency scanning.
//!
//! Scripts are parsed with oxc and walked for static imports, re-exports,
//! `require` calls, `require.context` calls and dynamic `import()`. Style
//! sheets are handled by [`crate::css`].

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, CallExpression, ExportAllDeclaration, ExportDefaultDeclaration,
    ExportNamedDeclaration, Expression, ImportDeclaration, ImportExpression, Program,
};
use oxc_ast_visit::{Visit, walk};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};

use crate::error::{Error, Result};
use crate::module::DependencyKind;

/// A dependency request found in a module, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub specifier: String,
    pub kind: DependencyKind,
}

/// Arguments of a `require.context(directory, recursive, /pattern/flags)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextCall {
    pub directory: String,
    pub recursive: bool,
    pub pattern: String,
    pub flags: String,
}

/// Everything the graph walker needs from a script.
#[derive(Debug, Default)]
pub struct ScriptScan {
    pub requests: Vec<Request>,
    pub contexts: Vec<ContextCall>,
    pub is_esm: bool,
}

/// Source type used to parse a script file.
pub fn source_type_for(path: &Path) -> SourceType {
    match path.extension().and_then(|e| e.to_str()) {
        Some("cjs") => SourceType::cjs(),
        _ => SourceType::mjs(),
    }
}

/// Parse a script, turning the first syntax error into [`Error::Parse`].
pub fn parse_script<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    path: &Path,
) -> Result<Program<'a>> {
    let ret = Parser::new(allocator, source, source_type_for(path)).parse();
    if let Some(err) = ret.errors.first() {
        let offset = err
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map_or(0, |label| label.offset());
        return Err(Error::parse_at(path, source, offset, err.to_string()));
    }
    Ok(ret.program)
}

/// Collect the dependency requests of a script.
pub fn scan_script(source: &str, path: &Path) -> Result<ScriptScan> {
    let allocator = Allocator::default();
    let program = parse_script(&allocator, source, path)?;

    let mut collector = ScriptCollector {
        source,
        scan: ScriptScan::default(),
        error: None,
    };
    collector.visit_program(&program);

    if let Some(reason) = collector.error {
        return Err(Error::InvalidContext {
            file: path.to_path_buf(),
            reason,
        });
    }
    Ok(collector.scan)
}

struct ScriptCollector<'s> {
    source: &'s str,
    scan: ScriptScan,
    error: Option<String>,
}

impl ScriptCollector<'_> {
    fn push(&mut self, specifier: &str, kind: DependencyKind) {
        self.scan.requests.push(Request {
            specifier: specifier.to_string(),
            kind,
        });
    }
}

impl<'a> Visit<'a> for ScriptCollector<'_> {
    fn visit_import_declaration(&mut self, it: &ImportDeclaration<'a>) {
        self.scan.is_esm = true;
        self.push(&it.source.value, DependencyKind::Import);
    }

    fn visit_export_named_declaration(&mut self, it: &ExportNamedDeclaration<'a>) {
        self.scan.is_esm = true;
        if let Some(source) = &it.source {
            self.push(&source.value, DependencyKind::Import);
        }
        walk::walk_export_named_declaration(self, it);
    }

    fn visit_export_all_declaration(&mut self, it: &ExportAllDeclaration<'a>) {
        self.scan.is_esm = true;
        self.push(&it.source.value, DependencyKind::Import);
    }

    fn visit_export_default_declaration(&mut self, it: &ExportDefaultDeclaration<'a>) {
        self.scan.is_esm = true;
        walk::walk_export_default_declaration(self, it);
    }

    fn visit_import_expression(&mut self, it: &ImportExpression<'a>) {
        if let Expression::StringLiteral(lit) = &it.source {
            self.push(&lit.value, DependencyKind::DynamicImport);
        } else {
            tracing::warn!(
                "dynamic import() with a non-literal specifier is left untouched"
            );
        }
        walk::walk_import_expression(self, it);
    }

    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if let Some(specifier) = require_specifier(it) {
            self.push(specifier, DependencyKind::Require);
        } else if is_require_context(it) {
            match context_call(it, self.source) {
                Ok(call) => self.scan.contexts.push(call),
                Err(reason) => {
                    self.error.get_or_insert(reason);
                }
            }
        }
        walk::walk_call_expression(self, it);
    }
}

/// `require("x")` with a single string literal argument.
pub fn require_specifier<'b>(call: &'b CallExpression<'_>) -> Option<&'b str> {
    let Expression::Identifier(ident) = &call.callee else {
        return None;
    };
    if ident.name != "require" || call.arguments.len() != 1 {
        return None;
    }
    match &call.arguments[0] {
        Argument::StringLiteral(lit) => Some(lit.value.as_str()),
        _ => None,
    }
}

/// Whether the callee is `require.context`.
pub fn is_require_context(call: &CallExpression<'_>) -> bool {
    let Expression::StaticMemberExpression(member) = &call.callee else {
        return false;
    };
    matches!(&member.object, Expression::Identifier(obj) if obj.name == "require")
        && member.property.name == "context"
}

/// Extract the static arguments of a `require.context` call.
///
/// `recursive` defaults to `true` and the pattern to `^\./.*$`. Any argument
/// that is not a literal makes the call impossible to expand at build time.
pub fn context_call(
    call: &CallExpression<'_>,
    source: &str,
) -> std::result::Result<ContextCall, String> {
    let directory = match call.arguments.first() {
        Some(Argument::StringLiteral(lit)) => lit.value.to_string(),
        _ => return Err("the directory argument must be a string literal".to_string()),
    };

    let recursive = match call.arguments.get(1) {
        None => true,
        Some(Argument::BooleanLiteral(lit)) => lit.value,
        Some(_) => return Err("the recursive argument must be a boolean literal".to_string()),
    };

    let (pattern, flags) = match call.arguments.get(2) {
        None => (r"^\./.*$".to_string(), String::new()),
        Some(Argument::RegExpLiteral(lit)) => {
            let span = lit.span();
            let text = &source[span.start as usize..span.end as usize];
            split_regex_literal(text)
                .ok_or_else(|| format!("malformed regular expression literal {text}"))?
        }
        Some(_) => {
            return Err("the filter argument must be a regular expression literal".to_string());
        }
    };

    if call.arguments.len() > 3 {
        return Err("expected at most three arguments".to_string());
    }

    Ok(ContextCall {
        directory,
        recursive,
        pattern,
        flags,
    })
}

/// Split `/pattern/flags` into its parts.
pub fn split_regex_literal(text: &str) -> Option<(String, String)> {
    let body = text.strip_prefix('/')?;
    let end = body.rfind('/')?;
    Some((body[..end].to_string(), body[end + 1..].to_string()))
}
