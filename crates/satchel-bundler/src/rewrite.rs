//! Module syntax rewriting.
//!
//! Turns `import`/`export`, `require`, `require.context` and dynamic
//! `import()` into calls on the runtime's `__satchel_require__` with resolved
//! module ids. Works by span edits on the original source:
//!
//! - import statements are blanked (keeping their newlines) and replaced by
//!   `var` bindings in a one-line prologue prepended to line 1, so line
//!   numbers of the rest of the module do not move;
//! - exports register getters on `exports` at the top of the module;
//! - `export` keywords in front of declarations are removed.
//!
//! Named imports are snapshots taken when the prologue runs, not live
//! bindings.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    CallExpression, ExportAllDeclaration, ExportDefaultDeclaration, ExportDefaultDeclarationKind,
    ExportNamedDeclaration, Expression, ImportDeclaration, ImportDeclarationSpecifier,
    ImportExpression, Statement,
};
use oxc_ast_visit::{Visit, walk};
use oxc_ecmascript::BoundNames;
use oxc_span::{GetSpan, Span};
use satchel_graph::scanner::{self, context_call, is_require_context, require_specifier};
use satchel_graph::{Module, ModuleId};

use crate::runtime::REQUIRE;
use crate::{Error, Result};

const DEFAULT_BINDING: &str = "__satchel_default__";

/// Rewrite one script module.
pub fn rewrite_module(module: &Module) -> Result<String> {
    let source = module.text();
    let allocator = Allocator::default();
    let program = scanner::parse_script(&allocator, source, &module.path)?;

    let mut rewriter = Rewriter {
        module,
        source,
        edits: Vec::new(),
        registrations: Vec::new(),
        prologue: Vec::new(),
        imports: 0,
        error: None,
    };

    if let Some(hashbang) = &program.hashbang {
        rewriter.blank(hashbang.span);
    }
    for statement in &program.body {
        rewriter.statement(statement)?;
    }
    rewriter.visit_program(&program);
    if let Some(err) = rewriter.error {
        return Err(err);
    }

    Ok(rewriter.finish())
}

struct Edit {
    start: u32,
    end: u32,
    text: String,
}

struct Rewriter<'m> {
    module: &'m Module,
    source: &'m str,
    edits: Vec<Edit>,
    /// `__satchel_require__.d(exports, ...)` calls.
    registrations: Vec<String>,
    /// Hoisted requires and import bindings, in source order.
    prologue: Vec<String>,
    imports: usize,
    error: Option<Error>,
}

impl<'m> Rewriter<'m> {
    fn target(&self, specifier: &str) -> Result<&'m ModuleId> {
        self.module
            .resolved(specifier)
            .ok_or_else(|| Error::Resolution {
                specifier: specifier.to_string(),
                importer: self.module.path.clone(),
            })
    }

    fn replace(&mut self, start: u32, end: u32, text: impl Into<String>) {
        self.edits.push(Edit {
            start,
            end,
            text: text.into(),
        });
    }

    /// Remove a span but keep its line breaks.
    fn blank(&mut self, span: Span) {
        let removed = &self.source[span.start as usize..span.end as usize];
        let newlines = "\n".repeat(removed.matches('\n').count());
        self.replace(span.start, span.end, newlines);
    }

    fn export(&mut self, name: &str, value: &str) {
        self.registrations.push(format!(
            "{REQUIRE}.d(exports, {}, () => {value});",
            js_string(name)
        ));
    }

    /// Hoist `__satchel_require__(id)` into a fresh binding and return its name.
    fn require_binding(&mut self, specifier: &str) -> Result<String> {
        let id = js_string(self.target(specifier)?.as_str());
        let binding = format!("__satchel_import_{}__", self.imports);
        self.imports += 1;
        self.prologue
            .push(format!("var {binding} = {REQUIRE}({id});"));
        Ok(binding)
    }

    fn statement(&mut self, statement: &Statement<'_>) -> Result<()> {
        match statement {
            Statement::ImportDeclaration(decl) => self.import(decl),
            Statement::ExportNamedDeclaration(decl) => self.export_named(decl),
            Statement::ExportDefaultDeclaration(decl) => {
                self.export_default(decl);
                Ok(())
            }
            Statement::ExportAllDeclaration(decl) => self.export_all(decl),
            _ => Ok(()),
        }
    }

    fn import(&mut self, decl: &ImportDeclaration<'_>) -> Result<()> {
        self.blank(decl.span);
        let specifier = decl.source.value.as_str();

        let specifiers = decl.specifiers.as_ref().filter(|s| !s.is_empty());
        let Some(specifiers) = specifiers else {
            let id = js_string(self.target(specifier)?.as_str());
            self.prologue.push(format!("{REQUIRE}({id});"));
            return Ok(());
        };

        let ns = self.require_binding(specifier)?;
        for spec in specifiers {
            let binding = match spec {
                ImportDeclarationSpecifier::ImportSpecifier(s) => {
                    let imported = s.imported.name();
                    let value = if imported.as_str() == "default" {
                        format!("{REQUIRE}.n({ns}).default")
                    } else {
                        member(&ns, &imported)
                    };
                    format!("var {} = {value};", s.local.name)
                }
                ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                    format!("var {} = {REQUIRE}.n({ns}).default;", s.local.name)
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                    format!("var {} = {REQUIRE}.n({ns});", s.local.name)
                }
            };
            self.prologue.push(binding);
        }
        Ok(())
    }

    fn export_named(&mut self, decl: &ExportNamedDeclaration<'_>) -> Result<()> {
        if let Some(source) = &decl.source {
            self.blank(decl.span);
            let ns = self.require_binding(source.value.as_str())?;
            for spec in &decl.specifiers {
                let local = spec.local.name();
                let value = if local.as_str() == "default" {
                    format!("{REQUIRE}.n({ns}).default")
                } else {
                    member(&ns, &local)
                };
                self.export(&spec.exported.name(), &value);
            }
            return Ok(());
        }

        if let Some(declaration) = &decl.declaration {
            self.replace(decl.span.start, declaration.span().start, "");
            let mut names = Vec::new();
            declaration.bound_names(&mut |ident| names.push(ident.name.to_string()));
            for name in names {
                self.export(&name, &name);
            }
            return Ok(());
        }

        self.blank(decl.span);
        for spec in &decl.specifiers {
            self.export(&spec.exported.name(), &spec.local.name());
        }
        Ok(())
    }

    fn export_default(&mut self, decl: &ExportDefaultDeclaration<'_>) {
        let inner = decl.declaration.span();
        let named = match &decl.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(f) => {
                Some(f.id.as_ref().map(|id| id.name.to_string()))
            }
            ExportDefaultDeclarationKind::ClassDeclaration(c) => {
                Some(c.id.as_ref().map(|id| id.name.to_string()))
            }
            ExportDefaultDeclarationKind::TSInterfaceDeclaration(_) => return,
            _ => None,
        };

        match named {
            Some(Some(name)) => {
                self.replace(decl.span.start, inner.start, "");
                self.export("default", &name);
            }
            Some(None) => {
                self.replace(decl.span.start, inner.start, format!("var {DEFAULT_BINDING} = "));
                self.replace(inner.end, inner.end, ";");
                self.export("default", DEFAULT_BINDING);
            }
            None => {
                self.replace(decl.span.start, inner.start, format!("var {DEFAULT_BINDING} = "));
                let text = &self.source[decl.span.start as usize..decl.span.end as usize];
                if !text.trim_end().ends_with(';') {
                    self.replace(decl.span.end, decl.span.end, ";");
                }
                self.export("default", DEFAULT_BINDING);
            }
        }
    }

    fn export_all(&mut self, decl: &ExportAllDeclaration<'_>) -> Result<()> {
        self.blank(decl.span);
        let ns = self.require_binding(decl.source.value.as_str())?;
        match &decl.exported {
            Some(name) => self.export(&name.name(), &format!("{REQUIRE}.n({ns})")),
            None => self.prologue.push(format!("{REQUIRE}.star(exports, {ns});")),
        }
        Ok(())
    }

    fn call_replacement(&self, call: &CallExpression<'_>) -> Result<Option<String>> {
        if let Some(specifier) = require_specifier(call) {
            let id = self.target(specifier)?;
            return Ok(Some(format!("{REQUIRE}({})", js_string(id.as_str()))));
        }
        if !is_require_context(call) {
            return Ok(None);
        }

        let args = context_call(call, self.source).map_err(|reason| {
            Error::Graph(satchel_graph::Error::InvalidContext {
                file: self.module.path.clone(),
                reason,
            })
        })?;
        let map = self
            .module
            .context(&args.directory, args.recursive, &args.pattern, &args.flags)
            .ok_or_else(|| Error::Resolution {
                specifier: args.directory.clone(),
                importer: self.module.path.clone(),
            })?;

        let object: serde_json::Map<String, serde_json::Value> = map
            .entries
            .iter()
            .map(|(key, id)| (key.clone(), serde_json::Value::from(id.as_str())))
            .collect();
        Ok(Some(format!(
            "{REQUIRE}.context({})",
            serde_json::Value::Object(object)
        )))
    }

    fn finish(mut self) -> String {
        let mut out = String::with_capacity(self.source.len() + 256);

        let mut header = Vec::new();
        if self.module.is_esm {
            header.push(format!("{REQUIRE}.r(exports);"));
        }
        header.append(&mut self.registrations);
        header.append(&mut self.prologue);
        if !header.is_empty() {
            out.push_str(&header.join(" "));
            out.push(' ');
        }

        self.edits.sort_by_key(|edit| (edit.start, edit.end));
        let mut cursor = 0usize;
        for edit in &self.edits {
            let (start, end) = (edit.start as usize, edit.end as usize);
            if start < cursor {
                tracing::debug!(module = %self.module.id, start, "skipping overlapping edit");
                continue;
            }
            out.push_str(&self.source[cursor..start]);
            out.push_str(&edit.text);
            cursor = end;
        }
        out.push_str(&self.source[cursor..]);
        out
    }
}

impl<'a> Visit<'a> for Rewriter<'_> {
    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        match self.call_replacement(it) {
            Ok(Some(text)) => self.replace(it.span.start, it.span.end, text),
            Ok(None) => walk::walk_call_expression(self, it),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
    }

    fn visit_import_expression(&mut self, it: &ImportExpression<'a>) {
        let Expression::StringLiteral(lit) = &it.source else {
            walk::walk_import_expression(self, it);
            return;
        };
        match self.target(lit.value.as_str()) {
            Ok(id) => {
                let id = js_string(id.as_str());
                self.replace(
                    it.span.start,
                    it.span.end,
                    format!("Promise.resolve().then(() => {REQUIRE}.n({REQUIRE}({id})))"),
                );
            }
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
    }
}

/// JSON string literal, which is also a valid JS string literal.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

fn member(object: &str, name: &str) -> String {
    let mut chars = name.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_identifier {
        format!("{object}.{name}")
    } else {
        format!("{object}[{}]", js_string(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use satchel_graph::{ContextMap, Dependency, DependencyKind, ModuleKind};
    use std::path::PathBuf;

    fn module(src: &str, deps: &[(&str, &str)]) -> Module {
        Module::builder(
            ModuleId::new("app.js"),
            PathBuf::from("/p/app.js"),
            ModuleKind::Script,
        )
        .source(satchel_graph::Source::Text(src.to_string()))
        .dependencies(
            deps.iter()
                .map(|(spec, id)| Dependency {
                    specifier: (*spec).to_string(),
                    kind: DependencyKind::Import,
                    target: ModuleId::new(*id),
                })
                .collect(),
        )
        .esm(src.contains("import") || src.contains("export"))
        .build()
    }

    #[test]
    fn imports_become_prologue_bindings() {
        let src = "import Foo, { bar as baz } from './foo';\nimport * as ns from './ns';\nimport './side.css';\nconsole.log(Foo, baz, ns);\n";
        let out = rewrite_module(&module(
            src,
            &[("./foo", "foo.js"), ("./ns", "ns.js"), ("./side.css", "side.css")],
        ))
        .unwrap();

        let first_line = out.lines().next().unwrap();
        assert!(first_line.starts_with("__satchel_require__.r(exports);"));
        assert!(first_line.contains(r#"var __satchel_import_0__ = __satchel_require__("foo.js");"#));
        assert!(first_line.contains("var Foo = __satchel_require__.n(__satchel_import_0__).default;"));
        assert!(first_line.contains("var baz = __satchel_import_0__.bar;"));
        assert!(first_line.contains("var ns = __satchel_require__.n(__satchel_import_1__);"));
        assert!(first_line.contains(r#"__satchel_require__("side.css");"#));
        assert!(!out.contains("import "));
        // Statements after the imports keep their line.
        assert_eq!(out.lines().nth(3), Some("console.log(Foo, baz, ns);"));
    }

    #[test]
    fn exports_register_getters() {
        let src = "export const a = 1, b = 2;\nexport function f() {}\nconst c = 3;\nexport { c as d };\nexport default class {}\n";
        let out = rewrite_module(&module(src, &[])).unwrap();

        for expected in [
            r#"__satchel_require__.d(exports, "a", () => a);"#,
            r#"__satchel_require__.d(exports, "b", () => b);"#,
            r#"__satchel_require__.d(exports, "f", () => f);"#,
            r#"__satchel_require__.d(exports, "d", () => c);"#,
            r#"__satchel_require__.d(exports, "default", () => __satchel_default__);"#,
        ] {
            assert!(out.contains(expected), "missing {expected} in {out}");
        }
        assert!(out.contains("const a = 1, b = 2;"));
        assert!(out.contains("\nfunction f() {}"));
        assert!(out.contains("var __satchel_default__ = class {};"));
        assert!(!out.contains("export "));
    }

    #[test]
    fn default_expression_gets_semicolon() {
        let out = rewrite_module(&module("export default 42\n", &[])).unwrap();
        assert!(out.contains("var __satchel_default__ = 42;"));

        let out = rewrite_module(&module("export default function named() {}\n", &[])).unwrap();
        assert!(out.contains("function named() {}"));
        assert!(out.contains(r#"__satchel_require__.d(exports, "default", () => named);"#));
    }

    #[test]
    fn reexports() {
        let src = "export * from './all';\nexport { x, default as y } from './one';\nexport * as ns from './ns';\n";
        let out = rewrite_module(&module(
            src,
            &[("./all", "all.js"), ("./one", "one.js"), ("./ns", "ns.js")],
        ))
        .unwrap();
        assert!(out.contains("__satchel_require__.star(exports, __satchel_import_0__);"));
        assert!(out.contains(r#"__satchel_require__.d(exports, "x", () => __satchel_import_1__.x);"#));
        assert!(out.contains(
            r#"__satchel_require__.d(exports, "y", () => __satchel_require__.n(__satchel_import_1__).default);"#
        ));
        assert!(out.contains(
            r#"__satchel_require__.d(exports, "ns", () => __satchel_require__.n(__satchel_import_2__));"#
        ));
    }

    #[test]
    fn require_and_dynamic_import_use_ids() {
        let src = "const a = require('./a');\nimport('./lazy').then(m => m.default);\n";
        let mut m = module(src, &[("./a", "lib/a.js"), ("./lazy", "lazy.js")]);
        m.is_esm = false;
        let out = rewrite_module(&m).unwrap();
        assert_eq!(
            out,
            "const a = __satchel_require__(\"lib/a.js\");\nPromise.resolve().then(() => __satchel_require__.n(__satchel_require__(\"lazy.js\"))).then(m => m.default);\n"
        );
    }

    #[test]
    fn require_context_becomes_static_map() {
        let src = "const ctx = require.context('./controllers', true, /_controller\\.js$/);\n";
        let mut m = module(src, &[]);
        m.is_esm = false;
        let mut entries = IndexMap::new();
        entries.insert(
            "./modal_controller.js".to_string(),
            ModuleId::new("controllers/modal_controller.js"),
        );
        m.contexts.push(ContextMap {
            directory: "./controllers".into(),
            recursive: true,
            pattern: r"_controller\.js$".into(),
            flags: String::new(),
            entries,
        });

        let out = rewrite_module(&m).unwrap();
        assert_eq!(
            out,
            "const ctx = __satchel_require__.context({\"./modal_controller.js\":\"controllers/modal_controller.js\"});\n"
        );
    }

    #[test]
    fn unresolved_require_is_resolution_error() {
        let mut m = module("require('./nope');", &[]);
        m.is_esm = false;
        assert!(matches!(
            rewrite_module(&m),
            Err(Error::Resolution { specifier, .. }) if specifier == "./nope"
        ));
    }

    #[test]
    fn member_access_quotes_non_identifiers() {
        assert_eq!(member("ns", "foo"), "ns.foo");
        assert_eq!(member("ns", "a-b"), r#"ns["a-b"]"#);
    }
}
