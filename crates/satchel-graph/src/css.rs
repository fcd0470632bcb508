//! Style sheet references.
//!
//! Sheets are parsed with lightningcss, so comments and string literals never
//! yield requests. `@import` rules come from the top-level rule list and every
//! other reference from a visitor over `url()` values.

use std::convert::Infallible;
use std::path::Path;

use lightningcss::error::ErrorLocation;
use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use lightningcss::values::url::Url;
use lightningcss::visit_types;
use lightningcss::visitor::{Visit, VisitTypes, Visitor};

use crate::error::{Error, Result};
use crate::module::DependencyKind;
use crate::scanner::Request;

/// Parse one sheet. Syntax errors become [`Error::Parse`] for `path`.
pub fn parse_sheet<'i>(css: &'i str, path: &Path) -> Result<StyleSheet<'i>> {
    StyleSheet::parse(
        css,
        ParserOptions {
            filename: path.display().to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| parse_error(path, e.loc.as_ref(), e.kind.to_string()))
}

/// Map a lightningcss location (0-based line, 1-based column) to 1-based
/// line and column.
pub fn parse_error(path: &Path, loc: Option<&ErrorLocation>, message: String) -> Error {
    Error::Parse {
        file: path.to_path_buf(),
        line: loc.map_or(0, |l| l.line as usize + 1),
        column: loc.map_or(0, |l| l.column as usize),
        message,
    }
}

struct UrlVisitor<F> {
    f: F,
}

impl<'i, F> Visitor<'i> for UrlVisitor<F>
where
    F: FnMut(&mut Url<'i>),
{
    type Error = Infallible;

    fn visit_types(&self) -> VisitTypes {
        visit_types!(URLS)
    }

    fn visit_url(&mut self, url: &mut Url<'i>) -> std::result::Result<(), Self::Error> {
        (self.f)(url);
        Ok(())
    }
}

/// Call `f` on every `url()` value of the sheet, in rule order.
/// `@import` targets are not `url()` values and are not visited.
pub fn for_each_url<'i>(sheet: &mut StyleSheet<'i>, f: impl FnMut(&mut Url<'i>)) {
    let mut visitor = UrlVisitor { f };
    let Ok(()) = sheet.visit(&mut visitor);
}

/// Whether a style reference points at something outside the module graph.
pub fn is_external_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    url.is_empty()
        || url.starts_with('#')
        || url.starts_with("//")
        || lower.starts_with("data:")
        || lower.starts_with("http:")
        || lower.starts_with("https:")
}

/// Split `font.woff?v=1#iefix` into the path and the `?v=1#iefix` suffix.
pub fn split_url_suffix(url: &str) -> (&str, &str) {
    match url.find(['?', '#']) {
        Some(i) => (&url[..i], &url[i..]),
        None => (url, ""),
    }
}

/// Collect `@import` and `url()` requests of compiled CSS, in source order.
pub fn scan_style(css: &str, path: &Path) -> Result<Vec<Request>> {
    let mut sheet = parse_sheet(css, path)?;
    let mut found: Vec<((u32, u32), Request)> = Vec::new();

    for rule in &sheet.rules.0 {
        if let CssRule::Import(import) = rule {
            if is_external_url(&import.url) {
                continue;
            }
            found.push((
                (import.loc.line, import.loc.column),
                Request {
                    specifier: import.url.to_string(),
                    kind: DependencyKind::StyleImport,
                },
            ));
        }
    }

    for_each_url(&mut sheet, |url| {
        if is_external_url(&url.url) {
            return;
        }
        let (target, _) = split_url_suffix(&url.url);
        if target.is_empty() {
            return;
        }
        found.push((
            (url.loc.line, url.loc.column),
            Request {
                specifier: target.to_string(),
                kind: DependencyKind::StyleUrl,
            },
        ));
    });

    found.sort_by_key(|(loc, _)| *loc);
    Ok(found.into_iter().map(|(_, request)| request).collect())
}
