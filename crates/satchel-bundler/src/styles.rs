//! Style extraction.
//!
//! Style modules arrive as plain CSS (SCSS is compiled while the graph is
//! loaded). Each module is post-processed on its own:
//!
//! 1. the module is parsed with lightningcss;
//! 2. local `@import` rules are dropped, since the imported modules are
//!    emitted earlier in the same artifact, and remote ones are hoisted;
//! 3. `url()` values that point at resources become public URLs or data URIs;
//! 4. vendor prefixes are added for the configured browsers and the sheet is
//!    optionally minified.
//!
//! The processed modules of one chunk are then concatenated in execution
//! order.

use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{MinifyOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use lightningcss::traits::ToCss;
use satchel_config::StyleOptions;
use satchel_graph::Module;
use satchel_graph::css::{self, is_external_url, split_url_suffix};

use crate::assets::ResourceOutput;
use crate::{Error, Result};

/// One processed style module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedStyle {
    /// Remote `@import` rules, printed.
    pub imports: Vec<String>,
    pub css: String,
}

#[derive(Debug, Clone)]
pub struct StyleProcessor {
    targets: Targets,
    minify: bool,
}

impl StyleProcessor {
    pub fn new(options: &StyleOptions) -> Result<Self> {
        let browsers = Browsers::from_browserslist(options.browsers.iter()).map_err(|e| {
            Error::InvalidConfig(format!(
                "invalid browsers query '{}': {e}",
                options.browsers.join(", ")
            ))
        })?;
        Ok(Self {
            targets: Targets {
                browsers,
                ..Targets::default()
            },
            minify: options.minify,
        })
    }

    pub fn process(&self, module: &Module, resources: &ResourceOutput) -> Result<ProcessedStyle> {
        let sheet_error = |loc: Option<(u32, u32)>, message: String| Error::Transform {
            file: module.path.clone(),
            line: loc.map_or(0, |(line, _)| line as usize + 1),
            column: loc.map_or(0, |(_, column)| column as usize),
            message,
        };

        let mut sheet = css::parse_sheet(module.text(), &module.path)?;
        let imports = take_imports(&mut sheet)
            .map_err(|e| sheet_error(e.loc.as_ref().map(|l| (l.line, l.column)), e.to_string()))?;
        rewrite_urls(&mut sheet, module, resources);

        sheet
            .minify(MinifyOptions {
                targets: self.targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| sheet_error(e.loc.as_ref().map(|l| (l.line, l.column)), e.to_string()))?;

        let printed = sheet
            .to_css(PrinterOptions {
                minify: self.minify,
                targets: self.targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| sheet_error(e.loc.as_ref().map(|l| (l.line, l.column)), e.to_string()))?;

        Ok(ProcessedStyle {
            imports,
            css: printed.code,
        })
    }

    /// Concatenate processed modules, remote imports first.
    pub fn concat<'a>(&self, styles: impl IntoIterator<Item = &'a ProcessedStyle>) -> String {
        let mut imports: Vec<&str> = Vec::new();
        let mut bodies: Vec<&str> = Vec::new();
        for style in styles {
            for import in &style.imports {
                if !imports.contains(&import.as_str()) {
                    imports.push(import);
                }
            }
            let body = style.css.trim_end();
            if !body.is_empty() {
                bodies.push(body);
            }
        }

        let separator = if self.minify { "" } else { "\n" };
        let mut out = String::new();
        for import in imports {
            out.push_str(import);
            out.push_str(if self.minify { "" } else { "\n" });
        }
        out.push_str(&bodies.join(separator));
        if !self.minify && !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

/// Remove every `@import` rule; return the remote ones, printed.
fn take_imports(
    sheet: &mut StyleSheet<'_>,
) -> std::result::Result<Vec<String>, lightningcss::error::PrinterError> {
    let mut remote = Vec::new();
    let mut rest = Vec::with_capacity(sheet.rules.0.len());
    for rule in sheet.rules.0.drain(..) {
        match rule {
            CssRule::Import(import) => {
                if is_external_url(&import.url) {
                    remote.push(import.to_css_string(PrinterOptions::default())?);
                }
            }
            other => rest.push(other),
        }
    }
    sheet.rules.0 = rest;
    Ok(remote)
}

/// Point `url()` values at emitted resources. Unresolved ones are left alone.
fn rewrite_urls(sheet: &mut StyleSheet<'_>, module: &Module, resources: &ResourceOutput) {
    css::for_each_url(sheet, |url| {
        if is_external_url(&url.url) {
            return;
        }
        let (path, suffix) = split_url_suffix(&url.url);
        let Some(public) = module.resolved(path).and_then(|id| resources.url(id)) else {
            return;
        };
        let rewritten = if public.starts_with("data:") {
            public.to_string()
        } else {
            format!("{public}{suffix}")
        };
        url.url = rewritten.into();
    });
}
