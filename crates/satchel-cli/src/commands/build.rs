//! `satchel build`.

use satchel_config::{ConfigOverrides, StyleOverrides, validate_fs};

use crate::cli::BuildArgs;
use crate::commands::utils::{absolute, load_config};
use crate::error::Result;
use crate::ui;

/// Load configuration, check it against the filesystem, build, and report.
///
/// Entries given with `--entry` are merged over the configured ones, replacing
/// entries of the same name.
pub fn execute(args: BuildArgs, quiet: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let overrides = ConfigOverrides {
        entries: args.entry.iter().cloned().collect(),
        output_dir: args.out_dir.as_deref().map(|dir| absolute(&cwd, dir)),
        public_path: args.public_path.clone(),
        search_roots: (!args.search_roots.is_empty()).then(|| args.search_roots.clone()),
        inline_threshold_bytes: args.inline_threshold,
        clean_output_dir: args.no_clean.then_some(false),
        target: args.target.clone(),
        html: args.html.then_some(true),
        styles: StyleOverrides {
            scss: args.no_scss.then_some(false),
            minify: args.minify.then_some(true),
        },
        ..ConfigOverrides::default()
    };

    let config = load_config(&args.config, overrides)?;
    validate_fs(&config)?;

    if !quiet {
        let names: Vec<&str> = config.entries.keys().map(String::as_str).collect();
        ui::info(&format!(
            "Building {} from {}",
            names.join(", "),
            config.root_dir().display()
        ));
    }

    let report = satchel_bundler::build(&config)?;

    if !quiet {
        ui::print_build_summary(&report.artifacts, report.duration);
        ui::success(&format!(
            "Wrote {} ({} modules)",
            config.manifest_path().display(),
            report.module_count
        ));
    }
    Ok(())
}
