//! Command-line interface definition.
//!
//! - `satchel build` - bundle the configured entries
//! - `satchel manifest <name>` - print the public URL of a built artifact
//! - `satchel check` - validate configuration and print it resolved

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Satchel - content-addressed asset bundler
#[derive(Parser, Debug)]
#[command(
    name = "satchel",
    version,
    about = "Bundle scripts, styles and static resources with a manifest",
    long_about = "Satchel turns a tree of scripts, style sheets, fonts and images into\n\
                  content-addressed files plus a manifest.json mapping logical names\n\
                  (main.js, main.css, img/logo.png) to hashed public URLs."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build every entry into the output directory
    ///
    /// Settings come from satchel.toml, SATCHEL_* environment variables and
    /// ASSET_PATH, then the flags below.
    Build(BuildArgs),

    /// Print the public URL of a logical name from a built manifest
    Manifest(ManifestArgs),

    /// Validate configuration and print it as JSON
    Check(CheckArgs),
}

/// Arguments shared by commands that load configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Configuration file (default: satchel.toml in the current directory or an ancestor)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project root; entries and search roots are relative to it
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Entry as NAME=PATH, PATH relative to the project root
    ///
    /// Examples:
    ///   satchel build --entry main=application.js
    ///   satchel build --entry main=app.js --entry admin=admin/index.js
    #[arg(short, long, value_name = "NAME=PATH", value_parser = parse_entry)]
    pub entry: Vec<(String, PathBuf)>,

    /// Output directory
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// URL prefix of emitted files (default /static/dist/)
    #[arg(long, value_name = "URL")]
    pub public_path: Option<String>,

    /// Directory searched for bare imports; repeatable, in priority order
    #[arg(long = "search-root", value_name = "DIR")]
    pub search_roots: Vec<PathBuf>,

    /// Resources smaller than this many bytes are inlined as data URIs
    #[arg(long, value_name = "BYTES")]
    pub inline_threshold: Option<u64>,

    /// Keep existing files in the output directory
    #[arg(long)]
    pub no_clean: bool,

    /// Disable SCSS compilation; importing a .scss file becomes an error
    #[arg(long)]
    pub no_scss: bool,

    /// Minify extracted style sheets
    #[arg(long)]
    pub minify: bool,

    /// Also write an index.html loading every entry
    #[arg(long)]
    pub html: bool,

    /// Syntax baseline for scripts (es2015, es2020, esnext, ...)
    #[arg(long, value_name = "TARGET")]
    pub target: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ManifestArgs {
    /// Logical name, such as main.js or img/logo.png
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Manifest file (default: the configured output directory's manifest)
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Parse `NAME=PATH`.
pub fn parse_entry(value: &str) -> Result<(String, PathBuf), String> {
    let (name, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got '{value}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("entry name cannot be empty".to_string());
    }
    if path.trim().is_empty() {
        return Err(format!("entry '{name}' has no path"));
    }
    Ok((name.to_string(), PathBuf::from(path.trim())))
}
