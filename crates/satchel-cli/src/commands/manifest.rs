//! `satchel manifest <name>`.

use satchel_bundler::Manifest;
use satchel_config::ConfigOverrides;

use crate::cli::ManifestArgs;
use crate::commands::utils::{absolute, load_config};
use crate::error::{CliError, Result};

/// Print the public URL of `args.name` to stdout.
pub fn execute(args: ManifestArgs) -> Result<()> {
    let path = match &args.manifest {
        Some(path) => absolute(&std::env::current_dir()?, path),
        None => load_config(&args.config, ConfigOverrides::default())?.manifest_path(),
    };
    if !path.is_file() {
        return Err(CliError::FileNotFound(path));
    }

    let manifest = Manifest::load(&path)?;
    match manifest.url_for(&args.name) {
        Some(url) => {
            println!("{url}");
            Ok(())
        }
        None => Err(CliError::NotInManifest {
            name: args.name,
            manifest: path,
        }),
    }
}
