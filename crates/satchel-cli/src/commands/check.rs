//! `satchel check`.

use satchel_config::{ConfigOverrides, validate_fs};

use crate::cli::CheckArgs;
use crate::commands::utils::load_config;
use crate::error::Result;
use crate::ui;

/// Validate the configuration and print it, fully resolved, as JSON on stdout.
pub fn execute(args: CheckArgs) -> Result<()> {
    let config = load_config(&args.config, ConfigOverrides::default())?;
    validate_fs(&config)?;

    println!("{}", serde_json::to_string_pretty(&config)?);
    ui::success(&format!(
        "Configuration is valid ({} entries)",
        config.entries.len()
    ));
    Ok(())
}
