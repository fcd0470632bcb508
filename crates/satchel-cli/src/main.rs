//! `satchel` binary entry point.

use clap::Parser;
use miette::Result;
use satchel_cli::{cli, commands, error, logger, ui};

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Build(build_args) => commands::build_execute(build_args, args.quiet),
        cli::Command::Manifest(manifest_args) => commands::manifest_execute(manifest_args),
        cli::Command::Check(check_args) => commands::check_execute(check_args),
    };

    result.map_err(error::cli_error_to_miette)
}
