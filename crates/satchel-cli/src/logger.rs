//! Logging setup for the `satchel` binary.
//!
//! | flags | filter |
//! |---|---|
//! | `--verbose` | debug for satchel crates |
//! | `--quiet` | errors only |
//! | neither | `RUST_LOG`, else info for satchel crates |

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str =
    "satchel=debug,satchel_bundler=debug,satchel_graph=debug,satchel_config=debug,satchel_cli=debug";
const QUIET_FILTER: &str = "error";
const DEFAULT_FILTER: &str =
    "satchel=info,satchel_bundler=info,satchel_graph=info,satchel_config=info,satchel_cli=info";

/// Filter for the given verbosity flags.
pub fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Install the global subscriber. Call once, before any logging.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(filter_for(verbose, quiet), no_color);
}

pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && crate::ui::should_use_color())
        .compact();

    // A second call (tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
