//! Sizes, durations and the build summary table.

use std::time::Duration;

use console::Term;
use owo_colors::OwoColorize;
use satchel_bundler::{ArtifactInfo, ArtifactKind};

/// Human-readable size.
///
/// ```
/// use satchel_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.2} {}", UNITS[unit])
    }
}

/// Human-readable duration (`50ms`, `1.50s`, `1m 30s`).
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    if total_ms < 1000 {
        format!("{total_ms}ms")
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

fn kind_label(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Runtime => "runtime",
        ArtifactKind::Script => "script",
        ArtifactKind::Style => "style",
        ArtifactKind::Asset => "asset",
        ArtifactKind::Page => "page",
    }
}

/// Print every written artifact with its size, then a total line.
pub fn print_build_summary(artifacts: &[ArtifactInfo], duration: Duration) {
    let width = Term::stderr().size().1 as usize;
    let name_width = artifacts
        .iter()
        .map(|a| a.file_name.len())
        .max()
        .unwrap_or(0);

    eprintln!("\n{}", "Build Summary".bold().underline());
    eprintln!("{}", "─".repeat(width.clamp(20, 80)));
    for artifact in artifacts {
        eprintln!(
            "  {} {:<name_width$}  {:>10}  {}",
            "▸".blue(),
            artifact.file_name.bright_white(),
            format_size(artifact.size as u64).dimmed(),
            kind_label(artifact.kind).dimmed(),
        );
    }

    let total: usize = artifacts.iter().map(|a| a.size).sum();
    eprintln!("{}", "─".repeat(width.clamp(20, 80)));
    eprintln!(
        "  {} files, {} in {}",
        artifacts.len().to_string().bold(),
        format_size(total as u64).bold(),
        format_duration(duration).bold(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1_048_576), "1.00 MB");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
    }
}
