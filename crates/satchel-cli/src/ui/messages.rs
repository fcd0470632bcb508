//! One-line status messages.

use owo_colors::OwoColorize;

pub fn success(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message);
}

pub fn info(message: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), message);
}

pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());
}

pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}
