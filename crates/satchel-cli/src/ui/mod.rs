//! Terminal output: status lines on stderr and the build summary.
//!
//! Results meant for scripts (`manifest`, `check`) go to stdout; everything
//! here writes to stderr.

mod format;
mod messages;

pub use format::{format_duration, format_size, print_build_summary};
pub use messages::{error, info, success, warning};

/// Whether stderr should get ANSI colors.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise colors follow whether stderr
/// is attended by a user.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::user_attended_stderr()
}

/// Apply the color decision to owo-colors' global override.
pub fn init_colors(no_color: bool) {
    owo_colors::set_override(!no_color && should_use_color());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn no_color_wins() {
        unsafe {
            std::env::set_var("NO_COLOR", "1");
            std::env::set_var("FORCE_COLOR", "1");
        }
        assert!(!should_use_color());
        unsafe {
            std::env::remove_var("NO_COLOR");
            std::env::remove_var("FORCE_COLOR");
        }
    }

    #[test]
    #[serial]
    fn force_color() {
        unsafe {
            std::env::remove_var("NO_COLOR");
            std::env::set_var("FORCE_COLOR", "1");
        }
        assert!(should_use_color());
        unsafe {
            std::env::remove_var("FORCE_COLOR");
        }
    }
}
