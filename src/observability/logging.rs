//! Logging setup
//!
//! Installs a `tracing` subscriber writing to stderr so log lines never
//! mix with the game screens on stdout. `STUDYHELPER_LOG_LEVEL` takes an
//! `EnvFilter` directive and wins over `-v`.

use std::io::IsTerminal;

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

use crate::cli::args::ColorChoice;

/// Environment variable holding a filter directive.
pub const LOG_LEVEL_ENV: &str = "STUDYHELPER_LOG_LEVEL";

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Plain text, colored when the terminal allows it
    #[default]
    Human,
    /// One JSON object per line
    Json,
}

/// Filter directive for a `-v` count.
///
/// 0 is `warn`, 1 `info`, 2 `debug`, anything higher `trace`.
#[must_use]
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Whether ANSI colors should be written to stderr.
#[must_use]
pub fn use_color(color: ColorChoice) -> bool {
    match color {
        ColorChoice::Auto => std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    }
}

/// Installs the global subscriber.
///
/// Targets are shown from `-vv` up. A second call is a no-op.
pub fn init_logging(format: LogFormat, verbosity: u8, color: ColorChoice) {
    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));
    let show_target = verbosity >= 2;

    match format {
        LogFormat::Human => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(use_color(color))
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(verbosity_to_directive(0), "warn");
        assert_eq!(verbosity_to_directive(1), "info");
        assert_eq!(verbosity_to_directive(2), "debug");
        assert_eq!(verbosity_to_directive(3), "trace");
        assert_eq!(verbosity_to_directive(u8::MAX), "trace");
    }

    #[test]
    fn explicit_color_choices() {
        assert!(use_color(ColorChoice::Always));
        assert!(!use_color(ColorChoice::Never));
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_logging(LogFormat::Human, 0, ColorChoice::Never);
        init_logging(LogFormat::Json, 3, ColorChoice::Auto);
    }
}
