//! Configuration validation
//!
//! Runs on the deserialized [`AppConfig`] and collects every issue rather
//! than stopping at the first, so a user sees all problems at once.

use std::time::Duration;

use crate::config::schema::{AppConfig, AudioConfig, TimingConfig};
use crate::error::{Severity, ValidationIssue};

/// Outcome of a validation run.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Issues that prevent the configuration from being used
    pub errors: Vec<ValidationIssue>,
    /// Issues worth reporting that do not block loading
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `config`, collecting all errors and warnings.
    pub fn validate(&mut self, config: &AppConfig) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_data(config);
        self.validate_timing(&config.timing);
        self.validate_audio(config.audio);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    fn validate_data(&mut self, config: &AppConfig) {
        if config.data.practice.trim().is_empty() {
            self.add_error("data.practice", "question source is required");
        }
        if config
            .data
            .theory
            .as_deref()
            .is_some_and(|t| t.trim().is_empty())
        {
            self.add_warning("data.theory", "empty title source; lesson ids will be used as titles");
        }
        if config.completion.path.as_os_str().is_empty() {
            self.add_error("completion.path", "completion store path is required");
        }
    }

    fn validate_timing(&mut self, timing: &TimingConfig) {
        if timing.tick.is_zero() {
            self.add_error("timing.tick", "tick must be greater than zero");
            return;
        }
        if timing.boss_countdown.is_zero() {
            self.add_error("timing.boss_countdown", "countdown must be greater than zero");
            return;
        }
        if timing.boss_countdown.as_nanos() % timing.tick.as_nanos() != 0 {
            self.add_error(
                "timing.boss_countdown",
                "countdown must be a whole number of ticks",
            );
        }

        let units = timing.countdown_units();
        if timing.warn_at > units {
            self.add_error(
                "timing.warn_at",
                &format!("warning threshold {} exceeds the countdown ({units} ticks)", timing.warn_at),
            );
        }
        if timing.critical_at >= timing.warn_at {
            self.add_error(
                "timing.critical_at",
                &format!(
                    "critical threshold {} must be below the warning threshold {}",
                    timing.critical_at, timing.warn_at
                ),
            );
        }

        if timing.cue_delay >= timing.attack {
            self.add_warning(
                "timing.cue_delay",
                "attack cue starts after the attack flash has ended",
            );
        }
        for (path, value) in [
            ("timing.attack", timing.attack),
            ("timing.lose_delay", timing.lose_delay),
            ("timing.boss_intro", timing.boss_intro),
            ("timing.question_reveal", timing.question_reveal),
            ("timing.enemy_leave", timing.enemy_leave),
        ] {
            if value > Duration::from_secs(10) {
                self.add_warning(path, "delay is unusually long (> 10s)");
            }
        }
    }

    fn validate_audio(&mut self, audio: AudioConfig) {
        if audio.music_volume > 100 {
            self.add_error("audio.music_volume", "volume must be between 0 and 100");
        }
        if audio.sfx_volume > 100 {
            self.add_error("audio.sfx_volume", "volume must be between 0 and 100");
        }
    }

    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_owned(),
            message: message.to_owned(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_owned(),
            message: message.to_owned(),
            severity: Severity::Warning,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(config: &AppConfig) -> ValidationResult {
        Validator::new().validate(config)
    }

    fn paths(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn defaults_are_valid() {
        let result = validate(&AppConfig::default());
        assert!(!result.has_errors(), "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn thresholds_must_be_ordered() {
        let mut config = AppConfig::default();
        config.timing.warn_at = 10;
        config.timing.critical_at = 10;
        assert_eq!(paths(&validate(&config).errors), vec!["timing.critical_at"]);

        config.timing.warn_at = 61;
        config.timing.critical_at = 5;
        assert_eq!(paths(&validate(&config).errors), vec!["timing.warn_at"]);
    }

    #[test]
    fn countdown_must_divide_into_ticks() {
        let mut config = AppConfig::default();
        config.timing.tick = Duration::from_millis(700);
        assert!(paths(&validate(&config).errors).contains(&"timing.boss_countdown"));
    }

    #[test]
    fn zero_tick_is_an_error() {
        let mut config = AppConfig::default();
        config.timing.tick = Duration::ZERO;
        assert_eq!(paths(&validate(&config).errors), vec!["timing.tick"]);
    }

    #[test]
    fn collects_every_error() {
        let mut config = AppConfig::default();
        config.audio.music_volume = 101;
        config.audio.sfx_volume = 200;
        config.data.practice = " ".to_owned();
        let result = validate(&config);
        assert_eq!(
            paths(&result.errors),
            vec!["data.practice", "audio.music_volume", "audio.sfx_volume"]
        );
    }

    #[test]
    fn slow_delays_warn() {
        let mut config = AppConfig::default();
        config.timing.lose_delay = Duration::from_secs(30);
        config.timing.cue_delay = Duration::from_secs(2);
        let result = validate(&config);
        assert!(!result.has_errors());
        assert_eq!(
            paths(&result.warnings),
            vec!["timing.cue_delay", "timing.lose_delay"]
        );
    }
}
