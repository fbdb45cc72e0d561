//! Configuration schema
//!
//! Every section and field has a default, so an empty or absent file is a
//! valid configuration. Durations are written in humantime form
//! (`60s`, `150ms`).

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::completion::{DEFAULT_GAME_PAGE, DEFAULT_PRACTICE_PAGE};
use crate::phase::EngineSettings;
use crate::presentation::CueTiming;

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Where lesson data comes from
    pub data: DataConfig,
    /// Completion store and hand-off pages
    pub completion: CompletionConfig,
    /// Countdown and presentation timing
    pub timing: TimingConfig,
    /// Volumes
    pub audio: AudioConfig,
}

/// Lesson data locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// `practice.json`: file path or http(s) URL
    pub practice: String,
    /// `theory.json` for lesson titles; `None` disables title lookup
    pub theory: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            practice: "../Practice/practice.json".to_owned(),
            theory: Some("../Theory/theory.json".to_owned()),
        }
    }
}

/// Completion persistence and navigation targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompletionConfig {
    /// JSON file holding completion records
    pub path: PathBuf,
    /// Page returned to after completing a lesson
    pub practice_page: String,
    /// Page that hosts a game session (retry target)
    pub game_page: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("studyhelper-completed.json"),
            practice_page: DEFAULT_PRACTICE_PAGE.to_owned(),
            game_page: DEFAULT_GAME_PAGE.to_owned(),
        }
    }
}

/// Countdown and presentation timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Countdown length per boss question
    #[serde(with = "duration_text")]
    pub boss_countdown: Duration,
    /// Length of one countdown unit
    #[serde(with = "duration_text")]
    pub tick: Duration,
    /// Warning threshold, in units remaining
    pub warn_at: u32,
    /// Critical threshold, in units remaining
    pub critical_at: u32,
    /// Attack flash duration
    #[serde(with = "duration_text")]
    pub attack: Duration,
    /// Feedback effect to attack effect
    #[serde(with = "duration_text")]
    pub cue_delay: Duration,
    /// Boss phase entry to first boss question
    #[serde(with = "duration_text")]
    pub boss_intro: Duration,
    /// Advance to normal question shown
    #[serde(with = "duration_text")]
    pub question_reveal: Duration,
    /// "Next" to the normal phase continuing
    #[serde(with = "duration_text")]
    pub enemy_leave: Duration,
    /// Final attack to defeat screen
    #[serde(with = "duration_text")]
    pub lose_delay: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            boss_countdown: Duration::from_secs(60),
            tick: Duration::from_secs(1),
            warn_at: 20,
            critical_at: 10,
            attack: Duration::from_millis(1000),
            cue_delay: Duration::from_millis(150),
            boss_intro: Duration::from_millis(600),
            question_reveal: Duration::from_millis(400),
            enemy_leave: Duration::from_millis(350),
            lose_delay: Duration::from_millis(1200),
        }
    }
}

impl TimingConfig {
    /// Countdown length in whole ticks.
    #[must_use]
    pub fn countdown_units(&self) -> u32 {
        if self.tick.is_zero() {
            return 0;
        }
        u32::try_from(self.boss_countdown.as_nanos() / self.tick.as_nanos()).unwrap_or(u32::MAX)
    }

    /// Countdown parameters for the phase engine.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            countdown_units: self.countdown_units(),
            tick: self.tick,
            warn_at: self.warn_at,
            critical_at: self.critical_at,
        }
    }

    /// Feedback sequencing delays.
    #[must_use]
    pub const fn cue_timing(&self) -> CueTiming {
        CueTiming {
            cue_delay: self.cue_delay,
            attack: self.attack,
            lose_delay: self.lose_delay,
        }
    }
}

/// Playback volumes, 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AudioConfig {
    /// Music volume
    pub music_volume: u8,
    /// Sound effect volume; 0 silences effects
    pub sfx_volume: u8,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            music_volume: 40,
            sfx_volume: 70,
        }
    }
}

/// Serde adapter for humantime duration strings.
mod duration_text {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(|e| D::Error::custom(format!("invalid duration '{raw}': {e}")))
    }
}
