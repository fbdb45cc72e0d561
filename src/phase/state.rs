//! Session state record
//!
//! The single mutable record of a game session. Readers get the whole
//! record through accessors; mutation is restricted to the `phase`
//! module so only the [`PhaseEngine`](super::engine::PhaseEngine) can
//! change phase, energy, or the index counters. Each mutator keeps the
//! energy bounds `0 <= energy <= energy_max` on its own.

use std::fmt;

use serde::Serialize;

/// Major stage of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Answering questions while approaching the enemy
    Normal,
    /// Timed confrontation with the boss
    Boss,
    /// Terminal: boss defeated
    Won,
    /// Terminal: energy ran out
    Lost,
}

impl Phase {
    /// Whether no further questions or timers can happen.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    /// Lowercase name for logs and metrics labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Boss => "boss",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Boss defeated with energy left
    Won,
    /// Energy exhausted
    Lost,
}

impl Outcome {
    /// Outcome decided purely by whether any energy remains.
    #[must_use]
    pub const fn from_energy(energy: u32) -> Self {
        if energy > 0 { Self::Won } else { Self::Lost }
    }

    /// Lowercase name for logs and metrics labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Outcome> for Phase {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Won => Self::Won,
            Outcome::Lost => Self::Lost,
        }
    }
}

/// Per-phase answer statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Correct normal answers
    pub normal_correct: u32,
    /// Wrong normal answers
    pub normal_wrong: u32,
    /// Correct boss answers
    pub boss_correct: u32,
    /// Wrong boss answers, timeouts included
    pub boss_wrong: u32,
}

impl SessionStats {
    /// Correct answers across both phases.
    #[must_use]
    pub const fn total_correct(&self) -> u32 {
        self.normal_correct + self.boss_correct
    }
}

/// Authoritative record of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    phase: Phase,
    normal_index: usize,
    boss_index: usize,
    energy: u32,
    energy_max: u32,
    answered_current: bool,
    stats: SessionStats,
    boss_seconds_remaining: u32,
}

impl SessionState {
    /// Fresh state at the start of the normal phase with zero energy.
    #[must_use]
    pub const fn new(energy_max: u32, boss_seconds: u32) -> Self {
        Self {
            phase: Phase::Normal,
            normal_index: 0,
            boss_index: 0,
            energy: 0,
            energy_max,
            answered_current: false,
            stats: SessionStats {
                normal_correct: 0,
                normal_wrong: 0,
                boss_correct: 0,
                boss_wrong: 0,
            },
            boss_seconds_remaining: boss_seconds,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Index of the current (or next) normal question.
    #[must_use]
    pub const fn normal_index(&self) -> usize {
        self.normal_index
    }

    /// Index of the current (or next) boss question.
    #[must_use]
    pub const fn boss_index(&self) -> usize {
        self.boss_index
    }

    /// Remaining energy.
    #[must_use]
    pub const fn energy(&self) -> u32 {
        self.energy
    }

    /// Energy cap (the number of normal questions).
    #[must_use]
    pub const fn energy_max(&self) -> u32 {
        self.energy_max
    }

    /// Whether the current question has already been scored.
    #[must_use]
    pub const fn answered_current(&self) -> bool {
        self.answered_current
    }

    /// Answer statistics.
    #[must_use]
    pub const fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Seconds left on the boss countdown.
    #[must_use]
    pub const fn boss_seconds_remaining(&self) -> u32 {
        self.boss_seconds_remaining
    }

    /// Terminal outcome, if the session has finished.
    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::Won => Some(Outcome::Won),
            Phase::Lost => Some(Outcome::Lost),
            Phase::Normal | Phase::Boss => None,
        }
    }

    /// Energy as a fraction of the cap, in `0.0..=1.0`.
    #[must_use]
    pub fn energy_ratio(&self) -> f64 {
        if self.energy_max == 0 {
            0.0
        } else {
            f64::from(self.energy) / f64::from(self.energy_max)
        }
    }

    // ------------------------------------------------------------------
    // Mutations (phase module only)
    // ------------------------------------------------------------------

    /// Scores a normal answer: a correct one gains energy up to the cap;
    /// a wrong one only counts.
    pub(super) fn record_normal_result(&mut self, correct: bool) {
        if correct {
            self.stats.normal_correct += 1;
            self.energy = (self.energy + 1).min(self.energy_max);
        } else {
            self.stats.normal_wrong += 1;
        }
    }

    /// Scores a boss answer: a wrong one (or a timeout) costs one energy,
    /// floored at zero.
    pub(super) fn record_boss_result(&mut self, correct: bool) {
        if correct {
            self.stats.boss_correct += 1;
        } else {
            self.stats.boss_wrong += 1;
            self.energy = self.energy.saturating_sub(1);
        }
    }

    pub(super) const fn advance_normal_index(&mut self) {
        self.normal_index += 1;
    }

    pub(super) const fn advance_boss_index(&mut self) {
        self.boss_index += 1;
    }

    pub(super) const fn enter_boss_phase(&mut self) {
        self.phase = Phase::Boss;
        self.boss_index = 0;
    }

    pub(super) fn enter_terminal(&mut self, outcome: Outcome) {
        self.phase = outcome.into();
    }

    pub(super) const fn reset_answered_guard(&mut self) {
        self.answered_current = false;
    }

    /// Sets the answered guard; returns `false` if it was already set.
    pub(super) const fn mark_answered(&mut self) -> bool {
        if self.answered_current {
            return false;
        }
        self.answered_current = true;
        true
    }

    pub(super) const fn set_boss_seconds_remaining(&mut self, seconds: u32) {
        self.boss_seconds_remaining = seconds;
    }
}
