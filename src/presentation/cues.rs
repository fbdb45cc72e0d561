//! Audio cues and feedback sequencing
//!
//! Playback goes through an [`AudioSink`]; [`AudioDirector`] applies the
//! volume rules and swallows sink failures, so audio can never affect a
//! session. [`plan_resolution`] turns a scored answer into an ordered list
//! of [`CueStep`]s that the session runner plays back after the state
//! change has been made.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::phase::{Attacker, Outcome, Resolution};

/// Background music.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicTrack {
    /// Normal phase
    Chill,
    /// Boss phase
    Stress,
    /// Victory screen
    Win,
    /// Defeat screen
    Lose,
}

impl MusicTrack {
    /// Track name as used for asset lookup.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chill => "chill",
            Self::Stress => "stress",
            Self::Win => "win",
            Self::Lose => "lose",
        }
    }

    /// Track for a terminal outcome.
    #[must_use]
    pub const fn for_outcome(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Won => Self::Win,
            Outcome::Lost => Self::Lose,
        }
    }
}

/// One-shot sound effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundEffect {
    /// Correct answer
    Correct,
    /// Wrong answer or timeout
    Wrong,
    /// Player strikes the boss
    Attack1,
    /// Boss strikes the player
    Attack2,
    /// Button press
    Button,
}

impl SoundEffect {
    /// Effect name as used for asset lookup.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Wrong => "wrong",
            Self::Attack1 => "attack1",
            Self::Attack2 => "attack2",
            Self::Button => "button",
        }
    }

    /// Attack effect for the attacking side.
    #[must_use]
    pub const fn attack_by(attacker: Attacker) -> Self {
        match attacker {
            Attacker::Player => Self::Attack1,
            Attacker::Boss => Self::Attack2,
        }
    }
}

// ============================================================================
// Sink
// ============================================================================

/// Audio backend. Implementations may fail; failures are ignored.
pub trait AudioSink: Send {
    /// Starts looping `track` at `volume` (0..=100).
    ///
    /// # Errors
    ///
    /// Returns a description of the playback failure.
    fn play_music(&mut self, track: MusicTrack, volume: u8) -> Result<(), String>;

    /// Plays `effect` once at `volume` (0..=100).
    ///
    /// # Errors
    ///
    /// Returns a description of the playback failure.
    fn play_effect(&mut self, effect: SoundEffect, volume: u8) -> Result<(), String>;

    /// Stops the music.
    fn stop_music(&mut self) {}
}

/// Sink that only logs what would play.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AudioSink for TracingSink {
    fn play_music(&mut self, track: MusicTrack, volume: u8) -> Result<(), String> {
        debug!(track = track.as_str(), volume, "music");
        Ok(())
    }

    fn play_effect(&mut self, effect: SoundEffect, volume: u8) -> Result<(), String> {
        debug!(effect = effect.as_str(), volume, "sound effect");
        Ok(())
    }
}

/// Applies playback rules in front of an [`AudioSink`].
///
/// - requesting the track that is already playing does nothing
/// - effects are skipped while the effect volume is 0
/// - sink errors are logged at debug level and dropped
pub struct AudioDirector {
    sink: Box<dyn AudioSink>,
    music_volume: u8,
    effect_volume: u8,
    current: Option<MusicTrack>,
}

impl std::fmt::Debug for AudioDirector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioDirector")
            .field("music_volume", &self.music_volume)
            .field("effect_volume", &self.effect_volume)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl AudioDirector {
    /// Wraps `sink` with the given volumes (clamped to 100).
    #[must_use]
    pub fn new(sink: Box<dyn AudioSink>, music_volume: u8, effect_volume: u8) -> Self {
        Self {
            sink,
            music_volume: music_volume.min(100),
            effect_volume: effect_volume.min(100),
            current: None,
        }
    }

    /// Track currently playing, if any.
    #[must_use]
    pub const fn current_track(&self) -> Option<MusicTrack> {
        self.current
    }

    /// Switches to `track` unless it is already playing.
    pub fn play_music(&mut self, track: MusicTrack) {
        if self.current == Some(track) {
            return;
        }
        self.current = Some(track);
        if let Err(e) = self.sink.play_music(track, self.music_volume) {
            debug!(track = track.as_str(), error = %e, "music playback failed");
        }
    }

    /// Plays `effect` once, unless effects are muted.
    pub fn play_effect(&mut self, effect: SoundEffect) {
        if self.effect_volume == 0 {
            return;
        }
        if let Err(e) = self.sink.play_effect(effect, self.effect_volume) {
            debug!(effect = effect.as_str(), error = %e, "effect playback failed");
        }
    }

    /// Stops the music.
    pub fn stop_music(&mut self) {
        self.current = None;
        self.sink.stop_music();
    }
}

// ============================================================================
// Sequencing
// ============================================================================

/// Delays used to order feedback after an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueTiming {
    /// Feedback effect to attack effect
    pub cue_delay: Duration,
    /// How long an attack flash stays up
    pub attack: Duration,
    /// Last attack to the defeat screen
    pub lose_delay: Duration,
}

impl Default for CueTiming {
    fn default() -> Self {
        Self {
            cue_delay: Duration::from_millis(150),
            attack: Duration::from_millis(1000),
            lose_delay: Duration::from_millis(1200),
        }
    }
}

/// One presentation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Play a sound effect
    Effect(SoundEffect),
    /// Switch music
    Music(MusicTrack),
    /// Show an attack flash; the attacker's idle sprite is hidden
    AttackStart(Attacker),
    /// Hide the attack flash
    AttackEnd,
    /// Show the result screen
    ShowResult(Outcome),
}

/// A cue and the delay to wait before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueStep {
    /// Wait before running `cue`
    pub after: Duration,
    /// Action to run
    pub cue: Cue,
}

impl CueStep {
    const fn now(cue: Cue) -> Self {
        Self {
            after: Duration::ZERO,
            cue,
        }
    }

    const fn after(after: Duration, cue: Cue) -> Self {
        Self { after, cue }
    }
}

/// Feedback sequence for a scored answer.
///
/// The feedback effect always comes first. In the boss phase the attack
/// flash starts with it, the attack effect follows `cue_delay` later, and
/// the flash lasts `attack`. If the answer ended the session, the result
/// music and screen follow `lose_delay` after the answer.
#[must_use]
pub fn plan_resolution(resolution: &Resolution, timing: &CueTiming) -> Vec<CueStep> {
    let feedback = if resolution.correct {
        SoundEffect::Correct
    } else {
        SoundEffect::Wrong
    };
    let mut plan = Timeline::default();
    plan.at(Duration::ZERO, Cue::Effect(feedback));

    let Some(attacker) = resolution.attacker else {
        return plan.steps;
    };

    plan.at(Duration::ZERO, Cue::AttackStart(attacker));
    plan.at(timing.cue_delay, Cue::Effect(SoundEffect::attack_by(attacker)));
    match resolution.outcome {
        Some(outcome) => {
            plan.at(timing.attack.min(timing.lose_delay), Cue::AttackEnd);
            plan.at(timing.lose_delay, Cue::Music(MusicTrack::for_outcome(outcome)));
            plan.at(timing.lose_delay, Cue::ShowResult(outcome));
        }
        None => plan.at(timing.attack, Cue::AttackEnd),
    }
    plan.steps
}

/// Builds a step list from offsets measured from the start of the plan.
#[derive(Default)]
struct Timeline {
    steps: Vec<CueStep>,
    elapsed: Duration,
}

impl Timeline {
    /// Schedules `cue` at `offset`, or right after the previous step if
    /// that one is later.
    fn at(&mut self, offset: Duration, cue: Cue) {
        let after = offset.saturating_sub(self.elapsed);
        self.elapsed += after;
        self.steps.push(CueStep::after(after, cue));
    }
}

/// Cues for reaching a terminal outcome outside an answer (the last
/// advance, or an empty boss set).
#[must_use]
pub fn plan_finish(outcome: Outcome) -> Vec<CueStep> {
    vec![
        CueStep::now(Cue::Music(MusicTrack::for_outcome(outcome))),
        CueStep::now(Cue::ShowResult(outcome)),
    ]
}

/// Total time a plan takes to play out.
#[must_use]
pub fn plan_duration(steps: &[CueStep]) -> Duration {
    steps.iter().map(|s| s.after).sum()
}
