//! Presentation
//!
//! Read-only views of a session: the [`Scene`] derived from engine state,
//! the audio cue model and feedback sequencing, and the plain-text
//! renderer used by the terminal front end.

pub mod cues;
pub mod scene;
pub mod terminal;

pub use cues::{
    AudioDirector, AudioSink, Cue, CueStep, CueTiming, MusicTrack, SoundEffect, TracingSink,
    plan_finish, plan_resolution,
};
pub use scene::{AnimationFlags, Hud, PhaseBadge, QuestionView, ResultSummary, Scene, Sprites};
