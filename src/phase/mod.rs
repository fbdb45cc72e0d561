//! Session phases
//!
//! A session moves `Normal → Boss → Won | Lost`. The [`PhaseEngine`] owns
//! the [`SessionState`], runs one [`Countdown`] per boss question, and is
//! the only writer of phase, energy, and index counters.

pub mod countdown;
pub mod engine;
pub mod state;

pub use countdown::{Countdown, CountdownId, TimerEvent, Urgency};
pub use engine::{
    Advance, Attacker, EngineSettings, NextAffordance, PhaseEngine, Resolution, Submission,
    TimerUpdate,
};
pub use state::{Outcome, Phase, SessionState, SessionStats};
