//! Scene and HUD derivation
//!
//! A [`Scene`] is computed from the engine's read-only view plus the
//! transient [`AnimationFlags`] the presenter keeps while an attack flash
//! is on screen. Nothing here can change session state.

use std::fmt;

use serde::Serialize;

use crate::lesson::{Question, QuestionKind};
use crate::phase::{Attacker, Outcome, Phase, PhaseEngine, Urgency};

/// Short-lived presentation flags that are not part of session state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationFlags {
    /// Side currently mid-attack; its idle sprite is hidden
    pub attacking: Option<Attacker>,
    /// Whether the normal-phase enemy is on screen
    pub enemy_visible: bool,
}

/// Phase indicator shown in the HUD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum PhaseBadge {
    /// Normal phase progress
    Normal {
        /// Questions advanced past
        done: usize,
        /// Questions in the set
        total: usize,
    },
    /// Boss phase progress
    Boss {
        /// Questions advanced past
        done: usize,
        /// Questions in the set
        total: usize,
    },
    /// Session over
    Finished {
        /// How it ended
        outcome: Outcome,
    },
}

impl fmt::Display for PhaseBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal { done, total } => write!(f, "NORMAL {done}/{total}"),
            Self::Boss { done, total } => write!(f, "BOSS {done}/{total}"),
            Self::Finished { outcome: Outcome::Won } => f.write_str("VICTORY"),
            Self::Finished { outcome: Outcome::Lost } => f.write_str("DEFEAT"),
        }
    }
}

/// Heads-up display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hud {
    /// Lesson title
    pub title: String,
    /// Class and subject labels
    pub subtitle: String,
    /// Remaining energy
    pub energy: u32,
    /// Energy cap
    pub energy_max: u32,
    /// Energy as a whole percentage of the cap
    pub energy_percent: u32,
    /// Phase indicator
    pub badge: PhaseBadge,
}

/// Which characters are drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Sprites {
    /// Player character
    pub player: bool,
    /// Normal-phase enemy
    pub enemy: bool,
    /// Boss
    pub boss: bool,
    /// "VS" marker between boss and player
    pub versus: bool,
}

/// Countdown indicator for an open boss question.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountdownView {
    /// Units left
    pub remaining: u32,
    /// Escalation level
    pub urgency: Urgency,
    /// Ring fill, `0.0..=1.0`
    pub fraction_elapsed: f64,
}

/// The question panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    /// Kind label ("Multiple choice", ...)
    pub label: &'static str,
    /// Prompt text
    pub prompt: String,
    /// Choices to pick from; empty for short answers
    pub choices: Vec<String>,
    /// Whether the panel is styled for the boss phase
    pub boss: bool,
    /// Whether input is locked because the question was scored
    pub locked: bool,
}

impl QuestionView {
    fn new(question: &Question, boss: bool, locked: bool) -> Self {
        let choices = match &question.kind {
            QuestionKind::SingleChoice { options, .. } => options.clone(),
            QuestionKind::TrueFalse { .. } => vec!["True".to_owned(), "False".to_owned()],
            QuestionKind::ShortAnswer { .. } => Vec::new(),
        };
        Self {
            label: question.kind.label(),
            prompt: question.prompt.clone(),
            choices,
            boss,
            locked,
        }
    }
}

/// End-of-session summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    /// How the session ended
    pub outcome: Outcome,
    /// Correct normal answers
    pub normal_correct: u32,
    /// Normal questions in the lesson
    pub normal_total: usize,
    /// Correct boss answers
    pub boss_correct: u32,
    /// Boss questions in the lesson
    pub boss_total: usize,
    /// Final energy
    pub energy: u32,
    /// Energy cap
    pub energy_max: u32,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    /// Phase the scene belongs to
    pub phase: Phase,
    /// HUD contents
    pub hud: Hud,
    /// Visible characters
    pub sprites: Sprites,
    /// Boss countdown, while a boss question is open
    pub countdown: Option<CountdownView>,
    /// Question panel, while a question is presented
    pub question: Option<QuestionView>,
    /// Result screen, once the session is over
    pub result: Option<ResultSummary>,
}

impl Scene {
    /// Derives the scene for the engine's current state.
    #[must_use]
    pub fn derive(engine: &PhaseEngine, flags: AnimationFlags) -> Self {
        let state = engine.state();
        let bank = engine.bank();
        let phase = state.phase();

        let badge = match (phase, state.outcome()) {
            (_, Some(outcome)) => PhaseBadge::Finished { outcome },
            (Phase::Boss, None) => PhaseBadge::Boss {
                done: state.boss_index(),
                total: bank.boss.len(),
            },
            _ => PhaseBadge::Normal {
                done: state.normal_index(),
                total: bank.normal.len(),
            },
        };

        let energy_percent = if state.energy_max() == 0 {
            0
        } else {
            state.energy() * 100 / state.energy_max()
        };

        let hud = Hud {
            title: bank.title.clone(),
            subtitle: bank.key.subtitle(),
            energy: state.energy(),
            energy_max: state.energy_max(),
            energy_percent,
            badge,
        };

        let sprites = match phase {
            Phase::Normal => Sprites {
                player: true,
                enemy: flags.enemy_visible,
                boss: false,
                versus: false,
            },
            Phase::Boss => Sprites {
                player: flags.attacking != Some(Attacker::Player),
                enemy: false,
                boss: flags.attacking != Some(Attacker::Boss),
                versus: true,
            },
            Phase::Won | Phase::Lost => Sprites::default(),
        };

        let question = engine.current_question().map(|q| {
            QuestionView::new(q, phase == Phase::Boss, state.answered_current())
        });

        let countdown = engine.active_countdown().map(|_| CountdownView {
            remaining: state.boss_seconds_remaining(),
            urgency: engine.urgency(),
            fraction_elapsed: engine.fraction_elapsed(),
        });

        let result = state.outcome().map(|outcome| {
            let stats = state.stats();
            ResultSummary {
                outcome,
                normal_correct: stats.normal_correct,
                normal_total: bank.normal.len(),
                boss_correct: stats.boss_correct,
                boss_total: bank.boss.len(),
                energy: state.energy(),
                energy_max: state.energy_max(),
            }
        });

        Self {
            phase,
            hud,
            sprites,
            countdown,
            question,
            result,
        }
    }
}
