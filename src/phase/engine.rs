//! Phase state machine
//!
//! [`PhaseEngine`] owns the [`SessionState`] of one session and is the only
//! code that mutates it. Callers drive the session through four
//! operations:
//!
//! - [`present_question`](PhaseEngine::present_question): put the next
//!   question up (starting its countdown in the boss phase)
//! - [`submit`](PhaseEngine::submit): score an answer
//! - [`handle_timer`](PhaseEngine::handle_timer): apply a countdown event
//! - [`advance`](PhaseEngine::advance): move past an answered question
//!
//! Every path away from a question goes through `leave_current_question`,
//! which cancels the boss countdown before any phase or index change.
//! Countdown events are delivered over an mpsc channel supplied by the
//! caller and carry the id of their countdown; events from a countdown
//! that is no longer active are ignored.

use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::error::{EvaluationError, PhaseError};
use crate::evaluator::evaluate;
use crate::lesson::{Answer, Question, QuestionBank, SetKind};

use super::countdown::{Countdown, CountdownId, TimerEvent, Urgency};
use super::state::{Outcome, Phase, SessionState};

// ============================================================================
// Settings
// ============================================================================

/// Countdown parameters for boss questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Units per boss question
    pub countdown_units: u32,
    /// Wall-clock length of one unit
    pub tick: Duration,
    /// Warning threshold (units remaining)
    pub warn_at: u32,
    /// Critical threshold (units remaining)
    pub critical_at: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            countdown_units: 60,
            tick: Duration::from_secs(1),
            warn_at: 20,
            critical_at: 10,
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// Side that attacks after a boss answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Attacker {
    /// Correct answer: the player hits the boss
    Player,
    /// Wrong answer or timeout: the boss hits the player
    Boss,
}

/// What the "next" affordance leads to after an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAffordance {
    /// Another question of the same phase follows
    NextQuestion,
    /// The last normal question was answered
    FaceBoss,
    /// The last boss question was answered
    SeeResults,
}

impl NextAffordance {
    /// Button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NextQuestion => "Next question",
            Self::FaceBoss => "Face the boss!",
            Self::SeeResults => "See results",
        }
    }
}

/// A scored question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    /// Phase the question belonged to
    pub set: SetKind,
    /// Question id
    pub question_id: String,
    /// Whether the answer was correct
    pub correct: bool,
    /// Whether the result was synthesized by countdown expiry
    pub timed_out: bool,
    /// Energy after scoring
    pub energy: u32,
    /// Attacking side (boss phase only)
    pub attacker: Option<Attacker>,
    /// Terminal outcome, when this answer ended the session
    pub outcome: Option<Outcome>,
    /// Where "next" leads; `None` once the session is over
    pub next: Option<NextAffordance>,
}

/// Result of a submission attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The answer was scored
    Resolved(Resolution),
    /// The evaluator could not score it; nothing changed
    Rejected(EvaluationError),
    /// The question was already scored; nothing changed
    Ignored,
}

/// Where the session went after [`PhaseEngine::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Another normal question is ready to present
    NextNormal,
    /// The boss phase just began
    BossEntered,
    /// Another boss question is ready to present
    NextBoss,
    /// The session ended
    Finished(Outcome),
}

/// Effect of a countdown event on the session.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerUpdate {
    /// The countdown moved
    Tick {
        /// Units left
        remaining: u32,
        /// Indicator escalation
        urgency: Urgency,
        /// Share of the countdown already used, `0.0..=1.0`
        fraction_elapsed: f64,
    },
    /// The countdown ran out and a wrong answer was recorded
    Expired(Resolution),
}

// ============================================================================
// Engine
// ============================================================================

/// Drives one game session from the first question to a terminal outcome.
pub struct PhaseEngine {
    bank: QuestionBank,
    settings: EngineSettings,
    state: SessionState,
    presented: bool,
    countdown: Option<Countdown>,
    timer_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl std::fmt::Debug for PhaseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseEngine")
            .field("lesson", &self.bank.key.storage_key())
            .field("state", &self.state)
            .field("presented", &self.presented)
            .field("countdown", &self.countdown.as_ref().map(Countdown::id))
            .finish_non_exhaustive()
    }
}

impl PhaseEngine {
    /// Creates an engine at the start of the normal phase.
    ///
    /// Countdown events are sent on `timer_tx`; the caller feeds them back
    /// through [`handle_timer`](Self::handle_timer).
    #[must_use]
    pub fn new(
        bank: QuestionBank,
        settings: EngineSettings,
        timer_tx: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        let energy_max = u32::try_from(bank.normal.len()).unwrap_or(u32::MAX);
        info!(
            lesson = %bank.key,
            normal = bank.normal.len(),
            boss = bank.boss.len(),
            "session started"
        );
        Self {
            state: SessionState::new(energy_max, settings.countdown_units),
            bank,
            settings,
            presented: false,
            countdown: None,
            timer_tx,
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    /// Current session record.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Questions this session plays.
    #[must_use]
    pub const fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Countdown parameters.
    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The question on screen, if any.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if !self.presented {
            return None;
        }
        match self.state.phase() {
            Phase::Normal => self.bank.normal.get(self.state.normal_index()),
            Phase::Boss => self.bank.boss.get(self.state.boss_index()),
            Phase::Won | Phase::Lost => None,
        }
    }

    /// Id of the running countdown, if a boss question is open.
    #[must_use]
    pub fn active_countdown(&self) -> Option<CountdownId> {
        self.countdown.as_ref().map(Countdown::id)
    }

    /// Whether every normal question has been answered and advanced past.
    #[must_use]
    pub fn normal_exhausted(&self) -> bool {
        self.state.normal_index() >= self.bank.normal.len()
    }

    /// Urgency of the countdown indicator.
    #[must_use]
    pub const fn urgency(&self) -> Urgency {
        Urgency::for_remaining(
            self.state.boss_seconds_remaining(),
            self.settings.warn_at,
            self.settings.critical_at,
        )
    }

    /// Share of the countdown already used, `0.0..=1.0`.
    #[must_use]
    pub fn fraction_elapsed(&self) -> f64 {
        if self.settings.countdown_units == 0 {
            return 1.0;
        }
        let remaining = f64::from(self.state.boss_seconds_remaining());
        (1.0 - remaining / f64::from(self.settings.countdown_units)).clamp(0.0, 1.0)
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Presents the question at the current index of the current phase.
    ///
    /// Resets the answered guard. In the boss phase this also starts a
    /// fresh countdown.
    ///
    /// # Errors
    ///
    /// - `PhaseError::Terminal` once the session is over
    /// - `PhaseError::AlreadyPresented` if a question is already up
    /// - `PhaseError::NoQuestion` if the current set is exhausted
    pub fn present_question(&mut self) -> Result<&Question, PhaseError> {
        let phase = self.state.phase();
        let (len, index) = match phase {
            Phase::Normal => (self.bank.normal.len(), self.state.normal_index()),
            Phase::Boss => (self.bank.boss.len(), self.state.boss_index()),
            Phase::Won | Phase::Lost => return Err(self.refuse(self.terminal_error())),
        };
        if self.presented {
            return Err(self.refuse(PhaseError::AlreadyPresented));
        }
        if index >= len {
            return Err(self.refuse(PhaseError::NoQuestion));
        }

        self.leave_current_question();
        self.state.reset_answered_guard();
        self.presented = true;
        if phase == Phase::Boss {
            self.start_countdown();
        }

        debug!(phase = %phase, index, total = len, "question presented");
        self.current_question().ok_or(PhaseError::NoQuestion)
    }

    /// Scores `answer` against the presented question.
    ///
    /// A submission for an already-scored question is ignored, as is one
    /// the evaluator rejects; neither changes any state.
    ///
    /// # Errors
    ///
    /// - `PhaseError::Terminal` once the session is over
    /// - `PhaseError::NoQuestion` if no question is presented
    pub fn submit(&mut self, answer: &Answer) -> Result<Submission, PhaseError> {
        if self.state.phase().is_terminal() {
            return Err(self.refuse(self.terminal_error()));
        }
        let Some(question) = self.current_question() else {
            return Err(self.refuse(PhaseError::NoQuestion));
        };
        if self.state.answered_current() {
            debug!(question = %question.id, "submission ignored; already answered");
            return Ok(Submission::Ignored);
        }
        let correct = match evaluate(&question.kind, answer) {
            Ok(correct) => correct,
            Err(e) => {
                debug!(question = %question.id, error = %e, "submission rejected");
                return Ok(Submission::Rejected(e));
            }
        };
        Ok(Submission::Resolved(self.resolve(correct, false)))
    }

    /// Applies a countdown event.
    ///
    /// Events from a countdown other than the active one are stale and
    /// return `None`. Expiry of an unanswered question records a wrong
    /// answer exactly as a manual one would.
    pub fn handle_timer(&mut self, event: TimerEvent) -> Option<TimerUpdate> {
        if self.active_countdown() != Some(event.id()) {
            debug!(countdown = %event.id(), "stale countdown event ignored");
            return None;
        }
        match event {
            TimerEvent::Tick { remaining, .. } => {
                self.state.set_boss_seconds_remaining(remaining);
                Some(TimerUpdate::Tick {
                    remaining,
                    urgency: self.urgency(),
                    fraction_elapsed: self.fraction_elapsed(),
                })
            }
            TimerEvent::Expired { .. } => {
                if self.state.answered_current() {
                    self.leave_current_question();
                    return None;
                }
                info!(boss_index = self.state.boss_index(), "boss countdown expired");
                Some(TimerUpdate::Expired(self.resolve(false, true)))
            }
        }
    }

    /// Moves past the answered question.
    ///
    /// In the normal phase, an exhausted set leads into the boss phase.
    /// With no question presented, an exhausted normal phase (including an
    /// empty normal set) goes straight to the boss phase.
    ///
    /// # Errors
    ///
    /// - `PhaseError::Terminal` once the session is over
    /// - `PhaseError::NotAnswered` while the presented question is open
    /// - `PhaseError::NoQuestion` if nothing is presented and the phase
    ///   still has questions
    pub fn advance(&mut self) -> Result<Advance, PhaseError> {
        let phase = self.state.phase();
        if phase.is_terminal() {
            return Err(self.refuse(self.terminal_error()));
        }
        if self.presented && !self.state.answered_current() {
            return Err(self.refuse(PhaseError::NotAnswered));
        }
        if !self.presented {
            if phase == Phase::Normal && self.normal_exhausted() {
                return self.enter_boss_phase();
            }
            return Err(self.refuse(PhaseError::NoQuestion));
        }

        self.leave_current_question();
        self.presented = false;
        match phase {
            Phase::Normal => {
                self.state.advance_normal_index();
                if self.normal_exhausted() {
                    self.enter_boss_phase()
                } else {
                    Ok(Advance::NextNormal)
                }
            }
            Phase::Boss => {
                self.state.advance_boss_index();
                if self.state.boss_index() >= self.bank.boss.len() {
                    let outcome = Outcome::from_energy(self.state.energy());
                    self.finish(outcome);
                    Ok(Advance::Finished(outcome))
                } else {
                    Ok(Advance::NextBoss)
                }
            }
            Phase::Won | Phase::Lost => Err(self.refuse(self.terminal_error())),
        }
    }

    /// Transitions from the normal phase to the boss phase.
    ///
    /// Refused, with no state change, unless every normal question has
    /// been advanced past. With an empty boss set the session ends at once:
    /// won with energy left, lost without.
    ///
    /// # Errors
    ///
    /// - `PhaseError::WrongPhase` outside the normal phase
    /// - `PhaseError::NormalPhaseIncomplete` while normal questions remain
    pub fn enter_boss_phase(&mut self) -> Result<Advance, PhaseError> {
        let phase = self.state.phase();
        if phase != Phase::Normal {
            return Err(self.refuse(PhaseError::WrongPhase {
                operation: "enter_boss_phase",
                phase: phase.to_string(),
            }));
        }
        if !self.normal_exhausted() {
            return Err(self.refuse(PhaseError::NormalPhaseIncomplete {
                answered: self.state.normal_index(),
                total: self.bank.normal.len(),
            }));
        }

        self.leave_current_question();
        self.presented = false;

        if self.bank.boss.is_empty() {
            let outcome = Outcome::from_energy(self.state.energy());
            info!(energy = self.state.energy(), "no boss questions; skipping boss phase");
            self.finish(outcome);
            return Ok(Advance::Finished(outcome));
        }

        self.state.enter_boss_phase();
        info!(
            energy = self.state.energy(),
            energy_max = self.state.energy_max(),
            boss = self.bank.boss.len(),
            "boss phase entered"
        );
        Ok(Advance::BossEntered)
    }

    /// Builds a fresh session over the same lesson with a new shuffle.
    ///
    /// # Errors
    ///
    /// Returns `PhaseError::NotFinished` unless the session has ended.
    pub fn retry<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Self, PhaseError> {
        if !self.state.phase().is_terminal() {
            return Err(self.refuse(PhaseError::NotFinished));
        }
        info!(lesson = %self.bank.key, "retrying lesson");
        Ok(Self::new(
            self.bank.reshuffled(rng),
            self.settings,
            self.timer_tx.clone(),
        ))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Scores the presented question. Caller has checked the guard.
    fn resolve(&mut self, correct: bool, timed_out: bool) -> Resolution {
        let phase = self.state.phase();
        let question_id = self
            .current_question()
            .map(|q| q.id.clone())
            .unwrap_or_default();

        self.leave_current_question();
        self.state.mark_answered();

        let mut resolution = Resolution {
            set: SetKind::Normal,
            question_id,
            correct,
            timed_out,
            energy: 0,
            attacker: None,
            outcome: None,
            next: None,
        };

        if phase == Phase::Boss {
            self.state.record_boss_result(correct);
            resolution.set = SetKind::Boss;
            resolution.attacker = Some(if correct { Attacker::Player } else { Attacker::Boss });
            if self.state.energy() == 0 {
                self.finish(Outcome::Lost);
                resolution.outcome = Some(Outcome::Lost);
            } else if self.state.boss_index() + 1 >= self.bank.boss.len() {
                resolution.next = Some(NextAffordance::SeeResults);
            } else {
                resolution.next = Some(NextAffordance::NextQuestion);
            }
        } else {
            self.state.record_normal_result(correct);
            resolution.next = Some(if self.state.normal_index() + 1 >= self.bank.normal.len() {
                NextAffordance::FaceBoss
            } else {
                NextAffordance::NextQuestion
            });
        }

        resolution.energy = self.state.energy();
        info!(
            phase = %phase,
            question = %resolution.question_id,
            correct,
            timed_out,
            energy = resolution.energy,
            "answer resolved"
        );
        resolution
    }

    /// Enters a terminal state. Cancels any countdown first.
    fn finish(&mut self, outcome: Outcome) {
        self.leave_current_question();
        self.presented = false;
        self.state.enter_terminal(outcome);
        let stats = self.state.stats();
        info!(
            %outcome,
            energy = self.state.energy(),
            normal_correct = stats.normal_correct,
            boss_correct = stats.boss_correct,
            "session finished"
        );
    }

    /// Invalidates the countdown of the question being left.
    ///
    /// Called on every exit path before phase, index, or guard changes.
    fn leave_current_question(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            debug!(countdown = %countdown.id(), "countdown cancelled");
            countdown.cancel();
        }
    }

    fn start_countdown(&mut self) {
        let id = CountdownId::next();
        self.state
            .set_boss_seconds_remaining(self.settings.countdown_units);
        self.countdown = Some(Countdown::start(
            id,
            self.settings.countdown_units,
            self.settings.tick,
            self.timer_tx.clone(),
        ));
        debug!(countdown = %id, units = self.settings.countdown_units, "countdown started");
    }

    fn terminal_error(&self) -> PhaseError {
        PhaseError::Terminal {
            outcome: self.state.phase().to_string(),
        }
    }

    fn refuse(&self, err: PhaseError) -> PhaseError {
        error!(phase = %self.state.phase(), error = %err, "phase operation refused");
        err
    }
}
