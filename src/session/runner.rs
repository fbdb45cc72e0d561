//! Session runner
//!
//! Plays a lesson over a line-based input stream and a text output
//! stream. A reader task forwards input lines over a channel; the runner
//! selects over input, countdown events, and shutdown, and is the only
//! caller of the [`PhaseEngine`]. Presentation delays are awaited after
//! the engine call they follow, so the engine has always settled before
//! anything is shown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::completion::{CompletionStore, NavigationSignal, report_win};
use crate::config::{AppConfig, AudioConfig, TimingConfig};
use crate::error::StudyHelperError;
use crate::lesson::{LessonKey, LessonLoader, Question, QuestionBank, SetKind};
use crate::observability::events::{Event, EventEmitter};
use crate::observability::metrics;
use crate::phase::{
    Advance, Attacker, Outcome, Phase, PhaseEngine, Resolution, Submission, TimerEvent, TimerUpdate,
    Urgency,
};
use crate::presentation::scene::{AnimationFlags, CountdownView, Scene};
use crate::presentation::terminal::{
    render_countdown, render_error_screen, render_resolution, render_scene,
};
use crate::presentation::{AudioDirector, Cue, CueStep, MusicTrack, SoundEffect, plan_finish, plan_resolution};

use super::input::{Command, Prompt, parse_command};

/// Settings a session takes from the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Countdown and presentation timing
    pub timing: TimingConfig,
    /// Volumes
    pub audio: AudioConfig,
    /// Page returned to after completing
    pub practice_page: String,
    /// Page that hosts a retried session
    pub game_page: String,
}

impl SessionConfig {
    /// Extracts session settings from a loaded configuration.
    #[must_use]
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            timing: config.timing,
            audio: config.audio,
            practice_page: config.completion.practice_page.clone(),
            game_page: config.completion.game_page.clone(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_app(&AppConfig::default())
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionExit {
    /// The player completed a won lesson; the signal is for the lesson browser
    Completed(NavigationSignal),
    /// The player quit or input ended
    Quit,
    /// Shutdown was requested
    Interrupted,
}

enum Ending {
    Retry,
    Exit(SessionExit),
}

/// Per-session state owned by the runner.
struct Live {
    engine: PhaseEngine,
    timer_rx: mpsc::UnboundedReceiver<TimerEvent>,
    session: Uuid,
    flags: AnimationFlags,
}

/// Plays lessons over text input and output.
pub struct SessionRunner<W> {
    loader: LessonLoader,
    store: Arc<dyn CompletionStore>,
    events: Arc<EventEmitter>,
    audio: AudioDirector,
    config: SessionConfig,
    cancel: CancellationToken,
    out: W,
}

impl<W> std::fmt::Debug for SessionRunner<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRunner")
            .field("loader", &self.loader)
            .field("audio", &self.audio)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<W: AsyncWrite + Unpin + Send> SessionRunner<W> {
    /// Creates a runner writing screens to `out`.
    #[must_use]
    pub fn new(
        loader: LessonLoader,
        store: Arc<dyn CompletionStore>,
        events: Arc<EventEmitter>,
        audio: AudioDirector,
        config: SessionConfig,
        out: W,
    ) -> Self {
        Self {
            loader,
            store,
            events,
            audio,
            config,
            cancel: CancellationToken::new(),
            out,
        }
    }

    /// Stops the run when `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Consumes the runner, returning its output.
    #[must_use]
    pub fn into_output(self) -> W {
        self.out
    }

    /// Plays `key` until the player completes, quits, or input ends.
    ///
    /// Retry reloads the lesson, so every attempt gets a fresh shuffle.
    ///
    /// # Errors
    ///
    /// - `StudyHelperError::Load` if the lesson cannot be loaded (an error
    ///   screen is written first)
    /// - `StudyHelperError::Io` if the output cannot be written
    pub async fn run<R>(&mut self, key: &LessonKey, input: R) -> Result<SessionExit, StudyHelperError>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let mut lines = spawn_reader(input);
        loop {
            let bank = match self.loader.load(key).await {
                Ok(bank) => bank,
                Err(e) => {
                    self.write(&render_error_screen(&e.to_string())).await?;
                    return Err(e.into());
                }
            };
            let mut live = self.start(bank);
            match self.play(&mut live, &mut lines).await? {
                Ending::Retry => {
                    let signal = NavigationSignal::Retry { key: key.clone() };
                    info!(url = %signal.url(&self.config.game_page), "restarting lesson");
                }
                Ending::Exit(exit) => {
                    self.audio.stop_music();
                    return Ok(exit);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    fn start(&mut self, bank: QuestionBank) -> Live {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let engine = PhaseEngine::new(bank, self.config.timing.engine_settings(), timer_tx);
        let live = Live {
            engine,
            timer_rx,
            session: Uuid::new_v4(),
            flags: AnimationFlags::default(),
        };

        let bank = live.engine.bank();
        let state = live.engine.state();
        self.events.emit(Event::SessionStarted {
            timestamp: Utc::now(),
            session: live.session,
            lesson: bank.key.storage_key(),
            normal_total: bank.normal.len(),
            boss_total: bank.boss.len(),
            energy_max: state.energy_max(),
        });
        self.phase_entered(&live, Phase::Normal);
        metrics::set_energy(state.energy());
        self.audio.play_music(MusicTrack::Chill);
        live
    }

    async fn play(
        &mut self,
        live: &mut Live,
        lines: &mut mpsc::UnboundedReceiver<String>,
    ) -> Result<Ending, StudyHelperError> {
        if live.engine.normal_exhausted() {
            let advance = live.engine.advance()?;
            self.after_advance(live, advance).await?;
        } else {
            self.present(live).await?;
        }

        loop {
            let ending = tokio::select! {
                biased;
                () = self.cancel.cancelled() => Some(Ending::Exit(SessionExit::Interrupted)),
                Some(event) = live.timer_rx.recv() => {
                    self.on_timer(live, event).await?;
                    None
                }
                line = lines.recv() => match line {
                    Some(line) => self.on_line(live, &line).await?,
                    None => {
                        debug!("input closed");
                        Some(Ending::Exit(SessionExit::Quit))
                    }
                },
            };
            if let Some(ending) = ending {
                return Ok(ending);
            }
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    async fn on_line(&mut self, live: &mut Live, line: &str) -> Result<Option<Ending>, StudyHelperError> {
        let command = match parse_command(line, prompt_for(&live.engine)) {
            Ok(command) => command,
            Err(e) => {
                self.write(&format!("{e}\n")).await?;
                return Ok(None);
            }
        };

        match command {
            Command::Answer(answer) => {
                let question = live.engine.current_question().cloned();
                match live.engine.submit(&answer)? {
                    Submission::Resolved(resolution) => {
                        self.after_resolution(live, question.as_ref(), resolution).await?;
                    }
                    Submission::Rejected(e) => self.write(&format!("{e}\n")).await?,
                    Submission::Ignored => {}
                }
                Ok(None)
            }
            Command::Next => {
                self.audio.play_effect(SoundEffect::Button);
                self.next(live).await?;
                Ok(None)
            }
            Command::Retry => {
                self.audio.play_effect(SoundEffect::Button);
                Ok(Some(Ending::Retry))
            }
            Command::Complete => {
                self.audio.play_effect(SoundEffect::Button);
                let signal = NavigationSignal::ReturnToPractice {
                    key: live.engine.bank().key.clone(),
                };
                let url = signal.url(&self.config.practice_page);
                self.write(&format!("Lesson complete. Returning to {url}\n")).await?;
                Ok(Some(Ending::Exit(SessionExit::Completed(signal))))
            }
            Command::Quit => Ok(Some(Ending::Exit(SessionExit::Quit))),
        }
    }

    async fn on_timer(&mut self, live: &mut Live, event: TimerEvent) -> Result<(), StudyHelperError> {
        let question = live.engine.current_question().cloned();
        match live.engine.handle_timer(event) {
            Some(TimerUpdate::Tick {
                remaining,
                urgency,
                fraction_elapsed,
            }) => {
                debug!(remaining, "countdown tick");
                if remaining % 10 == 0 || urgency == Urgency::Critical {
                    let view = CountdownView {
                        remaining,
                        urgency,
                        fraction_elapsed,
                    };
                    self.write(&format!("{}\n", render_countdown(&view))).await?;
                }
            }
            Some(TimerUpdate::Expired(resolution)) => {
                self.events.emit(Event::CountdownExpired {
                    timestamp: Utc::now(),
                    session: live.session,
                    question_id: resolution.question_id.clone(),
                });
                self.after_resolution(live, question.as_ref(), resolution).await?;
            }
            None => {}
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    async fn present(&mut self, live: &mut Live) -> Result<(), StudyHelperError> {
        let state = live.engine.state();
        let (set, index) = match state.phase() {
            Phase::Boss => (SetKind::Boss, state.boss_index()),
            _ => (SetKind::Normal, state.normal_index()),
        };
        let question_id = live.engine.present_question()?.id.clone();
        live.flags.enemy_visible = set == SetKind::Normal;

        self.events.emit(Event::QuestionPresented {
            timestamp: Utc::now(),
            session: live.session,
            set,
            index,
            question_id,
        });
        let scene = Scene::derive(&live.engine, live.flags);
        self.write(&render_scene(&scene)).await
    }

    async fn next(&mut self, live: &mut Live) -> Result<(), StudyHelperError> {
        if live.engine.state().phase() == Phase::Normal {
            live.flags.enemy_visible = false;
            sleep(self.config.timing.enemy_leave).await;
        }
        let advance = live.engine.advance()?;
        self.after_advance(live, advance).await
    }

    async fn after_advance(&mut self, live: &mut Live, advance: Advance) -> Result<(), StudyHelperError> {
        match advance {
            Advance::NextNormal => {
                sleep(self.config.timing.question_reveal).await;
                self.present(live).await
            }
            Advance::NextBoss => self.present(live).await,
            Advance::BossEntered => {
                self.phase_entered(live, Phase::Boss);
                self.audio.play_music(MusicTrack::Stress);
                self.write("The boss appears!\n").await?;
                sleep(self.config.timing.boss_intro).await;
                self.present(live).await
            }
            Advance::Finished(outcome) => {
                self.finished(live, outcome).await?;
                self.play_cues(live, &plan_finish(outcome)).await
            }
        }
    }

    async fn after_resolution(
        &mut self,
        live: &mut Live,
        question: Option<&Question>,
        resolution: Resolution,
    ) -> Result<(), StudyHelperError> {
        metrics::record_answer(resolution.set, resolution.correct, resolution.timed_out);
        metrics::set_energy(resolution.energy);
        self.events.emit(Event::AnswerResolved {
            timestamp: Utc::now(),
            session: live.session,
            set: resolution.set,
            question_id: resolution.question_id.clone(),
            correct: resolution.correct,
            timed_out: resolution.timed_out,
            energy: resolution.energy,
        });

        if let Some(outcome) = resolution.outcome {
            self.finished(live, outcome).await?;
        }
        self.write(&render_resolution(&resolution, question)).await?;
        let plan = plan_resolution(&resolution, &self.config.timing.cue_timing());
        self.play_cues(live, &plan).await
    }

    /// Bookkeeping for a terminal outcome: events, metrics, and the
    /// completion record on a win.
    async fn finished(&mut self, live: &Live, outcome: Outcome) -> Result<(), StudyHelperError> {
        self.phase_entered(live, outcome.into());
        metrics::record_session(outcome);

        let state = live.engine.state();
        let stats = state.stats();
        self.events.emit(Event::SessionEnded {
            timestamp: Utc::now(),
            session: live.session,
            outcome,
            normal_correct: stats.normal_correct,
            boss_correct: stats.boss_correct,
            energy: state.energy(),
        });

        if outcome != Outcome::Won {
            return Ok(());
        }
        let key = &live.engine.bank().key;
        match report_win(self.store.as_ref(), key, state).await {
            Ok(record) => {
                self.events.emit(Event::CompletionRecorded {
                    timestamp: Utc::now(),
                    session: live.session,
                    lesson: key.storage_key(),
                    correct: record.correct,
                });
                Ok(())
            }
            Err(e) => {
                warn!(lesson = %key, error = %e, "completion record not saved");
                self.write("(progress could not be saved)\n").await
            }
        }
    }

    async fn play_cues(&mut self, live: &mut Live, plan: &[CueStep]) -> Result<(), StudyHelperError> {
        for step in plan {
            sleep(step.after).await;
            debug!(cue = ?step.cue, "cue");
            match step.cue {
                Cue::Effect(effect) => self.audio.play_effect(effect),
                Cue::Music(track) => self.audio.play_music(track),
                Cue::AttackStart(attacker) => {
                    live.flags.attacking = Some(attacker);
                    self.write(attack_line(attacker)).await?;
                }
                Cue::AttackEnd => live.flags.attacking = None,
                Cue::ShowResult(_) => {
                    let scene = Scene::derive(&live.engine, live.flags);
                    self.write(&render_scene(&scene)).await?;
                }
            }
        }
        Ok(())
    }

    fn phase_entered(&self, live: &Live, phase: Phase) {
        metrics::record_phase(phase);
        self.events.emit(Event::PhaseEntered {
            timestamp: Utc::now(),
            session: live.session,
            phase,
        });
    }

    async fn write(&mut self, text: &str) -> Result<(), StudyHelperError> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.flush().await?;
        Ok(())
    }
}

/// Screen the next input line is meant for.
fn prompt_for(engine: &PhaseEngine) -> Prompt<'_> {
    if let Some(outcome) = engine.state().outcome() {
        return Prompt::Finished(outcome);
    }
    match engine.current_question() {
        Some(question) if !engine.state().answered_current() => Prompt::Question(&question.kind),
        _ => Prompt::Scored,
    }
}

const fn attack_line(attacker: Attacker) -> &'static str {
    match attacker {
        Attacker::Player => "You strike the boss!\n",
        Attacker::Boss => "The boss strikes back!\n",
    }
}

async fn sleep(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// Forwards input lines over a channel; the channel closes at end of input.
fn spawn_reader<R>(input: R) -> mpsc::UnboundedReceiver<String>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = input.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "input read failed");
                    break;
                }
            }
        }
    });
    rx
}
