//! Plain-text rendering
//!
//! Turns [`Scene`]s and feedback into the text the `play` command writes
//! to the terminal. Rendering is pure; the session runner decides when to
//! write.

use std::fmt::Write as _;

use crate::lesson::Question;
use crate::phase::{Outcome, Resolution, Urgency};

use super::scene::{CountdownView, QuestionView, ResultSummary, Scene, Sprites};

const BAR_WIDTH: usize = 20;

/// Renders a full frame: HUD, stage, countdown, and question panel.
#[must_use]
pub fn render_scene(scene: &Scene) -> String {
    let mut out = String::new();
    let hud = &scene.hud;
    let _ = writeln!(out, "[{}] {} | {}", hud.badge, hud.title, hud.subtitle);
    let _ = writeln!(
        out,
        "Energy {}/{} {} {}%",
        hud.energy,
        hud.energy_max,
        bar(u64::from(hud.energy_percent), 100),
        hud.energy_percent
    );

    let stage = render_sprites(scene.sprites);
    if !stage.is_empty() {
        let _ = writeln!(out, "{stage}");
    }
    if let Some(countdown) = &scene.countdown {
        let _ = writeln!(out, "{}", render_countdown(countdown));
    }
    if let Some(question) = &scene.question {
        out.push_str(&render_question(question));
    }
    if let Some(result) = &scene.result {
        out.push_str(&render_result(result));
    }
    out
}

fn render_sprites(sprites: Sprites) -> String {
    let mut parts = Vec::new();
    if sprites.boss {
        parts.push("(BOSS)");
    } else if sprites.versus {
        parts.push("  **  ");
    }
    if sprites.versus {
        parts.push("VS");
    }
    if sprites.player {
        parts.push("(YOU)");
    } else if sprites.versus {
        parts.push("  **  ");
    }
    if sprites.enemy {
        parts.push("(ENEMY)");
    }
    parts.join("  ")
}

/// Countdown line: number, urgency marker, and a ring-style bar.
#[must_use]
pub fn render_countdown(countdown: &CountdownView) -> String {
    let marker = match countdown.urgency {
        Urgency::Calm => "",
        Urgency::Warning => " !",
        Urgency::Critical => " !!",
    };
    let left = ((1.0 - countdown.fraction_elapsed) * 100.0).round();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let left = left.clamp(0.0, 100.0) as u64;
    format!("Time {:>2}{marker} {}", countdown.remaining, bar(left, 100))
}

/// Question panel with numbered choices and an input hint.
#[must_use]
pub fn render_question(view: &QuestionView) -> String {
    let mut out = String::new();
    let tag = if view.boss { "BOSS " } else { "" };
    let _ = writeln!(out, "{tag}{}: {}", view.label, view.prompt);
    for (i, choice) in view.choices.iter().enumerate() {
        let _ = writeln!(out, "  {}) {choice}", i + 1);
    }
    if !view.locked {
        let hint = if view.choices.is_empty() {
            "type your answer".to_owned()
        } else {
            format!("answer 1-{}", view.choices.len())
        };
        let _ = writeln!(out, "> {hint}");
    }
    out
}

/// Verdict line plus explanation.
#[must_use]
pub fn render_resolution(resolution: &Resolution, question: Option<&Question>) -> String {
    let verdict = match (resolution.correct, resolution.timed_out) {
        (_, true) => "Time's up!",
        (true, false) => "Correct!",
        (false, false) => "Wrong!",
    };
    let explanation = question.map_or("", |q| q.explanation_or_default(resolution.correct));
    let mut out = if explanation.is_empty() || explanation == verdict {
        format!("{verdict}\n")
    } else {
        format!("{verdict} {explanation}\n")
    };
    if let Some(next) = resolution.next {
        let _ = writeln!(out, "[enter] {}", next.label());
    }
    out
}

/// Result screen with per-phase tallies and the available actions.
#[must_use]
pub fn render_result(result: &ResultSummary) -> String {
    let mut out = String::new();
    let heading = match result.outcome {
        Outcome::Won => "VICTORY! The boss is defeated.",
        Outcome::Lost => "DEFEAT. You ran out of energy.",
    };
    let _ = writeln!(out, "{heading}");
    let _ = writeln!(
        out,
        "  Normal: {}/{} correct",
        result.normal_correct, result.normal_total
    );
    let _ = writeln!(
        out,
        "  Boss:   {}/{} correct",
        result.boss_correct, result.boss_total
    );
    let _ = writeln!(out, "  Energy: {}/{}", result.energy, result.energy_max);
    let actions = match result.outcome {
        Outcome::Won => "[c] complete  [r] retry  [q] quit",
        Outcome::Lost => "[r] retry  [q] quit",
    };
    let _ = writeln!(out, "{actions}");
    out
}

/// Error screen shown when a session cannot start.
#[must_use]
pub fn render_error_screen(message: &str) -> String {
    format!("Cannot start the game: {message}\n")
}

fn bar(filled: u64, total: u64) -> String {
    let width = BAR_WIDTH as u64;
    let cells = if total == 0 {
        0
    } else {
        (filled.min(total) * width + total / 2) / total
    };
    let cells = usize::try_from(cells).unwrap_or(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(cells), ".".repeat(BAR_WIDTH - cells))
}
