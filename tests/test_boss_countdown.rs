//! Boss countdown behavior under paused time: ticks, expiry as a wrong
//! answer, cancellation on answer, and stale events from earlier
//! questions.

mod common;

use std::time::Duration;

use studyhelper::lesson::Answer;
use studyhelper::phase::{
    Advance, Outcome, PhaseEngine, Submission, TimerEvent, TimerUpdate, Urgency,
};
use tokio::sync::mpsc::UnboundedReceiver;

use common::{bank, choice, engine, true_false};

/// Engine already in the boss phase with `energy` points banked.
fn boss_engine(energy: usize, boss: usize, units: u32) -> (PhaseEngine, UnboundedReceiver<TimerEvent>) {
    let normal = (0..energy.max(1))
        .map(|i| true_false(&format!("n{i}"), true))
        .collect();
    let boss = (0..boss).map(|i| choice(&format!("b{i}"), 0)).collect();
    let (mut engine, rx) = engine(bank(normal, boss), units);
    for i in 0..energy.max(1) {
        engine.present_question().unwrap();
        engine.submit(&Answer::Bool(i < energy)).unwrap();
        let _ = engine.advance().unwrap();
    }
    assert_eq!(engine.state().energy() as usize, energy);
    (engine, rx)
}

#[tokio::test(start_paused = true)]
async fn ticks_count_down_and_escalate() {
    let (mut engine, mut rx) = boss_engine(2, 1, 5);
    engine.present_question().unwrap();
    assert_eq!(engine.state().boss_seconds_remaining(), 5);
    assert_eq!(engine.urgency(), Urgency::Calm);

    let mut seen = Vec::new();
    for _ in 0..4 {
        let event = rx.recv().await.unwrap();
        match engine.handle_timer(event) {
            Some(TimerUpdate::Tick {
                remaining, urgency, ..
            }) => seen.push((remaining, urgency)),
            other => panic!("expected a tick, got {other:?}"),
        }
    }
    assert_eq!(
        seen,
        vec![
            (4, Urgency::Calm),
            (3, Urgency::Warning),
            (2, Urgency::Warning),
            (1, Urgency::Critical),
        ]
    );
    assert!((engine.fraction_elapsed() - 0.8).abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn expiry_counts_as_a_wrong_answer() {
    let (mut engine, mut rx) = boss_engine(2, 2, 3);
    engine.present_question().unwrap();

    let resolution = loop {
        let event = rx.recv().await.unwrap();
        if let Some(TimerUpdate::Expired(resolution)) = engine.handle_timer(event) {
            break resolution;
        }
    };
    assert!(resolution.timed_out);
    assert!(!resolution.correct);
    assert_eq!(resolution.energy, 1);
    assert!(engine.state().answered_current());
    assert!(engine.active_countdown().is_none());

    // a late manual answer is ignored
    assert_eq!(engine.submit(&Answer::Choice(0)).unwrap(), Submission::Ignored);
    assert_eq!(engine.state().energy(), 1);
    assert_eq!(engine.advance().unwrap(), Advance::NextBoss);
}

#[tokio::test(start_paused = true)]
async fn expiry_with_last_energy_loses() {
    let (mut engine, mut rx) = boss_engine(1, 2, 2);
    engine.present_question().unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    let mut outcome = None;
    while let Ok(event) = rx.try_recv() {
        if let Some(TimerUpdate::Expired(resolution)) = engine.handle_timer(event) {
            outcome = resolution.outcome;
        }
    }
    assert_eq!(outcome, Some(Outcome::Lost));
    assert!(engine.state().phase().is_terminal());
}

#[tokio::test(start_paused = true)]
async fn answering_stops_the_countdown() {
    let (mut engine, mut rx) = boss_engine(2, 2, 3);
    engine.present_question().unwrap();
    engine.submit(&Answer::Choice(0)).unwrap();

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(rx.try_recv().is_err(), "no events after the answer");
    assert_eq!(engine.state().energy(), 2);
}

#[tokio::test(start_paused = true)]
async fn events_from_a_previous_question_are_stale() {
    let (mut engine, mut rx) = boss_engine(2, 2, 5);
    engine.present_question().unwrap();
    let first = engine.active_countdown().unwrap();

    let tick = rx.recv().await.unwrap();
    assert_eq!(tick.id(), first);
    engine.submit(&Answer::Choice(0)).unwrap();
    engine.advance().unwrap();
    engine.present_question().unwrap();
    let second = engine.active_countdown().unwrap();
    assert_ne!(first, second);

    let before = engine.state().boss_seconds_remaining();
    assert!(engine.handle_timer(tick).is_none());
    assert!(engine.handle_timer(TimerEvent::Expired { id: first }).is_none());
    assert_eq!(engine.state().boss_seconds_remaining(), before);
    assert!(!engine.state().answered_current());
}
