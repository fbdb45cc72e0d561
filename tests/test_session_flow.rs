//! End-to-end session flows through the phase engine: scoring, the
//! normal-to-boss transition, both outcomes, and completion reporting.

mod common;

use studyhelper::completion::{CompletionStore, MemoryStore, report_win};
use studyhelper::error::{CompletionError, PhaseError};
use studyhelper::lesson::Answer;
use studyhelper::phase::{
    Advance, Attacker, NextAffordance, Outcome, Phase, PhaseEngine, Resolution, Submission,
};

use common::{bank, choice, engine, lesson_key, true_false};

fn answer(engine: &mut PhaseEngine, answer: Answer) -> Resolution {
    match engine.submit(&answer).unwrap() {
        Submission::Resolved(resolution) => resolution,
        other => panic!("expected a resolution, got {other:?}"),
    }
}

// ============================================================================
// Winning
// ============================================================================

#[tokio::test]
async fn perfect_run_wins_and_is_recorded() {
    let (mut engine, _timer) = engine(
        bank(
            vec![true_false("n1", true), true_false("n2", false)],
            vec![choice("b1", 2)],
        ),
        60,
    );

    engine.present_question().unwrap();
    let first = answer(&mut engine, Answer::Bool(true));
    assert!(first.correct);
    assert_eq!(first.energy, 1);
    assert_eq!(first.next, Some(NextAffordance::NextQuestion));
    assert_eq!(engine.advance().unwrap(), Advance::NextNormal);

    engine.present_question().unwrap();
    let second = answer(&mut engine, Answer::Bool(false));
    assert_eq!(second.energy, 2);
    assert_eq!(second.next, Some(NextAffordance::FaceBoss));
    assert_eq!(engine.advance().unwrap(), Advance::BossEntered);
    assert_eq!(engine.state().phase(), Phase::Boss);

    engine.present_question().unwrap();
    assert!(engine.active_countdown().is_some());
    let boss = answer(&mut engine, Answer::Choice(2));
    assert_eq!(boss.attacker, Some(Attacker::Player));
    assert_eq!(boss.energy, 2);
    assert_eq!(boss.next, Some(NextAffordance::SeeResults));
    assert!(engine.active_countdown().is_none());

    assert_eq!(engine.advance().unwrap(), Advance::Finished(Outcome::Won));
    assert_eq!(engine.state().outcome(), Some(Outcome::Won));
    assert_eq!(engine.state().stats().total_correct(), 3);

    let store = MemoryStore::new();
    let record = report_win(&store, &lesson_key(), engine.state()).await.unwrap();
    assert_eq!(record.correct, 3);
    assert!(store.is_done(&lesson_key()).await.unwrap());
}

#[tokio::test]
async fn boss_mistakes_cost_energy_but_can_still_win() {
    let (mut engine, _timer) = engine(
        bank(
            vec![true_false("n1", true), true_false("n2", true)],
            vec![choice("b1", 0), choice("b2", 1)],
        ),
        60,
    );
    for _ in 0..2 {
        engine.present_question().unwrap();
        answer(&mut engine, Answer::Bool(true));
        engine.advance().unwrap();
    }
    assert_eq!(engine.state().energy(), 2);

    engine.present_question().unwrap();
    let wrong = answer(&mut engine, Answer::Choice(2));
    assert_eq!(wrong.attacker, Some(Attacker::Boss));
    assert_eq!(wrong.energy, 1);
    assert_eq!(wrong.outcome, None);
    assert_eq!(engine.advance().unwrap(), Advance::NextBoss);

    engine.present_question().unwrap();
    answer(&mut engine, Answer::Choice(1));
    assert_eq!(engine.advance().unwrap(), Advance::Finished(Outcome::Won));
    assert_eq!(engine.state().energy(), 1);
}

// ============================================================================
// Losing
// ============================================================================

#[tokio::test]
async fn running_out_of_energy_loses_immediately() {
    let (mut engine, _timer) = engine(
        bank(
            vec![true_false("n1", true), true_false("n2", true)],
            vec![choice("b1", 0), choice("b2", 0), choice("b3", 0)],
        ),
        60,
    );
    engine.present_question().unwrap();
    answer(&mut engine, Answer::Bool(true));
    engine.advance().unwrap();
    engine.present_question().unwrap();
    answer(&mut engine, Answer::Bool(false));
    assert_eq!(engine.advance().unwrap(), Advance::BossEntered);
    assert_eq!(engine.state().energy(), 1);

    engine.present_question().unwrap();
    let fatal = answer(&mut engine, Answer::Choice(1));
    assert_eq!(fatal.outcome, Some(Outcome::Lost));
    assert_eq!(fatal.next, None);
    assert_eq!(engine.state().phase(), Phase::Lost);
    assert!(engine.current_question().is_none());

    // the remaining boss questions are never reached
    assert!(matches!(engine.advance(), Err(PhaseError::Terminal { .. })));
    assert!(matches!(
        engine.present_question(),
        Err(PhaseError::Terminal { .. })
    ));

    let store = MemoryStore::new();
    let err = report_win(&store, &lesson_key(), engine.state()).await.unwrap_err();
    assert!(matches!(err, CompletionError::NotWon { .. }));
    assert!(store.load_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn entering_the_boss_with_no_energy_loses_on_first_answer() {
    let (mut engine, _timer) = engine(
        bank(vec![true_false("n1", true)], vec![choice("b1", 0)]),
        60,
    );
    engine.present_question().unwrap();
    answer(&mut engine, Answer::Bool(false));
    assert_eq!(engine.advance().unwrap(), Advance::BossEntered);
    assert_eq!(engine.state().energy(), 0);

    engine.present_question().unwrap();
    let resolution = answer(&mut engine, Answer::Choice(0));
    assert!(resolution.correct);
    assert_eq!(resolution.outcome, Some(Outcome::Lost));
}

// ============================================================================
// Edge cases
// ============================================================================

#[tokio::test]
async fn empty_boss_set_ends_when_normal_phase_does() {
    let (mut engine, _timer) = engine(bank(vec![true_false("n1", true)], Vec::new()), 60);
    engine.present_question().unwrap();
    answer(&mut engine, Answer::Bool(true));
    assert_eq!(engine.advance().unwrap(), Advance::Finished(Outcome::Won));
    assert_eq!(engine.state().phase(), Phase::Won);
}

#[tokio::test]
async fn empty_normal_set_starts_with_the_boss() {
    let (mut engine, _timer) = engine(bank(Vec::new(), vec![choice("b1", 0)]), 60);
    assert!(matches!(
        engine.present_question(),
        Err(PhaseError::NoQuestion)
    ));
    assert_eq!(engine.advance().unwrap(), Advance::BossEntered);
    engine.present_question().unwrap();
    let resolution = answer(&mut engine, Answer::Choice(0));
    assert_eq!(resolution.outcome, Some(Outcome::Lost));
}

#[tokio::test]
async fn second_submission_and_rejected_answers_change_nothing() {
    let (mut engine, _timer) = engine(bank(vec![true_false("n1", true)], Vec::new()), 60);
    engine.present_question().unwrap();

    let rejected = engine.submit(&Answer::Choice(0)).unwrap();
    assert!(matches!(rejected, Submission::Rejected(_)));
    assert_eq!(engine.state().energy(), 0);
    assert!(!engine.state().answered_current());

    answer(&mut engine, Answer::Bool(true));
    assert_eq!(
        engine.submit(&Answer::Bool(false)).unwrap(),
        Submission::Ignored
    );
    assert_eq!(engine.state().energy(), 1);
    assert_eq!(engine.state().stats().normal_wrong, 0);
}

#[tokio::test]
async fn advancing_an_open_question_is_refused() {
    let (mut engine, _timer) = engine(bank(vec![true_false("n1", true)], Vec::new()), 60);
    engine.present_question().unwrap();
    assert_eq!(engine.advance(), Err(PhaseError::NotAnswered));
    assert_eq!(engine.state().normal_index(), 0);
}

#[tokio::test]
async fn retry_starts_over_with_the_same_questions() {
    let (mut engine, _timer) = engine(bank(vec![true_false("n1", true)], Vec::new()), 60);
    assert_eq!(
        engine.retry(&mut rand::rng()).unwrap_err(),
        PhaseError::NotFinished
    );

    engine.present_question().unwrap();
    answer(&mut engine, Answer::Bool(false));
    assert_eq!(engine.advance().unwrap(), Advance::Finished(Outcome::Lost));

    let fresh = engine.retry(&mut rand::rng()).unwrap();
    assert_eq!(fresh.state().phase(), Phase::Normal);
    assert_eq!(fresh.state().energy(), 0);
    assert_eq!(fresh.bank().normal.len(), 1);
}
