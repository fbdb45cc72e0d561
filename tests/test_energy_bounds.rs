//! Property checks on energy accounting over arbitrary answer sequences.

mod common;

use proptest::prelude::*;

use studyhelper::lesson::Answer;
use studyhelper::phase::{Advance, Outcome, Phase, Submission};

use common::{bank, choice, engine, true_false};

/// Plays every question, answering correctly where `normal`/`boss` say so.
/// Returns energy after each answer, the energy cap, and the outcome.
fn play(normal: &[bool], boss: &[bool]) -> (Vec<u32>, u32, Option<Outcome>) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap();

    runtime.block_on(async {
        let normal_qs = (0..normal.len())
            .map(|i| true_false(&format!("n{i}"), true))
            .collect();
        let boss_qs = (0..boss.len())
            .map(|i| choice(&format!("b{i}"), 0))
            .collect();
        let (mut engine, _timer) = engine(bank(normal_qs, boss_qs), 30);
        let cap = engine.state().energy_max();
        let mut energies = Vec::new();

        for &correct in normal {
            engine.present_question().unwrap();
            let Submission::Resolved(r) = engine.submit(&Answer::Bool(correct)).unwrap() else {
                panic!("normal answer not scored");
            };
            energies.push(r.energy);
            if let Advance::Finished(_) = engine.advance().unwrap() {
                return (energies, cap, engine.state().outcome());
            }
        }

        for &correct in boss {
            engine.present_question().unwrap();
            let pick = if correct { 0 } else { 1 };
            let Submission::Resolved(r) = engine.submit(&Answer::Choice(pick)).unwrap() else {
                panic!("boss answer not scored");
            };
            energies.push(r.energy);
            if r.outcome.is_some() {
                break;
            }
            if let Advance::Finished(_) = engine.advance().unwrap() {
                break;
            }
        }
        assert!(engine.state().phase().is_terminal() || boss.is_empty());
        (energies, cap, engine.state().outcome())
    })
}

proptest! {
    #[test]
    fn energy_stays_within_bounds(
        normal in prop::collection::vec(any::<bool>(), 1..8),
        boss in prop::collection::vec(any::<bool>(), 0..8),
    ) {
        let (energies, cap, outcome) = play(&normal, &boss);
        prop_assert!(energies.iter().all(|&e| e <= cap));

        let earned = u32::try_from(normal.iter().filter(|&&c| c).count()).unwrap();
        prop_assert_eq!(energies[normal.len() - 1], earned);

        let outcome = outcome.expect("session ends");
        let last = *energies.last().unwrap();
        match outcome {
            Outcome::Won => prop_assert!(last > 0),
            Outcome::Lost => prop_assert_eq!(last, 0),
        }
    }

    #[test]
    fn boss_answers_never_raise_energy(
        boss in prop::collection::vec(any::<bool>(), 1..8),
    ) {
        let normal = vec![true; 3];
        let (energies, _, _) = play(&normal, &boss);
        for pair in energies[normal.len() - 1..].windows(2) {
            prop_assert!(pair[1] <= pair[0]);
        }
    }
}

#[test]
fn lost_sessions_report_lost_phase() {
    let (energies, _, outcome) = play(&[false, false], &[true, true]);
    assert_eq!(energies, vec![0, 0, 0]);
    assert_eq!(outcome, Some(Outcome::Lost));
    assert_eq!(Phase::from(Outcome::Lost), Phase::Lost);
}
