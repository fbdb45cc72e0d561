//! Shared integration-test helpers: question builders, engine setup, and
//! a harness for running the `studyhelper` binary against the fixtures.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::Duration;

use tokio::sync::mpsc;

use studyhelper::lesson::{ClassId, LessonKey, Question, QuestionBank, QuestionKind, SubjectId};
use studyhelper::phase::{EngineSettings, PhaseEngine, TimerEvent};

// ============================================================================
// Questions
// ============================================================================

/// Key used by engine-level tests.
pub fn lesson_key() -> LessonKey {
    LessonKey::new(ClassId::Class10, SubjectId::Math, "l1").expect("valid key")
}

/// True/false question with the given correct value.
pub fn true_false(id: &str, correct: bool) -> Question {
    Question {
        id: id.to_owned(),
        prompt: format!("statement {id}"),
        kind: QuestionKind::TrueFalse { correct },
        explanation: None,
    }
}

/// Three-option question whose correct option is `correct`.
pub fn choice(id: &str, correct: usize) -> Question {
    Question {
        id: id.to_owned(),
        prompt: format!("pick for {id}"),
        kind: QuestionKind::SingleChoice {
            options: vec!["a".to_owned(), "b".to_owned(), "c".to_owned()],
            correct,
        },
        explanation: Some(format!("option {correct} is right")),
    }
}

/// Bank keeping the given question order.
pub fn bank(normal: Vec<Question>, boss: Vec<Question>) -> QuestionBank {
    QuestionBank::from_questions(lesson_key(), normal, boss)
}

// ============================================================================
// Engine
// ============================================================================

/// Engine with a short countdown, plus the receiving end of its timer channel.
pub fn engine(
    bank: QuestionBank,
    units: u32,
) -> (PhaseEngine, mpsc::UnboundedReceiver<TimerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let settings = EngineSettings {
        countdown_units: units,
        tick: Duration::from_secs(1),
        warn_at: 3,
        critical_at: 1,
    };
    (PhaseEngine::new(bank, settings, tx), rx)
}

// ============================================================================
// Binary harness
// ============================================================================

/// The `tests/fixtures` directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Path to a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Runs `studyhelper` with the fixture configuration, storing completions
/// at `store`, feeding `stdin` and waiting for it to exit.
#[allow(clippy::missing_panics_doc)]
pub fn run_cli(args: &[&str], stdin: &str, store: &Path) -> Output {
    let bin = env!("CARGO_BIN_EXE_studyhelper");
    let mut child = Command::new(bin)
        .arg("--config")
        .arg(fixture_path("config.yaml"))
        .args(args)
        .env("STUDYHELPER_TEST_DATA", fixtures_dir())
        .env("STUDYHELPER_TEST_STORE", store)
        .env("NO_COLOR", "1")
        .env_remove("STUDYHELPER_LOG_LEVEL")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn studyhelper");

    {
        let mut pipe = child.stdin.take().expect("stdin not captured");
        pipe.write_all(stdin.as_bytes())
            .expect("failed to write to stdin");
    }

    child.wait_with_output().expect("failed to wait for studyhelper")
}

/// Runs a command that reads no input and needs no store.
#[allow(clippy::missing_panics_doc)]
pub fn run_command(args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_studyhelper");
    Command::new(bin)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("failed to run studyhelper")
}
