//! End-to-end tests of the `studyhelper` binary against the fixture data.

mod common;

use common::{run_cli, run_command};
use studyhelper::error::ExitCode;

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ============================================================================
// version / completions
// ============================================================================

#[test]
fn version_human() {
    let output = run_command(&["version"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("studyhelper "), "{out}");
    assert!(out.contains('.'), "{out}");
}

#[test]
fn version_json() {
    let output = run_command(&["version", "--format", "json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("version JSON should be valid");
    assert_eq!(parsed["name"], "studyhelper");
    assert!(parsed.get("version").is_some());
}

#[test]
fn completions_bash() {
    let output = run_command(&["completions", "bash"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("studyhelper"));
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    let output = run_command(&["fight"]);
    assert!(!output.status.success());
}

// ============================================================================
// validate
// ============================================================================

#[test]
fn validate_single_lesson() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("done.json");
    let output = run_cli(
        &["validate", "--class", "class10", "--subject", "math", "--lesson", "mixed"],
        "",
        &store,
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(
        out.contains("\"Mixed review\": 3 normal, 2 boss, 4 dropped"),
        "{out}"
    );
    assert!(out.contains("[normal q4]"), "{out}");
}

#[test]
fn validate_all_reports_every_lesson_and_fails_on_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("done.json");
    let output = run_cli(&["validate", "--all", "--format", "json"], "", &store);
    assert_eq!(output.status.code(), Some(ExitCode::LOAD_ERROR));

    let reports: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 4);
    let failed: Vec<&str> = reports
        .iter()
        .filter(|r| !r["error"].is_null())
        .map(|r| r["lesson"].as_str().unwrap())
        .collect();
    assert_eq!(failed, vec!["class10 / math / empty"]);
}

#[test]
fn validate_unknown_class_suggests() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("done.json");
    let output = run_cli(
        &["validate", "--class", "class1O", "--subject", "math", "--lesson", "l1"],
        "",
        &store,
    );
    assert_eq!(output.status.code(), Some(ExitCode::LOAD_ERROR));
    assert!(stderr(&output).contains("did you mean 'class10'"), "{}", stderr(&output));
}

// ============================================================================
// play / progress
// ============================================================================

#[test]
fn play_win_is_recorded_and_listed() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("done.json");
    let output = run_cli(
        &[
            "play", "--class", "class10", "--subject", "math", "--lesson", "l1", "--json",
        ],
        "t\n\n2\n\nc\n",
        &store,
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("Comparing numbers"), "{out}");
    assert!(out.contains("The boss appears!"), "{out}");
    assert!(out.contains("VICTORY"), "{out}");
    let message: serde_json::Value =
        serde_json::from_str(out.lines().last().unwrap()).expect("last line is the signal");
    assert_eq!(message["type"], "SH_NAVIGATE");
    assert!(message["url"].as_str().unwrap().ends_with("done=l1"));

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store).unwrap()).unwrap();
    assert_eq!(saved["class10__math__l1"]["correct"], 2);

    let output = run_cli(&["progress", "--format", "json"], "", &store);
    assert!(output.status.success(), "{}", stderr(&output));
    let listed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(listed[0]["key"], "class10__math__l1");
    assert_eq!(listed[0]["correct"], 2);
}

#[test]
fn play_loss_records_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("done.json");
    let output = run_cli(
        &["play", "--class", "class10", "--subject", "math", "--lesson", "l1"],
        "f\n\n2\nq\n",
        &store,
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("DEFEAT"), "{}", stdout(&output));
    assert!(!store.exists());

    let output = run_cli(&["progress"], "", &store);
    assert!(stdout(&output).contains("No completed lessons."));
}

#[test]
fn play_missing_lesson_shows_error_screen() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("done.json");
    let output = run_cli(
        &["play", "--class", "class10", "--subject", "math", "--lesson", "nope"],
        "",
        &store,
    );
    assert_eq!(output.status.code(), Some(ExitCode::LOAD_ERROR));
    assert!(stdout(&output).contains("Cannot start the game"), "{}", stdout(&output));
}

#[test]
fn play_writes_event_log() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("done.json");
    let events = dir.path().join("events.jsonl");
    let output = run_cli(
        &[
            "play",
            "--class",
            "class10",
            "--subject",
            "math",
            "--lesson",
            "l1",
            "--events",
            events.to_str().unwrap(),
        ],
        "t\n\n2\n\nq\n",
        &store,
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let text = std::fs::read_to_string(&events).unwrap();
    let kinds: Vec<String> = text
        .lines()
        .map(|line| {
            let event: serde_json::Value = serde_json::from_str(line).unwrap();
            event["type"].as_str().unwrap().to_owned()
        })
        .collect();
    assert_eq!(kinds.first().map(String::as_str), Some("SessionStarted"));
    assert!(kinds.iter().any(|k| k == "AnswerResolved"));
    assert!(kinds.iter().any(|k| k == "SessionEnded"));
    assert!(kinds.iter().any(|k| k == "CompletionRecorded"));
}
