//! Session metrics
//!
//! Counters and gauges on the `metrics` facade, exported in Prometheus
//! format when a recorder is installed. Every label value comes from a
//! closed enum, so label cardinality is fixed.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::StudyHelperError;
use crate::lesson::SetKind;
use crate::phase::{Outcome, Phase};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Installs the global Prometheus recorder.
///
/// With `port`, metrics are served on `127.0.0.1:<port>`; without, they
/// are recorded in-process only. A second call does nothing.
///
/// # Errors
///
/// Returns `StudyHelperError::Io` if the recorder or listener cannot be
/// installed.
pub fn init_metrics(port: Option<u16>) -> Result<(), StudyHelperError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| StudyHelperError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "studyhelper_answers_total",
        "Answers scored, by set and result"
    );
    describe_counter!(
        "studyhelper_timeouts_total",
        "Boss questions lost to the countdown"
    );
    describe_counter!(
        "studyhelper_sessions_total",
        "Sessions finished, by outcome"
    );
    describe_counter!(
        "studyhelper_phase_transitions_total",
        "Phase changes, by phase entered"
    );
    describe_gauge!("studyhelper_energy", "Energy of the running session");
}

/// Records a scored answer.
pub fn record_answer(set: SetKind, correct: bool, timed_out: bool) {
    let result = if correct { "correct" } else { "wrong" };
    counter!("studyhelper_answers_total", "phase" => set.as_str(), "result" => result).increment(1);
    if timed_out {
        counter!("studyhelper_timeouts_total").increment(1);
    }
}

/// Records a phase change.
pub fn record_phase(phase: Phase) {
    counter!("studyhelper_phase_transitions_total", "phase" => phase.as_str()).increment(1);
}

/// Records a finished session.
pub fn record_session(outcome: Outcome) {
    counter!("studyhelper_sessions_total", "outcome" => outcome.as_str()).increment(1);
}

/// Sets the energy gauge.
pub fn set_energy(energy: u32) {
    gauge!("studyhelper_energy").set(f64::from(energy));
}
