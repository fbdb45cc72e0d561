//! Structured session event stream
//!
//! Discrete, typed events written as JSON lines. Each line carries a
//! sequence number so consumers can detect gaps and reorder. Enabled with
//! `--events <path>`; otherwise events go to a sink.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::lesson::SetKind;
use crate::phase::{Outcome, Phase};

// ============================================================================
// Event variants
// ============================================================================

/// Something that happened during a game session.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A session began.
    SessionStarted {
        /// When it began
        timestamp: DateTime<Utc>,
        /// Session id
        session: Uuid,
        /// Lesson storage key
        lesson: String,
        /// Playable normal questions
        normal_total: usize,
        /// Playable boss questions
        boss_total: usize,
        /// Starting energy
        energy_max: u32,
    },

    /// A question was put on screen.
    QuestionPresented {
        /// When it was shown
        timestamp: DateTime<Utc>,
        /// Session id
        session: Uuid,
        /// Set the question belongs to
        set: SetKind,
        /// Zero-based position in the set
        index: usize,
        /// Question id
        question_id: String,
    },

    /// An answer was scored.
    AnswerResolved {
        /// When it was scored
        timestamp: DateTime<Utc>,
        /// Session id
        session: Uuid,
        /// Set the question belongs to
        set: SetKind,
        /// Question id
        question_id: String,
        /// Whether it was correct
        correct: bool,
        /// Whether the countdown produced it
        timed_out: bool,
        /// Energy afterwards
        energy: u32,
    },

    /// A boss countdown ran out on an open question.
    CountdownExpired {
        /// When it expired
        timestamp: DateTime<Utc>,
        /// Session id
        session: Uuid,
        /// Question id
        question_id: String,
    },

    /// The session moved to another phase.
    PhaseEntered {
        /// When it moved
        timestamp: DateTime<Utc>,
        /// Session id
        session: Uuid,
        /// Phase entered
        phase: Phase,
    },

    /// The session reached a terminal outcome.
    SessionEnded {
        /// When it ended
        timestamp: DateTime<Utc>,
        /// Session id
        session: Uuid,
        /// Won or lost
        outcome: Outcome,
        /// Correct normal answers
        normal_correct: u32,
        /// Correct boss answers
        boss_correct: u32,
        /// Final energy
        energy: u32,
    },

    /// A win was written to the completion store.
    CompletionRecorded {
        /// When it was written
        timestamp: DateTime<Utc>,
        /// Session id
        session: Uuid,
        /// Completion store key
        lesson: String,
        /// Total correct answers stored
        correct: u32,
    },
}

impl Event {
    /// Variant name, as written in the `type` field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "SessionStarted",
            Self::QuestionPresented { .. } => "QuestionPresented",
            Self::AnswerResolved { .. } => "AnswerResolved",
            Self::CountdownExpired { .. } => "CountdownExpired",
            Self::PhaseEntered { .. } => "PhaseEntered",
            Self::SessionEnded { .. } => "SessionEnded",
            Self::CompletionRecorded { .. } => "CompletionRecorded",
        }
    }
}

#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

// ============================================================================
// Emitter
// ============================================================================

/// Thread-safe JSONL event writer.
///
/// Serialization and I/O failures are dropped; a broken event file never
/// interrupts a game.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Emitter writing to `writer`.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Emitter that discards everything.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Emitter appending to the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Writes `event` as one line and flushes.
    pub fn emit(&self, event: Event) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope { sequence, event };

        if let Ok(mut w) = self.writer.lock()
            && let Ok(line) = serde_json::to_string(&envelope)
        {
            let _ = writeln!(w, "{line}");
            let _ = w.flush();
        }
    }

    /// Number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;

    #[derive(Clone)]
    struct Capture(Arc<StdMutex<Vec<u8>>>);

    impl Capture {
        fn new() -> Self {
            Self(Arc::new(StdMutex::new(Vec::new())))
        }

        fn lines(&self) -> Vec<serde_json::Value> {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf)
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn ended(session: Uuid) -> Event {
        Event::SessionEnded {
            timestamp: Utc::now(),
            session,
            outcome: Outcome::Won,
            normal_correct: 2,
            boss_correct: 1,
            energy: 2,
        }
    }

    #[test]
    fn lines_are_tagged_and_sequenced() {
        let capture = Capture::new();
        let emitter = EventEmitter::new(Box::new(capture.clone()));
        let session = Uuid::new_v4();
        emitter.emit(Event::PhaseEntered {
            timestamp: Utc::now(),
            session,
            phase: Phase::Boss,
        });
        emitter.emit(ended(session));

        let lines = capture.lines();
        assert_eq!(emitter.event_count(), 2);
        assert_eq!(lines[0]["sequence"], 0);
        assert_eq!(lines[0]["type"], "PhaseEntered");
        assert_eq!(lines[0]["phase"], "boss");
        assert_eq!(lines[1]["sequence"], 1);
        assert_eq!(lines[1]["type"], "SessionEnded");
        assert_eq!(lines[1]["outcome"], "won");
        assert_eq!(lines[1]["session"], session.to_string());
        assert!(lines[1].get("event").is_none());
    }

    #[test]
    fn kind_matches_type_tag() {
        let event = Event::AnswerResolved {
            timestamp: Utc::now(),
            session: Uuid::new_v4(),
            set: SetKind::Boss,
            question_id: "boss-1".to_owned(),
            correct: false,
            timed_out: true,
            energy: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.kind());
        assert_eq!(json["set"], "boss");
    }

    #[test]
    fn file_emitter_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        {
            let emitter = EventEmitter::from_file(&path).unwrap();
            emitter.emit(ended(Uuid::new_v4()));
        }
        {
            let emitter = EventEmitter::from_file(&path).unwrap();
            emitter.emit(ended(Uuid::new_v4()));
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn noop_counts_but_discards() {
        let emitter = EventEmitter::noop();
        emitter.emit(ended(Uuid::new_v4()));
        assert_eq!(emitter.event_count(), 1);
    }
}
