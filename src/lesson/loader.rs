//! Question bank loader
//!
//! Loading pipeline:
//! 1. Fetch the raw lesson record for the key (`DataNotFound` if absent)
//! 2. Validate each entry, dropping malformed ones with a warning
//! 3. Normalize short-answer correctness data
//! 4. Reject lessons with no playable questions (`EmptyLesson`)
//! 5. Look up the lesson title (non-fatal; falls back to the lesson id)
//! 6. Shuffle each set independently

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::error::LoadError;

use super::key::LessonKey;
use super::question::{Question, QuestionKind, QuestionSet, SetKind, normalize_text};
use super::raw::{RawLesson, RawQuestion};
use super::source::{LessonSource, TitleSource};

// ============================================================================
// Output Types
// ============================================================================

/// A malformed entry excluded at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedQuestion {
    /// Set the entry was authored in
    pub set: SetKind,
    /// One-based position in the authored array
    pub position: usize,
    /// Why the entry was dropped
    pub reason: String,
}

impl std::fmt::Display for DroppedQuestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} q{}] {}", self.set, self.position, self.reason)
    }
}

/// Summary of what validation kept and dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Entries excluded as malformed
    pub dropped: Vec<DroppedQuestion>,
}

/// Everything a session needs from a lesson.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    /// Lesson the questions belong to
    pub key: LessonKey,
    /// Human-readable title (lesson id when no title is known)
    pub title: String,
    /// Normal-phase questions, shuffled
    pub normal: QuestionSet,
    /// Boss-phase questions, shuffled
    pub boss: QuestionSet,
    /// Validation summary
    pub report: LoadReport,
}

impl QuestionBank {
    /// Builds a bank directly from question lists, keeping their order.
    #[must_use]
    pub fn from_questions(key: LessonKey, normal: Vec<Question>, boss: Vec<Question>) -> Self {
        Self {
            title: key.lesson.clone(),
            key,
            normal: QuestionSet::in_order(normal),
            boss: QuestionSet::in_order(boss),
            report: LoadReport::default(),
        }
    }

    /// Returns a copy with both sets independently reshuffled.
    #[must_use]
    pub fn reshuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        Self {
            key: self.key.clone(),
            title: self.title.clone(),
            normal: self.normal.reshuffled(rng),
            boss: self.boss.reshuffled(rng),
            report: self.report.clone(),
        }
    }
}

// ============================================================================
// Loader
// ============================================================================

/// Loads and validates lesson question banks.
#[derive(Clone)]
pub struct LessonLoader {
    lessons: Arc<dyn LessonSource>,
    titles: Arc<dyn TitleSource>,
}

impl std::fmt::Debug for LessonLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LessonLoader")
            .field("lessons", &self.lessons.name())
            .finish_non_exhaustive()
    }
}

impl LessonLoader {
    /// Creates a loader over the given sources.
    #[must_use]
    pub fn new(lessons: Arc<dyn LessonSource>, titles: Arc<dyn TitleSource>) -> Self {
        Self { lessons, titles }
    }

    /// Loads the bank for `key`, shuffling with the thread RNG.
    ///
    /// # Errors
    ///
    /// Returns `DataNotFound`, `EmptyLesson`, or `LoadFailure`.
    pub async fn load(&self, key: &LessonKey) -> Result<QuestionBank, LoadError> {
        let (raw, title) = self.fetch(key).await?;
        let mut rng = rand::rng();
        assemble(key, &raw, title, &mut rng)
    }

    /// Loads the bank for `key`, shuffling with `rng`.
    ///
    /// # Errors
    ///
    /// Returns `DataNotFound`, `EmptyLesson`, or `LoadFailure`.
    pub async fn load_with_rng<R: Rng + Send + ?Sized>(
        &self,
        key: &LessonKey,
        rng: &mut R,
    ) -> Result<QuestionBank, LoadError> {
        let (raw, title) = self.fetch(key).await?;
        assemble(key, &raw, title, rng)
    }

    async fn fetch(&self, key: &LessonKey) -> Result<(RawLesson, String), LoadError> {
        let raw = self
            .lessons
            .fetch_lesson(key)
            .await?
            .ok_or_else(|| LoadError::DataNotFound {
                key: key.to_string(),
            })?;

        let title = match self.titles.fetch_title(key).await {
            Ok(Some(title)) => title,
            Ok(None) => key.lesson.clone(),
            Err(e) => {
                warn!(error = %e, "lesson title unavailable; using lesson id");
                key.lesson.clone()
            }
        };

        Ok((raw, title))
    }
}

/// Validates, checks emptiness, and shuffles a fetched lesson.
fn assemble<R: Rng + ?Sized>(
    key: &LessonKey,
    raw: &RawLesson,
    title: String,
    rng: &mut R,
) -> Result<QuestionBank, LoadError> {
    let mut report = LoadReport::default();
    let normal = validate_set(&raw.normal, SetKind::Normal, &mut report);
    let boss = validate_set(&raw.boss, SetKind::Boss, &mut report);

    if normal.is_empty() && boss.is_empty() {
        return Err(LoadError::EmptyLesson {
            key: key.to_string(),
        });
    }

    info!(
        lesson = %key,
        normal = normal.len(),
        boss = boss.len(),
        dropped = report.dropped.len(),
        "lesson loaded"
    );

    Ok(QuestionBank {
        key: key.clone(),
        title,
        normal: QuestionSet::shuffled(normal, rng),
        boss: QuestionSet::shuffled(boss, rng),
        report,
    })
}

/// Validates every authored entry of one set, recording drops.
fn validate_set(
    entries: &[serde_json::Value],
    set: SetKind,
    report: &mut LoadReport,
) -> Vec<Question> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| match validate_question(entry, set, i) {
            Ok(q) => Some(q),
            Err(reason) => {
                warn!(set = %set, position = i + 1, %reason, "dropping malformed question");
                report.dropped.push(DroppedQuestion {
                    set,
                    position: i + 1,
                    reason,
                });
                None
            }
        })
        .collect()
}

/// Converts one authored entry into a playable question.
///
/// Returns the reason as `Err` when the entry is malformed.
pub fn validate_question(
    entry: &serde_json::Value,
    set: SetKind,
    index: usize,
) -> Result<Question, String> {
    let raw: RawQuestion =
        serde_json::from_value(entry.clone()).map_err(|e| format!("not a question object: {e}"))?;

    let Some(answer) = raw.answer.as_ref() else {
        return Err("missing answer".to_owned());
    };
    let prompt = raw.question.unwrap_or_default();

    let kind = match raw.kind.as_ref().and_then(type_tag) {
        Some(1) => single_choice(raw.options.as_deref(), answer)?,
        Some(2) => true_false(answer)?,
        Some(3) => short_answer(answer)?,
        _ => {
            let tag = raw.kind.map_or_else(|| "none".to_owned(), |v| v.to_string());
            return Err(format!("unknown question type {tag}"));
        }
    };

    let id = raw
        .id
        .as_ref()
        .and_then(scalar_text)
        .unwrap_or_else(|| format!("{set}-{}", index + 1));

    debug!(%id, kind = kind.name(), "question validated");

    Ok(Question {
        id,
        prompt,
        kind,
        explanation: raw.explanation.filter(|e| !e.trim().is_empty()),
    })
}

fn type_tag(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

fn scalar_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn single_choice(
    options: Option<&[serde_json::Value]>,
    answer: &serde_json::Value,
) -> Result<QuestionKind, String> {
    let options: Vec<String> = options
        .ok_or_else(|| "single-choice question has no options".to_owned())?
        .iter()
        .map(|o| scalar_text(o).unwrap_or_else(|| o.to_string()))
        .collect();
    if options.is_empty() {
        return Err("single-choice question has no options".to_owned());
    }
    let correct = answer
        .as_u64()
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(|| format!("single-choice answer {answer} is not an option index"))?;
    if correct >= options.len() {
        return Err(format!(
            "single-choice answer {correct} out of range ({} options)",
            options.len()
        ));
    }
    Ok(QuestionKind::SingleChoice { options, correct })
}

fn true_false(answer: &serde_json::Value) -> Result<QuestionKind, String> {
    answer
        .as_bool()
        .map(|correct| QuestionKind::TrueFalse { correct })
        .ok_or_else(|| format!("true/false answer {answer} is not a boolean"))
}

fn short_answer(answer: &serde_json::Value) -> Result<QuestionKind, String> {
    let candidates: Vec<&serde_json::Value> = match answer {
        serde_json::Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };
    let mut accepted: Vec<String> = Vec::with_capacity(candidates.len());
    for value in candidates {
        if let Some(text) = scalar_text(value) {
            let normalized = normalize_text(&text);
            if !normalized.is_empty() && !accepted.contains(&normalized) {
                accepted.push(normalized);
            }
        }
    }
    if accepted.is_empty() {
        return Err("short answer has no accepted answers".to_owned());
    }
    Ok(QuestionKind::ShortAnswer { accepted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::key::{ClassId, SubjectId};
    use crate::lesson::source::{MemorySource, NoTitles};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    fn key(lesson: &str) -> LessonKey {
        LessonKey::new(ClassId::Class10, SubjectId::Math, lesson).unwrap()
    }

    fn loader(json: &str) -> LessonLoader {
        LessonLoader::new(
            Arc::new(MemorySource::from_json(json).unwrap()),
            Arc::new(NoTitles),
        )
    }

    #[test]
    fn short_answer_normalizes_single_value() {
        let q = validate_question(
            &json!({"type": 3, "question": "Capital?", "answer": "  PARIS  "}),
            SetKind::Normal,
            0,
        )
        .unwrap();
        assert_eq!(
            q.kind,
            QuestionKind::ShortAnswer {
                accepted: vec!["paris".to_owned()]
            }
        );
        assert_eq!(q.id, "normal-1");
    }

    #[test]
    fn short_answer_normalizes_every_member() {
        let q = validate_question(
            &json!({"type": 3, "question": "City?", "answer": ["Ho  Chi Minh", "SAIGON", "saigon", 42]}),
            SetKind::Boss,
            4,
        )
        .unwrap();
        assert_eq!(
            q.kind,
            QuestionKind::ShortAnswer {
                accepted: vec!["ho chi minh".to_owned(), "saigon".to_owned(), "42".to_owned()]
            }
        );
        assert_eq!(q.id, "boss-5");
    }

    #[test]
    fn missing_or_null_answer_is_malformed() {
        for entry in [
            json!({"type": 1, "question": "Q", "options": ["a"]}),
            json!({"type": 1, "question": "Q", "options": ["a"], "answer": null}),
        ] {
            let err = validate_question(&entry, SetKind::Normal, 0).unwrap_err();
            assert_eq!(err, "missing answer");
        }
    }

    #[test]
    fn single_choice_index_must_be_in_range() {
        let err = validate_question(
            &json!({"type": 1, "question": "Q", "options": ["a", "b"], "answer": 2}),
            SetKind::Normal,
            0,
        )
        .unwrap_err();
        assert!(err.contains("out of range"));
    }

    #[test]
    fn true_false_needs_a_real_boolean() {
        let err = validate_question(
            &json!({"type": 2, "question": "Sky is blue", "answer": "TRUE"}),
            SetKind::Normal,
            0,
        )
        .unwrap_err();
        assert!(err.contains("is not a boolean"), "{err}");

        let q = validate_question(
            &json!({"type": 2, "question": "Sky is blue", "answer": false, "id": 9}),
            SetKind::Normal,
            0,
        )
        .unwrap();
        assert_eq!(q.kind, QuestionKind::TrueFalse { correct: false });
        assert_eq!(q.id, "9");
    }

    #[test]
    fn type_tag_must_be_numeric() {
        let err = validate_question(
            &json!({"type": "2", "question": "Sky is blue", "answer": true}),
            SetKind::Normal,
            0,
        )
        .unwrap_err();
        assert!(err.contains("unknown question type \"2\""), "{err}");
    }

    #[test]
    fn blank_question_text_is_kept() {
        let q = validate_question(
            &json!({"type": 2, "question": "", "answer": true}),
            SetKind::Boss,
            2,
        )
        .unwrap();
        assert_eq!(q.prompt, "");
        assert_eq!(q.id, "boss-3");
    }

    #[test]
    fn unknown_type_is_malformed() {
        let err = validate_question(
            &json!({"type": 7, "question": "Q", "answer": 1}),
            SetKind::Normal,
            0,
        )
        .unwrap_err();
        assert!(err.contains("unknown question type"));
    }

    #[tokio::test]
    async fn drops_malformed_and_keeps_rest() {
        let loader = loader(
            r#"{"class10": {"math": {"l1": {
                "normal": [
                    {"type": 2, "question": "A", "answer": true},
                    {"type": 2, "question": "B"},
                    {"type": 1, "question": "C", "options": ["x", "y"], "answer": 1}
                ],
                "boss": [{"type": 3, "question": "D", "answer": "d"}]
            }}}}"#,
        );
        let mut rng = StdRng::seed_from_u64(3);
        let bank = loader.load_with_rng(&key("l1"), &mut rng).await.unwrap();
        assert_eq!(bank.normal.len(), 2);
        assert_eq!(bank.boss.len(), 1);
        assert_eq!(bank.report.dropped.len(), 1);
        assert_eq!(bank.report.dropped[0].position, 2);
        assert_eq!(bank.title, "l1");
    }

    #[tokio::test]
    async fn missing_key_is_data_not_found() {
        let loader = loader(r#"{"class10": {"math": {}}}"#);
        let err = loader.load(&key("nope")).await.unwrap_err();
        assert!(matches!(err, LoadError::DataNotFound { .. }));
    }

    #[tokio::test]
    async fn all_malformed_is_empty_lesson() {
        let loader = loader(
            r#"{"class10": {"math": {"l1": {"normal": [{"type": 2, "question": "A"}], "boss": "x"}}}}"#,
        );
        let err = loader.load(&key("l1")).await.unwrap_err();
        assert!(matches!(err, LoadError::EmptyLesson { .. }));
    }

    #[tokio::test]
    async fn title_failure_falls_back_to_lesson_id() {
        struct Broken;

        #[async_trait::async_trait]
        impl TitleSource for Broken {
            async fn fetch_title(&self, _key: &LessonKey) -> Result<Option<String>, LoadError> {
                Err(LoadError::failure("theory.json", "HTTP 500"))
            }
        }

        let loader = LessonLoader::new(
            Arc::new(
                MemorySource::from_json(
                    r#"{"class10": {"math": {"l1": {"normal": [{"type": 2, "question": "A", "answer": false}]}}}}"#,
                )
                .unwrap(),
            ),
            Arc::new(Broken),
        );
        let bank = loader.load(&key("l1")).await.unwrap();
        assert_eq!(bank.title, "l1");
    }
}
