//! Answer evaluation
//!
//! Pure correctness checks, one per question kind. Nothing here touches
//! session state; the phase machine decides what a verdict means.

use crate::error::EvaluationError;
use crate::lesson::question::{Answer, QuestionKind, normalize_text};

/// Scores `answer` against `kind`.
///
/// Short answers are compared by exact equality after normalization;
/// a submission that merely contains (or is contained in) an accepted
/// answer is wrong.
///
/// # Errors
///
/// - `EvaluationError::EmptySubmission` for blank free text
/// - `EvaluationError::KindMismatch` when the answer shape does not fit
/// - `EvaluationError::ChoiceOutOfRange` for an index past the options
///
/// None of these count as an answer attempt.
pub fn evaluate(kind: &QuestionKind, answer: &Answer) -> Result<bool, EvaluationError> {
    match (kind, answer) {
        (QuestionKind::SingleChoice { options, correct }, Answer::Choice(index)) => {
            if *index >= options.len() {
                return Err(EvaluationError::ChoiceOutOfRange {
                    index: *index,
                    count: options.len(),
                });
            }
            Ok(index == correct)
        }
        (QuestionKind::TrueFalse { correct }, Answer::Bool(chosen)) => Ok(chosen == correct),
        (QuestionKind::ShortAnswer { accepted }, Answer::Text(text)) => {
            let submitted = normalize_text(text);
            if submitted.is_empty() {
                return Err(EvaluationError::EmptySubmission);
            }
            Ok(accepted.iter().any(|a| *a == submitted))
        }
        (kind, answer) => Err(EvaluationError::KindMismatch {
            expected: kind.name(),
            got: answer.name(),
        }),
    }
}
