//! Validated question model
//!
//! Questions reach this form only through the loader, so every
//! [`Question`] carries well-formed correctness data for its kind.

use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

/// Normalizes free text for short-answer comparison.
///
/// Trims, lowercases, and collapses every run of internal whitespace
/// to a single space. Used identically at load time and at submission.
#[must_use]
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Which half of the lesson a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SetKind {
    /// Questions answered while approaching the enemy
    Normal,
    /// Timed questions answered against the boss
    Boss,
}

impl SetKind {
    /// Lowercase name as used in data files and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Boss => "boss",
        }
    }
}

impl fmt::Display for SetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific question body with its correctness data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    /// Pick one of several options.
    SingleChoice {
        /// Option texts, in display order
        options: Vec<String>,
        /// Index of the correct option
        correct: usize,
    },
    /// Decide whether a statement holds.
    TrueFalse {
        /// Whether the statement is true
        correct: bool,
    },
    /// Type a short free-text answer.
    ShortAnswer {
        /// Accepted answers, already normalized
        accepted: Vec<String>,
    },
}

impl QuestionKind {
    /// Short label shown above the prompt.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SingleChoice { .. } => "Multiple choice",
            Self::TrueFalse { .. } => "True / False",
            Self::ShortAnswer { .. } => "Short answer",
        }
    }

    /// Stable name used in error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SingleChoice { .. } => "single-choice",
            Self::TrueFalse { .. } => "true/false",
            Self::ShortAnswer { .. } => "short-answer",
        }
    }
}

/// A playable question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    /// Stable id (from data, or positional when the data has none)
    pub id: String,
    /// Prompt text
    pub prompt: String,
    /// Kind-specific body and correctness data
    #[serde(flatten)]
    pub kind: QuestionKind,
    /// Optional explanation shown after answering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    /// Explanation text, falling back to a generic verdict.
    #[must_use]
    pub fn explanation_or_default(&self, correct: bool) -> &str {
        match &self.explanation {
            Some(text) if !text.trim().is_empty() => text,
            _ if correct => "Correct!",
            _ => "Not quite.",
        }
    }
}

/// A player's submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Answer {
    /// Chosen option index
    Choice(usize),
    /// Chosen truth value
    Bool(bool),
    /// Typed text, as entered
    Text(String),
}

impl Answer {
    /// Stable name used in error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Choice(_) => "choice",
            Self::Bool(_) => "true/false",
            Self::Text(_) => "text",
        }
    }
}

/// Ordered, shuffled questions for one phase.
///
/// Built once at session start and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    /// Builds a set, shuffling `questions` with `rng`.
    pub fn shuffled<R: Rng + ?Sized>(mut questions: Vec<Question>, rng: &mut R) -> Self {
        questions.shuffle(rng);
        Self { questions }
    }

    /// Builds a set keeping the given order.
    #[must_use]
    pub const fn in_order(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Returns a fresh, independently shuffled copy of this set.
    #[must_use]
    pub fn reshuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        Self::shuffled(self.questions.clone(), rng)
    }

    /// Question at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Number of questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the set has no questions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Iterates questions in play order.
    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }
}

impl<'a> IntoIterator for &'a QuestionSet {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
