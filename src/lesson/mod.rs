//! Lesson data
//!
//! Identifies lessons, models their questions, and loads validated
//! question banks from `practice.json`-style sources.
//!
//! - [`LessonKey`] — validated `(class, subject, lesson)` triple
//! - [`Question`] / [`QuestionSet`] — playable questions in session order
//! - [`LessonLoader`] — fetch, validate, normalize, shuffle

pub mod key;
pub mod loader;
pub mod question;
pub mod raw;
pub mod source;

pub use key::{ClassId, LessonKey, SubjectId};
pub use loader::{DroppedQuestion, LessonLoader, LoadReport, QuestionBank};
pub use question::{Answer, Question, QuestionKind, QuestionSet, SetKind, normalize_text};
pub use source::{
    DataLocation, LessonSource, MemorySource, NoTitles, PracticeSource, TheorySource, TitleSource,
};
