//! Raw lesson data as stored in `practice.json` and `theory.json`
//!
//! These types accept the data files as they are written by content
//! authors, which is loosely typed: `answer` may be a number, boolean,
//! string, or array depending on the question type, and may be missing.
//! Conversion into validated [`Question`](super::question::Question)s
//! happens in the loader.

use std::collections::HashMap;

use serde::Deserialize;

/// Whole `practice.json` database: class → subject → lesson → record.
pub type PracticeDb = HashMap<String, HashMap<String, HashMap<String, RawLesson>>>;

/// Whole `theory.json` database: class → subject → lesson list.
pub type TheoryDb = HashMap<String, HashMap<String, Vec<TheoryLesson>>>;

/// One lesson's question arrays.
///
/// A field that is absent or not an array counts as empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLesson {
    /// Normal-phase questions
    #[serde(default, deserialize_with = "lenient_list")]
    pub normal: Vec<serde_json::Value>,
    /// Boss-phase questions
    #[serde(default, deserialize_with = "lenient_list")]
    pub boss: Vec<serde_json::Value>,
}

/// One authored question, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuestion {
    /// Optional stable id
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    /// Numeric type tag: 1 single choice, 2 true/false, 3 short answer
    #[serde(default, rename = "type")]
    pub kind: Option<serde_json::Value>,
    /// Prompt text
    #[serde(default)]
    pub question: Option<String>,
    /// Options for single-choice questions
    #[serde(default)]
    pub options: Option<Vec<serde_json::Value>>,
    /// Correctness data; shape depends on `kind`
    #[serde(default)]
    pub answer: Option<serde_json::Value>,
    /// Optional explanation
    #[serde(default)]
    pub explanation: Option<String>,
}

/// A lesson entry in `theory.json`; only the title is used here.
#[derive(Debug, Clone, Deserialize)]
pub struct TheoryLesson {
    /// Lesson id
    pub id: String,
    /// Human-readable title
    #[serde(default)]
    pub title: Option<String>,
}

/// Accepts any JSON value, keeping it only if it is an array.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => items,
        _ => Vec::new(),
    })
}
