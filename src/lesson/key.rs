//! Lesson identity
//!
//! A lesson is addressed by a `(class, subject, lesson)` triple. Class and
//! subject ids come from fixed enumerations; the lesson id is free-form but
//! must be non-empty.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Maximum edit distance for "did you mean" suggestions.
const SUGGESTION_DISTANCE: usize = 3;

/// School year the lesson belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClassId {
    /// Year 10
    #[serde(rename = "class10")]
    Class10,
    /// Year 11
    #[serde(rename = "class11")]
    Class11,
    /// Year 12
    #[serde(rename = "class12")]
    Class12,
}

impl ClassId {
    /// Every known class, in display order.
    pub const ALL: [Self; 3] = [Self::Class10, Self::Class11, Self::Class12];

    /// Wire id used in data files and URLs.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Class10 => "class10",
            Self::Class11 => "class11",
            Self::Class12 => "class12",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Class10 => "Khối 10",
            Self::Class11 => "Khối 11",
            Self::Class12 => "Khối 12",
        }
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ClassId {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.id() == s)
            .ok_or_else(|| LoadError::InvalidParameters {
                message: format!("unknown class \"{s}\""),
                suggestion: suggest(s, Self::ALL.iter().map(|c| c.id())),
            })
    }
}

/// Subject the lesson belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectId {
    /// Mathematics
    Math,
    /// Physics
    Physics,
    /// Chemistry
    Chemistry,
    /// Biology
    Biology,
    /// Technology
    Technology,
    /// Informatics
    Informatics,
    /// Literature
    Literature,
    /// English
    English,
    /// History
    History,
    /// Geography
    Geography,
}

impl SubjectId {
    /// Every known subject, in display order.
    pub const ALL: [Self; 10] = [
        Self::Math,
        Self::Physics,
        Self::Chemistry,
        Self::Biology,
        Self::Technology,
        Self::Informatics,
        Self::Literature,
        Self::English,
        Self::History,
        Self::Geography,
    ];

    /// Wire id used in data files and URLs.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::Physics => "physics",
            Self::Chemistry => "chemistry",
            Self::Biology => "biology",
            Self::Technology => "technology",
            Self::Informatics => "informatics",
            Self::Literature => "literature",
            Self::English => "english",
            Self::History => "history",
            Self::Geography => "geography",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Math => "Toán",
            Self::Physics => "Vật lý",
            Self::Chemistry => "Hóa học",
            Self::Biology => "Sinh học",
            Self::Technology => "Công nghệ",
            Self::Informatics => "Tin học",
            Self::Literature => "Văn học",
            Self::English => "Tiếng Anh",
            Self::History => "Lịch sử",
            Self::Geography => "Địa lý",
        }
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SubjectId {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.id() == s)
            .ok_or_else(|| LoadError::InvalidParameters {
                message: format!("unknown subject \"{s}\""),
                suggestion: suggest(s, Self::ALL.iter().map(|c| c.id())),
            })
    }
}

/// Validated `(class, subject, lesson)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LessonKey {
    /// School year
    pub class: ClassId,
    /// Subject
    pub subject: SubjectId,
    /// Lesson id within the subject
    pub lesson: String,
}

impl LessonKey {
    /// Builds a key from already-typed parts.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidParameters` if `lesson` is blank.
    pub fn new(class: ClassId, subject: SubjectId, lesson: impl Into<String>) -> Result<Self, LoadError> {
        let lesson = lesson.into().trim().to_owned();
        if lesson.is_empty() {
            return Err(LoadError::invalid("missing lesson id"));
        }
        Ok(Self {
            class,
            subject,
            lesson,
        })
    }

    /// Parses and validates raw parameters as supplied by the invoking context.
    ///
    /// Checks are made in order class, subject, lesson so the first
    /// problem is the one reported.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidParameters` naming the offending parameter.
    pub fn parse(
        class: Option<&str>,
        subject: Option<&str>,
        lesson: Option<&str>,
    ) -> Result<Self, LoadError> {
        let class: ClassId = class.unwrap_or_default().parse()?;
        let subject: SubjectId = subject.unwrap_or_default().parse()?;
        Self::new(class, subject, lesson.unwrap_or_default())
    }

    /// Key used by the completion store: `"{class}__{subject}__{lesson}"`.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{}__{}__{}", self.class, self.subject, self.lesson)
    }

    /// Parses a completion-store key back into a lesson key.
    #[must_use]
    pub fn from_storage_key(key: &str) -> Option<Self> {
        let mut parts = key.splitn(3, "__");
        let class = parts.next()?.parse().ok()?;
        let subject = parts.next()?.parse().ok()?;
        Self::new(class, subject, parts.next()?).ok()
    }

    /// `"Khối 10 · Toán"` style subtitle.
    #[must_use]
    pub fn subtitle(&self) -> String {
        format!("{} · {}", self.class.label(), self.subject.label())
    }
}

impl fmt::Display for LessonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.class, self.subject, self.lesson)
    }
}

/// Suggest a similar id for typo correction.
///
/// Returns the closest candidate if its Damerau-Levenshtein distance is small.
fn suggest<'a>(input: &str, candidates: impl Iterator<Item = &'a str>) -> Option<String> {
    if input.is_empty() {
        return None;
    }
    candidates
        .map(|c| (c, strsim::damerau_levenshtein(input, c)))
        .filter(|(_, dist)| *dist <= SUGGESTION_DISTANCE)
        .min_by_key(|(_, dist)| *dist)
        .map(|(c, _)| c.to_owned())
}
