//! Lesson data sources
//!
//! The loader reads question data through [`LessonSource`] and lesson
//! titles through [`TitleSource`]. Both data files can live on disk or
//! behind an HTTP URL; [`DataLocation`] hides the difference.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::LoadError;

use super::key::LessonKey;
use super::raw::{PracticeDb, RawLesson, TheoryDb};

// ============================================================================
// Traits
// ============================================================================

/// Keyed lookup of raw lesson question data.
#[async_trait]
pub trait LessonSource: Send + Sync {
    /// Fetches the raw record for `key`.
    ///
    /// Returns `Ok(None)` when the source is reachable but has no entry
    /// for the key.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::LoadFailure` on transport or decoding failure.
    async fn fetch_lesson(&self, key: &LessonKey) -> Result<Option<RawLesson>, LoadError>;

    /// Name used in logs and error messages.
    fn name(&self) -> String;
}

/// Optional lookup of a human-readable lesson title.
#[async_trait]
pub trait TitleSource: Send + Sync {
    /// Fetches the title for `key`, if the source knows one.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::LoadFailure` on transport or decoding failure.
    /// Callers treat any failure as non-fatal.
    async fn fetch_title(&self, key: &LessonKey) -> Result<Option<String>, LoadError>;
}

// ============================================================================
// Locations
// ============================================================================

/// Where a JSON data file lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLocation {
    /// Local file
    File(PathBuf),
    /// `http://` or `https://` URL
    Url(String),
}

impl DataLocation {
    /// Interprets a configured string as a URL or a file path.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            Self::Url(s.to_owned())
        } else {
            Self::File(PathBuf::from(s))
        }
    }

    /// Fetches and decodes the JSON document at this location.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::LoadFailure` if the document cannot be read,
    /// the server answers with a non-success status, or the body is not
    /// valid JSON of the expected shape.
    pub async fn fetch_json<T: DeserializeOwned>(&self) -> Result<T, LoadError> {
        match self {
            Self::File(path) => {
                debug!(path = %path.display(), "reading data file");
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| LoadError::failure(self.to_string(), e))?;
                serde_json::from_str(&text).map_err(|e| LoadError::failure(self.to_string(), e))
            }
            Self::Url(url) => {
                debug!(%url, "fetching data over HTTP");
                let response = reqwest::get(url)
                    .await
                    .map_err(|e| LoadError::failure(url.clone(), e))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(LoadError::failure(url.clone(), format!("HTTP {status}")));
                }
                response
                    .json::<T>()
                    .await
                    .map_err(|e| LoadError::failure(url.clone(), e))
            }
        }
    }
}

impl std::fmt::Display for DataLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

// ============================================================================
// practice.json
// ============================================================================

/// Question source backed by a `practice.json` document.
#[derive(Debug, Clone)]
pub struct PracticeSource {
    location: DataLocation,
}

impl PracticeSource {
    /// Creates a source reading from `location`.
    #[must_use]
    pub const fn new(location: DataLocation) -> Self {
        Self { location }
    }

    /// Fetches the whole database.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::LoadFailure` on transport or decoding failure.
    pub async fn fetch_all(&self) -> Result<PracticeDb, LoadError> {
        self.location.fetch_json().await
    }
}

#[async_trait]
impl LessonSource for PracticeSource {
    async fn fetch_lesson(&self, key: &LessonKey) -> Result<Option<RawLesson>, LoadError> {
        let mut db = self.fetch_all().await?;
        Ok(take_lesson(&mut db, key))
    }

    fn name(&self) -> String {
        self.location.to_string()
    }
}

/// In-memory question source, mainly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    db: PracticeDb,
}

impl MemorySource {
    /// Wraps an already-decoded database.
    #[must_use]
    pub const fn new(db: PracticeDb) -> Self {
        Self { db }
    }

    /// Decodes a `practice.json` document held in memory.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::LoadFailure` if `json` is not a valid database.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        serde_json::from_str(json)
            .map(Self::new)
            .map_err(|e| LoadError::failure("<memory>", e))
    }
}

#[async_trait]
impl LessonSource for MemorySource {
    async fn fetch_lesson(&self, key: &LessonKey) -> Result<Option<RawLesson>, LoadError> {
        Ok(self
            .db
            .get(key.class.id())
            .and_then(|subjects| subjects.get(key.subject.id()))
            .and_then(|lessons| lessons.get(&key.lesson))
            .cloned())
    }

    fn name(&self) -> String {
        "<memory>".to_owned()
    }
}

fn take_lesson(db: &mut PracticeDb, key: &LessonKey) -> Option<RawLesson> {
    db.get_mut(key.class.id())?
        .get_mut(key.subject.id())?
        .remove(&key.lesson)
}

// ============================================================================
// theory.json
// ============================================================================

/// Title source backed by a `theory.json` document.
#[derive(Debug, Clone)]
pub struct TheorySource {
    location: DataLocation,
}

impl TheorySource {
    /// Creates a source reading from `location`.
    #[must_use]
    pub const fn new(location: DataLocation) -> Self {
        Self { location }
    }
}

#[async_trait]
impl TitleSource for TheorySource {
    async fn fetch_title(&self, key: &LessonKey) -> Result<Option<String>, LoadError> {
        let db: TheoryDb = self.location.fetch_json().await?;
        Ok(db
            .get(key.class.id())
            .and_then(|subjects| subjects.get(key.subject.id()))
            .and_then(|lessons| lessons.iter().find(|l| l.id == key.lesson))
            .and_then(|l| l.title.clone())
            .filter(|t| !t.trim().is_empty()))
    }
}

/// Title source that never knows a title.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTitles;

#[async_trait]
impl TitleSource for NoTitles {
    async fn fetch_title(&self, _key: &LessonKey) -> Result<Option<String>, LoadError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::key::{ClassId, SubjectId};

    fn key(lesson: &str) -> LessonKey {
        LessonKey::new(ClassId::Class10, SubjectId::Math, lesson).unwrap()
    }

    #[test]
    fn location_detects_urls() {
        assert_eq!(
            DataLocation::parse("https://example.org/practice.json"),
            DataLocation::Url("https://example.org/practice.json".to_owned())
        );
        assert_eq!(
            DataLocation::parse("../Practice/practice.json"),
            DataLocation::File(PathBuf::from("../Practice/practice.json"))
        );
    }

    #[tokio::test]
    async fn memory_source_lookup() {
        let source = MemorySource::from_json(
            r#"{"class10": {"math": {"l1": {"normal": [], "boss": []}}}}"#,
        )
        .unwrap();
        assert!(source.fetch_lesson(&key("l1")).await.unwrap().is_some());
        assert!(source.fetch_lesson(&key("l2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_file_is_load_failure() {
        let source = PracticeSource::new(DataLocation::File(PathBuf::from(
            "/nonexistent/practice.json",
        )));
        let err = source.fetch_lesson(&key("l1")).await.unwrap_err();
        assert!(matches!(err, LoadError::LoadFailure { .. }));
    }

    #[tokio::test]
    async fn theory_source_finds_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theory.json");
        std::fs::write(
            &path,
            r#"{"class10": {"math": [{"id": "l1", "title": "Sets"}, {"id": "l2"}]}}"#,
        )
        .unwrap();
        let source = TheorySource::new(DataLocation::File(path));
        assert_eq!(
            source.fetch_title(&key("l1")).await.unwrap().as_deref(),
            Some("Sets")
        );
        assert_eq!(source.fetch_title(&key("l2")).await.unwrap(), None);
        assert_eq!(source.fetch_title(&key("l3")).await.unwrap(), None);
    }
}
