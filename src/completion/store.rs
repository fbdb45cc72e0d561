//! Completion records
//!
//! A completion store maps `"{class}__{subject}__{lesson}"` to the time
//! the lesson was won and the number of correct answers. Recording the
//! same lesson again overwrites the earlier record.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::CompletionError;
use crate::lesson::LessonKey;
use crate::phase::{Outcome, SessionState};

/// Records keyed by storage key.
pub type CompletionMap = BTreeMap<String, CompletionRecord>;

/// One completed lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// Completion time, milliseconds since the Unix epoch
    pub ts: i64,
    /// Correct answers across both phases
    pub correct: u32,
}

impl CompletionRecord {
    /// Record stamped with the current time.
    #[must_use]
    pub fn now(correct: u32) -> Self {
        Self {
            ts: Utc::now().timestamp_millis(),
            correct,
        }
    }

    /// Completion time as a UTC timestamp.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.ts)
    }
}

/// Persistent completion storage.
#[async_trait]
pub trait CompletionStore: Send + Sync {
    /// Stores `record` for `key`, replacing any earlier record.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError` if the store cannot be written.
    async fn record(&self, key: &LessonKey, record: CompletionRecord) -> Result<(), CompletionError>;

    /// Reads every record.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError` if the store cannot be read.
    async fn load_all(&self) -> Result<CompletionMap, CompletionError>;

    /// Whether `key` has a record.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError` if the store cannot be read.
    async fn is_done(&self, key: &LessonKey) -> Result<bool, CompletionError> {
        Ok(self.load_all().await?.contains_key(&key.storage_key()))
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// Store backed by a single JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store at `path`; the file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<Option<CompletionMap>, CompletionError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Some(CompletionMap::new())),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| CompletionError::Corrupt {
                    path: self.path.clone(),
                    source,
                }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CompletionError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    async fn write_map(&self, map: &CompletionMap) -> Result<(), CompletionError> {
        let io_err = |source| CompletionError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let json = serde_json::to_vec_pretty(map).map_err(|source| CompletionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)
    }
}

#[async_trait]
impl CompletionStore for JsonFileStore {
    async fn record(&self, key: &LessonKey, record: CompletionRecord) -> Result<(), CompletionError> {
        let mut map = match self.read_map().await {
            Ok(map) => map.unwrap_or_default(),
            Err(CompletionError::Corrupt { path, source }) => {
                warn!(path = %path.display(), error = %source, "completion store corrupt; starting over");
                CompletionMap::new()
            }
            Err(e) => return Err(e),
        };
        map.insert(key.storage_key(), record);
        self.write_map(&map).await
    }

    async fn load_all(&self) -> Result<CompletionMap, CompletionError> {
        Ok(self.read_map().await?.unwrap_or_default())
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Store kept in memory, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<CompletionMap>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompletionStore for MemoryStore {
    async fn record(&self, key: &LessonKey, record: CompletionRecord) -> Result<(), CompletionError> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.storage_key(), record);
        Ok(())
    }

    async fn load_all(&self) -> Result<CompletionMap, CompletionError> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }
}

// ============================================================================
// Reporting
// ============================================================================

/// Persists the completion record of a won session.
///
/// # Errors
///
/// - `CompletionError::NotWon` unless the session ended in a win
/// - store errors from [`CompletionStore::record`]
pub async fn report_win(
    store: &dyn CompletionStore,
    key: &LessonKey,
    state: &SessionState,
) -> Result<CompletionRecord, CompletionError> {
    match state.outcome() {
        Some(Outcome::Won) => {}
        other => {
            return Err(CompletionError::NotWon {
                outcome: other.map_or_else(|| state.phase().to_string(), |o| o.to_string()),
            });
        }
    }
    let record = CompletionRecord::now(state.stats().total_correct());
    store.record(key, record).await?;
    info!(lesson = %key, correct = record.correct, "lesson completion recorded");
    Ok(record)
}
