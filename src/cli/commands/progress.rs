//! `progress` command
//!
//! Lists the lessons recorded as completed in the completion store.

use serde::Serialize;

use crate::cli::args::{OutputFormat, ProgressArgs};
use crate::completion::{CompletionMap, CompletionStore, JsonFileStore};
use crate::config::AppConfig;
use crate::error::StudyHelperError;
use crate::lesson::{ClassId, LessonKey, SubjectId};

/// One completed lesson as listed.
#[derive(Debug, Serialize)]
struct ProgressEntry {
    key: String,
    lesson: Option<LessonKey>,
    completed_at: Option<String>,
    correct: u32,
}

/// List completion records, optionally narrowed by class and subject.
///
/// # Errors
///
/// Returns `Load` for an unknown class or subject id and `Completion`
/// if the store cannot be read.
pub async fn run(args: &ProgressArgs, config: &AppConfig) -> Result<(), StudyHelperError> {
    let class = args.class.as_deref().map(str::parse::<ClassId>).transpose()?;
    let subject = args
        .subject
        .as_deref()
        .map(str::parse::<SubjectId>)
        .transpose()?;

    let store = JsonFileStore::new(config.completion.path.clone());
    let records = store.load_all().await?;
    let entries = entries(&records, class, subject);

    match args.format {
        OutputFormat::Human if entries.is_empty() => println!("No completed lessons."),
        OutputFormat::Human => {
            for entry in &entries {
                println!(
                    "{:<40} {:<24} {} correct",
                    entry
                        .lesson
                        .as_ref()
                        .map_or_else(|| entry.key.clone(), ToString::to_string),
                    entry.completed_at.as_deref().unwrap_or("-"),
                    entry.correct
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
    }
    Ok(())
}

/// Records matching the filters. Keys that do not parse as lesson keys
/// are listed only when no filter is set.
fn entries(
    records: &CompletionMap,
    class: Option<ClassId>,
    subject: Option<SubjectId>,
) -> Vec<ProgressEntry> {
    records
        .iter()
        .filter_map(|(key, record)| {
            let lesson = LessonKey::from_storage_key(key);
            let keep = match &lesson {
                Some(lesson) => {
                    class.is_none_or(|c| c == lesson.class)
                        && subject.is_none_or(|s| s == lesson.subject)
                }
                None => class.is_none() && subject.is_none(),
            };
            keep.then(|| ProgressEntry {
                key: key.clone(),
                lesson,
                completed_at: record
                    .completed_at()
                    .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string()),
                correct: record.correct,
            })
        })
        .collect()
}
