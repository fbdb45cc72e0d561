//! `validate` command
//!
//! Loads lesson data the way a session would and reports how many
//! questions are playable and which entries were dropped.

use std::sync::Arc;

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::AppConfig;
use crate::error::{LoadError, StudyHelperError};
use crate::lesson::raw::PracticeDb;
use crate::lesson::{
    DataLocation, LessonKey, LessonLoader, MemorySource, PracticeSource, QuestionBank,
};

/// One checked lesson.
#[derive(Debug, Serialize)]
struct LessonReport {
    lesson: String,
    title: Option<String>,
    normal: usize,
    boss: usize,
    dropped: Vec<String>,
    error: Option<String>,
}

impl LessonReport {
    fn from_bank(bank: &QuestionBank) -> Self {
        Self {
            lesson: bank.key.to_string(),
            title: Some(bank.title.clone()),
            normal: bank.normal.len(),
            boss: bank.boss.len(),
            dropped: bank.report.dropped.iter().map(ToString::to_string).collect(),
            error: None,
        }
    }

    fn from_error(lesson: String, error: &LoadError) -> Self {
        Self {
            lesson,
            title: None,
            normal: 0,
            boss: 0,
            dropped: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

/// Validate one lesson, or every lesson with `--all`.
///
/// # Errors
///
/// Returns the first `LoadError` met, after printing the full report.
pub async fn run(args: &ValidateArgs, config: &AppConfig) -> Result<(), StudyHelperError> {
    let mut reports = Vec::new();
    let mut first_error = None;

    if args.all {
        let source = PracticeSource::new(DataLocation::parse(&config.data.practice));
        let db = source.fetch_all().await?;
        let keys = lesson_keys(&db);
        tracing::info!(lessons = keys.len(), "validating every lesson");
        let loader = LessonLoader::new(Arc::new(MemorySource::new(db)), super::title_source(config));
        for key in keys {
            match loader.load(&key).await {
                Ok(bank) => reports.push(LessonReport::from_bank(&bank)),
                Err(e) => {
                    reports.push(LessonReport::from_error(key.to_string(), &e));
                    first_error.get_or_insert(e);
                }
            }
        }
    } else {
        let key = LessonKey::parse(
            args.lesson.class.as_deref(),
            args.lesson.subject.as_deref(),
            args.lesson.lesson.as_deref(),
        )?;
        match super::lesson_loader(config).load(&key).await {
            Ok(bank) => reports.push(LessonReport::from_bank(&bank)),
            Err(e) => {
                reports.push(LessonReport::from_error(key.to_string(), &e));
                first_error = Some(e);
            }
        }
    }

    match args.format {
        OutputFormat::Human => {
            for report in &reports {
                print!("{}", render(report));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }

    first_error.map_or(Ok(()), |e| Err(e.into()))
}

/// Every lesson key in the database with known class and subject ids,
/// in sorted order.
fn lesson_keys(db: &PracticeDb) -> Vec<LessonKey> {
    let mut keys = Vec::new();
    for (class, subjects) in db {
        for (subject, lessons) in subjects {
            for lesson in lessons.keys() {
                match LessonKey::parse(Some(class.as_str()), Some(subject.as_str()), Some(lesson.as_str())) {
                    Ok(key) => keys.push(key),
                    Err(e) => tracing::warn!(class, subject, lesson, error = %e, "skipping unknown lesson key"),
                }
            }
        }
    }
    keys.sort();
    keys
}

fn render(report: &LessonReport) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    if let Some(error) = &report.error {
        let _ = writeln!(out, "FAIL {}: {error}", report.lesson);
        return out;
    }
    let _ = writeln!(
        out,
        "ok   {} \"{}\": {} normal, {} boss, {} dropped",
        report.lesson,
        report.title.as_deref().unwrap_or_default(),
        report.normal,
        report.boss,
        report.dropped.len()
    );
    for dropped in &report.dropped {
        let _ = writeln!(out, "       {dropped}");
    }
    out
}
