//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod play;
pub mod progress;
pub mod validate;
pub mod version;

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cli::args::{Cli, Commands};
use crate::config::{AppConfig, ConfigLoader};
use crate::error::StudyHelperError;
use crate::lesson::{DataLocation, LessonLoader, NoTitles, PracticeSource, TheorySource, TitleSource};

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if configuration loading or the command fails.
pub async fn dispatch(cli: Cli, cancel: CancellationToken) -> Result<(), StudyHelperError> {
    match cli.command {
        Commands::Play(args) => {
            let config = load_config(cli.config.as_deref())?;
            play::run(&args, &config, cancel).await
        }
        Commands::Validate(args) => {
            let config = load_config(cli.config.as_deref())?;
            validate::run(&args, &config).await
        }
        Commands::Progress(args) => {
            let config = load_config(cli.config.as_deref())?;
            progress::run(&args, &config).await
        }
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Loads the configuration file, or defaults when none is given.
fn load_config(path: Option<&Path>) -> Result<AppConfig, StudyHelperError> {
    if let Some(path) = path {
        tracing::info!(config = %path.display(), "loading configuration");
    }
    let result = ConfigLoader::default().load_optional(path)?;
    for warning in &result.warnings {
        tracing::warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }
    Ok(result.config)
}

/// Lesson loader over the configured question and title sources.
fn lesson_loader(config: &AppConfig) -> LessonLoader {
    let lessons = PracticeSource::new(DataLocation::parse(&config.data.practice));
    LessonLoader::new(Arc::new(lessons), title_source(config))
}

fn title_source(config: &AppConfig) -> Arc<dyn TitleSource> {
    match config.data.theory.as_deref().map(str::trim) {
        Some(theory) if !theory.is_empty() => {
            Arc::new(TheorySource::new(DataLocation::parse(theory)))
        }
        _ => Arc::new(NoTitles),
    }
}
