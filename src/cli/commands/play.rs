//! `play` command
//!
//! Runs an interactive session on stdin/stdout.

use std::sync::Arc;

use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

use crate::cli::args::PlayArgs;
use crate::completion::JsonFileStore;
use crate::config::AppConfig;
use crate::error::StudyHelperError;
use crate::lesson::LessonKey;
use crate::observability::EventEmitter;
use crate::presentation::terminal::render_error_screen;
use crate::presentation::{AudioDirector, TracingSink};
use crate::session::{SessionConfig, SessionExit, SessionRunner};

/// Play the selected lesson until the player completes or quits.
///
/// # Errors
///
/// Returns `Load` if the lesson triple is invalid or cannot be loaded,
/// and `Io` if the event file or terminal cannot be written.
pub async fn run(
    args: &PlayArgs,
    config: &AppConfig,
    cancel: CancellationToken,
) -> Result<(), StudyHelperError> {
    let key = match LessonKey::parse(
        args.lesson.class.as_deref(),
        args.lesson.subject.as_deref(),
        args.lesson.lesson.as_deref(),
    ) {
        Ok(key) => key,
        Err(e) => {
            print!("{}", render_error_screen(&e.to_string()));
            return Err(e.into());
        }
    };

    if let Some(port) = args.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        tracing::info!(port, "Prometheus metrics endpoint started");
    }

    let events = match &args.events {
        Some(path) => EventEmitter::from_file(path)?,
        None => EventEmitter::noop(),
    };
    let store = JsonFileStore::new(config.completion.path.clone());
    let audio = AudioDirector::new(
        Box::new(TracingSink),
        config.audio.music_volume,
        config.audio.sfx_volume,
    );

    tracing::info!(lesson = %key, "starting session");
    let mut runner = SessionRunner::new(
        super::lesson_loader(config),
        Arc::new(store),
        Arc::new(events),
        audio,
        SessionConfig::from_app(config),
        tokio::io::stdout(),
    )
    .with_cancellation(cancel);

    match runner.run(&key, BufReader::new(tokio::io::stdin())).await? {
        SessionExit::Completed(signal) => {
            if args.json {
                println!("{}", signal.message(&config.completion.practice_page));
            }
        }
        SessionExit::Quit => tracing::info!(lesson = %key, "session left"),
        SessionExit::Interrupted => tracing::info!(lesson = %key, "session interrupted"),
    }
    Ok(())
}
