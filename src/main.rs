//! `StudyHelper` - boss-battle lesson quiz

use clap::Parser;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;

use studyhelper::cli::args::Cli;
use studyhelper::cli::commands;
use studyhelper::error::ExitCode;
use studyhelper::observability::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(cli.log_format, cli.verbose, cli.color);
    }

    let cancel = CancellationToken::new();

    // First signal ends the session, second one exits immediately
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => Some(sigterm),
            Err(e) => {
                tracing::warn!(error = %e, "failed to register SIGTERM handler");
                None
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            () = recv_term(sigterm.as_mut()) => {}
        }

        eprintln!("\nShutting down gracefully... (press Ctrl+C again to force)");
        shutdown.cancel();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => std::process::exit(ExitCode::INTERRUPTED),
            () = recv_term(sigterm.as_mut()) => std::process::exit(ExitCode::TERMINATED),
        }
    });

    match commands::dispatch(cli, cancel).await {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

/// Waits for SIGTERM, or forever when the handler could not be registered.
async fn recv_term(sigterm: Option<&mut tokio::signal::unix::Signal>) {
    match sigterm {
        Some(sigterm) => {
            sigterm.recv().await;
        }
        None => std::future::pending().await,
    }
}
