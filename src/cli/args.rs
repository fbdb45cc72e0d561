//! CLI argument definitions
//!
//! All Clap derive structs for `studyhelper` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::LogFormat;

// ============================================================================
// Root CLI
// ============================================================================

/// Boss-battle lesson quiz.
#[derive(Parser, Debug)]
#[command(name = "studyhelper", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "STUDYHELPER_COLOR")]
    pub color: ColorChoice,

    /// Log line format.
    #[arg(long, default_value = "human", global = true)]
    pub log_format: LogFormat,

    /// Path to the YAML configuration file.
    #[arg(short, long, global = true, env = "STUDYHELPER_CONFIG")]
    pub config: Option<PathBuf>,
}

// ============================================================================
// Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play a lesson in the terminal.
    Play(PlayArgs),

    /// Load lesson data and report what is playable.
    Validate(ValidateArgs),

    /// List completed lessons.
    Progress(ProgressArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

/// Lesson selection shared by `play` and `validate`.
#[derive(Args, Debug, Clone, Default)]
pub struct LessonArgs {
    /// Class id (class10, class11, class12).
    #[arg(long)]
    pub class: Option<String>,

    /// Subject id (math, physics, ...).
    #[arg(long)]
    pub subject: Option<String>,

    /// Lesson id within the subject.
    #[arg(long)]
    pub lesson: Option<String>,
}

/// Arguments for `play`.
#[derive(Args, Debug)]
pub struct PlayArgs {
    /// Lesson to play.
    #[command(flatten)]
    pub lesson: LessonArgs,

    /// Append structured session events (JSONL) to this file.
    #[arg(long, env = "STUDYHELPER_EVENTS")]
    pub events: Option<PathBuf>,

    /// Serve Prometheus metrics on 127.0.0.1:<port>.
    #[arg(long, env = "STUDYHELPER_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Print the completion message as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Lesson to check.
    #[command(flatten)]
    pub lesson: LessonArgs,

    /// Check every lesson in the question source.
    #[arg(long, conflicts_with_all = ["class", "subject", "lesson"])]
    pub all: bool,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `progress`.
#[derive(Args, Debug)]
pub struct ProgressArgs {
    /// Only this class.
    #[arg(long)]
    pub class: Option<String>,

    /// Only this subject.
    #[arg(long)]
    pub subject: Option<String>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================
