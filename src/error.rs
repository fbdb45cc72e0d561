//! Error types for `StudyHelper`
//!
//! One error enum per concern (lesson loading, phase transitions, answer
//! evaluation, completion persistence, configuration), aggregated by
//! [`StudyHelperError`] which also maps onto process exit codes.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `studyhelper` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Lesson could not be started (bad parameters, missing or empty data)
    pub const LOAD_ERROR: i32 = 4;

    /// Phase machine refused an operation
    pub const PHASE_ERROR: i32 = 5;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `StudyHelper` operations.
///
/// Aggregates all domain-specific errors and provides a unified
/// interface for error reporting and exit code mapping.
#[derive(Debug, Error)]
pub enum StudyHelperError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Lesson could not be loaded; the session never starts
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Phase machine error
    #[error(transparent)]
    Phase(#[from] PhaseError),

    /// Completion record could not be persisted or read
    #[error(transparent)]
    Completion(#[from] CompletionError),

    /// Invalid command-line usage
    #[error("usage error: {0}")]
    Usage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StudyHelperError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => ExitCode::CONFIG_ERROR,
            Self::Load(_) => ExitCode::LOAD_ERROR,
            Self::Phase(_) => ExitCode::PHASE_ERROR,
            Self::Completion(_) | Self::Json(_) => ExitCode::ERROR,
            Self::Usage(_) => ExitCode::USAGE_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Load Errors
// ============================================================================

/// Errors that prevent a session from starting.
///
/// All four are terminal-at-start: they are surfaced on an error screen
/// and no partial session is ever constructed.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Class, subject, or lesson id is missing or not in the fixed enumeration
    #[error("invalid parameters: {message}{}", suggestion.as_ref().map_or_else(String::new, |s| format!(" (did you mean '{s}'?)")))]
    InvalidParameters {
        /// What was wrong with the parameters
        message: String,
        /// Closest known id, if one is near enough
        suggestion: Option<String>,
    },

    /// The lesson triple has no question data
    #[error("no question data for {key}")]
    DataNotFound {
        /// Lesson key in `class / subject / lesson` form
        key: String,
    },

    /// Both question sets are empty after validation
    #[error("lesson {key} has no playable questions")]
    EmptyLesson {
        /// Lesson key in `class / subject / lesson` form
        key: String,
    },

    /// Transport-level failure fetching lesson data
    #[error("failed to load {source_name}: {message}")]
    LoadFailure {
        /// Where the data was being fetched from
        source_name: String,
        /// Underlying failure
        message: String,
    },
}

impl LoadError {
    /// Shorthand for an [`LoadError::InvalidParameters`] without a suggestion.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: message.into(),
            suggestion: None,
        }
    }

    /// Shorthand for a [`LoadError::LoadFailure`].
    #[must_use]
    pub fn failure(source_name: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::LoadFailure {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }
}

// ============================================================================
// Phase Errors
// ============================================================================

/// Illegal operations refused by the phase machine.
///
/// These are programming-invariant violations: the machine logs them,
/// refuses the operation, and leaves the session state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseError {
    /// Boss phase requested before every normal question was answered
    #[error("normal phase not exhausted: {answered} of {total} questions done")]
    NormalPhaseIncomplete {
        /// Current normal index
        answered: usize,
        /// Number of normal questions
        total: usize,
    },

    /// Advance requested while the current question is still open
    #[error("current question has not been answered")]
    NotAnswered,

    /// Operation requires an active question but none is presented
    #[error("no question is currently presented")]
    NoQuestion,

    /// A question is already on screen; advance before presenting another
    #[error("a question is already presented")]
    AlreadyPresented,

    /// Operation attempted after the session reached a terminal outcome
    #[error("session already finished ({outcome})")]
    Terminal {
        /// Outcome the session ended with
        outcome: String,
    },

    /// Operation requires a finished session
    #[error("session is still in progress")]
    NotFinished,

    /// Operation is not valid in the current phase
    #[error("operation '{operation}' not valid in {phase} phase")]
    WrongPhase {
        /// Operation name
        operation: &'static str,
        /// Phase the session was in
        phase: String,
    },
}

// ============================================================================
// Evaluation Errors
// ============================================================================

/// Submissions the evaluator cannot score.
///
/// None of these consume an answer attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// Free-text submission was empty or whitespace-only
    #[error("empty answer")]
    EmptySubmission,

    /// Answer shape does not match the question type
    #[error("a {expected} question cannot take a {got} answer")]
    KindMismatch {
        /// Question type label
        expected: &'static str,
        /// Answer type label
        got: &'static str,
    },

    /// Chosen option index is outside the option list
    #[error("option {index} out of range ({count} options)")]
    ChoiceOutOfRange {
        /// Chosen index
        index: usize,
        /// Number of options
        count: usize,
    },
}

// ============================================================================
// Input Errors
// ============================================================================

/// Terminal input lines that do not form a command in the current context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Multiple-choice input outside `1..=count`
    #[error("pick an option between 1 and {count}")]
    NotAChoice {
        /// Number of options
        count: usize,
    },

    /// True/false input that is neither
    #[error("answer t(rue) or f(alse), or 1 or 2")]
    NotABool,

    /// Word that is not a command here
    #[error("'{input}' is not available now; try {hint}")]
    Unavailable {
        /// What was typed
        input: String,
        /// Commands that would work
        hint: &'static str,
    },
}

// ============================================================================
// Completion Errors
// ============================================================================

/// Failures persisting or reading completion records.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The completion store could not be read or written
    #[error("completion store {path}: {source}")]
    Io {
        /// Store location
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The completion store contains invalid JSON
    #[error("completion store {path} is corrupt: {source}")]
    Corrupt {
        /// Store location
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// A completion was reported for a session that was not won
    #[error("session ended in {outcome}, not a win")]
    NotWon {
        /// Actual outcome
        outcome: String,
    },
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}{}: {message}", line.map_or_else(String::new, |l| format!(" (line {l})")))]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("validation failed for {path}: {}", errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    ValidationError {
        /// Path to the configuration file
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Environment variable referenced in configuration is not set
    #[error("environment variable '{var}' not set (referenced in {path})")]
    EnvVarNotSet {
        /// Name of the environment variable
        var: String,
        /// Configuration file that referenced it
        path: PathBuf,
    },

    /// Configuration file exceeds the size limit
    #[error("configuration file {path} is {size} bytes (limit {limit})")]
    TooLarge {
        /// Path to the configuration file
        path: PathBuf,
        /// Actual size
        size: u64,
        /// Maximum accepted size
        limit: u64,
    },
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during configuration validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Dotted path to the problematic field (e.g. "timing.warn_at")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Validation failure that prevents the configuration from being used
    Error,
    /// Potential issue that does not prevent loading
    Warning,
}
