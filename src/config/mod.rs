//! Configuration
//!
//! Loads and validates the `studyhelper` YAML configuration: data
//! locations, completion store, timing, and volumes.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLoader, DEFAULT_MAX_CONFIG_SIZE, LoadResult, LoadWarning};
pub use schema::{AppConfig, AudioConfig, CompletionConfig, DataConfig, TimingConfig};
pub use validation::{ValidationResult, Validator};
