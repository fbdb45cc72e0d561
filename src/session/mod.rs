//! Interactive sessions
//!
//! Glue between terminal input, the phase engine, presentation, and the
//! completion store.

pub mod input;
pub mod runner;

pub use input::{Command, Prompt, parse_answer, parse_command};
pub use runner::{SessionConfig, SessionExit, SessionRunner};
