//! `StudyHelper` - boss-battle lesson quiz
//!
//! Loads a lesson's question bank, runs the normal-then-boss phase
//! machine with its energy and countdown rules, evaluates answers,
//! derives presentation state and cues, and records completed lessons.

pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod lesson;
pub mod observability;
pub mod phase;
pub mod presentation;
pub mod session;
