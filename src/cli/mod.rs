//! Command-line interface
//!
//! Argument definitions and command handlers for the `studyhelper` binary.

pub mod args;
pub mod commands;
