// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! CLI module for the pose pipelines.
//!
//! This module contains the command-line interface logic: argument parsing,
//! console logging and the `overlay`, `stream` and `stickman` commands.

// Modules
/// CLI arguments.
pub mod args;

/// Console logging macros and verbosity.
pub mod logging;

/// Command implementations.
pub mod run;
