//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the img10 binary.

mod commands;
mod handlers;

pub use commands::{Cli, LogFormat};
pub use handlers::execute;
