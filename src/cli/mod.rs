//! CLI module for BARKR
//!
//! Provides command-line interface for:
//! - start: Verify the database and serve HTTP
//! - check: Verify the database and exit

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{build_store, check, run, run_command, start};
pub use errors::{CliError, CliErrorCode, CliResult};
