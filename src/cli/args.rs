//! CLI argument definitions using clap
//!
//! Commands:
//! - barkr start [--host <host>] [--port <port>] [--in-memory]
//! - barkr check [--in-memory]

use clap::{Parser, Subcommand};

/// BARKR - REST gateway in front of a hosted document database
#[derive(Parser, Debug)]
#[command(name = "barkr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Verify the database, then serve HTTP until terminated
    Start {
        /// Host to bind to (overrides HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Serve from an in-process store instead of Cloudant
        #[arg(long)]
        in_memory: bool,
    },

    /// Verify the database has every required collection and exit
    Check {
        /// Check an in-process store instead of Cloudant
        #[arg(long)]
        in_memory: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
