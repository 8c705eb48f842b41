//! Command line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "vulnwatch",
    version,
    about = "Vulnerability scan orchestration and report enrichment"
)]
pub struct Cli {
    /// Configuration file (defaults to the per-user config location)
    #[arg(long, global = true, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Write log output to a file instead of the console
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log line format: text or json
    #[arg(long, global = true, value_name = "FORMAT")]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a scan of a target and wait for the enriched report
    Scan {
        /// Target host address
        target: String,
    },
    /// Print the stored enriched report for a target
    Report {
        /// Target host address
        target: String,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Query the engine-side status of a task
    Status {
        /// Engine task id
        task_id: String,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Pause a running task
    Pause {
        /// Engine task id
        task_id: String,
    },
    /// Resume a paused or stopped task
    Resume {
        /// Engine task id
        task_id: String,
    },
}
