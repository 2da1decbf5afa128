use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "printqueue")]
#[command(version)]
#[command(about = "Runs a queue of print jobs on a PrusaLink printer and logs telemetry")]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the TOML config file
    #[arg(
        long,
        short = 'c',
        global = true,
        env = "PRINTQUEUE_CONFIG",
        default_value = "printqueue.toml"
    )]
    pub config: PathBuf,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit every queued job in order, logging telemetry while each prints
    Run,

    /// Fetch the printer status once and print it as JSON
    Status,

    /// Convert a JSON document (e.g. the telemetry log) to CSV
    Convert {
        /// JSON file to read (default: converter.input from the config)
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,

        /// CSV file to write (default: converter.output from the config)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration with secrets redacted
    Config,
}
