//! CLI parser.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "memory-worker")]
#[command(about = "Tiered conversation memory over JSON lines", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Also append logs to this file (overrides MEMORY_LOG_FILE).
    #[arg(long, global = true)]
    pub log_file: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read commands from stdin, one JSON object per line; write events to stdout.
    Serve,
    /// Print the chunk windows of a file using the configured chunk size and overlap.
    Chunk {
        #[arg(short, long)]
        file: PathBuf,
    },
}
