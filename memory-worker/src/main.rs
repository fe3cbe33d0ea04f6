//! memory-worker: serve the tiered memory over stdin/stdout, or inspect chunking.
//! Config from env (and .env); `--log-file` overrides MEMORY_LOG_FILE.

use anyhow::{Context, Result};
use clap::Parser;
use memory_worker::{init_tracing, run_chunk, run_serve, Cli, Commands, WorkerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = WorkerConfig::from_env().context("Load worker config from environment")?;
    if cli.log_file.is_some() {
        config.log_file = cli.log_file;
    }

    init_tracing(config.log_file.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Serve => run_serve(config).await,
        Commands::Chunk { file } => run_chunk(&config, &file).await,
    }
}
