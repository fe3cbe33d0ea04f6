//! `serve` and `chunk` subcommands.
//!
//! `serve` reads one JSON command per input line and writes one JSON event per
//! output line. Blank lines are skipped; lines that do not parse produce an
//! `error` event. At end of input the worker drains its queues before exiting.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use memory_inmemory::InMemoryClient;
use tiered_memory::{Chunker, Command, Event, MemoryWorker, TieredMemory};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::{build_embedder, WorkerConfig};

/// Serves stdin/stdout until stdin closes.
pub async fn run_serve(config: WorkerConfig) -> Result<()> {
    let embedder = build_embedder(&config.embedding)?;
    let memory = TieredMemory::new(config.memory)?;
    memory
        .initialize(Arc::new(InMemoryClient::new()), embedder)
        .await?;
    info!("memory worker serving on stdin/stdout");

    let stdin = BufReader::new(tokio::io::stdin());
    serve_lines(Arc::new(memory), stdin, tokio::io::stdout()).await
}

/// Feeds commands read from `input` to a worker and writes its events to `output`.
pub async fn serve_lines<R, W>(memory: Arc<TieredMemory>, input: R, output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (worker, events) = MemoryWorker::new(memory);
    let writer = tokio::spawn(write_events(events, output));

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("read command line")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Command>(line) {
            Ok(command) => {
                debug!(conversation_id = command.conversation_id(), "command received");
                worker.submit(command);
            }
            Err(e) => {
                warn!(error = %e, "malformed command line");
                worker.report_error(format!("malformed command: {}", e));
            }
        }
    }

    info!("input closed, draining queues");
    worker.shutdown().await;
    writer.await.context("event writer task")?
}

async fn write_events<W>(mut events: mpsc::UnboundedReceiver<Event>, mut output: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = events.recv().await {
        let mut line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "could not serialize event");
                continue;
            }
        };
        line.push('\n');
        output.write_all(line.as_bytes()).await.context("write event")?;
        output.flush().await.context("flush events")?;
    }
    Ok(())
}

/// Prints the chunk windows of `path`, one per line, prefixed by the chunk index.
pub async fn run_chunk(config: &WorkerConfig, path: &Path) -> Result<()> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    let chunker = Chunker::new(config.memory.chunk_size, config.memory.chunk_overlap)?;
    for (index, chunk) in chunker.chunk(&text).iter().enumerate() {
        println!("[{}] {}", index, chunk);
    }
    Ok(())
}
