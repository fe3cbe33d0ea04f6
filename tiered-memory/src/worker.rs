//! Command dispatcher with one serial queue per conversation.
//!
//! **Data flow:** [`MemoryWorker::submit`] → per-conversation queue →
//! `process_queue_loop` → [`TieredMemory`] → [`Event`]s on the channel returned by
//! [`MemoryWorker::new`].
//!
//! Commands of one conversation run in submission order; different
//! conversations run on independent tasks. A successful write puts a
//! maintenance job on its conversation's backlog, which runs before the next
//! queued command, so the write's ack is never held up by maintenance.
//!
//! A queue is released after a successful `delete-collection` when nothing else
//! is waiting on it; the next command for that conversation starts a new one.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::command::{Command, Event};
use crate::memory::TieredMemory;
use crate::types::{CollectionStatus, MaintenanceOutcome};

/// Work item of a conversation task.
enum Job {
    Command(Command),
    Maintenance,
}

struct ConversationQueue {
    sender: mpsc::UnboundedSender<Command>,
    handle: JoinHandle<()>,
}

type Queues = Arc<DashMap<String, ConversationQueue>>;

pub struct MemoryWorker {
    memory: Arc<TieredMemory>,
    events: mpsc::UnboundedSender<Event>,
    queues: Queues,
}

impl MemoryWorker {
    /// Creates a worker and the receiver of everything it emits.
    pub fn new(memory: Arc<TieredMemory>) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (events, rx) = mpsc::unbounded_channel();
        let worker = Self {
            memory,
            events,
            queues: Arc::new(DashMap::new()),
        };
        (worker, rx)
    }

    /// Queues `command` behind earlier commands of the same conversation.
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, command: Command) {
        let conversation_id = command.conversation_id().to_string();
        // Sent while the entry is held, so a queue is never released with a
        // command in flight.
        let sent = self
            .queues
            .entry(conversation_id.clone())
            .or_insert_with(|| self.spawn_queue(conversation_id.clone()))
            .sender
            .send(command);

        if let Err(e) = sent {
            error!(conversation_id = %conversation_id, "conversation queue closed");
            emit(
                &self.events,
                Event::Error {
                    message: "conversation queue closed".to_string(),
                    conversation_id: Some(conversation_id),
                    unit_id: None,
                },
            );
            debug!(command = ?e.0, "dropped command");
        }
    }

    /// Emits an `error` event not tied to any queue, e.g. for input that did
    /// not parse as a command.
    pub fn report_error(&self, message: impl Into<String>) {
        emit(
            &self.events,
            Event::Error {
                message: message.into(),
                conversation_id: None,
                unit_id: None,
            },
        );
    }

    /// Number of conversations with a live queue.
    pub fn active_conversations(&self) -> usize {
        self.queues.len()
    }

    /// Closes every queue and waits until queued work has finished.
    pub async fn shutdown(self) {
        let ids: Vec<String> = self.queues.iter().map(|e| e.key().clone()).collect();
        let queues: Vec<ConversationQueue> = ids
            .iter()
            .filter_map(|id| self.queues.remove(id).map(|(_, q)| q))
            .collect();
        info!(conversations = queues.len(), "memory worker shutting down");
        for queue in queues {
            drop(queue.sender);
            if let Err(e) = queue.handle.await {
                error!(error = %e, "conversation task failed");
            }
        }
    }

    fn spawn_queue(&self, conversation_id: String) -> ConversationQueue {
        let (sender, rx) = mpsc::unbounded_channel::<Command>();
        debug!(conversation_id = %conversation_id, "starting conversation queue");
        let handle = tokio::spawn(process_queue_loop(
            rx,
            self.memory.clone(),
            self.events.clone(),
            self.queues.clone(),
            conversation_id,
        ));
        ConversationQueue { sender, handle }
    }
}

fn emit(events: &mpsc::UnboundedSender<Event>, event: Event) {
    if events.send(event).is_err() {
        debug!("event receiver dropped");
    }
}

/// Runs the jobs of one conversation, one at a time.
async fn process_queue_loop(
    mut rx: mpsc::UnboundedReceiver<Command>,
    memory: Arc<TieredMemory>,
    events: mpsc::UnboundedSender<Event>,
    queues: Queues,
    conversation_id: String,
) {
    let mut backlog: VecDeque<Job> = VecDeque::new();
    loop {
        let job = match backlog.pop_front() {
            Some(job) => job,
            None => match rx.recv().await {
                Some(command) => Job::Command(command),
                None => break,
            },
        };

        match job {
            Job::Command(command) => match handle_command(&memory, &events, command).await {
                Next::Maintain => backlog.push_back(Job::Maintenance),
                Next::Release if backlog.is_empty() => release(&queues, &conversation_id, &rx),
                Next::Release | Next::Continue => {}
            },
            Job::Maintenance => run_maintenance_job(&memory, &events, &conversation_id).await,
        }
    }
    debug!(conversation_id = %conversation_id, "conversation queue drained");
}

/// What the queue does after a command.
enum Next {
    Continue,
    Maintain,
    /// The conversation's collections were dropped.
    Release,
}

/// Drops the queue's map entry if no command is waiting. The loop then ends once
/// the channel is empty, since the entry held the only sender.
fn release(queues: &Queues, conversation_id: &str, rx: &mpsc::UnboundedReceiver<Command>) {
    if queues.remove_if(conversation_id, |_, _| rx.is_empty()).is_some() {
        debug!(conversation_id, "conversation queue released");
    }
}

/// Executes one command and emits its events.
async fn handle_command(
    memory: &TieredMemory,
    events: &mpsc::UnboundedSender<Event>,
    command: Command,
) -> Next {
    match command {
        Command::AddToMemory {
            conversation_id,
            unit_id,
            text,
        } => match memory.add_to_memory(&conversation_id, &unit_id, &text).await {
            Ok(ack) => {
                emit(
                    events,
                    Event::AddToMemoryDone {
                        conversation_id,
                        unit_id: ack.unit_id,
                        chunks: ack.chunks,
                    },
                );
                if ack.chunks > 0 {
                    Next::Maintain
                } else {
                    Next::Continue
                }
            }
            Err(e) => {
                error!(error = %e, conversation_id = %conversation_id, %unit_id, "add-to-memory failed");
                emit(events, Event::from_error(&e));
                Next::Continue
            }
        },
        Command::GetContext {
            conversation_id,
            query,
            request_id,
            regeneration_instruction,
        } => {
            let context = match memory.get_context(&conversation_id, &query).await {
                Ok(context) => context,
                Err(e) => {
                    warn!(error = %e, conversation_id = %conversation_id, "get-context failed, answering without memory");
                    emit(events, Event::from_error(&e));
                    String::new()
                }
            };
            emit(
                events,
                Event::ContextRetrieved {
                    conversation_id,
                    context,
                    request_id,
                    regeneration_instruction,
                },
            );
            Next::Continue
        }
        Command::ArchiveData {
            conversation_id,
            unit_id,
            summary,
        } => {
            match memory.archive(&conversation_id, &unit_id, &summary).await {
                Ok(ack) => emit(
                    events,
                    Event::log(format!(
                        "unit {} of {} archived, {} chunks removed",
                        ack.unit_id, conversation_id, ack.removed_chunks
                    )),
                ),
                Err(e) => {
                    error!(error = %e, conversation_id = %conversation_id, %unit_id, "archive failed");
                    emit(events, Event::from_error(&e));
                }
            }
            Next::Continue
        }
        Command::CreateCollection { conversation_id } => {
            match memory.create_collection(&conversation_id).await {
                Ok(()) => emit(events, Event::CollectionReady { conversation_id }),
                Err(e) => emit(events, Event::from_error(&e)),
            }
            Next::Continue
        }
        Command::ClearCollection { conversation_id } => {
            match memory.clear_collection(&conversation_id).await {
                Ok(status) => {
                    log_absent(events, &conversation_id, status);
                    emit(events, Event::CollectionCleared { conversation_id });
                }
                Err(e) => emit(events, Event::from_error(&e)),
            }
            Next::Continue
        }
        Command::DeleteCollection { conversation_id } => {
            match memory.delete_collection(&conversation_id).await {
                Ok(status) => {
                    log_absent(events, &conversation_id, status);
                    emit(events, Event::CollectionDeleted { conversation_id });
                    Next::Release
                }
                Err(e) => {
                    emit(events, Event::from_error(&e));
                    Next::Continue
                }
            }
        }
        Command::GetStats { conversation_id } => {
            match memory.stats(&conversation_id).await {
                Ok(stats) => emit(
                    events,
                    Event::Stats {
                        conversation_id,
                        stats,
                    },
                ),
                Err(e) => emit(events, Event::from_error(&e)),
            }
            Next::Continue
        }
    }
}

fn log_absent(events: &mpsc::UnboundedSender<Event>, conversation_id: &str, status: CollectionStatus) {
    if status == CollectionStatus::Absent {
        info!(conversation_id, "collection absent, nothing to drop");
        emit(
            events,
            Event::log(format!("collections of {} did not exist", conversation_id)),
        );
    }
}

async fn run_maintenance_job(
    memory: &TieredMemory,
    events: &mpsc::UnboundedSender<Event>,
    conversation_id: &str,
) {
    match memory.run_maintenance(conversation_id).await {
        Ok(MaintenanceOutcome::SummarizationPending(requests)) => {
            for request in requests {
                emit(
                    events,
                    Event::SummarizeAndArchive {
                        conversation_id: request.conversation_id,
                        unit_id: request.unit_id,
                        full_text: request.full_text,
                    },
                );
            }
        }
        Ok(outcome) => debug!(conversation_id, ?outcome, "maintenance: nothing to archive"),
        Err(e) => {
            error!(error = %e, conversation_id, "maintenance failed");
            emit(events, Event::from_error(&e));
        }
    }
}
