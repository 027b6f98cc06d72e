//! Per-conversation task poll loop.
//!
//! Observes the server-side task forest for one conversation on a fixed
//! interval until every child task is terminal, the attempt budget runs
//! out, or a fetch fails. Loops are single-flight per conversation id and
//! tracked in a handle registry, so there are no free-running timers:
//! starting, stopping, and overlap prevention are all explicit and
//! testable.
//!
//! Status transitions are server-driven; the loop only observes. Stopping
//! a loop never cancels server-side work, and a later start resumes
//! observation of whatever state the tasks are actually in.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::TransportError;
use crate::domain::models::{ConversationId, PollerConfig, TaskId, TaskQueueSnapshot};
use crate::domain::ports::TaskFeed;
use crate::services::event_bus::{EventBus, OrchestratorEvent, StopReason};
use crate::services::reconciler::Reconciler;

type LoopRegistry = Arc<Mutex<HashMap<ConversationId, JoinHandle<()>>>>;

/// Drives poll loops over the task feed and keeps the store fresh through
/// the reconciler.
pub struct TaskPoller {
    feed: Arc<dyn TaskFeed>,
    reconciler: Arc<Reconciler>,
    events: EventBus,
    interval: Duration,
    max_attempts: u32,
    added_debounce: Duration,
    loops: LoopRegistry,
}

impl TaskPoller {
    pub fn new(
        feed: Arc<dyn TaskFeed>,
        reconciler: Arc<Reconciler>,
        events: EventBus,
        config: &PollerConfig,
    ) -> Self {
        Self {
            feed,
            reconciler,
            events,
            interval: Duration::from_millis(config.interval_ms),
            max_attempts: config.max_attempts,
            added_debounce: Duration::from_millis(config.added_debounce_ms),
            loops: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start a poll loop for a conversation. No-op while a loop is already
    /// running for the same id; returns whether a new loop was spawned.
    #[instrument(skip(self), fields(conversation = %id))]
    pub fn start(self: &Arc<Self>, id: &ConversationId) -> bool {
        let mut loops = self
            .loops
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = loops.get(id) {
            if !handle.is_finished() {
                debug!("poll loop already running, ignoring start");
                return false;
            }
        }
        let poller = Arc::clone(self);
        let conversation = id.clone();
        let handle = tokio::spawn(async move {
            poller.run_loop(conversation).await;
        });
        loops.insert(id.clone(), handle);
        info!("poll loop started");
        true
    }

    /// Stop observing a conversation (e.g. it was switched away from).
    ///
    /// Only the observation loop stops; in-flight server-side tasks are
    /// untouched and no final refresh is performed.
    pub fn stop(&self, id: &ConversationId) {
        let mut loops = self
            .loops
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = loops.remove(id) {
            handle.abort();
            debug!(conversation = %id, "poll loop aborted");
        }
    }

    /// Abort every running loop. Used at shutdown; server-side work is
    /// untouched.
    pub fn stop_all(&self) {
        let mut loops = self
            .loops
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for (id, handle) in loops.drain() {
            handle.abort();
            debug!(conversation = %id, "poll loop aborted");
        }
    }

    /// Whether a poll loop is currently running for this conversation.
    pub fn is_polling(&self, id: &ConversationId) -> bool {
        let loops = self
            .loops
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loops.get(id).is_some_and(|handle| !handle.is_finished())
    }

    /// Issue an advisory cancellation for one child task, then restart
    /// polling immediately rather than waiting for the next scheduled
    /// tick, so the cancellation outcome is observed promptly.
    #[instrument(skip(self), fields(conversation = %conversation, task = %task))]
    pub async fn cancel_task(
        self: &Arc<Self>,
        conversation: &ConversationId,
        task: &TaskId,
    ) -> Result<(), TransportError> {
        self.feed.cancel(task).await?;
        info!("cancellation requested, restarting poll loop");
        self.stop(conversation);
        self.start(conversation);
        Ok(())
    }

    async fn run_loop(self: Arc<Self>, id: ConversationId) {
        let reason = self.poll_until_stopped(&id).await;

        // Exactly one final refresh on every termination path, so the
        // caller's state is never left stale even on budget exhaustion.
        if let Err(err) = self.reconciler.refresh(&id).await {
            warn!(error = %err, conversation = %id, "final refresh failed");
        }
        info!(conversation = %id, %reason, "poll loop stopped");
        self.events.emit(OrchestratorEvent::PollerStopped {
            conversation_id: id.clone(),
            reason,
        });

        let mut loops = self
            .loops
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loops.remove(&id);
    }

    async fn poll_until_stopped(&self, id: &ConversationId) -> StopReason {
        let mut interval = tokio::time::interval(self.interval);
        let mut previous: Option<TaskQueueSnapshot> = None;
        let mut last_added_emit: Option<Instant> = None;
        let mut attempts: u32 = 0;

        loop {
            // The first tick fires immediately; a slow iteration makes the
            // next tick fire as soon as the iteration completes.
            interval.tick().await;
            attempts += 1;

            let snapshot = match self.feed.fetch(id).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!(error = %err, conversation = %id, attempt = attempts, "task fetch failed");
                    return StopReason::Error;
                }
            };
            debug!(
                conversation = %id,
                attempt = attempts,
                children = snapshot.total_child_count(),
                "fetched task snapshot"
            );

            if let Some(previous) = &previous {
                if snapshot.total_child_count() > previous.total_child_count() {
                    let due = last_added_emit
                        .is_none_or(|at| at.elapsed() >= self.added_debounce);
                    if due {
                        self.events.emit(OrchestratorEvent::TasksAdded {
                            conversation_id: id.clone(),
                            total_children: snapshot.total_child_count(),
                        });
                        last_added_emit = Some(Instant::now());
                    }
                }

                let completed = snapshot.newly_done(previous);
                if !completed.is_empty() {
                    for task in &completed {
                        self.events.emit(OrchestratorEvent::TaskCompleted {
                            conversation_id: id.clone(),
                            task_id: task.id.clone(),
                            job_name: task.job_name.clone(),
                        });
                    }
                    // Surface each finished unit as soon as it lands
                    // instead of waiting for the whole batch.
                    if let Err(err) = self.reconciler.refresh(id).await {
                        warn!(error = %err, conversation = %id, "completion refresh failed");
                    }
                }
            }

            // An empty queue is not an error: nothing to wait for.
            let finished = snapshot.is_empty() || snapshot.all_terminal();
            previous = Some(snapshot);

            if finished {
                return StopReason::Complete;
            }
            if attempts >= self.max_attempts {
                return StopReason::BudgetExhausted;
            }
        }
    }
}
