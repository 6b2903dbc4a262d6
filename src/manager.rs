//! Stream manager: creates, tracks, stops and shuts down generation streams.
//!
//! ```text
//! create(request)
//!   │ validate ─► reserve slot ─► parse schema ─► DataGenerator
//!   │         ─► open_sink ─► GenerationController
//!   ▼
//! registry lock ─► spawn on WorkerPool ─► insert into `active`
//!                         │
//!                         ▼ (task end)
//!                  registry lock ─► move to `finished`
//! ```
//!
//! The spawn and the insertion happen under the same registry lock that the
//! task needs to remove itself, so a stream can never be removed before it
//! was inserted.

use crate::config::ManagerConfig;
use crate::controller::{panic_message, GenerationController, StreamState};
use crate::error::ManagerError;
use crate::pool::WorkerPool;
use crate::request::{CreateStreamRequest, CreateStreamResponse};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stream_generator::DataGenerator;
use stream_schema::JsonSchema;
use stream_sink::{open_sink, SinkKind};
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

pub type StreamId = Uuid;

/// Result of [`StreamManager::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Cancellation was requested; the stream stops at its next iteration.
    Signalled,
    /// The stream had already ended. Nothing was done.
    AlreadyFinished,
    /// No stream with this id is known. Nothing was done.
    NotFound,
}

/// Point-in-time view of one stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSummary {
    pub id: StreamId,
    pub output: SinkKind,
    pub state: StreamState,
    pub messages_sent: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// What [`StreamManager::shutdown`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Streams that were active when cancellation was signalled
    pub signalled: usize,
    /// Whether the grace period elapsed before every stream stopped
    pub timed_out: bool,
    /// Streams abandoned after the grace period
    pub aborted: Vec<StreamId>,
}

struct StreamEntry {
    output: SinkKind,
    cancel: CancellationToken,
    state: watch::Receiver<StreamState>,
    sent: Arc<AtomicU64>,
    started_at: DateTime<Utc>,
    abort: AbortHandle,
}

impl StreamEntry {
    fn summary(&self, id: StreamId) -> StreamSummary {
        StreamSummary {
            id,
            output: self.output,
            state: *self.state.borrow(),
            messages_sent: self.sent.load(Ordering::Relaxed),
            started_at: self.started_at,
            finished_at: None,
        }
    }

    fn into_finished(self, id: StreamId, state: StreamState) -> StreamSummary {
        StreamSummary {
            state,
            finished_at: Some(Utc::now()),
            ..self.summary(id)
        }
    }
}

#[derive(Default)]
struct Registry {
    active: HashMap<StreamId, StreamEntry>,
    /// Oldest first, bounded by `finished_retention`
    finished: VecDeque<StreamSummary>,
}

impl Registry {
    fn record_finished(&mut self, summary: StreamSummary, retention: usize) {
        self.finished.push_back(summary);
        while self.finished.len() > retention {
            self.finished.pop_front();
        }
    }

    fn finished(&self, id: &StreamId) -> Option<&StreamSummary> {
        self.finished.iter().rev().find(|s| &s.id == id)
    }
}

struct Shared {
    config: ManagerConfig,
    pool: WorkerPool,
    registry: Mutex<Registry>,
    idle: Notify,
    shutting_down: AtomicBool,
}

impl Shared {
    /// Called by the stream task itself once its controller has returned.
    async fn finish(&self, id: StreamId, outcome: StreamState) {
        let mut registry = self.registry.lock().await;
        if let Some(entry) = registry.active.remove(&id) {
            let summary = entry.into_finished(id, outcome);
            info!(
                "Stream {} finished: {} ({} messages)",
                id, outcome, summary.messages_sent
            );
            registry.record_finished(summary, self.config.finished_retention);
        }
        if registry.active.is_empty() {
            self.idle.notify_waiters();
        }
    }
}

/// Owns the worker pool and the registry of streams.
///
/// Cheap to clone; all clones share the same streams.
#[derive(Clone)]
pub struct StreamManager {
    shared: Arc<Shared>,
}

impl StreamManager {
    pub fn new(config: ManagerConfig) -> Self {
        info!(
            "StreamManager initialized (max streams: {})",
            config
                .max_concurrent_streams
                .map_or_else(|| "unbounded".to_string(), |n| n.to_string())
        );
        Self {
            shared: Arc::new(Shared {
                pool: WorkerPool::new(config.max_concurrent_streams),
                config,
                registry: Mutex::new(Registry::default()),
                idle: Notify::new(),
                shutting_down: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.shared.config
    }

    /// Validate the request, build the stream and launch it.
    ///
    /// Nothing is launched unless every step succeeds.
    pub async fn create(&self, request: &CreateStreamRequest) -> Result<StreamId, ManagerError> {
        if self.is_shutting_down() {
            return Err(ManagerError::ShuttingDown);
        }
        let plan = request.validate()?;
        let slot = self
            .shared
            .pool
            .try_reserve()
            .map_err(ManagerError::Capacity)?;

        let schema = Arc::new(JsonSchema::parse(&plan.schema_content)?);
        let generator = match plan.seed {
            Some(seed) => DataGenerator::with_seed(schema, seed)?,
            None => DataGenerator::new(schema)?,
        };
        let sink = open_sink(&plan.sink).await?;
        let output = sink.kind();

        let id = Uuid::new_v4();
        let controller = GenerationController::new(generator, sink, plan.limits)
            .with_yield_every(self.shared.config.yield_every)
            .with_label(id.to_string());
        let state = controller.subscribe();
        let sent = controller.sent_counter();
        let cancel = self.shared.pool.child_token();

        let mut registry = self.shared.registry.lock().await;
        if self.is_shutting_down() {
            return Err(ManagerError::ShuttingDown);
        }

        let shared = Arc::clone(&self.shared);
        let task_cancel = cancel.clone();
        let handle = self.shared.pool.spawn(slot, async move {
            // Deregistration must happen however the controller ends
            let outcome = match AssertUnwindSafe(controller.run(task_cancel))
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(panic) => {
                    error!("Stream {} panicked: {}", id, panic_message(panic.as_ref()));
                    StreamState::Failed
                }
            };
            shared.finish(id, outcome).await;
        });
        registry.active.insert(
            id,
            StreamEntry {
                output,
                cancel,
                state,
                sent,
                started_at: Utc::now(),
                abort: handle.abort_handle(),
            },
        );
        drop(registry);

        info!("Stream {} submitted ({} output)", id, output);
        Ok(id)
    }

    /// [`create`](Self::create), reported as a response DTO.
    pub async fn submit(&self, request: &CreateStreamRequest) -> CreateStreamResponse {
        match self.create(request).await {
            Ok(id) => CreateStreamResponse::submitted(id.to_string()),
            Err(e) => {
                error!("Failed to create stream: {}", e);
                CreateStreamResponse::error(e.to_string())
            }
        }
    }

    /// Request cancellation of one stream. Safe to repeat.
    pub async fn stop(&self, id: &StreamId) -> StopOutcome {
        let registry = self.shared.registry.lock().await;
        if let Some(entry) = registry.active.get(id) {
            entry.cancel.cancel();
            info!("Stop signal sent to stream {}", id);
            return StopOutcome::Signalled;
        }
        if registry.finished(id).is_some() {
            return StopOutcome::AlreadyFinished;
        }
        warn!("Stream not found for stopping: {}", id);
        StopOutcome::NotFound
    }

    pub async fn status(&self, id: &StreamId) -> Option<StreamSummary> {
        let registry = self.shared.registry.lock().await;
        match registry.active.get(id) {
            Some(entry) => Some(entry.summary(*id)),
            None => registry.finished(id).cloned(),
        }
    }

    /// All known streams, oldest first.
    pub async fn list(&self) -> Vec<StreamSummary> {
        let registry = self.shared.registry.lock().await;
        let mut summaries: Vec<StreamSummary> = registry
            .finished
            .iter()
            .cloned()
            .chain(registry.active.iter().map(|(id, e)| e.summary(*id)))
            .collect();
        summaries.sort_by_key(|s| s.started_at);
        summaries
    }

    pub async fn active_count(&self) -> usize {
        self.shared.registry.lock().await.active.len()
    }

    /// Resolve once no stream is active.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.shared.registry.lock().await.active.is_empty() {
                return;
            }
            notified.await;
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shared.shutting_down.load(Ordering::SeqCst)
    }

    /// Stop accepting streams, cancel all of them and wait up to `grace`.
    ///
    /// Streams still running after `grace` are aborted and recorded as
    /// cancelled. Calling this again is harmless.
    pub async fn shutdown(&self, grace: Duration) -> ShutdownReport {
        let signalled = {
            let registry = self.shared.registry.lock().await;
            self.shared.shutting_down.store(true, Ordering::SeqCst);
            registry.active.len()
        };

        if self.shared.pool.close() {
            info!(
                "Shutting down StreamManager: signalling {} active stream(s)",
                signalled
            );
        }
        self.shared.pool.cancel_all();

        let timed_out = tokio::time::timeout(grace, self.shared.pool.wait())
            .await
            .is_err();

        let mut aborted = Vec::new();
        if timed_out {
            let mut registry = self.shared.registry.lock().await;
            let stragglers: Vec<StreamId> = registry.active.keys().copied().collect();
            for id in stragglers {
                if let Some(entry) = registry.active.remove(&id) {
                    entry.abort.abort();
                    let summary = entry.into_finished(id, StreamState::Cancelled);
                    registry.record_finished(summary, self.shared.config.finished_retention);
                    aborted.push(id);
                }
            }
            warn!(
                "Shutdown grace period of {:?} elapsed; abandoned {} stream(s)",
                grace,
                aborted.len()
            );
            self.shared.idle.notify_waiters();
        } else {
            info!("All streams stopped");
        }

        ShutdownReport {
            signalled,
            timed_out,
            aborted,
        }
    }
}

impl Default for StreamManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}
