//! Generation controller: drives one generator into one sink.
//!
//! ```text
//! Idle ──run()──► Running ──► Completed  (message or time limit reached)
//!                        ├──► Cancelled  (token cancelled)
//!                        └──► Failed     (generation or send error)
//! ```
//!
//! The state is published on a `watch` channel so the stream manager can
//! report it without touching the running task.

use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use stream_generator::DataGenerator;
use stream_sink::Sink;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Records between cooperative yields to the scheduler.
pub const DEFAULT_YIELD_EVERY: u64 = 100;

/// Records between progress log lines.
const PROGRESS_LOG_EVERY: u64 = 1000;

/// Lifecycle of a generation stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl StreamState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stopping criteria. With neither limit the stream runs until cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopLimits {
    pub max_messages: Option<u64>,
    pub max_duration: Option<Duration>,
}

impl StopLimits {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn messages(max_messages: u64) -> Self {
        Self {
            max_messages: Some(max_messages),
            max_duration: None,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_messages.is_none() && self.max_duration.is_none()
    }
}

pub struct GenerationController {
    generator: DataGenerator,
    sink: Box<dyn Sink>,
    limits: StopLimits,
    yield_every: u64,
    label: String,
    state: watch::Sender<StreamState>,
    sent: Arc<AtomicU64>,
}

impl GenerationController {
    pub fn new(generator: DataGenerator, sink: Box<dyn Sink>, limits: StopLimits) -> Self {
        let (state, _) = watch::channel(StreamState::Idle);
        Self {
            generator,
            sink,
            limits,
            yield_every: DEFAULT_YIELD_EVERY,
            label: "stream".to_string(),
            state,
            sent: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_yield_every(mut self, yield_every: u64) -> Self {
        self.yield_every = yield_every.max(1);
        self
    }

    /// Name used in log lines, usually the stream id.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<StreamState> {
        self.state.subscribe()
    }

    /// Shared counter of records accepted by the sink.
    pub fn sent_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.sent)
    }

    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Generate until a stopping condition, then flush and close the sink.
    ///
    /// The sink is closed exactly once whatever the exit reason, a panic
    /// inside generation or delivery included, and the terminal state is
    /// published after it has been released.
    pub async fn run(mut self, cancel: CancellationToken) -> StreamState {
        self.state.send_replace(StreamState::Running);
        self.log_start();

        let result = AssertUnwindSafe(self.generate_until_stopped(&cancel))
            .catch_unwind()
            .await;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(panic) => {
                error!(
                    "[{}] Generation panicked: {}",
                    self.label,
                    panic_message(panic.as_ref())
                );
                StreamState::Failed
            }
        };
        self.release_sink().await;

        info!(
            "[{}] Generation finished ({}). Generated {} messages",
            self.label,
            outcome,
            self.sent.load(Ordering::Relaxed)
        );
        self.state.send_replace(outcome);
        outcome
    }

    fn log_start(&self) {
        info!("[{}] Starting data generation", self.label);
        if let Some(max) = self.limits.max_messages {
            info!("[{}] Will generate up to {} messages", self.label, max);
        }
        if let Some(max) = self.limits.max_duration {
            info!("[{}] Will generate for up to {:?}", self.label, max);
        }
        if self.limits.is_unlimited() {
            info!("[{}] Running in unlimited mode until cancelled", self.label);
        }
    }

    async fn generate_until_stopped(&mut self, cancel: &CancellationToken) -> StreamState {
        let started = Instant::now();

        loop {
            if cancel.is_cancelled() {
                info!("[{}] Generation cancelled", self.label);
                return StreamState::Cancelled;
            }
            if let Some(max) = self.limits.max_messages {
                if self.sent.load(Ordering::Relaxed) >= max {
                    info!("[{}] Reached maximum message count of {}", self.label, max);
                    return StreamState::Completed;
                }
            }
            if let Some(max) = self.limits.max_duration {
                if started.elapsed() >= max {
                    info!("[{}] Reached maximum time of {:?}", self.label, max);
                    return StreamState::Completed;
                }
            }

            let record = match self.generator.next_record() {
                Ok(record) => record,
                Err(e) => {
                    error!("[{}] Record generation failed: {}", self.label, e);
                    return StreamState::Failed;
                }
            };
            if let Err(e) = self.sink.send(record).await {
                error!("[{}] Sink rejected record: {}", self.label, e);
                return StreamState::Failed;
            }

            let count = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
            if count % PROGRESS_LOG_EVERY == 0 {
                info!("[{}] Generated {} messages", self.label, count);
            }
            if count % self.yield_every == 0 {
                tokio::task::yield_now().await;
            }
        }
    }

    async fn release_sink(&self) {
        if let Err(e) = self.sink.flush().await {
            warn!("[{}] Final flush failed: {}", self.label, e);
        }
        if let Err(e) = self.sink.close().await {
            error!(
                "[{}] Failed to close {} sink: {}",
                self.label,
                self.sink.kind(),
                e
            );
        }
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use stream_schema::{FieldDefinition, FieldType, GeneratedRecord, JsonSchema};
    use stream_sink::{SinkError, SinkKind};

    #[derive(Default)]
    struct Counters {
        sends: AtomicUsize,
        flushes: AtomicUsize,
        closes: AtomicUsize,
        sends_after_close: AtomicUsize,
    }

    /// Sink that only counts calls.
    struct CountingSink {
        counters: Arc<Counters>,
        fail_send_after: Option<usize>,
        fail_close: bool,
    }

    impl CountingSink {
        fn boxed(counters: &Arc<Counters>) -> Box<dyn Sink> {
            Box::new(Self {
                counters: Arc::clone(counters),
                fail_send_after: None,
                fail_close: false,
            })
        }
    }

    #[async_trait::async_trait]
    impl Sink for CountingSink {
        async fn send(&self, _record: GeneratedRecord) -> Result<(), SinkError> {
            if self.counters.closes.load(Ordering::SeqCst) > 0 {
                self.counters.sends_after_close.fetch_add(1, Ordering::SeqCst);
                return Err(SinkError::Closed);
            }
            let sent = self.counters.sends.fetch_add(1, Ordering::SeqCst);
            match self.fail_send_after {
                Some(n) if sent >= n => Err(SinkError::Closed),
                _ => Ok(()),
            }
        }

        async fn flush(&self) -> Result<(), SinkError> {
            self.counters.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn close(&self) -> Result<(), SinkError> {
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                return Err(SinkError::InvalidConfig("close failed".into()));
            }
            Ok(())
        }

        fn kind(&self) -> SinkKind {
            SinkKind::Console
        }
    }

    /// Sink whose `send` panics, as a buggy destination would.
    struct PanickingSink {
        counters: Arc<Counters>,
    }

    #[async_trait::async_trait]
    impl Sink for PanickingSink {
        async fn send(&self, _record: GeneratedRecord) -> Result<(), SinkError> {
            panic!("send exploded");
        }

        async fn flush(&self) -> Result<(), SinkError> {
            self.counters.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn close(&self) -> Result<(), SinkError> {
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn kind(&self) -> SinkKind {
            SinkKind::File
        }
    }

    fn generator() -> DataGenerator {
        let schema = JsonSchema::parse(
            r#"{"type": "object", "properties": {"id": {"type": "integer"}}}"#,
        )
        .unwrap();
        DataGenerator::with_seed(Arc::new(schema), 1).unwrap()
    }

    #[tokio::test]
    async fn test_max_messages_completes_after_exact_count() {
        let counters = Arc::new(Counters::default());
        let controller = GenerationController::new(
            generator(),
            CountingSink::boxed(&counters),
            StopLimits::messages(5),
        );
        let state_rx = controller.subscribe();
        let sent = controller.sent_counter();

        let state = controller.run(CancellationToken::new()).await;

        assert_eq!(state, StreamState::Completed);
        assert_eq!(*state_rx.borrow(), StreamState::Completed);
        assert_eq!(counters.sends.load(Ordering::SeqCst), 5);
        assert_eq!(sent.load(Ordering::SeqCst), 5);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
        assert!(counters.flushes.load(Ordering::SeqCst) >= 1);
        assert_eq!(counters.sends_after_close.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pre_cancelled_sends_nothing() {
        let counters = Arc::new(Counters::default());
        let controller = GenerationController::new(
            generator(),
            CountingSink::boxed(&counters),
            StopLimits::unlimited(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(controller.run(cancel).await, StreamState::Cancelled);
        assert_eq!(counters.sends.load(Ordering::SeqCst), 0);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_max_messages_completes_immediately() {
        let counters = Arc::new(Counters::default());
        let controller = GenerationController::new(
            generator(),
            CountingSink::boxed(&counters),
            StopLimits::messages(0),
        );

        assert_eq!(
            controller.run(CancellationToken::new()).await,
            StreamState::Completed
        );
        assert_eq!(counters.sends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancellation_takes_priority_over_limits() {
        let counters = Arc::new(Counters::default());
        let controller = GenerationController::new(
            generator(),
            CountingSink::boxed(&counters),
            StopLimits::messages(0),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(controller.run(cancel).await, StreamState::Cancelled);
    }

    #[tokio::test]
    async fn test_time_limit_completes() {
        let counters = Arc::new(Counters::default());
        let limits = StopLimits {
            max_messages: None,
            max_duration: Some(Duration::from_millis(50)),
        };
        let controller =
            GenerationController::new(generator(), CountingSink::boxed(&counters), limits);

        let started = Instant::now();
        assert_eq!(
            controller.run(CancellationToken::new()).await,
            StreamState::Completed
        );
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(counters.sends.load(Ordering::SeqCst) > 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unlimited_runs_until_cancelled() {
        let counters = Arc::new(Counters::default());
        let controller = GenerationController::new(
            generator(),
            CountingSink::boxed(&counters),
            StopLimits::unlimited(),
        )
        .with_yield_every(10);
        let mut state_rx = controller.subscribe();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(controller.run(cancel.clone()));
        state_rx
            .wait_for(|s| *s == StreamState::Running)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        assert_eq!(task.await.unwrap(), StreamState::Cancelled);
        assert!(counters.sends.load(Ordering::SeqCst) > 0);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_send_failure_fails_stream_and_closes_sink() {
        let counters = Arc::new(Counters::default());
        let sink = Box::new(CountingSink {
            counters: Arc::clone(&counters),
            fail_send_after: Some(3),
            fail_close: false,
        });
        let controller = GenerationController::new(generator(), sink, StopLimits::messages(10));
        let sent = controller.sent_counter();

        assert_eq!(
            controller.run(CancellationToken::new()).await,
            StreamState::Failed
        );
        assert_eq!(sent.load(Ordering::SeqCst), 3);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_fails_stream() {
        let counters = Arc::new(Counters::default());
        let schema = JsonSchema::new(
            "object",
            vec![(
                "when".to_string(),
                FieldDefinition::new(FieldType::Unsupported("date".to_string())),
            )],
        );
        let generator = DataGenerator::with_seed(Arc::new(schema), 1).unwrap();
        let controller = GenerationController::new(
            generator,
            CountingSink::boxed(&counters),
            StopLimits::messages(5),
        );

        assert_eq!(
            controller.run(CancellationToken::new()).await,
            StreamState::Failed
        );
        assert_eq!(counters.sends.load(Ordering::SeqCst), 0);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_failure_does_not_mask_outcome() {
        let counters = Arc::new(Counters::default());
        let sink = Box::new(CountingSink {
            counters: Arc::clone(&counters),
            fail_send_after: None,
            fail_close: true,
        });
        let controller = GenerationController::new(generator(), sink, StopLimits::messages(2));

        assert_eq!(
            controller.run(CancellationToken::new()).await,
            StreamState::Completed
        );
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(StreamState::Cancelled.to_string(), "cancelled");
        assert!(StreamState::Failed.is_terminal());
        assert!(!StreamState::Running.is_terminal());
        assert_eq!(
            serde_json::to_string(&StreamState::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[tokio::test]
    async fn test_panic_fails_stream_and_still_closes_sink() {
        let counters = Arc::new(Counters::default());
        let sink = Box::new(PanickingSink {
            counters: Arc::clone(&counters),
        });
        let controller = GenerationController::new(generator(), sink, StopLimits::messages(1));
        let state_rx = controller.subscribe();

        let state = controller.run(CancellationToken::new()).await;

        assert_eq!(state, StreamState::Failed);
        assert_eq!(*state_rx.borrow(), StreamState::Failed);
        assert_eq!(counters.flushes.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panic_message_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("static text");
        assert_eq!(panic_message(payload.as_ref()), "static text");

        let payload: Box<dyn Any + Send> = Box::new(format!("code {}", 7));
        assert_eq!(panic_message(payload.as_ref()), "code 7");

        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
