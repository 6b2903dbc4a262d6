//! Buffering layer shared by every sink variant.
//!
//! A single async mutex guards the pending buffer together with the
//! destination, so a timer flush and a size-triggered flush can never
//! interleave or reorder records.

use crate::error::{DeliveryFailure, SinkError};
use crate::sink::{Destination, Sink, SinkKind};
use std::sync::Arc;
use std::time::Duration;
use stream_schema::GeneratedRecord;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// How long `close` waits for an in-flight timer flush before aborting it.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Records kept for retry after failed deliveries, per batch size.
const RETAINED_BATCHES: usize = 100;

/// Batching parameters for a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSettings {
    /// Buffer length that triggers a delivery from `send`.
    pub batch_size: usize,
    /// Period of the background flush timer.
    pub flush_interval: Duration,
    /// Upper bound on buffered records while deliveries keep failing.
    pub max_retained: usize,
    pub close_timeout: Duration,
}

impl BatchSettings {
    pub fn new(batch_size: usize, flush_interval: Duration) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            flush_interval,
            max_retained: batch_size.saturating_mul(RETAINED_BATCHES),
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }

    pub fn with_max_retained(mut self, max_retained: usize) -> Self {
        self.max_retained = max_retained.max(self.batch_size);
        self
    }

    pub fn with_close_timeout(mut self, close_timeout: Duration) -> Self {
        self.close_timeout = close_timeout;
        self
    }
}

struct BatchState<D> {
    buffer: Vec<GeneratedRecord>,
    destination: Option<D>,
    closed: bool,
}

impl<D: Destination> BatchState<D> {
    /// Deliver the whole buffer. The delivered prefix is always removed.
    async fn flush(&mut self, max_retained: usize) -> Result<usize, DeliveryFailure> {
        if self.buffer.is_empty() {
            return Ok(0);
        }
        let Some(destination) = self.destination.as_mut() else {
            return Ok(0);
        };

        match destination.deliver(&self.buffer).await {
            Ok(()) => {
                let delivered = self.buffer.len();
                self.buffer.clear();
                Ok(delivered)
            }
            Err(failure) => {
                let delivered = failure.delivered.min(self.buffer.len());
                self.buffer.drain(..delivered);
                self.enforce_retention(max_retained);
                Err(failure)
            }
        }
    }

    fn enforce_retention(&mut self, max_retained: usize) {
        if self.buffer.len() > max_retained {
            let overflow = self.buffer.len() - max_retained;
            error!(
                "Dropping {} undelivered record(s): retry buffer exceeds {} records",
                overflow, max_retained
            );
            self.buffer.drain(..overflow);
        }
    }
}

/// A [`Sink`] that buffers records and hands them to a [`Destination`] in
/// batches, either when the buffer is full or when the flush timer fires.
///
/// Must be created inside a tokio runtime: the flush timer is spawned on
/// construction.
pub struct BatchingSink<D: Destination> {
    kind: SinkKind,
    settings: BatchSettings,
    state: Arc<Mutex<BatchState<D>>>,
    timer_cancel: CancellationToken,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl<D: Destination> BatchingSink<D> {
    pub fn new(destination: D, settings: BatchSettings) -> Self {
        let kind = destination.kind();
        let state = Arc::new(Mutex::new(BatchState {
            buffer: Vec::with_capacity(settings.batch_size),
            destination: Some(destination),
            closed: false,
        }));
        let timer_cancel = CancellationToken::new();
        let timer = spawn_flush_timer(
            Arc::clone(&state),
            settings.clone(),
            timer_cancel.clone(),
            kind,
        );

        Self {
            kind,
            settings,
            state,
            timer_cancel,
            timer: Mutex::new(Some(timer)),
        }
    }

    /// Number of records waiting for delivery.
    #[cfg(test)]
    pub(crate) async fn pending(&self) -> usize {
        self.state.lock().await.buffer.len()
    }

    async fn stop_timer(&self) {
        self.timer_cancel.cancel();
        let Some(mut handle) = self.timer.lock().await.take() else {
            return;
        };
        if tokio::time::timeout(self.settings.close_timeout, &mut handle)
            .await
            .is_err()
        {
            warn!(
                "{} sink flush timer did not stop within {:?}, aborting it",
                self.kind, self.settings.close_timeout
            );
            handle.abort();
        }
    }
}

fn spawn_flush_timer<D: Destination>(
    state: Arc<Mutex<BatchState<D>>>,
    settings: BatchSettings,
    cancel: CancellationToken,
    kind: SinkKind,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(settings.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let mut state = state.lock().await;
                    if state.closed {
                        break;
                    }
                    match state.flush(settings.max_retained).await {
                        Ok(0) => {}
                        Ok(n) => debug!("{} sink timer flushed {} record(s)", kind, n),
                        Err(e) => warn!("{} sink timer flush failed: {}", kind, e),
                    }
                }
            }
        }
        debug!("{} sink flush timer stopped", kind);
    })
}

#[async_trait::async_trait]
impl<D: Destination> Sink for BatchingSink<D> {
    async fn send(&self, record: GeneratedRecord) -> Result<(), SinkError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(SinkError::Closed);
        }

        state.buffer.push(record);
        if state.buffer.len() >= self.settings.batch_size {
            if let Err(e) = state.flush(self.settings.max_retained).await {
                warn!("{} sink batch delivery failed: {}", self.kind, e);
            }
        }
        Ok(())
    }

    async fn flush(&self) -> Result<(), SinkError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Ok(());
        }
        state.flush(self.settings.max_retained).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.stop_timer().await;

        let mut state = self.state.lock().await;
        if state.closed {
            return Ok(());
        }
        if let Err(e) = state.flush(self.settings.max_retained).await {
            error!("{} sink final flush failed: {}", self.kind, e);
        }
        if !state.buffer.is_empty() {
            error!(
                "{} sink closed with {} undelivered record(s)",
                self.kind,
                state.buffer.len()
            );
            state.buffer.clear();
        }
        state.closed = true;

        match state.destination.take() {
            Some(mut destination) => destination.release().await,
            None => Ok(()),
        }
    }

    fn kind(&self) -> SinkKind {
        self.kind
    }
}

impl<D: Destination> Drop for BatchingSink<D> {
    fn drop(&mut self) {
        self.timer_cancel.cancel();
    }
}
