//! Worker pool owned by the stream manager.
//!
//! Every stream runs as one task on this pool. The pool owns a root
//! cancellation token; each stream gets a child token, so cancelling the
//! root reaches every stream while a single stream can still be stopped on
//! its own.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// A reserved execution slot. Released when dropped.
#[derive(Debug)]
pub struct Slot {
    _permit: Option<OwnedSemaphorePermit>,
}

pub struct WorkerPool {
    tracker: TaskTracker,
    slots: Option<Arc<Semaphore>>,
    capacity: Option<usize>,
    root: CancellationToken,
}

impl WorkerPool {
    /// Create a pool. `None` means elastic: no limit on concurrent streams.
    pub fn new(max_concurrent: Option<usize>) -> Self {
        Self {
            tracker: TaskTracker::new(),
            slots: max_concurrent.map(|n| Arc::new(Semaphore::new(n))),
            capacity: max_concurrent,
            root: CancellationToken::new(),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Reserve a slot without waiting. Returns the capacity when full.
    pub fn try_reserve(&self) -> Result<Slot, usize> {
        match &self.slots {
            None => Ok(Slot { _permit: None }),
            Some(slots) => Arc::clone(slots)
                .try_acquire_owned()
                .map(|permit| Slot {
                    _permit: Some(permit),
                })
                .map_err(|_| self.capacity.unwrap_or(0)),
        }
    }

    /// A cancellation token that fires when this stream or the whole pool
    /// is cancelled.
    pub fn child_token(&self) -> CancellationToken {
        self.root.child_token()
    }

    /// Run `task` on the pool, holding `slot` until it finishes.
    pub fn spawn<F>(&self, slot: Slot, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(async move {
            let _slot = slot;
            task.await
        })
    }

    /// Stop accepting work. Returns `false` if the pool was already closed.
    pub fn close(&self) -> bool {
        self.tracker.close()
    }

    /// Cancel every stream token handed out by this pool.
    pub fn cancel_all(&self) {
        self.root.cancel();
    }

    /// Wait until the pool is closed and every task has finished.
    pub async fn wait(&self) {
        self.tracker.wait().await;
    }

    /// Number of tasks still running.
    pub fn running(&self) -> usize {
        self.tracker.len()
    }
}
