//! Fire-and-forget background tasks.
//!
//! Derived state (weights, trust, item aggregates) is recomputed off the
//! request path. A [`TaskSpawner`] accepts a named future and runs it at most
//! once, with no retry. Errors are logged at `warn`; panics are caught and
//! logged at `error` as internal faults. Neither reaches the caller that
//! submitted the task.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};

use crate::error::{EngineError, EngineResult};

/// A unit of background work.
pub type Task = BoxFuture<'static, EngineResult<()>>;

/// Capability to run background tasks.
pub trait TaskSpawner: Send + Sync {
    /// Submit a task. Returns immediately; the task is never awaited by the caller.
    fn spawn(&self, name: &'static str, task: Task);
}

/// Outcome counters of a dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    /// Tasks submitted.
    pub spawned: u64,
    /// Tasks that returned `Ok`.
    pub succeeded: u64,
    /// Tasks that returned `Err`.
    pub failed: u64,
    /// Tasks that panicked.
    pub panicked: u64,
}

impl DispatchStats {
    /// Tasks submitted but not yet finished.
    #[must_use]
    pub const fn in_flight(&self) -> u64 {
        self.spawned
            .saturating_sub(self.succeeded + self.failed + self.panicked)
    }
}

#[derive(Debug, Default)]
struct Counters {
    spawned: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
}

/// [`TaskSpawner`] backed by a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioDispatcher {
    handle: Handle,
    tracker: TaskTracker,
    counters: Arc<Counters>,
}

impl TokioDispatcher {
    /// Dispatch onto the given runtime.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        let tracker = TaskTracker::new();
        // Closing only arms `wait`; spawning stays possible.
        tracker.close();
        Self {
            handle,
            tracker,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Dispatch onto the runtime of the calling context.
    pub fn try_current() -> EngineResult<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| EngineError::InternalFault(format!("no tokio runtime: {e}")))
    }

    /// Snapshot of the outcome counters.
    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            spawned: self.counters.spawned.load(Ordering::SeqCst),
            succeeded: self.counters.succeeded.load(Ordering::SeqCst),
            failed: self.counters.failed.load(Ordering::SeqCst),
            panicked: self.counters.panicked.load(Ordering::SeqCst),
        }
    }

    /// Wait until every task spawned so far has finished.
    pub async fn wait_idle(&self) {
        self.tracker.wait().await;
    }
}

impl TaskSpawner for TokioDispatcher {
    fn spawn(&self, name: &'static str, task: Task) {
        self.counters.spawned.fetch_add(1, Ordering::SeqCst);
        let counters = Arc::clone(&self.counters);

        let guarded = async move {
            match AssertUnwindSafe(task).catch_unwind().await {
                Ok(Ok(())) => {
                    counters.succeeded.fetch_add(1, Ordering::SeqCst);
                    debug!(task = name, "Background task completed");
                }
                Ok(Err(err)) => {
                    counters.failed.fetch_add(1, Ordering::SeqCst);
                    warn!(task = name, error = %err, "Background task failed");
                }
                Err(payload) => {
                    counters.panicked.fetch_add(1, Ordering::SeqCst);
                    let fault = EngineError::InternalFault(panic_message(payload.as_ref()));
                    error!(task = name, error = %fault, "Background task panicked");
                }
            }
        };
        self.tracker.spawn_on(guarded, &self.handle);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
