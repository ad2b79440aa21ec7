//! Bounded blocking-inference pool.
//!
//! Model calls are synchronous and CPU-heavy with no internal
//! cancellation. Running them inline in an async handler would block
//! the runtime; running them unbounded would let concurrent requests
//! pile inference on every core. The pool dispatches each call to
//! `spawn_blocking` behind a semaphore sized to the deployment's
//! compute budget.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::types::PipelineError;

/// Default cap on concurrent model calls.
pub const DEFAULT_MAX_CONCURRENT: usize = 2;

/// Runs blocking inference closures with bounded concurrency.
#[derive(Clone)]
pub struct InferencePool {
    permits: Arc<Semaphore>,
}

impl InferencePool {
    /// Pool allowing up to `max_concurrent` simultaneous model calls.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Run `f` on a blocking thread once a permit is available.
    ///
    /// Waiters queue on the semaphore in FIFO order; the permit is
    /// held for the duration of the call.
    pub async fn run<F, T>(&self, f: F) -> Result<T, PipelineError>
    where
        F: FnOnce() -> Result<T, PipelineError> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| PipelineError::Pool(format!("semaphore closed: {e}")))?;
        debug!(available = self.permits.available_permits(), "inference permit acquired");

        tokio::task::spawn_blocking(move || {
            let result = f();
            drop(permit);
            result
        })
        .await
        .map_err(|e| PipelineError::Pool(format!("join: {e}")))?
    }
}

impl Default for InferencePool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}
