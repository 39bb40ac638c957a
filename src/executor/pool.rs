use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use threadpool::ThreadPool;

use super::future::{Future, pending};
use super::{TaskError, panic_message};

// ---------------------------------------------------------------------------
// Executor – fixed-size pool with submit → Future
// ---------------------------------------------------------------------------

/// A fixed set of worker threads executing submitted closures.
///
/// Dropping the executor waits for every task already submitted.
pub struct Executor {
    pool: ThreadPool,
}

impl Executor {
    /// Spawn a pool with `workers` threads (at least one).
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let pool = threadpool::Builder::new()
            .num_threads(workers)
            .thread_name("rusty-corr-worker".to_string())
            .build();
        log::debug!("executor started with {workers} workers");
        Self { pool }
    }

    /// One worker per logical CPU.
    pub fn with_default_workers() -> Self {
        Self::new(num_cpus::get())
    }

    pub fn max_workers(&self) -> usize {
        self.pool.max_count()
    }

    /// Tasks currently running.
    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    /// Tasks submitted but not yet picked up by a worker.
    pub fn queued_count(&self) -> usize {
        self.pool.queued_count()
    }

    /// Schedule `f` on a worker and return immediately.
    ///
    /// A panic inside `f` fails the returned future with
    /// [`TaskError::Panicked`]; the worker survives.
    pub fn submit<F, T>(&self, f: F) -> Future<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.try_submit(move || Ok(f()))
    }

    /// Like [`Executor::submit`], for closures that can fail. An `Err` fails
    /// the future with [`TaskError::Failed`].
    pub fn try_submit<F, T>(&self, f: F) -> Future<T>
    where
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (completer, future) = pending();
        self.pool.execute(move || {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(f)) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(TaskError::Failed(Arc::new(err))),
                Err(payload) => {
                    let msg = panic_message(payload.as_ref());
                    log::error!("task panicked: {msg}");
                    Err(TaskError::Panicked(msg))
                }
            };
            completer.complete(outcome);
        });
        future
    }

    /// Wait for all submitted tasks, then stop the workers.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        self.pool.join();
        log::debug!("executor shut down");
    }
}
