use std::fmt;
use std::mem;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use super::TaskError;

type Callback = Box<dyn FnOnce() + Send>;

enum State<T> {
    Pending(Vec<Callback>),
    Done(Result<T, TaskError>),
}

struct Shared<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

impl<T> Shared<T> {
    /// Move the slot to `Done` and wake every reader. Only the first call wins.
    fn fulfil(&self, outcome: Result<T, TaskError>) {
        let callbacks = {
            let mut state = self.state.lock();
            let callbacks = match &mut *state {
                State::Pending(callbacks) => mem::take(callbacks),
                State::Done(_) => return,
            };
            *state = State::Done(outcome);
            callbacks
        };
        self.ready.notify_all();

        for callback in callbacks {
            callback();
        }
    }
}

/// Creates a connected pair of [`Completer`] and [`Future`].
pub(crate) fn pending<T>() -> (Completer<T>, Future<T>) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State::Pending(Vec::new())),
        ready: Condvar::new(),
    });
    (
        Completer {
            shared: Some(shared.clone()),
        },
        Future { shared },
    )
}

// ---------------------------------------------------------------------------
// Completer – the single producer side
// ---------------------------------------------------------------------------

/// Write end of a [`Future`]. Owned by exactly one task.
///
/// Dropping it without calling [`Completer::complete`] fails the future with
/// [`TaskError::Abandoned`], so readers never block forever.
pub(crate) struct Completer<T> {
    shared: Option<Arc<Shared<T>>>,
}

impl<T> Completer<T> {
    pub(crate) fn complete(mut self, outcome: Result<T, TaskError>) {
        if let Some(shared) = self.shared.take() {
            shared.fulfil(outcome);
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.fulfil(Err(TaskError::Abandoned));
        }
    }
}

// ---------------------------------------------------------------------------
// Future – the reader side
// ---------------------------------------------------------------------------

/// Handle to a value produced by a task running on an [`Executor`](super::Executor).
///
/// Cloning a `Future` gives another reader of the same slot; every clone sees
/// the same value or the same [`TaskError`].
pub struct Future<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_done() { "done" } else { "pending" };
        f.debug_struct("Future").field("status", &status).finish()
    }
}

impl<T> Future<T> {
    /// A future that is already fulfilled with `value`.
    pub fn ready(value: T) -> Self {
        let (completer, future) = pending();
        completer.complete(Ok(value));
        future
    }

    /// Whether the task has finished (successfully or not). Never blocks.
    pub fn is_done(&self) -> bool {
        matches!(*self.shared.state.lock(), State::Done(_))
    }

    /// Block until the task has finished, without reading its value.
    pub fn wait(&self) {
        let mut state = self.shared.state.lock();
        while let State::Pending(_) = *state {
            self.shared.ready.wait(&mut state);
        }
    }

    /// Run `callback` once the task has finished.
    ///
    /// If it already has, `callback` runs immediately on the calling thread;
    /// otherwise it runs on the worker thread that completes the future.
    pub fn on_done<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.shared.state.lock();
        if let State::Pending(callbacks) = &mut *state {
            callbacks.push(Box::new(callback));
            return;
        }
        drop(state);
        callback();
    }
}

impl<T: Clone> Future<T> {
    /// Block until the task has finished, then return its value or its failure.
    pub fn result(&self) -> Result<T, TaskError> {
        let mut state = self.shared.state.lock();
        loop {
            if let State::Done(outcome) = &*state {
                return outcome.clone();
            }
            self.shared.ready.wait(&mut state);
        }
    }
}
