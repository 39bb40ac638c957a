//! Ad-hoc task parallelism: a fixed-size worker pool and the futures it hands out.
//!
//! Architecture:
//! ```text
//!   caller
//!     │  submit(closure)
//!     ▼
//!   ┌──────────┐   queue   ┌──────────────┐
//!   │ Executor  │ ───────► │ worker thread │  runs closure, catches panics
//!   └──────────┘           └──────────────┘
//!     │ Future<T>                 │ Completer<T>::complete
//!     ▼                           ▼
//!   result() blocks ◄──── shared slot (Mutex + Condvar)
//! ```

mod future;
mod pool;

use std::any::Any;
use std::sync::Arc;
use std::sync::mpsc;

pub use future::Future;
pub use pool::Executor;

// ---------------------------------------------------------------------------
// TaskError – why a Future did not produce a value
// ---------------------------------------------------------------------------

/// Failure of a submitted task, as seen by every reader of its [`Future`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum TaskError {
    /// The task ran and returned an error.
    #[error("task failed: {0:#}")]
    Failed(Arc<anyhow::Error>),
    /// The task panicked; the payload message is kept when it is a string.
    #[error("task panicked: {0}")]
    Panicked(String),
    /// The task was dropped before it could complete its future.
    #[error("task was dropped before completing")]
    Abandoned,
}

/// Best-effort extraction of a panic payload's message.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

// ---------------------------------------------------------------------------
// as_completed – iterate futures in the order they finish
// ---------------------------------------------------------------------------

/// Iterator returned by [`as_completed`].
pub struct AsCompleted<K, T> {
    slots: Vec<Option<(K, Future<T>)>>,
    done_rx: mpsc::Receiver<usize>,
    remaining: usize,
}

/// Yield `(key, result)` for each future as soon as it finishes, regardless of
/// submission order.
pub fn as_completed<K, T, I>(futures: I) -> AsCompleted<K, T>
where
    I: IntoIterator<Item = (K, Future<T>)>,
{
    let (tx, rx) = mpsc::channel();
    let slots: Vec<Option<(K, Future<T>)>> = futures.into_iter().map(Some).collect();

    for (i, slot) in slots.iter().enumerate() {
        if let Some((_, fut)) = slot {
            let tx = tx.clone();
            fut.on_done(move || {
                // Receiver gone means the caller stopped iterating.
                let _ = tx.send(i);
            });
        }
    }

    AsCompleted {
        remaining: slots.len(),
        slots,
        done_rx: rx,
    }
}

impl<K, T: Clone> Iterator for AsCompleted<K, T> {
    type Item = (K, Result<T, TaskError>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.done_rx.recv().ok()?;
        let (key, fut) = self.slots.get_mut(idx)?.take()?;
        self.remaining -= 1;
        Some((key, fut.result()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
