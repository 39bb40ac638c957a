//! Pairwise correlation: keys, the coefficient itself, the parallel run and
//! the reductions over its results.

pub mod correlation;
pub mod pipeline;
pub mod reduce;

use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// TaskKey – one ordered pair of distinct series
// ---------------------------------------------------------------------------

/// Ordered pair `(a, b)` of two distinct series names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskKey {
    a: String,
    b: String,
}

impl TaskKey {
    /// `None` when `a == b`.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Option<Self> {
        let (a, b) = (a.into(), b.into());
        (a != b).then_some(TaskKey { a, b })
    }

    pub fn a(&self) -> &str {
        &self.a
    }

    pub fn b(&self) -> &str {
        &self.b
    }

    /// The same pair in the opposite order.
    pub fn reversed(&self) -> TaskKey {
        TaskKey {
            a: self.b.clone(),
            b: self.a.clone(),
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {}", self.a, self.b)
    }
}

/// Correlation coefficient per task key. Iterates in key order.
pub type ResultMap = BTreeMap<TaskKey, f64>;
