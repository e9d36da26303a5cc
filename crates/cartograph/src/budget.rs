//! Work limits for the iterative stages.
//!
//! Force-directed layout and all-pairs metrics can be expensive on dense
//! graphs. A [`Budget`] lets the caller cap iterations, set a deadline or
//! cancel from another thread. Stages that run out of budget stop early and
//! report `complete = false` instead of hanging.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

#[derive(Debug, Clone, Default)]
pub struct Budget {
    /// Maximum number of work units (iterations, search sources).
    pub max_iterations: Option<usize>,
    pub deadline: Option<Instant>,
    /// Set to `true` from anywhere to stop the stage at its next check.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Budget {
    /// A budget that never runs out.
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// True once the deadline passed or the cancel flag was raised.
    pub fn is_interrupted(&self) -> bool {
        let cancelled = self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed));
        cancelled || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Starts counting work against this budget.
    pub fn meter(&self) -> Meter<'_> {
        Meter {
            budget: self,
            spent: 0,
            exhausted: false,
        }
    }
}

/// Running count of work spent against a [`Budget`].
///
/// One meter is shared by every scope of a layout call, so the limit applies
/// to the whole call rather than to each container.
#[derive(Debug)]
pub struct Meter<'a> {
    budget: &'a Budget,
    spent: usize,
    exhausted: bool,
}

impl Meter<'_> {
    /// Claims one unit of work. Returns `false` once the budget is gone;
    /// after that every call returns `false`.
    pub fn tick(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        let over_limit = self
            .budget
            .max_iterations
            .is_some_and(|limit| self.spent >= limit);
        if over_limit || self.budget.is_interrupted() {
            self.exhausted = true;
            return false;
        }
        self.spent += 1;
        true
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn spent(&self) -> usize {
        self.spent
    }
}
