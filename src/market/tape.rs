//! Trade tape projection.

use std::collections::VecDeque;

use parking_lot::RwLock;

use crate::models::execution::Execution;

/// Bounded newest-first buffer of executions for one market.
pub struct TradeTape {
    capacity: usize,
    state: RwLock<VecDeque<Execution>>,
}

impl TradeTape {
    /// Creates an empty tape holding at most `capacity` executions.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Prepends a batch (delivered newest-first) and evicts past capacity.
    pub fn on_executions(&self, batch: &[Execution]) {
        let mut tape = self.state.write();
        for execution in batch.iter().rev() {
            tape.push_front(execution.clone());
        }
        tape.truncate(self.capacity);
    }

    /// Empties the tape, e.g. on a symbol switch.
    pub fn clear(&self) {
        self.state.write().clear();
    }

    /// Immutable copy of the buffer, newest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Execution> {
        self.state.read().iter().cloned().collect()
    }
}
