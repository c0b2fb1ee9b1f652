//! The barrier / active-counter used to join a batch of parallel subtree
//! tasks.
//!
//! A small `Mutex`-guarded completion count plus a sticky first-error slot,
//! woken on every increment through a `Condvar` rather than polled.

use std::sync::{Condvar, Mutex};

#[derive(Debug)]
struct State {
    should_count: u32,
    is_count: u32,
    success: bool,
    message: String,
}

/// Thread-safe completion counter with sticky first-error capture, shared
/// by every task in one parallel batch.
#[derive(Debug)]
pub struct Barrier {
    state: Mutex<State>,
    condvar: Condvar,
}

impl Barrier {
    /// Create a barrier expecting `should_count` task completions.
    #[must_use]
    pub fn new(should_count: u32) -> Self {
        Barrier {
            state: Mutex::new(State {
                should_count,
                is_count: 0,
                success: true,
                message: String::new(),
            }),
            condvar: Condvar::new(),
        }
    }

    /// Record a task failure. Idempotent: only the first call's message is
    /// kept — the barrier captures the first error in the batch and
    /// discards every later sibling's.
    pub fn register_error(&self, message: impl Into<String>) {
        let mut state = self.state.lock().expect("barrier lock poisoned");
        if state.success {
            state.success = false;
            state.message = message.into();
        }
    }

    /// Mark one task as complete and wake any waiter.
    pub fn increment(&self) {
        let mut state = self.state.lock().expect("barrier lock poisoned");
        state.is_count += 1;
        self.condvar.notify_all();
    }

    /// `true` once every expected task has completed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        let state = self.state.lock().expect("barrier lock poisoned");
        state.is_count == state.should_count
    }

    /// Block until every expected task has completed, then return whether
    /// the batch succeeded and, if not, the first error message.
    #[must_use]
    pub fn wait(&self) -> (bool, String) {
        let mut state = self.state.lock().expect("barrier lock poisoned");
        while state.is_count < state.should_count {
            state = self.condvar.wait(state).expect("barrier lock poisoned");
        }
        (state.success, state.message.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn zero_children_completes_immediately() {
        let barrier = Barrier::new(0);
        assert!(barrier.is_done());
        assert_eq!(barrier.wait(), (true, String::new()));
    }

    #[test]
    fn first_error_wins_over_later_ones() {
        let barrier = Barrier::new(2);
        barrier.register_error("first");
        barrier.register_error("second");
        barrier.increment();
        barrier.increment();
        assert_eq!(barrier.wait(), (false, "first".to_string()));
    }

    #[test]
    fn wait_blocks_until_all_increments_land() {
        let barrier = Arc::new(Barrier::new(3));
        let mut handles = Vec::new();
        for _ in 0..3 {
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.increment();
            }));
        }
        let (success, _) = barrier.wait();
        for h in handles {
            h.join().unwrap();
        }
        assert!(success);
        assert!(barrier.is_done());
    }
}
