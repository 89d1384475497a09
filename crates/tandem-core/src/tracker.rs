//! Completion-ordered outcome queue.
//!
//! Replicas post outcomes as they finish; the aggregator takes them in the
//! same order. Sized for exactly N posts and N takes per run.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use crate::error::{HarnessError, Result};
use crate::outcome::Outcome;

/// An outcome stamped with its completion position.
#[derive(Debug, Clone)]
pub struct Completion {
    /// Position in completion order, starting at 0.
    pub sequence: usize,
    /// Index of the replica that produced the outcome.
    pub index: usize,
    /// The replica's outcome.
    pub outcome: Outcome,
}

#[derive(Debug, Default)]
struct TrackerState {
    queue: VecDeque<Completion>,
    posted: usize,
    taken: usize,
}

/// Concurrent sink and source of replica outcomes.
#[derive(Debug)]
pub struct CompletionTracker {
    capacity: usize,
    state: Mutex<TrackerState>,
    available: Condvar,
}

impl CompletionTracker {
    /// Creates a tracker for `capacity` replicas.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(TrackerState {
                queue: VecDeque::with_capacity(capacity),
                ..TrackerState::default()
            }),
            available: Condvar::new(),
        }
    }

    /// Records a replica outcome. Never blocks on the consumer.
    ///
    /// # Errors
    /// Returns [`HarnessError::TrackerOverflow`] once `capacity` outcomes
    /// have been posted.
    pub fn post(&self, index: usize, outcome: Outcome) -> Result<()> {
        let mut state = self.state.lock();
        if state.posted >= self.capacity {
            return Err(HarnessError::TrackerOverflow {
                capacity: self.capacity,
            });
        }
        let sequence = state.posted;
        state.posted += 1;
        state.queue.push_back(Completion {
            sequence,
            index,
            outcome,
        });
        drop(state);
        self.available.notify_one();
        Ok(())
    }

    /// Blocks until an unconsumed outcome exists and returns it.
    ///
    /// # Errors
    /// Returns [`HarnessError::TrackerExhausted`] once `capacity` outcomes
    /// have been taken, instead of blocking forever.
    pub fn take(&self) -> Result<Completion> {
        let mut state = self.state.lock();
        if state.taken >= self.capacity {
            return Err(HarnessError::TrackerExhausted {
                capacity: self.capacity,
            });
        }
        loop {
            if let Some(completion) = state.queue.pop_front() {
                state.taken += 1;
                return Ok(completion);
            }
            self.available.wait(&mut state);
        }
    }

    /// Number of outcomes the tracker accepts.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of outcomes posted so far.
    #[must_use]
    pub fn posted(&self) -> usize {
        self.state.lock().posted
    }

    /// Number of outcomes taken so far.
    #[must_use]
    pub fn taken(&self) -> usize {
        self.state.lock().taken
    }
}
