//! Failure aggregation.
//!
//! Drains every outcome, keeps the first failure by completion order, and
//! reduces the run to a single [`HarnessResult`]. There is no early exit: a
//! failure never stops the drain, so the result is only produced once every
//! replica has finished.

use crate::error::{HarnessError, Result};
use crate::outcome::{Failure, Outcome};
use crate::tracker::{Completion, CompletionTracker};

/// Aggregated result of a replicated run.
#[derive(Debug, Clone)]
pub enum HarnessResult {
    /// No replica failed (cancelled replicas do not count as failures).
    AllSucceeded,
    /// The first failure, by completion order.
    Failed(Failure),
}

impl HarnessResult {
    /// Returns true for [`HarnessResult::AllSucceeded`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::AllSucceeded)
    }

    /// Returns the retained failure, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::AllSucceeded => None,
            Self::Failed(failure) => Some(failure),
        }
    }

    /// Converts into `Ok(())` or the retained failure.
    ///
    /// # Errors
    /// Returns [`HarnessError::Replica`] carrying the retained cause.
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::AllSucceeded => Ok(()),
            Self::Failed(failure) => Err(HarnessError::Replica(failure)),
        }
    }
}

/// Everything the aggregator drained.
#[derive(Debug, Clone)]
pub struct Drained {
    /// The aggregated result.
    pub result: HarnessResult,
    /// All completions, in completion order.
    pub completions: Vec<Completion>,
    /// Failures discarded because an earlier one was retained.
    pub suppressed: usize,
}

/// Drains exactly N outcomes and applies the first-failure rule.
#[derive(Debug)]
pub struct FailureAggregator<'a> {
    tracker: &'a CompletionTracker,
    expected: usize,
}

impl<'a> FailureAggregator<'a> {
    /// Creates an aggregator expecting one outcome per tracker slot.
    #[must_use]
    pub const fn new(tracker: &'a CompletionTracker) -> Self {
        Self {
            tracker,
            expected: tracker.capacity(),
        }
    }

    /// Takes exactly N outcomes, blocking until each is available.
    ///
    /// # Errors
    /// Propagates tracker errors; none occur when the tracker was sized for
    /// the same N as the replicas posting into it.
    pub fn drain(self) -> Result<Drained> {
        let mut retained: Option<Failure> = None;
        let mut completions = Vec::with_capacity(self.expected);
        let mut suppressed = 0;

        for _ in 0..self.expected {
            let completion = self.tracker.take()?;
            match &completion.outcome {
                Outcome::Success => {}
                Outcome::Cancelled => {
                    tracing::debug!(replica = completion.index, "ignoring cancelled replica");
                }
                Outcome::Failed(failure) => {
                    if retained.is_none() {
                        tracing::debug!(
                            replica = completion.index,
                            sequence = completion.sequence,
                            failure = %failure,
                            "retaining first replica failure"
                        );
                        retained = Some(failure.clone());
                    } else {
                        suppressed += 1;
                        tracing::debug!(
                            replica = completion.index,
                            sequence = completion.sequence,
                            failure = %failure,
                            "suppressing later replica failure"
                        );
                    }
                }
            }
            completions.push(completion);
        }

        let result = retained.map_or(HarnessResult::AllSucceeded, HarnessResult::Failed);
        Ok(Drained {
            result,
            completions,
            suppressed,
        })
    }
}
