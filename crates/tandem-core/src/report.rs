//! Per-run report.
//!
//! # Toyota Way: Genchi Genbutsu (現地現物)
//! Go and see: every replica's outcome, in the order it actually finished.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::aggregator::{Drained, HarnessResult};
use crate::error::Result;
use crate::harness::HarnessState;
use crate::outcome::{Outcome, OutcomeKind};

/// Unique identifier of one replicated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(uuid::Uuid);

impl RunId {
    /// Creates a new random run ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Report of one replicated run.
#[derive(Debug, Clone)]
pub struct ReplicationReport {
    /// Run identifier, also recorded on the run's tracing span.
    pub run_id: RunId,
    /// Label used for replica thread names.
    pub label: String,
    /// Number of replicas.
    pub replicas: usize,
    /// Terminal lifecycle state, `Completed` or `Failed`.
    pub state: HarnessState,
    /// Replicas whose work unit returned normally.
    pub succeeded: usize,
    /// Replicas cancelled before or during the work unit.
    pub cancelled: usize,
    /// Replicas whose work unit failed.
    pub failed: usize,
    /// Failures dropped because an earlier one was retained.
    pub suppressed: usize,
    /// Replica indices in completion order.
    pub completion_order: Vec<usize>,
    /// Outcome kind per replica index.
    pub outcomes: Vec<OutcomeKind>,
    /// Wall time from gate release to the last drained outcome.
    pub elapsed: Duration,
    /// The aggregated result.
    pub result: HarnessResult,
}

impl ReplicationReport {
    pub(crate) fn from_drained(
        run_id: RunId,
        label: &str,
        state: HarnessState,
        drained: Drained,
        elapsed: Duration,
    ) -> Self {
        let replicas = drained.completions.len();
        let mut outcomes = vec![OutcomeKind::Cancelled; replicas];
        let mut completion_order = Vec::with_capacity(replicas);
        let (mut succeeded, mut cancelled, mut failed) = (0, 0, 0);

        for completion in &drained.completions {
            match completion.outcome {
                Outcome::Success => succeeded += 1,
                Outcome::Cancelled => cancelled += 1,
                Outcome::Failed(_) => failed += 1,
            }
            if let Some(slot) = outcomes.get_mut(completion.index) {
                *slot = completion.outcome.kind();
            }
            completion_order.push(completion.index);
        }

        Self {
            run_id,
            label: label.to_string(),
            replicas,
            state,
            succeeded,
            cancelled,
            failed,
            suppressed: drained.suppressed,
            completion_order,
            outcomes,
            elapsed,
            result: drained.result,
        }
    }

    /// Returns true if no replica failed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.result.is_success()
    }

    /// Returns success rate (0.0 to 1.0).
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.replicas > 0 {
            self.succeeded as f64 / self.replicas as f64
        } else {
            0.0
        }
    }

    /// Converts into `Ok(())` or the retained failure.
    ///
    /// # Errors
    /// Returns [`crate::HarnessError::Replica`] if any replica failed.
    pub fn into_result(self) -> Result<()> {
        self.result.into_result()
    }

    /// Returns a serializable summary (the failure as text).
    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            run_id: self.run_id,
            label: self.label.clone(),
            replicas: self.replicas,
            state: self.state,
            succeeded: self.succeeded,
            cancelled: self.cancelled,
            failed: self.failed,
            suppressed: self.suppressed,
            completion_order: self.completion_order.clone(),
            outcomes: self.outcomes.clone(),
            elapsed_ms: self.elapsed.as_millis() as u64,
            failure: self.result.failure().map(ToString::to_string),
        }
    }
}

/// Serializable view of a [`ReplicationReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// See [`ReplicationReport::run_id`].
    pub run_id: RunId,
    /// See [`ReplicationReport::label`].
    pub label: String,
    /// See [`ReplicationReport::replicas`].
    pub replicas: usize,
    /// See [`ReplicationReport::state`].
    pub state: HarnessState,
    /// See [`ReplicationReport::succeeded`].
    pub succeeded: usize,
    /// See [`ReplicationReport::cancelled`].
    pub cancelled: usize,
    /// See [`ReplicationReport::failed`].
    pub failed: usize,
    /// See [`ReplicationReport::suppressed`].
    pub suppressed: usize,
    /// See [`ReplicationReport::completion_order`].
    pub completion_order: Vec<usize>,
    /// See [`ReplicationReport::outcomes`].
    pub outcomes: Vec<OutcomeKind>,
    /// Elapsed wall time in milliseconds.
    pub elapsed_ms: u64,
    /// Display text of the retained failure.
    pub failure: Option<String>,
}
