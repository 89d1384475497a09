//! Replicated-execution harness.
//!
//! # Toyota Way: Built-in Quality (品質の作り込み)
//! Quality cannot be inspected in; it must be built in.
//!
//! A run moves through a fixed lifecycle and never retries:
//!
//! ```text
//! Idle → Armed → Released → Draining → Completed
//!                                    ↘ Failed
//! ```
//!
//! - **Armed**: N named threads exist, each blocked on the gate.
//! - **Released**: the gate opened; replicas run concurrently.
//! - **Draining**: the aggregator takes all N outcomes in completion order.
//!
//! One [`Harness`] value serves exactly one run.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::aggregator::{Drained, FailureAggregator};
use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::gate::Gate;
use crate::report::{ReplicationReport, RunId};
use crate::runner::WorkUnit;
use crate::spawner::{SpawnedReplica, Spawner};
use crate::tracker::CompletionTracker;

/// Lifecycle state of a replicated run. A finished run records its terminal
/// state in [`ReplicationReport::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarnessState {
    /// Nothing started.
    Idle,
    /// Replica threads started and blocked on the gate.
    Armed,
    /// Gate opened.
    Released,
    /// Consuming outcomes.
    Draining,
    /// All replicas finished, none failed.
    Completed,
    /// All replicas finished, at least one failed.
    Failed,
}

impl HarnessState {
    /// Returns true for the terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Armed)
                | (Self::Armed, Self::Released)
                | (Self::Released, Self::Draining)
                | (Self::Draining, Self::Completed | Self::Failed)
        )
    }
}

struct Lifecycle {
    state: HarnessState,
}

impl Lifecycle {
    const fn new() -> Self {
        Self {
            state: HarnessState::Idle,
        }
    }

    fn advance(&mut self, next: HarnessState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {:?} -> {next:?}",
            self.state
        );
        tracing::debug!(from = ?self.state, to = ?next, "harness transition");
        self.state = next;
    }
}

/// Control over armed replicas, handed out before the gate opens.
#[derive(Debug)]
pub struct ArmedReplicas<'a, 'scope> {
    replicas: &'a [SpawnedReplica<'scope>],
    gate: &'a Gate,
}

impl ArmedReplicas<'_, '_> {
    /// Number of armed replicas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    /// Returns true if no replica is armed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    /// Thread names of the armed replicas, by index.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.replicas.iter().map(SpawnedReplica::name)
    }

    /// Cancels one replica while it waits on the gate.
    ///
    /// The replica reports `Cancelled` without running the work unit. Other
    /// replicas are unaffected.
    ///
    /// # Errors
    /// Returns [`HarnessError::InvalidArgument`] if `index` is out of range.
    pub fn cancel(&self, index: usize) -> Result<()> {
        let replica = self.replicas.get(index).ok_or_else(|| {
            HarnessError::invalid_argument(format!(
                "replica index {index} out of range 0..{}",
                self.replicas.len()
            ))
        })?;
        tracing::warn!(replica = replica.name(), "cancelling armed replica");
        replica.token().cancel();
        self.gate.interrupt_waiters();
        Ok(())
    }
}

/// Cancels every armed replica if the gate never opened, so that the
/// enclosing thread scope can always join.
struct AbortGuard<'a, 'scope> {
    replicas: &'a [SpawnedReplica<'scope>],
    gate: &'a Gate,
}

impl Drop for AbortGuard<'_, '_> {
    fn drop(&mut self) {
        if !self.gate.is_released() {
            tracing::warn!(replicas = self.replicas.len(), "aborting armed replicas");
            for replica in self.replicas {
                replica.token().cancel();
            }
            self.gate.interrupt_waiters();
        }
    }
}

/// Replicated-execution harness.
#[derive(Debug)]
pub struct Harness {
    config: HarnessConfig,
    run_id: RunId,
}

impl Harness {
    /// Creates a harness running `replicas` copies, threads named after `label`.
    #[must_use]
    pub fn new(label: impl Into<String>, replicas: usize) -> Self {
        Self::from_config(HarnessConfig::new(label, replicas))
    }

    /// Creates a harness from a configuration.
    #[must_use]
    pub fn from_config(config: HarnessConfig) -> Self {
        Self {
            config,
            run_id: RunId::new(),
        }
    }

    /// Returns the harness configuration.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Returns the identifier of the run this harness will perform.
    #[must_use]
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Runs all replicas and returns the aggregated result.
    ///
    /// # Errors
    /// - [`HarnessError::InvalidArgument`] if the replica count is zero.
    /// - [`HarnessError::Replica`] with the first failure by completion
    ///   order, returned only after every replica has finished.
    pub fn run<W: WorkUnit + ?Sized>(self, work: &W) -> Result<()> {
        self.run_report(work)?.into_result()
    }

    /// Runs all replicas and returns the full report.
    ///
    /// Replica failures are reported in [`ReplicationReport::result`], not
    /// as an `Err`.
    ///
    /// # Errors
    /// Returns an error only for misuse or infrastructure failures.
    pub fn run_report<W: WorkUnit + ?Sized>(self, work: &W) -> Result<ReplicationReport> {
        self.run_with(work, |_| {})
    }

    /// Like [`Harness::run_report`], calling `before_release` once every
    /// replica is armed and before the gate opens.
    ///
    /// # Errors
    /// Returns an error only for misuse or infrastructure failures.
    pub fn run_with<W, C>(self, work: &W, before_release: C) -> Result<ReplicationReport>
    where
        W: WorkUnit + ?Sized,
        C: FnOnce(&ArmedReplicas<'_, '_>),
    {
        let Self { config, run_id } = self;
        let span = tracing::info_span!(
            "replicated",
            label = %config.label,
            replicas = config.replicas,
            run_id = %run_id
        );
        let _enter = span.enter();

        let gate = Gate::new();
        let tracker = CompletionTracker::new(config.replicas);
        let mut lifecycle = Lifecycle::new();

        let (drained, elapsed) = std::thread::scope(|scope| -> Result<(Drained, Duration)> {
            let replicas = Spawner::new(&config.label, &gate, &tracker).spawn(
                scope,
                config.replicas,
                work,
            )?;
            lifecycle.advance(HarnessState::Armed);

            let started = {
                let _abort = AbortGuard {
                    replicas: &replicas,
                    gate: &gate,
                };
                before_release(&ArmedReplicas {
                    replicas: &replicas,
                    gate: &gate,
                });
                let started = Instant::now();
                gate.release()?;
                started
            };
            lifecycle.advance(HarnessState::Released);

            lifecycle.advance(HarnessState::Draining);
            let drained = FailureAggregator::new(&tracker).drain()?;
            let elapsed = started.elapsed();

            join_all(replicas);
            Ok((drained, elapsed))
        })?;

        lifecycle.advance(if drained.result.is_success() {
            HarnessState::Completed
        } else {
            HarnessState::Failed
        });

        let report = ReplicationReport::from_drained(
            run_id,
            &config.label,
            lifecycle.state,
            drained,
            elapsed,
        );
        tracing::info!(
            succeeded = report.succeeded,
            cancelled = report.cancelled,
            failed = report.failed,
            suppressed = report.suppressed,
            elapsed = ?report.elapsed,
            "replicated run finished"
        );
        Ok(report)
    }
}

fn join_all(replicas: Vec<SpawnedReplica<'_>>) {
    for replica in replicas {
        let name = replica.name().to_string();
        match replica.join() {
            Ok(None) => {}
            Ok(Some(cause)) => {
                tracing::error!(replica = %name, error = %cause, "replica exited with fatal error");
            }
            Err(_) => {
                tracing::error!(replica = %name, "replica thread panicked outside the work unit");
            }
        }
    }
}

/// Runs `work` on `replica_count` replicas whose threads are named
/// `"<label>-thread-<index>"`.
///
/// Returns normally when every replica succeeded or was cancelled; otherwise
/// returns the cause of the first replica to fail, by completion order, once
/// all replicas have finished.
///
/// # Errors
/// - [`HarnessError::InvalidArgument`] if `replica_count < 1` (no thread is
///   spawned).
/// - [`HarnessError::Replica`] with the first failure.
///
/// # Example
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use tandem_core::{WorkResult, run_replicated};
///
/// let counter = AtomicUsize::new(0);
/// let work = || -> WorkResult {
///     counter.fetch_add(1, Ordering::SeqCst);
///     Ok(())
/// };
/// run_replicated(&work, 5, "increment").unwrap();
/// assert_eq!(counter.load(Ordering::SeqCst), 5);
/// ```
pub fn run_replicated<W: WorkUnit + ?Sized>(
    work: &W,
    replica_count: usize,
    label: &str,
) -> Result<()> {
    Harness::new(label, replica_count).run(work)
}
