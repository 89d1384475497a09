//! Single-replica execution.
//!
//! A [`ReplicaRunner`] waits on the gate, invokes the work unit once, turns
//! whatever happened into an [`Outcome`], and posts it. Nothing escapes the
//! replica thread except the cause of a fatal failure, which is also the
//! thread's exit value.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::gate::{Gate, GateSignal};
use crate::outcome::{Cause, Failure, Outcome, WorkError, WorkResult};
use crate::replica::{self, CancelToken, ReplicaContext, ReplicaTask};
use crate::tracker::CompletionTracker;

/// A zero-argument operation replicated across threads.
///
/// The same value is invoked concurrently by every replica; any state it
/// touches must be safe for concurrent use.
pub trait WorkUnit: Sync {
    /// Runs the work once.
    fn invoke(&self) -> WorkResult;
}

impl<F> WorkUnit for F
where
    F: Fn() -> WorkResult + Sync,
{
    fn invoke(&self) -> WorkResult {
        self()
    }
}

/// Runs one replica of a work unit.
#[derive(Debug)]
pub struct ReplicaRunner<'a> {
    context: ReplicaContext,
    gate: &'a Gate,
    tracker: &'a CompletionTracker,
}

impl<'a> ReplicaRunner<'a> {
    /// Creates a runner for `task`.
    #[must_use]
    pub fn new(
        task: ReplicaTask,
        name: &str,
        token: CancelToken,
        gate: &'a Gate,
        tracker: &'a CompletionTracker,
    ) -> Self {
        Self {
            context: ReplicaContext::new(task, name, token),
            gate,
            tracker,
        }
    }

    /// Waits for the gate, runs the work unit, and posts exactly one outcome.
    ///
    /// Returns the cause of a fatal failure so the replica thread exits with
    /// it; every other outcome yields `None`.
    pub fn run<W: WorkUnit + ?Sized>(self, work: &W) -> Option<Cause> {
        let index = self.context.index();

        if self.gate.await_release(self.context.token()) == GateSignal::Cancelled {
            tracing::warn!(replica = self.context.name(), "replica cancelled before release");
            self.post(Outcome::Cancelled);
            return None;
        }

        let token = self.context.token().clone();
        let result = {
            let _ctx = replica::enter(self.context.clone());
            catch_unwind(AssertUnwindSafe(|| work.invoke()))
        };

        let outcome = match result {
            Ok(Ok(())) => Outcome::Success,
            Ok(Err(WorkError::Interrupted)) => {
                // Leave the replica observably cancelled after it exits.
                token.cancel();
                Outcome::Cancelled
            }
            Ok(Err(err)) => Outcome::from_work(Err(err)),
            Err(payload) => Outcome::Failed(Failure::from_panic(payload)),
        };

        tracing::trace!(replica = index, kind = ?outcome.kind(), "replica finished");

        let fatal = outcome
            .failure()
            .filter(|failure| failure.is_fatal())
            .map(|failure| failure.cause().clone());
        self.post(outcome);
        fatal
    }

    fn post(&self, outcome: Outcome) {
        if let Err(e) = self.tracker.post(self.context.index(), outcome) {
            tracing::error!(replica = self.context.name(), error = %e, "outcome dropped");
        }
    }
}
