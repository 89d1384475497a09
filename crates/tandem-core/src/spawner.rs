//! Replica thread creation.
//!
//! All replica indices are assigned up front, before the first thread
//! exists, so diagnostic names are never duplicated or skipped.

use std::thread::{Builder, Scope, ScopedJoinHandle};

use crate::error::{HarnessError, Result};
use crate::gate::Gate;
use crate::outcome::Cause;
use crate::replica::{CancelToken, ReplicaTask, replica_thread_name};
use crate::runner::{ReplicaRunner, WorkUnit};
use crate::tracker::CompletionTracker;

/// A started replica thread, blocked on the gate until release.
#[derive(Debug)]
pub struct SpawnedReplica<'scope> {
    task: ReplicaTask,
    name: String,
    token: CancelToken,
    handle: ScopedJoinHandle<'scope, Option<Cause>>,
}

impl SpawnedReplica<'_> {
    /// Returns the replica's task.
    #[must_use]
    pub const fn task(&self) -> ReplicaTask {
        self.task
    }

    /// Returns the replica thread name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the replica's cancellation token.
    #[must_use]
    pub const fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Returns true once the replica thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the replica thread and returns its exit value.
    ///
    /// The exit value is the cause of a fatal failure, if the replica had one.
    pub fn join(self) -> std::thread::Result<Option<Cause>> {
        self.handle.join()
    }
}

/// Creates the thread builder for the replica with the given index.
pub type BuilderFactory = dyn Fn(usize) -> Builder + Sync;

fn default_builder(_index: usize) -> Builder {
    Builder::new()
}

/// Starts one named thread per replica.
///
/// Replica threads run inside the caller's current span and subscriber, so
/// their events carry the run's `run_id`.
#[derive(Clone, Copy)]
pub struct Spawner<'env> {
    label: &'env str,
    gate: &'env Gate,
    tracker: &'env CompletionTracker,
    builder: &'env BuilderFactory,
}

impl std::fmt::Debug for Spawner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spawner")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl<'env> Spawner<'env> {
    /// Creates a spawner whose threads are named after `label`.
    #[must_use]
    pub fn new(label: &'env str, gate: &'env Gate, tracker: &'env CompletionTracker) -> Self {
        Self {
            label,
            gate,
            tracker,
            builder: &default_builder,
        }
    }

    /// Uses `builder` to configure each replica thread (stack size and the
    /// like). The thread name is always set by the spawner.
    #[must_use]
    pub fn with_builder(mut self, builder: &'env BuilderFactory) -> Self {
        self.builder = builder;
        self
    }

    /// Spawns `replicas` threads inside `scope`, each running `work` once
    /// the gate opens. Does not wait for completion.
    ///
    /// # Errors
    /// - [`HarnessError::InvalidArgument`] if `replicas < 1`; nothing is
    ///   spawned.
    /// - [`HarnessError::Spawn`] if the OS refuses a thread. Replicas that
    ///   were already started are cancelled and exit without running `work`.
    pub fn spawn<'scope, W>(
        &self,
        scope: &'scope Scope<'scope, 'env>,
        replicas: usize,
        work: &'env W,
    ) -> Result<Vec<SpawnedReplica<'scope>>>
    where
        W: WorkUnit + ?Sized,
    {
        if replicas < 1 {
            return Err(HarnessError::invalid_argument(format!(
                "replica count must be at least 1, got {replicas}"
            )));
        }

        let tasks: Vec<ReplicaTask> = (0..replicas).map(ReplicaTask::new).collect();
        let mut spawned = Vec::with_capacity(replicas);
        let span = tracing::Span::current();
        let dispatch = tracing::dispatcher::get_default(Clone::clone);

        for task in tasks {
            let name = replica_thread_name(self.label, task.index());
            let token = CancelToken::new();
            let runner = ReplicaRunner::new(task, &name, token.clone(), self.gate, self.tracker);
            let span = span.clone();
            let dispatch = dispatch.clone();

            match (self.builder)(task.index())
                .name(name.clone())
                .spawn_scoped(scope, move || {
                    tracing::dispatcher::with_default(&dispatch, || {
                        span.in_scope(|| runner.run(work))
                    })
                })
            {
                Ok(handle) => spawned.push(SpawnedReplica {
                    task,
                    name,
                    token,
                    handle,
                }),
                Err(source) => {
                    tracing::warn!(
                        replica = %name,
                        started = spawned.len(),
                        error = %source,
                        "failed to spawn replica, cancelling started replicas"
                    );
                    for replica in &spawned {
                        replica.token.cancel();
                    }
                    self.gate.interrupt_waiters();
                    return Err(HarnessError::Spawn {
                        index: task.index(),
                        source,
                    });
                }
            }
        }

        tracing::debug!(label = self.label, replicas, "replicas armed");
        Ok(spawned)
    }
}
