//! Replica identity, cancellation, and the per-thread replica context.
//!
//! Work units take no arguments. While a replica runs its work unit, the
//! replica's [`ReplicaContext`] is installed in a thread-local so the work
//! unit can ask which replica it is ([`index`]) and whether it has been
//! cancelled ([`is_cancelled`]).

use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One replica of a replicated run. Created before any thread starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplicaTask {
    index: usize,
}

impl ReplicaTask {
    /// Creates a task for the given replica index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self { index }
    }

    /// Returns the replica index, in `[0, N)`.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

/// Cancellation flag for a single replica.
///
/// Clones share the same flag. Cancelling one replica never affects another.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates an uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the replica as cancelled.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns true once [`CancelToken::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Context of the replica running on the current thread.
#[derive(Debug, Clone)]
pub struct ReplicaContext {
    task: ReplicaTask,
    name: Arc<str>,
    token: CancelToken,
}

impl ReplicaContext {
    /// Creates a replica context.
    #[must_use]
    pub fn new(task: ReplicaTask, name: impl Into<Arc<str>>, token: CancelToken) -> Self {
        Self {
            task,
            name: name.into(),
            token,
        }
    }

    /// Returns the replica index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.task.index()
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

    /// Returns true if the replica has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

thread_local! {
    static CURRENT: RefCell<Option<ReplicaContext>> = const { RefCell::new(None) };
}

/// Installs `ctx` as the current replica until the guard is dropped.
pub(crate) fn enter(ctx: ReplicaContext) -> ContextGuard {
    let previous = CURRENT.with(|current| current.replace(Some(ctx)));
    ContextGuard { previous }
}

/// Restores the previous replica context on drop.
pub(crate) struct ContextGuard {
    previous: Option<ReplicaContext>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|current| {
            current.replace(previous);
        });
    }
}

/// Returns the context of the replica running on this thread, if any.
#[must_use]
pub fn current() -> Option<ReplicaContext> {
    CURRENT.with(|current| current.borrow().clone())
}

/// Returns the index of the replica running on this thread.
#[must_use]
pub fn index() -> Option<usize> {
    CURRENT.with(|current| current.borrow().as_ref().map(ReplicaContext::index))
}

/// Returns true if the replica running on this thread has been cancelled.
///
/// Always false outside a replica.
#[must_use]
pub fn is_cancelled() -> bool {
    CURRENT.with(|current| {
        current
            .borrow()
            .as_ref()
            .is_some_and(ReplicaContext::is_cancelled)
    })
}

/// Diagnostic thread name for a replica: `"<label>-thread-<index>"`.
#[must_use]
pub fn replica_thread_name(label: &str, index: usize) -> String {
    format!("{label}-thread-{index}")
}
