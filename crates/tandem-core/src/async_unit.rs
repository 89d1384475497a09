//! Async work units.
//!
//! Replica threads stay the unit of concurrency: each invocation drives its
//! future to completion on a fresh current-thread tokio runtime owned by the
//! replica thread.

use std::future::Future;

use crate::outcome::WorkResult;
use crate::runner::WorkUnit;

/// A [`WorkUnit`] built from an async closure. See [`from_async`].
#[derive(Debug, Clone)]
pub struct AsyncWork<F> {
    factory: F,
}

/// Adapts `factory` (called once per replica) into a [`WorkUnit`].
///
/// A runtime that fails to build is reported as an `Exception` failure of
/// that replica.
pub fn from_async<F, Fut>(factory: F) -> AsyncWork<F>
where
    F: Fn() -> Fut + Sync,
    Fut: Future<Output = WorkResult>,
{
    AsyncWork { factory }
}

impl<F, Fut> WorkUnit for AsyncWork<F>
where
    F: Fn() -> Fut + Sync,
    Fut: Future<Output = WorkResult>,
{
    fn invoke(&self) -> WorkResult {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        runtime.block_on((self.factory)())
    }
}
