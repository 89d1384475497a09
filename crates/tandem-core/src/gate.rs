//! One-shot release gate.
//!
//! Every replica blocks on the gate before touching the work unit, so that
//! all of them start as close to simultaneously as the scheduler allows.
//!
//! ```text
//! closed ──release()──▶ open      (exactly once)
//! ```

use parking_lot::{Condvar, Mutex};

use crate::error::{HarnessError, Result};
use crate::replica::CancelToken;

/// Why [`Gate::await_release`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateSignal {
    /// The gate opened.
    Released,
    /// The waiting replica was cancelled.
    Cancelled,
}

/// Single-use release barrier.
#[derive(Debug, Default)]
pub struct Gate {
    released: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    /// Creates a closed gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the gate, waking every blocked replica.
    ///
    /// # Errors
    /// Returns [`HarnessError::GateAlreadyReleased`] on a second call.
    pub fn release(&self) -> Result<()> {
        let mut released = self.released.lock();
        if *released {
            return Err(HarnessError::GateAlreadyReleased);
        }
        *released = true;
        self.opened.notify_all();
        Ok(())
    }

    /// Returns true once the gate has been released.
    #[must_use]
    pub fn is_released(&self) -> bool {
        *self.released.lock()
    }

    /// Blocks until the gate opens or `token` is cancelled.
    ///
    /// Cancellation is checked first: a replica cancelled before the release
    /// reports [`GateSignal::Cancelled`] even if it wakes after the gate
    /// opened.
    pub fn await_release(&self, token: &CancelToken) -> GateSignal {
        let mut released = self.released.lock();
        loop {
            if token.is_cancelled() {
                return GateSignal::Cancelled;
            }
            if *released {
                return GateSignal::Released;
            }
            self.opened.wait(&mut released);
        }
    }

    /// Wakes blocked replicas so they re-check their cancellation tokens.
    ///
    /// Call after [`CancelToken::cancel`]. Taking the lock orders the wake-up
    /// after any waiter's token check.
    pub fn interrupt_waiters(&self) {
        let _released = self.released.lock();
        self.opened.notify_all();
    }
}
