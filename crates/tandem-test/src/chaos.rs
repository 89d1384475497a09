//! Deterministic fault injection for replicated work.
//!
//! Faults are keyed by replica index, so a scenario such as "replica 0
//! sleeps then fails, replica 1 fails at once" is reproducible run after run.
//!
//! # Reference
//! Netflix. (2012). Chaos Monkey. GitHub.
//! <https://github.com/Netflix/chaosmonkey>

use std::collections::BTreeMap;
use std::time::Duration;

use tandem_core::{WorkError, WorkResult, WorkUnit, replica};

/// Fault injected into one replica in place of its work unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Fail with an [`InjectedFault`] exception.
    Error(String),
    /// Fail with an [`InjectedFault`] classified as fatal.
    Fatal(String),
    /// Report the replica as interrupted.
    Interrupt,
    /// Panic with the given message.
    Panic(String),
}

/// Error produced by an injected [`Fault`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("injected fault in replica {index}: {message}")]
pub struct InjectedFault {
    /// Replica the fault was injected into.
    pub index: usize,
    /// Fault message.
    pub message: String,
}

/// Per-replica fault plan.
#[derive(Debug, Clone, Default)]
pub struct ChaosConfig {
    /// Delay before the work unit (or fault), by replica index.
    pub latency: BTreeMap<usize, Duration>,
    /// Fault replacing the work unit, by replica index.
    pub faults: BTreeMap<usize, Fault>,
}

impl ChaosConfig {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays replica `index` by `delay`.
    #[must_use]
    pub fn delay(mut self, index: usize, delay: Duration) -> Self {
        self.latency.insert(index, delay);
        self
    }

    /// Fails replica `index` with an exception.
    #[must_use]
    pub fn fail(mut self, index: usize, message: impl Into<String>) -> Self {
        self.faults.insert(index, Fault::Error(message.into()));
        self
    }

    /// Fails replica `index` with a fatal error.
    #[must_use]
    pub fn fatal(mut self, index: usize, message: impl Into<String>) -> Self {
        self.faults.insert(index, Fault::Fatal(message.into()));
        self
    }

    /// Interrupts replica `index`.
    #[must_use]
    pub fn interrupt(mut self, index: usize) -> Self {
        self.faults.insert(index, Fault::Interrupt);
        self
    }

    /// Panics in replica `index`.
    #[must_use]
    pub fn panic(mut self, index: usize, message: impl Into<String>) -> Self {
        self.faults.insert(index, Fault::Panic(message.into()));
        self
    }

    /// Returns true if nothing is injected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.latency.is_empty() && self.faults.is_empty()
    }
}

/// Applies a [`ChaosConfig`] to the replica running on the current thread.
#[derive(Debug, Clone)]
pub struct ChaosInjector {
    config: ChaosConfig,
}

impl ChaosInjector {
    /// Creates a new injector.
    #[must_use]
    pub const fn new(config: ChaosConfig) -> Self {
        Self { config }
    }

    /// Returns the chaos config.
    #[must_use]
    pub const fn config(&self) -> &ChaosConfig {
        &self.config
    }

    /// Injects latency and any fault for replica `index`.
    ///
    /// # Errors
    /// Returns the injected failure, if any; the work unit then does not run.
    pub fn inject(&self, index: usize) -> Result<(), WorkError> {
        if let Some(delay) = self.config.latency.get(&index) {
            tracing::debug!(index, ?delay, "injecting latency");
            std::thread::sleep(*delay);
        }

        let Some(fault) = self.config.faults.get(&index) else {
            return Ok(());
        };

        tracing::debug!(index, ?fault, "injecting fault");
        match fault {
            Fault::Error(message) => Err(WorkError::exception(InjectedFault {
                index,
                message: message.clone(),
            })),
            Fault::Fatal(message) => Err(WorkError::fatal(InjectedFault {
                index,
                message: message.clone(),
            })),
            Fault::Interrupt => Err(WorkError::Interrupted),
            Fault::Panic(message) => std::panic::panic_any(message.clone()),
        }
    }

    /// Wraps `work` so each replica first goes through [`Self::inject`].
    #[must_use]
    pub fn wrap<W: WorkUnit>(self, work: W) -> ChaosWork<W> {
        ChaosWork {
            injector: self,
            work,
        }
    }
}

/// A work unit with injected faults. See [`ChaosInjector::wrap`].
#[derive(Debug, Clone)]
pub struct ChaosWork<W> {
    injector: ChaosInjector,
    work: W,
}

impl<W: WorkUnit> WorkUnit for ChaosWork<W> {
    fn invoke(&self) -> WorkResult {
        if let Some(index) = replica::index() {
            self.injector.inject(index)?;
        }
        self.work.invoke()
    }
}
