//! Test-method wrapping hook.
//!
//! A test method either runs once, or, when it carries a [`Concurrent`]
//! request, is replicated through [`run_replicated`] with its threads named
//! `"<methodName>-thread-<index>"`.
//!
//! ```rust
//! use tandem_core::WorkResult;
//! use tandem_test::{Concurrent, ConcurrentRule, TestDescription};
//!
//! let body = || -> WorkResult { Ok(()) };
//! let description = TestDescription::new("my_test_method").with_concurrent(Concurrent::new(15));
//!
//! ConcurrentRule::new().apply(body, description).evaluate().unwrap();
//! ```

use serde::{Deserialize, Serialize};
use tandem_core::{DEFAULT_REPLICAS, HarnessError, Result, WorkResult, WorkUnit, run_replicated};

/// Request to replicate a test method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concurrent {
    /// Number of replicas, i.e. threads to start.
    #[serde(default = "default_replicas")]
    pub replicas: usize,
}

const fn default_replicas() -> usize {
    DEFAULT_REPLICAS
}

impl Concurrent {
    /// Requests `replicas` concurrent runs.
    #[must_use]
    pub const fn new(replicas: usize) -> Self {
        Self { replicas }
    }
}

impl Default for Concurrent {
    fn default() -> Self {
        Self::new(DEFAULT_REPLICAS)
    }
}

/// What the hook knows about the test being run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDescription {
    method_name: String,
    concurrent: Option<Concurrent>,
}

impl TestDescription {
    /// Describes a test method without a replication request.
    #[must_use]
    pub fn new(method_name: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
            concurrent: None,
        }
    }

    /// Attaches a replication request.
    #[must_use]
    pub const fn with_concurrent(mut self, concurrent: Concurrent) -> Self {
        self.concurrent = Some(concurrent);
        self
    }

    /// Returns the test method name.
    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Returns the replication request, if any.
    #[must_use]
    pub const fn concurrent(&self) -> Option<Concurrent> {
        self.concurrent
    }
}

/// The base body of a test.
pub trait Statement: Sync {
    /// Runs the test body once.
    fn evaluate(&self) -> WorkResult;
}

impl<F> Statement for F
where
    F: Fn() -> WorkResult + Sync,
{
    fn evaluate(&self) -> WorkResult {
        self()
    }
}

struct StatementWork<'a, S>(&'a S);

impl<S: Statement> WorkUnit for StatementWork<'_, S> {
    fn invoke(&self) -> WorkResult {
        self.0.evaluate()
    }
}

/// Wraps test bodies so that annotated ones are replicated.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcurrentRule;

impl ConcurrentRule {
    /// Creates the rule.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Wraps `base` according to `description`.
    #[must_use]
    pub fn apply<S: Statement>(&self, base: S, description: TestDescription) -> ConcurrentStatement<S> {
        ConcurrentStatement { base, description }
    }
}

/// A test body wrapped by [`ConcurrentRule`].
#[derive(Debug)]
pub struct ConcurrentStatement<S> {
    base: S,
    description: TestDescription,
}

impl<S: Statement> ConcurrentStatement<S> {
    /// Runs the test body, replicated if the description asks for it.
    ///
    /// # Errors
    /// - Without a replication request: the body's own failure, classified
    ///   like a replica failure; an interrupted body yields
    ///   [`HarnessError::Interrupted`].
    /// - With one: whatever [`run_replicated`] returns.
    pub fn evaluate(&self) -> Result<()> {
        match self.description.concurrent {
            None => self.base.evaluate().map_err(|err| {
                err.into_failure()
                    .map_or(HarnessError::Interrupted, HarnessError::Replica)
            }),
            Some(concurrent) => {
                tracing::debug!(
                    method = self.description.method_name(),
                    replicas = concurrent.replicas,
                    "replicating test method"
                );
                run_replicated(
                    &StatementWork(&self.base),
                    concurrent.replicas,
                    self.description.method_name(),
                )
            }
        }
    }

    /// Returns the test description.
    #[must_use]
    pub const fn description(&self) -> &TestDescription {
        &self.description
    }
}
