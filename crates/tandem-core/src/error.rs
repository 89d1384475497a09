//! Error types for tandem-core.
//!
//! Per Iron Lotus Framework: All errors are explicit, no panics allowed.

use crate::outcome::{Cause, Failure, FailureCategory};

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Harness errors.
///
/// [`HarnessError::Replica`] is the aggregated failure of a replicated run;
/// every other variant is a misuse or infrastructure error.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Invalid argument (e.g. a replica count of zero).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The OS refused to start a replica thread.
    #[error("failed to spawn replica {index}: {source}")]
    Spawn {
        /// Index of the replica that could not be started.
        index: usize,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The gate was released twice.
    #[error("gate already released")]
    GateAlreadyReleased,

    /// More outcomes were posted than replicas exist.
    #[error("completion tracker overflow: capacity {capacity}")]
    TrackerOverflow {
        /// Number of outcomes the tracker accepts.
        capacity: usize,
    },

    /// More outcomes were taken than replicas exist.
    #[error("completion tracker exhausted: all {capacity} outcomes consumed")]
    TrackerExhausted {
        /// Number of outcomes the tracker hands out.
        capacity: usize,
    },

    /// A directly evaluated work unit was interrupted.
    #[error("interrupted")]
    Interrupted,

    /// The first replica failure, by completion order.
    #[error("replica failed: {0}")]
    Replica(#[source] Failure),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the replica failure, if this is one.
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Replica(failure) => Some(failure),
            _ => None,
        }
    }

    /// Returns the cause raised by the failing replica.
    #[must_use]
    pub fn cause(&self) -> Option<&Cause> {
        self.failure().map(Failure::cause)
    }

    /// Returns the failure category of a replica failure.
    #[must_use]
    pub fn category(&self) -> Option<FailureCategory> {
        self.failure().map(Failure::category)
    }

    /// Returns true if a replica failed with an unrecoverable error.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.failure().is_some_and(Failure::is_fatal)
    }

    /// Downcasts the replica cause to a concrete error type.
    #[must_use]
    pub fn downcast_ref<T: std::error::Error + 'static>(&self) -> Option<&T> {
        self.failure().and_then(|f| f.downcast_ref::<T>())
    }
}

impl From<Failure> for HarnessError {
    fn from(failure: Failure) -> Self {
        Self::Replica(failure)
    }
}
