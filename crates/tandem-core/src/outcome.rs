//! Replica outcomes and the failure taxonomy.
//!
//! A work unit reports through [`WorkError`]; the runner turns every
//! invocation into exactly one [`Outcome`]:
//!
//! | Work unit result        | Outcome                               |
//! |-------------------------|---------------------------------------|
//! | `Ok(())`                | `Success`                             |
//! | `WorkError::Interrupted`| `Cancelled`                           |
//! | `WorkError::Exception`  | `Failed(Exception)`                   |
//! | `WorkError::Fatal`      | `Failed(FatalError)`                  |
//! | panic                   | `Failed(OpaqueThrowable)`             |

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Boxed error produced by a work unit.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure cause shared between the replica that raised it and the caller.
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Result of a single work-unit invocation.
pub type WorkResult = std::result::Result<(), WorkError>;

/// Non-success signalled by a work unit.
///
/// Every `std::error::Error` converts into [`WorkError::Exception`], so work
/// units can use `?` directly. This type does not implement
/// `std::error::Error` itself, otherwise the blanket conversion would overlap
/// with `From<T> for T`.
#[derive(Debug)]
pub enum WorkError {
    /// Cancellation was observed while the work unit was running.
    Interrupted,
    /// Recoverable application failure.
    Exception(BoxError),
    /// Unrecoverable failure.
    Fatal(BoxError),
}

impl WorkError {
    /// Creates an application-level failure.
    #[must_use]
    pub fn exception(err: impl Into<BoxError>) -> Self {
        Self::Exception(err.into())
    }

    /// Creates an unrecoverable failure.
    #[must_use]
    pub fn fatal(err: impl Into<BoxError>) -> Self {
        Self::Fatal(err.into())
    }

    /// Returns true for [`WorkError::Interrupted`].
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }

    /// Converts into a [`Failure`]; interruptions are not failures.
    #[must_use]
    pub fn into_failure(self) -> Option<Failure> {
        match self {
            Self::Interrupted => None,
            Self::Exception(err) => Some(Failure::new(FailureCategory::Exception, Arc::from(err))),
            Self::Fatal(err) => Some(Failure::new(FailureCategory::FatalError, Arc::from(err))),
        }
    }
}

impl<E> From<E> for WorkError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self::Exception(Box::new(err))
    }
}

impl fmt::Display for WorkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupted => write!(f, "interrupted"),
            Self::Exception(err) => write!(f, "{err}"),
            Self::Fatal(err) => write!(f, "fatal: {err}"),
        }
    }
}

/// Category of a replica failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureCategory {
    /// Recoverable application failure, propagated by value.
    Exception,
    /// Unrecoverable failure, propagated unchanged.
    FatalError,
    /// Anything else (a panic), wrapped with its message preserved.
    OpaqueThrowable,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exception => write!(f, "exception"),
            Self::FatalError => write!(f, "fatal error"),
            Self::OpaqueThrowable => write!(f, "opaque failure"),
        }
    }
}

/// A classified replica failure.
#[derive(Debug, Clone)]
pub struct Failure {
    category: FailureCategory,
    cause: Cause,
}

impl Failure {
    /// Creates a failure from a category and a shared cause.
    #[must_use]
    pub fn new(category: FailureCategory, cause: Cause) -> Self {
        Self { category, cause }
    }

    /// Creates an [`FailureCategory::Exception`] failure.
    #[must_use]
    pub fn exception(cause: impl Into<BoxError>) -> Self {
        Self::new(FailureCategory::Exception, Arc::from(cause.into()))
    }

    /// Creates a [`FailureCategory::FatalError`] failure.
    #[must_use]
    pub fn fatal(cause: impl Into<BoxError>) -> Self {
        Self::new(FailureCategory::FatalError, Arc::from(cause.into()))
    }

    /// Wraps a panic payload as an [`FailureCategory::OpaqueThrowable`].
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Self::new(
            FailureCategory::OpaqueThrowable,
            Arc::new(PanicError::from_payload(payload.as_ref())),
        )
    }

    /// Returns the failure category.
    #[must_use]
    pub const fn category(&self) -> FailureCategory {
        self.category
    }

    /// Returns the shared cause.
    #[must_use]
    pub const fn cause(&self) -> &Cause {
        &self.cause
    }

    /// Consumes the failure, returning its cause.
    #[must_use]
    pub fn into_cause(self) -> Cause {
        self.cause
    }

    /// Returns true for fatal failures.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.category == FailureCategory::FatalError
    }

    /// Downcasts the cause to a concrete error type.
    #[must_use]
    pub fn downcast_ref<T: std::error::Error + 'static>(&self) -> Option<&T> {
        self.cause.downcast_ref::<T>()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.cause)
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let cause: &(dyn std::error::Error + 'static) = self.cause.as_ref();
        Some(cause)
    }
}

/// A panic captured from a work unit.
///
/// Displays exactly the original panic message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PanicError {
    message: String,
}

impl PanicError {
    /// Extracts the message from a panic payload.
    #[must_use]
    pub fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { message }
    }

    /// Returns the panic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Outcome of one replica. Exactly one is produced per replica.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The work unit returned normally.
    Success,
    /// The replica was cancelled before or during the work unit.
    Cancelled,
    /// The work unit failed.
    Failed(Failure),
}

impl Outcome {
    /// Classifies a work-unit result.
    #[must_use]
    pub fn from_work(result: WorkResult) -> Self {
        match result {
            Ok(()) => Self::Success,
            Err(err) => err.into_failure().map_or(Self::Cancelled, Self::Failed),
        }
    }

    /// Returns true for [`Outcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true for [`Outcome::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the failure, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Returns the data-free kind of this outcome.
    #[must_use]
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Success => OutcomeKind::Success,
            Self::Cancelled => OutcomeKind::Cancelled,
            Self::Failed(failure) => OutcomeKind::Failed(failure.category()),
        }
    }
}

/// Outcome without its cause, for reports and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeKind {
    /// See [`Outcome::Success`].
    Success,
    /// See [`Outcome::Cancelled`].
    Cancelled,
    /// See [`Outcome::Failed`].
    Failed(FailureCategory),
}
