// Iron Lotus: Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # tandem-core
//!
//! Replicated-execution harness: run N replicas of one work unit nearly
//! simultaneously, wait for all of them, and report exactly one outcome.
//!
//! - [`Gate`]: one-shot release barrier every replica waits on
//! - [`ReplicaRunner`]: runs one replica and classifies its [`Outcome`]
//! - [`Spawner`]: one named thread per replica, `"<label>-thread-<index>"`
//! - [`CompletionTracker`]: outcomes in completion order
//! - [`FailureAggregator`]: drains all N outcomes, keeps the first failure
//! - [`Harness`] / [`run_replicated`]: the public entry points
//!
//! ## Iron Lotus Framework
//!
//! - **Jidoka**: Every failure is classified and surfaced, never swallowed silently
//! - **Heijunka**: All replicas are released at once through the gate
//! - **Genchi Genbutsu**: [`ReplicationReport`] records what each replica did
//!
//! ## Example
//!
//! ```rust
//! use tandem_core::{WorkError, WorkResult, replica, run_replicated};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("boom")]
//! struct Boom;
//!
//! let work = || -> WorkResult {
//!     if replica::index() == Some(1) {
//!         return Err(WorkError::exception(Boom));
//!     }
//!     Ok(())
//! };
//!
//! let err = run_replicated(&work, 3, "example").unwrap_err();
//! assert!(err.downcast_ref::<Boom>().is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregator;
pub mod async_unit;
pub mod config;
pub mod error;
pub mod gate;
pub mod harness;
pub mod outcome;
pub mod replica;
pub mod report;
pub mod runner;
pub mod spawner;
pub mod tracker;

pub use aggregator::{Drained, FailureAggregator, HarnessResult};
pub use async_unit::{AsyncWork, from_async};
pub use config::{DEFAULT_REPLICAS, HarnessConfig};
pub use error::{HarnessError, Result};
pub use gate::{Gate, GateSignal};
pub use harness::{ArmedReplicas, Harness, HarnessState, run_replicated};
pub use outcome::{
    BoxError, Cause, Failure, FailureCategory, Outcome, OutcomeKind, PanicError, WorkError,
    WorkResult,
};
pub use replica::{CancelToken, ReplicaContext, ReplicaTask, replica_thread_name};
pub use report::{ReplicationReport, ReportSummary, RunId};
pub use runner::{ReplicaRunner, WorkUnit};
pub use spawner::{BuilderFactory, SpawnedReplica, Spawner};
pub use tracker::{Completion, CompletionTracker};
