//! Tandem: Replicated-Execution Harness for Concurrent Tests
//!
//! Runs one work unit on N threads released together, waits for all of them,
//! and reports exactly one outcome.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use tandem::prelude::*;
//!
//! let counter = AtomicUsize::new(0);
//! let work = || -> WorkResult {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! };
//!
//! run_replicated(&work, 5, "quick_start").unwrap();
//! assert_eq!(counter.load(Ordering::SeqCst), 5);
//! ```

pub use tandem_core as core;
pub use tandem_test as test;

/// Prelude module for common imports.
pub mod prelude {
    pub use tandem_core::{
        Failure, FailureCategory, Harness, HarnessConfig, HarnessError, ReplicationReport,
        WorkError, WorkResult, WorkUnit, from_async, replica, run_replicated,
    };
    pub use tandem_test::{
        ChaosConfig, ChaosInjector, Concurrent, ConcurrentRule, TestDescription,
        init_test_tracing,
    };
}
