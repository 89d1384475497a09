// Iron Lotus: Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # tandem-test
//!
//! Test-framework integration for the Tandem replicated-execution harness.
//!
//! This crate provides:
//! - **Concurrent rule**: wraps a test body so that a [`Concurrent`]
//!   request replicates it across threads named after the test method
//! - **Fault injection**: deterministic per-replica latency, errors,
//!   interrupts and panics
//! - **Falsification tests**: Popperian tests for the harness guarantees
//!
//! ## Iron Lotus Framework
//!
//! - **Built-in Quality** (品質の作り込み): Quality cannot be inspected in
//! - **Popperian Falsification**: Tests designed to refute claims
//!
//! ## Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use tandem_core::WorkResult;
//! use tandem_test::{Concurrent, ConcurrentRule, TestDescription};
//!
//! let counter = AtomicUsize::new(0);
//! let body = || -> WorkResult {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! };
//!
//! let description = TestDescription::new("counts").with_concurrent(Concurrent::new(5));
//! ConcurrentRule::new().apply(body, description).evaluate().unwrap();
//! assert_eq!(counter.load(Ordering::SeqCst), 5);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod chaos;
pub mod rule;

pub use chaos::{ChaosConfig, ChaosInjector, ChaosWork, Fault, InjectedFault};
pub use rule::{Concurrent, ConcurrentRule, ConcurrentStatement, Statement, TestDescription};

use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber.
///
/// Honors `RUST_LOG`, defaulting to `warn`. Output goes through the test
/// harness capture. Safe to call from every test; only the first call
/// installs the subscriber.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
