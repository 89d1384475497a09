//! Popperian Falsification Tests for Tandem
//!
//! # Reference
//! Popper, K. (1959). *The Logic of Scientific Discovery*. Routledge.
//!
//! > "A theory which is not refutable by any conceivable event is non-scientific."
//!
//! Categories:
//! - A: Replicated execution (F001-F010)
//! - B: Failure aggregation (F011-F020)
//! - C: Cancellation (F021-F030)
//! - D: Concurrent rule and configuration (F031-F040)

// Allow test-specific patterns that are denied in production code
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod execution;
mod rule;
