//! Replicated Execution Example
//!
//! Runs a few work units through the harness and prints their reports.
//!
//! # Usage
//!
//! ```bash
//! # Default scenarios with 5 replicas
//! cargo run --example replicate
//!
//! # Choose the replica count
//! cargo run --example replicate -- --replicas 12
//!
//! # Read label and replica count from a TOML file
//! cargo run --example replicate -- --config tandem.toml
//!
//! # More log output
//! RUST_LOG=tandem_core=debug cargo run --example replicate
//! ```

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use tandem::prelude::*;

fn main() {
    // Initialize tracing for log output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }

    let config = load_config(&args);
    println!("=== tandem replicate Example ===");
    println!("  label = {}", config.label);
    println!("  replicas = {}\n", config.replicas);

    // Scenario 1: every replica increments a shared counter
    println!("Scenario 1: shared counter");
    let counter = AtomicUsize::new(0);
    let work = || -> WorkResult {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    };
    let report = Harness::from_config(config.clone())
        .run_report(&work)
        .expect("counter run");
    print_report(&report);
    println!("  counter = {}\n", counter.load(Ordering::SeqCst));

    // Scenario 2: replica 1 fails while the others are still sleeping
    println!("Scenario 2: one failing replica");
    let work = || -> WorkResult {
        if replica::index() == Some(1) {
            return Err(WorkError::exception("boom"));
        }
        thread::sleep(Duration::from_millis(50));
        Ok(())
    };
    match run_replicated(&work, config.replicas.max(2), &config.label) {
        Ok(()) => println!("  Result: all replicas succeeded"),
        Err(e) => println!("  Result: FAILED - {e}"),
    }
    println!();

    // Scenario 3: injected faults
    println!("Scenario 3: injected faults");
    let chaos = ChaosConfig::new()
        .delay(0, Duration::from_millis(10))
        .fail(0, "late failure")
        .interrupt(1);
    let work = ChaosInjector::new(chaos).wrap(|| -> WorkResult { Ok(()) });
    let report = Harness::new(config.label.as_str(), config.replicas.max(2))
        .run_report(&work)
        .expect("chaos run");
    print_report(&report);

    println!();
    println!("=== Example Complete ===");
}

fn load_config(args: &[String]) -> HarnessConfig {
    let mut config = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map_or_else(
            || HarnessConfig::new("replicate", 5),
            |path| HarnessConfig::load(path).expect("config file"),
        );

    if let Some(replicas) = args
        .iter()
        .position(|a| a == "--replicas")
        .and_then(|i| args.get(i + 1))
    {
        config.replicas = replicas.parse().expect("--replicas takes a number");
    }

    config.with_env_overrides().expect("valid configuration")
}

fn print_report(report: &ReplicationReport) {
    let summary = report.summary();
    println!("  run_id = {}", summary.run_id);
    println!(
        "  succeeded = {}, cancelled = {}, failed = {}, suppressed = {}",
        summary.succeeded, summary.cancelled, summary.failed, summary.suppressed
    );
    println!("  completion order = {:?}", summary.completion_order);
    println!("  elapsed = {} ms", summary.elapsed_ms);
    match summary.failure {
        Some(failure) => println!("  Result: FAILED - {failure}"),
        None => println!("  Result: PASSED"),
    }
}

fn print_help() {
    println!(
        r#"tandem replicate Example

USAGE:
    cargo run --example replicate [OPTIONS]

OPTIONS:
    --replicas N     Number of replicas (default 5)
    --config PATH    Load label and replicas from a TOML file
    --help, -h       Print this help message

ENVIRONMENT:
    TANDEM_REPLICAS  Overrides the replica count
    TANDEM_LABEL     Overrides the thread name label
    RUST_LOG         Log filter (tracing-subscriber EnvFilter)
"#
    );
}
