//! Falsification Tests: Category D - Concurrent Rule and Configuration (F031-F040)

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use parking_lot::Mutex;
use tandem_core::{
    DEFAULT_REPLICAS, FailureCategory, Harness, HarnessConfig, HarnessError, WorkError,
    WorkResult, replica,
};
use tandem_test::{Concurrent, ConcurrentRule, TestDescription, init_test_tracing};

// =============================================================================
// F031-F035: Rule Behavior
// =============================================================================

/// F031: A test without a replication request runs once, in place
///
/// # Falsification Attempt
/// Record the calling thread and invocation count.
#[test]
fn f031_unannotated_runs_once_in_place() {
    init_test_tracing();
    let caller = thread::current().id();
    let calls = Mutex::new(Vec::new());
    let body = || -> WorkResult {
        calls.lock().push((thread::current().id(), replica::index()));
        Ok(())
    };

    ConcurrentRule::new()
        .apply(body, TestDescription::new("f031"))
        .evaluate()
        .expect("evaluate");

    let calls = calls.into_inner();
    assert_eq!(
        calls,
        vec![(caller, None)],
        "F031 FALSIFIED: unannotated test did not run once on the caller thread"
    );
}

/// F032: An annotated test runs exactly `replicas` times
///
/// # Falsification Attempt
/// Annotate with 15 replicas and count invocations.
#[test]
fn f032_annotated_runs_n_times() {
    init_test_tracing();
    let counter = AtomicUsize::new(0);
    let body = || -> WorkResult {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    };

    ConcurrentRule::new()
        .apply(
            body,
            TestDescription::new("f032").with_concurrent(Concurrent::new(15)),
        )
        .evaluate()
        .expect("evaluate");

    assert_eq!(
        counter.load(Ordering::SeqCst),
        15,
        "F032 FALSIFIED: annotated test did not run 15 times"
    );
}

/// F033: The default replica count is 10
///
/// # Falsification Attempt
/// Annotate without a count.
#[test]
fn f033_default_replica_count() {
    let counter = AtomicUsize::new(0);
    let body = || -> WorkResult {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    };

    ConcurrentRule::new()
        .apply(
            body,
            TestDescription::new("f033").with_concurrent(Concurrent::default()),
        )
        .evaluate()
        .expect("evaluate");

    assert_eq!(DEFAULT_REPLICAS, 10);
    assert_eq!(
        counter.load(Ordering::SeqCst),
        10,
        "F033 FALSIFIED: default annotation did not run 10 times"
    );
}

/// F034: Replica threads are named after the test method
///
/// # Falsification Attempt
/// Collect thread names under an annotated method.
#[test]
fn f034_thread_names_from_method() {
    let names = Mutex::new(Vec::new());
    let body = || -> WorkResult {
        names
            .lock()
            .push(thread::current().name().unwrap_or_default().to_string());
        Ok(())
    };

    ConcurrentRule::new()
        .apply(
            body,
            TestDescription::new("shouldRunConcurrently").with_concurrent(Concurrent::new(2)),
        )
        .evaluate()
        .expect("evaluate");

    let mut names = names.into_inner();
    names.sort();
    assert_eq!(
        names,
        vec![
            "shouldRunConcurrently-thread-0".to_string(),
            "shouldRunConcurrently-thread-1".to_string(),
        ],
        "F034 FALSIFIED: thread names do not follow the method name"
    );
}

/// F035: A failing annotated test surfaces the replica failure
///
/// # Falsification Attempt
/// Fail one replica under the rule.
#[test]
fn f035_annotated_failure_surfaces() {
    let body = || -> WorkResult {
        if replica::index() == Some(2) {
            return Err(WorkError::exception("replica two failed"));
        }
        Ok(())
    };

    let err = ConcurrentRule::new()
        .apply(
            body,
            TestDescription::new("f035").with_concurrent(Concurrent::new(4)),
        )
        .evaluate()
        .unwrap_err();

    assert_eq!(
        err.category(),
        Some(FailureCategory::Exception),
        "F035 FALSIFIED: wrong failure category"
    );
    assert_eq!(
        err.cause().map(ToString::to_string).as_deref(),
        Some("replica two failed"),
        "F035 FALSIFIED: wrong failure reported"
    );
}

/// F036: An interrupted unannotated test is reported as interrupted
///
/// # Falsification Attempt
/// Return `Interrupted` directly from an unannotated test.
#[test]
fn f036_unannotated_interrupt() {
    let body = || -> WorkResult { Err(WorkError::Interrupted) };

    let result = ConcurrentRule::new()
        .apply(body, TestDescription::new("f036"))
        .evaluate();

    assert!(
        matches!(result, Err(HarnessError::Interrupted)),
        "F036 FALSIFIED: interrupted test returned {result:?}"
    );
}

// =============================================================================
// F037-F040: Configuration
// =============================================================================

/// F037: A TOML configuration drives label and replica count
///
/// # Falsification Attempt
/// Build a harness from TOML and inspect thread names.
#[test]
fn f037_toml_config_drives_harness() {
    let config = HarnessConfig::from_toml_str("label = \"configured\"\nreplicas = 3\n")
        .expect("config");
    let names = Mutex::new(Vec::new());
    let work = || -> WorkResult {
        names
            .lock()
            .push(thread::current().name().unwrap_or_default().to_string());
        Ok(())
    };

    let report = Harness::from_config(config).run_report(&work).expect("run");
    assert_eq!(report.replicas, 3, "F037 FALSIFIED: replica count ignored");
    assert_eq!(report.label, "configured");
    assert!(
        names
            .into_inner()
            .iter()
            .all(|n| n.starts_with("configured-thread-")),
        "F037 FALSIFIED: label ignored"
    );
}

/// F038: An invalid configuration is rejected
///
/// # Falsification Attempt
/// Parse a zero replica count.
#[test]
fn f038_invalid_config_rejected() {
    let result = HarnessConfig::from_toml_str("replicas = 0\n");
    assert!(
        matches!(result, Err(HarnessError::Config(_) | HarnessError::InvalidArgument(_))),
        "F038 FALSIFIED: zero replicas accepted: {result:?}"
    );
}

/// F039: Overrides replace file values
///
/// # Falsification Attempt
/// Override both fields through key/value pairs.
#[test]
fn f039_overrides_apply() {
    let config = HarnessConfig::default()
        .with_overrides([("TANDEM_REPLICAS", "4"), ("TANDEM_LABEL", "overridden")])
        .expect("overrides");
    assert_eq!(config.replicas, 4, "F039 FALSIFIED: replica override ignored");
    assert_eq!(config.label, "overridden", "F039 FALSIFIED: label override ignored");
}

/// F040: A malformed override is rejected
///
/// # Falsification Attempt
/// Override the replica count with a non-number.
#[test]
fn f040_malformed_override_rejected() {
    let result = HarnessConfig::default().with_overrides([("TANDEM_REPLICAS", "many")]);
    assert!(
        matches!(result, Err(HarnessError::Config(_))),
        "F040 FALSIFIED: malformed override accepted"
    );
}
