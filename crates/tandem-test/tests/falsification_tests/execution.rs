//! Falsification Tests: Category A - Replicated Execution (F001-F010)
//!
//! # Toyota Way: Heijunka (平準化)
//! Every replica is released at once and does the same work.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tandem_core::{Harness, HarnessError, WorkResult, replica, run_replicated};

// =============================================================================
// F001-F004: Execution Count and Identity
// =============================================================================

/// F001: Every replica runs the work unit exactly once
///
/// # Falsification Attempt
/// Increment a shared counter from 5 replicas; anything other than 5 refutes.
#[test]
fn f001_counter_reaches_replica_count() {
    let counter = AtomicUsize::new(0);
    let work = || -> WorkResult {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    };

    let result = run_replicated(&work, 5, "f001");
    assert!(result.is_ok(), "F001 FALSIFIED: all-success run returned {result:?}");
    assert_eq!(
        counter.load(Ordering::SeqCst),
        5,
        "F001 FALSIFIED: work unit did not run exactly 5 times"
    );
}

/// F002: A replica count of zero is rejected before any thread starts
///
/// # Falsification Attempt
/// Request zero replicas with a work unit that records invocations.
#[test]
fn f002_zero_replicas_rejected() {
    let counter = AtomicUsize::new(0);
    let work = || -> WorkResult {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    };

    let result = run_replicated(&work, 0, "f002");
    assert!(
        matches!(result, Err(HarnessError::InvalidArgument(_))),
        "F002 FALSIFIED: zero replicas returned {result:?}"
    );
    assert_eq!(
        counter.load(Ordering::SeqCst),
        0,
        "F002 FALSIFIED: work unit ran despite invalid replica count"
    );
}

/// F003: Replica indices are exactly 0..N, each seen once
///
/// # Falsification Attempt
/// Record `replica::index()` from every replica and compare with 0..N.
#[test]
fn f003_indices_cover_range_once() {
    let seen = Mutex::new(Vec::new());
    let work = || -> WorkResult {
        seen.lock().push(replica::index());
        Ok(())
    };

    run_replicated(&work, 8, "f003").expect("run");

    let mut seen = seen.into_inner();
    seen.sort_unstable();
    let expected: Vec<Option<usize>> = (0..8).map(Some).collect();
    assert_eq!(seen, expected, "F003 FALSIFIED: indices are not 0..8 exactly once");
}

/// F004: Thread names follow `"<label>-thread-<index>"` and are unique
///
/// # Falsification Attempt
/// Collect thread names from every replica.
#[test]
fn f004_thread_names_unique_and_labelled() {
    let names = Mutex::new(Vec::new());
    let work = || -> WorkResult {
        let name = thread::current().name().map(str::to_string);
        names.lock().push((replica::index(), name));
        Ok(())
    };

    run_replicated(&work, 4, "f004").expect("run");

    let names = names.into_inner();
    let unique: HashSet<_> = names.iter().map(|(_, n)| n.clone()).collect();
    assert_eq!(unique.len(), 4, "F004 FALSIFIED: thread names are not unique");
    for (index, name) in names {
        let index = index.expect("replica index");
        assert_eq!(
            name.as_deref(),
            Some(format!("f004-thread-{index}").as_str()),
            "F004 FALSIFIED: replica {index} has wrong thread name"
        );
    }
}

// =============================================================================
// F005-F008: Threads and Release
// =============================================================================

/// F005: Replicas run on their own threads, never on the caller's
///
/// # Falsification Attempt
/// Compare each replica's thread id with the caller's.
#[test]
fn f005_replicas_on_distinct_threads() {
    let caller = thread::current().id();
    let ids = Mutex::new(HashSet::new());
    let work = || -> WorkResult {
        ids.lock().insert(thread::current().id());
        Ok(())
    };

    run_replicated(&work, 6, "f005").expect("run");

    let ids = ids.into_inner();
    assert_eq!(ids.len(), 6, "F005 FALSIFIED: replicas shared threads");
    assert!(!ids.contains(&caller), "F005 FALSIFIED: a replica ran on the caller thread");
}

/// F006: No replica starts its work unit before the gate opens
///
/// # Falsification Attempt
/// Hold the gate for 30ms after arming and observe the counter.
#[test]
fn f006_gate_holds_replicas() {
    let counter = AtomicUsize::new(0);
    let work = || -> WorkResult {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    };

    let mut before_release = None;
    let report = Harness::new("f006", 4)
        .run_with(&work, |armed| {
            assert_eq!(armed.len(), 4);
            thread::sleep(Duration::from_millis(30));
            before_release = Some(counter.load(Ordering::SeqCst));
        })
        .expect("run");

    assert_eq!(
        before_release,
        Some(0),
        "F006 FALSIFIED: work ran before the gate opened"
    );
    assert!(report.passed());
    assert_eq!(counter.load(Ordering::SeqCst), 4);
}

/// F007: Released replicas run concurrently
///
/// # Falsification Attempt
/// Four replicas each sleep 100ms; serial execution would take 400ms.
#[test]
fn f007_replicas_overlap() {
    let work = || -> WorkResult {
        thread::sleep(Duration::from_millis(100));
        Ok(())
    };

    let start = Instant::now();
    run_replicated(&work, 4, "f007").expect("run");
    let elapsed = start.elapsed();

    assert!(
        elapsed < Duration::from_millis(350),
        "F007 FALSIFIED: replicas appear serialized ({elapsed:?})"
    );
}

/// F008: The replica context does not leak to the caller
///
/// # Falsification Attempt
/// Query `replica::index()` on the caller after a run.
#[test]
fn f008_context_scoped_to_replica() {
    let work = || -> WorkResult {
        assert!(replica::index().is_some());
        Ok(())
    };

    run_replicated(&work, 2, "f008").expect("run");
    assert!(
        replica::index().is_none(),
        "F008 FALSIFIED: caller thread sees a replica context"
    );
    assert!(!replica::is_cancelled());
}

/// F009: Each invocation spawns fresh threads
///
/// # Falsification Attempt
/// Run twice and compare thread ids.
#[test]
fn f009_no_thread_reuse_across_runs() {
    let ids = Mutex::new(Vec::new());
    let work = || -> WorkResult {
        ids.lock().push(thread::current().id());
        Ok(())
    };

    run_replicated(&work, 3, "f009").expect("first run");
    run_replicated(&work, 3, "f009").expect("second run");

    let ids = ids.into_inner();
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), 6, "F009 FALSIFIED: threads were reused across runs");
}

/// F010: A report accounts for every replica
///
/// # Falsification Attempt
/// Check counts and completion order of an all-success run.
#[test]
fn f010_report_accounts_for_all() {
    let work = || -> WorkResult { Ok(()) };

    let report = Harness::new("f010", 7).run_report(&work).expect("run");

    assert_eq!(report.replicas, 7, "F010 FALSIFIED: wrong replica count");
    assert_eq!(report.succeeded, 7, "F010 FALSIFIED: wrong success count");
    let mut order = report.completion_order.clone();
    order.sort_unstable();
    assert_eq!(
        order,
        (0..7).collect::<Vec<_>>(),
        "F010 FALSIFIED: completion order misses replicas"
    );
}
