//! Behavioral specifications for covers with atomic counting.
//!
//! These tests drive the public API end to end: the package sources are
//! scanned once, tags in `specs/sample.rs` are bound to its probes, and each
//! spec reads deltas from its own tags.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/sample.rs"]
mod sample;

use std::sync::Mutex;
use std::thread;

use covers::{Counters, Error, ErrorKind, Mode, bindings, instrument};

/// Serializes the two specs that share the `foobar` tag.
static FOOBAR: Mutex<()> = Mutex::new(());

fn counters() -> Counters<'static> {
    instrument::init(Mode::Atomic).unwrap();
    covers::must()
}

// =============================================================================
// ROUND TRIP
// =============================================================================

/// > A test that never executes the tagged statement sees a zero delta.
#[test]
fn untouched_tag_is_zero() {
    let _guard = FOOBAR.lock().unwrap_or_else(|e| e.into_inner());
    let counters = counters();

    sample::foobar(false);

    counters.expect("foobar").is_zero();
    assert_eq!(counters.delta("foobar"), 0);
}

/// > A test that executes it twice sees a delta of exactly 2.
#[test]
fn executed_tag_counts_exactly() {
    let _guard = FOOBAR.lock().unwrap_or_else(|e| e.into_inner());
    let counters = counters();

    sample::foobar(true);
    sample::foobar(true);

    counters.expect("foobar").is_not_zero();
    assert_eq!(counters.delta("foobar"), 2);
}

#[test]
fn branches_are_counted_separately() {
    let counters = counters();

    assert_eq!(sample::classify(-3), "negative");
    assert_eq!(sample::classify(0), "zero");
    assert_eq!(sample::classify(5), "positive");
    assert_eq!(sample::classify(9), "positive");

    counters.expect("classify-negative").is(1);
    counters.expect("classify-zero").is(1);
    counters.expect("classify-positive").is(2);
}

#[test]
fn tags_in_one_block_share_a_counter() {
    let counters = counters();

    sample::shared();

    assert_eq!(counters.delta("shared-first"), 1);
    assert_eq!(counters.delta("shared-second"), 1);
}

#[test]
fn tag_callback_sees_delta() {
    let counters = counters();
    sample::callback();

    let mut seen = None;
    counters.tag("callback", |delta| seen = Some(delta));

    assert_eq!(seen, Some(1));
}

// =============================================================================
// SNAPSHOTS
// =============================================================================

/// > Layered snapshots each compute deltas from their own base.
#[test]
fn nested_snapshots_are_independent() {
    let counters = counters();

    sample::layered();
    let inner = counters.snapshot();
    sample::layered();
    sample::layered();

    assert_eq!(inner.delta("layered"), 2);
    assert_eq!(counters.delta("layered"), 3);
    inner.expect("layered").is(2);
}

// =============================================================================
// DEFERRED CHECKS
// =============================================================================

/// > Checks declared before the code runs evaluate after it.
#[test]
fn deferred_checks_see_later_hits() {
    let mut counters = counters();
    counters.defer_not_zero("deferred");
    counters.defer("deferred", |delta| assert_eq!(delta, 3));

    for _ in 0..3 {
        sample::deferred();
    }
}

#[test]
fn failing_deferred_check_fails_the_test() {
    let result = std::panic::catch_unwind(|| {
        let mut counters = counters();
        counters.defer_not_zero("unreached");
    });

    let payload = result.unwrap_err();
    let message = payload.downcast_ref::<String>().unwrap();
    assert!(message.contains("expected \"unreached\" to run"), "{message}");
}

// =============================================================================
// CONCURRENCY
// =============================================================================

/// > Concurrent setup yields one table for every caller.
#[test]
fn binding_table_is_built_once() {
    instrument::init(Mode::Atomic).unwrap();

    let tables: Vec<usize> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| std::ptr::from_ref(bindings::global().unwrap()) as usize))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(tables.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn concurrent_hits_are_all_counted() {
    let counters = counters();

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..250 {
                    sample::threaded();
                }
            });
        }
    });

    assert_eq!(counters.delta("threaded"), 2000);
}

// =============================================================================
// ERRORS
// =============================================================================

/// > Asking for a tag the scan never produced fails immediately.
#[test]
#[should_panic(expected = "tag not found in counters: never-written")]
fn missing_tag_fails() {
    let counters = counters();
    counters.expect("never-written");
}

#[test]
fn missing_tag_is_a_usage_error() {
    let counters = counters();

    let err = counters.try_delta("never-written").unwrap_err();

    assert!(matches!(err, Error::UnknownTag { .. }));
    assert_eq!(err.kind(), ErrorKind::Usage);
}

#[test]
fn mode_cannot_change_once_fixed() {
    instrument::init(Mode::Atomic).unwrap();

    let err = instrument::init(Mode::Count).unwrap_err();

    assert!(matches!(
        err,
        Error::ModeConflict {
            current: Mode::Atomic,
            requested: Mode::Count
        }
    ));
    assert_eq!(instrument::mode().unwrap(), Mode::Atomic);
}

#[test]
fn setup_reports_scanned_tags() {
    let counters = counters();

    for tag in ["foobar", "classify-zero", "shared-second", "unreached"] {
        assert!(counters.has_tag(tag), "{tag}");
    }
    assert!(!counters.is_degraded());
    assert_eq!(counters.table().mode(), Mode::Atomic);
}
