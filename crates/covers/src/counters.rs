// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot and delta facade used from tests.
//!
//! A [`Snapshot`] records the value of every bound counter. Deltas are the
//! wrapping difference between the live value and the recorded one. Unbound
//! tags (instrumentation off) have no delta: callbacks are skipped and
//! assertions pass vacuously. Asking for a tag the scan never produced fails
//! the calling test.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::bindings::BindingTable;
use crate::error::{Error, Result};
use crate::instrument::CounterId;

/// Fail the current test.
#[allow(clippy::panic)]
#[track_caller]
pub(crate) fn fail(message: impl fmt::Display) -> ! {
    panic!("covers: {message}")
}

/// Counter values captured at one instant.
#[derive(Debug, Clone)]
pub struct Snapshot<'t> {
    table: &'t BindingTable,
    values: HashMap<CounterId, u32>,
}

impl<'t> Snapshot<'t> {
    /// Read every distinct counter in `table` once.
    pub fn capture(table: &'t BindingTable) -> Self {
        let mode = table.mode();
        let values = table
            .counters()
            .map(|counter| (counter.id(), counter.load(mode)))
            .collect();
        Self { table, values }
    }

    /// Delta since capture, `None` for unbound tags.
    pub fn try_delta(&self, tag: &str) -> Result<Option<u32>> {
        let Some(counter) = self.table.counter(tag)? else {
            return Ok(None);
        };
        let base = self.values.get(&counter.id()).copied().unwrap_or(0);
        Ok(Some(counter.load(self.table.mode()).wrapping_sub(base)))
    }

    /// Delta since capture; unbound tags report 0.
    ///
    /// # Panics
    ///
    /// If the scan never produced `tag`.
    #[track_caller]
    pub fn delta(&self, tag: &str) -> u32 {
        match self.try_delta(tag) {
            Ok(delta) => delta.unwrap_or(0),
            Err(e) => fail(e),
        }
    }

    /// Call `f` with the delta for `tag`, unless the tag is unbound.
    ///
    /// # Panics
    ///
    /// If the scan never produced `tag`.
    #[track_caller]
    pub fn tag(&self, tag: &str, f: impl FnOnce(u32)) {
        match self.try_delta(tag) {
            Ok(Some(delta)) => f(delta),
            Ok(None) => {}
            Err(e) => fail(e),
        }
    }

    /// Assertions on one tag's delta.
    #[track_caller]
    pub fn expect<'s>(&'s self, tag: &'s str) -> Expectation<'s, 't> {
        if !self.table.contains(tag) {
            fail(Error::UnknownTag {
                tag: tag.to_string(),
            });
        }
        Expectation {
            snapshot: self,
            tag,
        }
    }
}

/// Assertions on the delta of one tag. Unbound tags pass every assertion.
#[derive(Debug, Clone, Copy)]
pub struct Expectation<'s, 't> {
    snapshot: &'s Snapshot<'t>,
    tag: &'s str,
}

impl Expectation<'_, '_> {
    /// The current delta; 0 when unbound.
    pub fn delta(&self) -> u32 {
        self.snapshot.delta(self.tag)
    }

    #[track_caller]
    pub fn is_zero(&self) {
        self.snapshot.tag(self.tag, |delta| {
            if delta != 0 {
                fail(format!("expected {:?} not to run, ran {} times", self.tag, delta));
            }
        });
    }

    #[track_caller]
    pub fn is_not_zero(&self) {
        self.snapshot.tag(self.tag, |delta| {
            if delta == 0 {
                fail(format!("expected {:?} to run, it did not", self.tag));
            }
        });
    }

    #[track_caller]
    pub fn is(&self, expected: u32) {
        self.snapshot.tag(self.tag, |delta| {
            if delta != expected {
                fail(format!(
                    "expected {:?} to run {} times, ran {} times",
                    self.tag, expected, delta
                ));
            }
        });
    }

    /// Call `f` with the delta, unless the tag is unbound.
    pub fn run(&self, f: impl FnOnce(u32)) {
        self.snapshot.tag(self.tag, f);
    }
}

struct Deferred<'t> {
    tag: String,
    check: Box<dyn FnOnce(u32) + 't>,
}

/// Per-test handle over the shared binding table.
///
/// Holds the baseline snapshot taken at setup and any deferred checks. The
/// checks run when the handle is dropped, most recently registered first.
pub struct Counters<'t> {
    baseline: Snapshot<'t>,
    deferred: Vec<Deferred<'t>>,
    degraded: bool,
}

impl<'t> Counters<'t> {
    pub fn new(table: &'t BindingTable) -> Self {
        Self {
            baseline: Snapshot::capture(table),
            deferred: Vec::new(),
            degraded: false,
        }
    }

    /// A handle whose setup failed for environmental reasons.
    pub(crate) fn degraded(table: &'t BindingTable) -> Self {
        let mut counters = Self::new(table);
        counters.degraded = true;
        counters
    }

    /// True when instrumentation is unavailable and deltas are not observed.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn table(&self) -> &'t BindingTable {
        self.baseline.table
    }

    /// The snapshot captured at setup.
    pub fn baseline(&self) -> &Snapshot<'t> {
        &self.baseline
    }

    /// Capture a new, independent snapshot.
    pub fn snapshot(&self) -> Snapshot<'t> {
        Snapshot::capture(self.table())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.table().contains(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &'t str> {
        self.table().tags()
    }

    /// See [`Snapshot::delta`].
    #[track_caller]
    pub fn delta(&self, tag: &str) -> u32 {
        self.baseline.delta(tag)
    }

    pub fn try_delta(&self, tag: &str) -> Result<Option<u32>> {
        self.baseline.try_delta(tag)
    }

    /// See [`Snapshot::tag`].
    #[track_caller]
    pub fn tag(&self, tag: &str, f: impl FnOnce(u32)) {
        self.baseline.tag(tag, f);
    }

    #[track_caller]
    pub fn expect<'s>(&'s self, tag: &'s str) -> Expectation<'s, 't> {
        self.baseline.expect(tag)
    }

    /// Run `f` with the delta for `tag` when this handle is dropped.
    ///
    /// # Panics
    ///
    /// Immediately, if the scan never produced `tag`.
    #[track_caller]
    pub fn defer(&mut self, tag: &str, f: impl FnOnce(u32) + 't) {
        if !self.has_tag(tag) {
            fail(Error::UnknownTag {
                tag: tag.to_string(),
            });
        }
        self.deferred.push(Deferred {
            tag: tag.to_string(),
            check: Box::new(f),
        });
    }

    /// Assert on drop that `tag` did not run.
    #[track_caller]
    pub fn defer_zero(&mut self, tag: &str) {
        let owned = tag.to_string();
        self.defer(tag, move |delta| {
            if delta != 0 {
                fail(format!("expected {owned:?} not to run, ran {delta} times"));
            }
        });
    }

    /// Assert on drop that `tag` ran at least once.
    #[track_caller]
    pub fn defer_not_zero(&mut self, tag: &str) {
        let owned = tag.to_string();
        self.defer(tag, move |delta| {
            if delta == 0 {
                fail(format!("expected {owned:?} to run, it did not"));
            }
        });
    }

    /// Run deferred checks now instead of at the end of scope.
    pub fn finish(self) {}

    fn run_deferred(&mut self) {
        let deferred = std::mem::take(&mut self.deferred);
        let unwinding = std::thread::panicking();
        let mut first_failure: Option<Box<dyn Any + Send>> = None;

        for Deferred { tag, check } in deferred.into_iter().rev() {
            let baseline = &self.baseline;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| baseline.tag(&tag, check)));
            let Err(payload) = outcome else {
                continue;
            };
            if unwinding || first_failure.is_some() {
                tracing::error!(
                    "deferred check for {:?} failed: {}",
                    tag,
                    panic_message(payload.as_ref())
                );
            } else {
                first_failure = Some(payload);
            }
        }

        if let Some(payload) = first_failure {
            panic::resume_unwind(payload);
        }
    }
}

impl Drop for Counters<'_> {
    fn drop(&mut self) {
        if !self.deferred.is_empty() {
            self.run_deferred();
        }
    }
}

impl fmt::Debug for Counters<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counters")
            .field("tags", &self.table().len())
            .field("deferred", &self.deferred.len())
            .field("degraded", &self.degraded)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
#[path = "counters_tests.rs"]
mod tests;
