// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Setup entry points for tests.
//!
//! [`setup`] does the work. [`must`], [`should`], and [`may`] differ only in
//! how they treat an environment error (instrumentation off or unusable):
//! fail the test, warn and continue, or continue silently. Every other error
//! fails the test under all three.

use crate::bindings::{self, BindingTable};
use crate::counters::{Counters, fail};
use crate::error::{Error, Result};
use crate::instrument::{self, Mode};

/// How a wrapper reacts to setup errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    May,
    Should,
    Must,
}

/// Resolve the mode, build (or reuse) the binding table, and take a baseline.
///
/// # Errors
///
/// [`Error::NoCoverage`] when instrumentation is disabled, [`Error::WrongMode`]
/// for a mode that cannot count, or the cached table build error.
pub fn setup() -> Result<Counters<'static>> {
    match instrument::mode()? {
        Mode::Disabled => Err(Error::NoCoverage),
        Mode::Set => Err(Error::WrongMode {
            mode: Mode::Set.to_string(),
        }),
        Mode::Count | Mode::Atomic => Ok(Counters::new(bindings::global()?)),
    }
}

/// Setup that fails the test on any error.
#[track_caller]
pub fn must() -> Counters<'static> {
    apply(Policy::Must, setup(), bindings::global)
}

/// Setup that warns and degrades when instrumentation is unavailable.
#[track_caller]
pub fn should() -> Counters<'static> {
    apply(Policy::Should, setup(), bindings::global)
}

/// Setup that silently degrades when instrumentation is unavailable.
#[track_caller]
pub fn may() -> Counters<'static> {
    apply(Policy::May, setup(), bindings::global)
}

#[track_caller]
fn apply<'t>(
    policy: Policy,
    outcome: Result<Counters<'t>>,
    table: impl FnOnce() -> Result<&'t BindingTable>,
) -> Counters<'t> {
    let err = match outcome {
        Ok(counters) => return counters,
        Err(e) => e,
    };
    if policy == Policy::Must || !err.is_environment() {
        fail(err);
    }
    if policy == Policy::Should {
        tracing::warn!("coverage assertions disabled: {}", err);
    }
    // Unknown tags must still fail, so degraded handles keep the real table.
    match table() {
        Ok(table) => Counters::degraded(table),
        Err(e) => fail(e),
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
