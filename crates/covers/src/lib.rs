// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Assert from a test how many times an annotated line executed.
//!
//! Code under test marks the blocks it wants counted with
//! [`probe!`] and labels individual lines with `//covers:<tag>` comments.
//! On first setup the package's sources are scanned once, every tag is matched
//! to the probe block that contains it, and tests read per-tag deltas between
//! snapshots.
//!
//! ```ignore
//! // src/lib.rs
//! pub fn parse(input: &str) -> Option<u32> {
//!     if input.is_empty() {
//!         covers::probe!();
//!         return None; //covers:parse-empty
//!     }
//!     covers::probe!();
//!     input.parse().ok()
//! }
//!
//! // tests/parse.rs
//! #[test]
//! fn empty_input_short_circuits() {
//!     let counters = covers::must();
//!     parse("");
//!     counters.expect("parse-empty").is(1);
//! }
//! ```
//!
//! Counting is off unless `COVERS_MODE` (or `covers.toml`) selects `count` or
//! `atomic`. [`must`], [`should`], and [`may`] choose what happens then.

pub mod bindings;
pub mod config;
pub mod counters;
pub mod error;
pub mod index;
pub mod instrument;
pub mod lexer;
pub mod logging;
pub mod matcher;
pub mod module;
pub mod policy;
pub mod position;
pub mod scan;
pub mod source;
pub mod walker;

#[cfg(test)]
pub mod test_utils;

/// Literal that starts every annotation comment.
pub const TAG_PREFIX: &str = "//covers:";

pub use counters::{Counters, Expectation, Snapshot};
pub use error::{Error, ErrorKind, Result};
pub use instrument::Mode;
pub use policy::{may, must, setup, should};
