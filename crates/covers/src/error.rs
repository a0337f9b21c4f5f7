// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types.
//!
//! Every failure the setup pipeline can produce, grouped by [`ErrorKind`] so the
//! policy wrappers can decide which ones are survivable.

use std::path::PathBuf;

use crate::instrument::Mode;
use crate::position::Location;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Broad error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Instrumentation is off or uses a counting scheme deltas cannot use.
    Environment,
    /// The package or its sources could not be loaded.
    Resolution,
    /// Annotations and instrumented blocks do not line up.
    Binding,
    /// The caller asked for something the scan never produced.
    Usage,
    /// A broken internal invariant.
    Internal,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("coverage not enabled (set COVERS_MODE=count|atomic)")]
    NoCoverage,

    #[error("mode not supported for operation; was \"{mode}\". Try COVERS_MODE=atomic|count")]
    WrongMode { mode: String },

    #[error("instrumentation mode is already {current}; cannot switch to {requested}")]
    ModeConflict { current: Mode, requested: Mode },

    #[error("failed to resolve package at {}: {reason}", path.display())]
    Resolution { path: PathBuf, reason: String },

    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("tag {tag:?} at {location} is not inside any instrumented block; add covers::probe!() before it")]
    Unbound { tag: String, location: Location },

    #[error("duplicated tag {tag:?}: {first} and {second} resolve to different counters")]
    DuplicateTag {
        tag: String,
        first: Location,
        second: Location,
    },

    #[error("tag not found in counters: {tag}")]
    UnknownTag { tag: String },

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoCoverage | Self::WrongMode { .. } | Self::ModeConflict { .. } => {
                ErrorKind::Environment
            }
            Self::Resolution { .. } | Self::Parse { .. } | Self::Config { .. } => {
                ErrorKind::Resolution
            }
            Self::Unbound { .. } | Self::DuplicateTag { .. } => ErrorKind::Binding,
            Self::UnknownTag { .. } => ErrorKind::Usage,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True for the only class the permissive policies may survive.
    pub fn is_environment(&self) -> bool {
        self.kind() == ErrorKind::Environment
    }

    pub(crate) fn resolution(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Resolution {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
