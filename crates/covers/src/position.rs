// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Source positions shared by the scanner, the block index, and the matcher.
//!
//! Lines and columns are 1-based. Columns count characters, which is the unit
//! both `column!()` and `proc-macro2` span locations report.

use std::fmt;
use std::path::{Path, PathBuf};

/// A (line, column) pair inside one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// The last position strictly before this one.
    ///
    /// Column 1 steps back to an unbounded column on the previous line.
    pub fn predecessor(self) -> Self {
        if self.column > 1 {
            Self::new(self.line, self.column - 1)
        } else {
            Self::new(self.line.saturating_sub(1), u32::MAX)
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A position in a specific source file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub file: PathBuf,
    pub position: Position,
}

impl Location {
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            position: Position::new(line, column),
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.position.line
    }

    pub fn column(&self) -> u32 {
        self.position.column
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.position)
    }
}

#[cfg(test)]
#[path = "position_tests.rs"]
mod tests;
