// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Annotation scanner.
//!
//! An annotation is a line comment whose text starts with [`TAG_PREFIX`]. The
//! tag is everything after the prefix, untouched.

use std::path::Path;

use rayon::prelude::*;

use crate::TAG_PREFIX;
use crate::config::Config;
use crate::error::Result;
use crate::lexer::{self, CommentKind};
use crate::module::ModuleRoot;
use crate::position::Location;
use crate::source::{self, SourceFile};

/// A tagged source position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Annotation {
    pub location: Location,
    pub tag: String,
}

impl Annotation {
    pub fn new(tag: impl Into<String>, location: Location) -> Self {
        Self {
            location,
            tag: tag.into(),
        }
    }
}

/// Every annotation in one file's text, in source order.
pub fn annotations_in(path: &Path, text: &str) -> Vec<Annotation> {
    lexer::comments(text)
        .into_iter()
        .filter(|c| c.kind == CommentKind::Line)
        .filter_map(|c| {
            let tag = c.text.strip_prefix(TAG_PREFIX)?;
            Some(Annotation::new(
                tag,
                Location::new(path, c.position.line, c.position.column),
            ))
        })
        .collect()
}

/// Annotations across `sources`, sorted by location.
pub fn scan(sources: &[SourceFile]) -> Vec<Annotation> {
    let mut annotations: Vec<Annotation> = sources
        .par_iter()
        .filter(|s| s.has_tags)
        .flat_map_iter(|s| annotations_in(&s.path, &s.text))
        .collect();
    annotations.sort();
    annotations
}

/// Load the module's sources and scan them.
pub fn scan_module(module: &ModuleRoot, config: &Config) -> Result<Vec<Annotation>> {
    let sources = source::load_sources(module, config)?;
    Ok(scan(&sources))
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
