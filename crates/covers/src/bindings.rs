// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The tag → counter table and its process-wide cache.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use crate::config::{self, Config};
use crate::error::{Error, Result};
use crate::index::BlockIndex;
use crate::instrument::{self, Counter, Mode, ProbeRegistry};
use crate::matcher;
use crate::module::ModuleRoot;
use crate::position::Location;
use crate::scan;
use crate::source;

/// One resolved tag.
#[derive(Debug, Clone)]
pub struct Binding {
    pub tag: String,
    /// `None` when instrumentation does not count executions.
    pub counter: Option<&'static Counter>,
    /// Every annotation carrying this tag. Never empty.
    pub locations: Vec<Location>,
}

impl Binding {
    pub fn first_location(&self) -> &Location {
        &self.locations[0]
    }
}

/// Immutable tag → counter table.
#[derive(Debug)]
pub struct BindingTable {
    bindings: BTreeMap<String, Binding>,
    mode: Mode,
}

impl BindingTable {
    pub(crate) fn new(bindings: BTreeMap<String, Binding>, mode: Mode) -> Self {
        Self { bindings, mode }
    }

    /// Run scan, index, and bind for `module`.
    ///
    /// The index is only built when `mode` counts executions; otherwise every
    /// tag binds to `None`.
    pub fn build(
        module: &ModuleRoot,
        config: &Config,
        registry: &ProbeRegistry,
        mode: Mode,
    ) -> Result<Self> {
        let sources = source::load_sources(module, config)?;
        let annotations = scan::scan(&sources);
        let index = if mode.is_counting() {
            BlockIndex::build(&sources, registry)?
        } else {
            BlockIndex::default()
        };

        let table = matcher::bind(&annotations, &index, mode)?;
        tracing::debug!(
            "{}: bound {} tags from {} annotations ({} mode)",
            module.name,
            table.len(),
            annotations.len(),
            mode
        );
        Ok(table)
    }

    pub fn get(&self, tag: &str) -> Option<&Binding> {
        self.bindings.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.bindings.contains_key(tag)
    }

    /// Counter bound to `tag`, or [`Error::UnknownTag`] if the scan never saw it.
    pub fn counter(&self, tag: &str) -> Result<Option<&'static Counter>> {
        self.get(tag)
            .map(|binding| binding.counter)
            .ok_or_else(|| Error::UnknownTag {
                tag: tag.to_string(),
            })
    }

    /// Tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Each distinct bound counter once, ordered by id.
    pub fn counters(&self) -> impl Iterator<Item = &'static Counter> {
        let mut seen = BTreeSet::new();
        let mut counters: Vec<&'static Counter> = self
            .bindings
            .values()
            .filter_map(|b| b.counter)
            .filter(|c| seen.insert(c.id()))
            .collect();
        counters.sort_by_key(|c| c.id());
        counters.into_iter()
    }

    /// The mode the table was built under; counter reads follow it.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

static GLOBAL: OnceLock<Result<BindingTable>> = OnceLock::new();

/// The table for the package under test, built on first use.
///
/// Concurrent first callers wait for the one build. A failed build is cached
/// and returned to every later caller.
pub fn global() -> Result<&'static BindingTable> {
    match GLOBAL.get_or_init(build_global) {
        Ok(table) => Ok(table),
        Err(e) => Err(e.clone()),
    }
}

fn build_global() -> Result<BindingTable> {
    let mode = instrument::effective_mode();
    let module = ModuleRoot::from_env()?;
    let config = config::load_for(&module.package_dir)?;
    BindingTable::build(&module, &config, ProbeRegistry::global(), mode)
}

#[cfg(test)]
#[path = "bindings_tests.rs"]
mod tests;
