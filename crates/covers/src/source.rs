// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Loading the source files of a module.
//!
//! Files are read in parallel and prefiltered for the two literals that matter
//! (the tag prefix and `probe!`). Files containing neither are dropped before
//! any lexing or parsing happens.

use std::path::{Path, PathBuf};

use aho_corasick::AhoCorasick;
use rayon::prelude::*;

use crate::TAG_PREFIX;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::module::ModuleRoot;
use crate::walker::{FileWalker, WalkerConfig};

const PROBE_MARKER: &str = "probe!";

/// One source file worth lexing or parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Canonical path.
    pub path: PathBuf,
    pub text: String,
    /// The text mentions the tag prefix somewhere.
    pub has_tags: bool,
    /// The text mentions `probe!` somewhere.
    pub has_probes: bool,
}

impl SourceFile {
    pub fn is_relevant(&self) -> bool {
        self.has_tags || self.has_probes
    }

    pub fn line_count(&self) -> usize {
        let bytes = self.text.as_bytes();
        let newlines = memchr::memchr_iter(b'\n', bytes).count();
        match bytes.last() {
            Some(b'\n') | None => newlines,
            Some(_) => newlines + 1,
        }
    }
}

/// Finds the tag prefix and probe marker in one pass.
pub struct Prefilter {
    matcher: AhoCorasick,
}

impl Prefilter {
    const TAG: usize = 0;
    const PROBE: usize = 1;

    pub fn new() -> Result<Self> {
        let matcher = AhoCorasick::new([TAG_PREFIX, PROBE_MARKER])
            .map_err(|e| Error::Internal(format!("prefilter: {e}")))?;
        Ok(Self { matcher })
    }

    /// Returns (mentions tags, mentions probes).
    pub fn classify(&self, text: &str) -> (bool, bool) {
        let mut tags = false;
        let mut probes = false;
        for found in self.matcher.find_iter(text) {
            match found.pattern().as_usize() {
                Self::TAG => tags = true,
                Self::PROBE => probes = true,
                _ => {}
            }
            if tags && probes {
                break;
            }
        }
        (tags, probes)
    }

    pub fn load(&self, path: &Path) -> Result<SourceFile> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::resolution(path, e))?;
        let (has_tags, has_probes) = self.classify(&text);
        Ok(SourceFile {
            path: path.to_path_buf(),
            text,
            has_tags,
            has_probes,
        })
    }
}

/// Collect the canonical paths of every source file in the module.
pub fn source_paths(module: &ModuleRoot, config: &Config) -> Result<Vec<PathBuf>> {
    let walker = FileWalker::new(WalkerConfig {
        git_ignore: config.scan.git_ignore,
        exclude: config.scan.exclude.clone(),
        ..Default::default()
    })?;

    let mut roots = module.source_roots();
    for include in config.include_paths(&module.package_dir) {
        let include = include
            .canonicalize()
            .map_err(|e| Error::resolution(&include, format!("scan.include: {e}")))?;
        roots.push(include);
    }

    let mut paths = Vec::new();
    for root in &roots {
        let (files, stats) = walker.walk_collect(root);
        if let Some(first) = stats.first_error {
            return Err(Error::resolution(
                root,
                format!("walk failed with {} error(s): {first}", stats.errors),
            ));
        }
        for file in files {
            let path = file.canonicalize().map_err(|e| Error::resolution(&file, e))?;
            paths.push(path);
        }
    }

    paths.sort();
    paths.dedup();
    Ok(paths)
}

/// Read every relevant source file of the module, sorted by path.
pub fn load_sources(module: &ModuleRoot, config: &Config) -> Result<Vec<SourceFile>> {
    let paths = source_paths(module, config)?;
    let prefilter = Prefilter::new()?;

    let loaded = paths
        .par_iter()
        .map(|path| prefilter.load(path))
        .collect::<Result<Vec<_>>>()?;
    let total = loaded.len();

    let sources: Vec<SourceFile> = loaded.into_iter().filter(SourceFile::is_relevant).collect();
    tracing::debug!(
        "{}: {} of {} source files mention tags or probes ({} lines)",
        module.name,
        sources.len(),
        total,
        sources.iter().map(SourceFile::line_count).sum::<usize>()
    );
    Ok(sources)
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;
