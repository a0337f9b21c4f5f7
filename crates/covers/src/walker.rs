// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Source file discovery for one package.
//!
//! Walks a root with gitignore and hidden-file handling, keeps `.rs` files,
//! and prunes build output, nested packages, and excluded globs. Large trees
//! are walked in parallel; results are always returned sorted by path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::unbounded;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder, WalkState};

use crate::config::CONFIG_FILE;
use crate::error::{Error, Result};

/// Default number of top-level entries (times ten) above which walks go parallel.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1000;

const SOURCE_EXTENSION: &str = "rs";

/// Configuration for the file walker.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Respect `.gitignore` files.
    pub git_ignore: bool,

    /// Skip hidden files and directories.
    pub hidden: bool,

    /// Glob patterns relative to the walk root. A pattern also excludes
    /// everything below a matching directory.
    pub exclude: Vec<String>,

    /// Skip subdirectories holding their own `Cargo.toml`.
    pub skip_nested_packages: bool,

    /// Top-level entry count (times ten) that switches to a parallel walk.
    /// `0` always walks in parallel.
    pub parallel_threshold: usize,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            git_ignore: true,
            hidden: true,
            exclude: Vec::new(),
            skip_nested_packages: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

/// Walk statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub files_found: usize,
    pub errors: usize,
    /// Message of the first error seen, if any.
    pub first_error: Option<String>,
}

impl WalkStats {
    fn record_error(&mut self, root: &Path, message: String) {
        tracing::debug!("walk error under {}: {}", root.display(), message);
        self.errors += 1;
        self.first_error.get_or_insert(message);
    }
}

pub struct FileWalker {
    config: WalkerConfig,
    exclude: Arc<GlobSet>,
}

impl FileWalker {
    /// Build a walker, compiling the exclude globs.
    pub fn new(config: WalkerConfig) -> Result<Self> {
        let exclude = build_glob_set(&config.exclude)?;
        Ok(Self {
            config,
            exclude: Arc::new(exclude),
        })
    }

    /// Walk `root` and collect every source file under it.
    ///
    /// `root` may also be a single file, which is returned if it is a source file.
    pub fn walk_collect(&self, root: &Path) -> (Vec<PathBuf>, WalkStats) {
        let (mut files, stats) = if self.should_use_parallel(root) {
            self.walk_parallel(root)
        } else {
            self.walk_sequential(root)
        };
        files.sort();
        (files, stats)
    }

    /// Decide between parallel and sequential walking.
    pub fn should_use_parallel(&self, root: &Path) -> bool {
        let Ok(entries) = std::fs::read_dir(root) else {
            return false;
        };
        let limit = self.config.parallel_threshold / 10;
        entries.take(limit + 1).count() > limit
    }

    fn builder(&self, root: &Path) -> WalkBuilder {
        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(self.config.hidden)
            .git_ignore(self.config.git_ignore)
            .git_exclude(self.config.git_ignore)
            .git_global(false)
            .parents(self.config.git_ignore);

        let exclude = Arc::clone(&self.exclude);
        let root = root.to_path_buf();
        let skip_nested = self.config.skip_nested_packages;
        builder.filter_entry(move |entry| keep_entry(entry, &root, &exclude, skip_nested));
        builder
    }

    fn walk_sequential(&self, root: &Path) -> (Vec<PathBuf>, WalkStats) {
        let mut files = Vec::new();
        let mut stats = WalkStats::default();

        for result in self.builder(root).build() {
            match result {
                Ok(entry) => {
                    if let Some(file) = source_file(&entry) {
                        files.push(file);
                    }
                }
                Err(e) => stats.record_error(root, e.to_string()),
            }
        }

        stats.files_found = files.len();
        (files, stats)
    }

    fn walk_parallel(&self, root: &Path) -> (Vec<PathBuf>, WalkStats) {
        let (tx, rx) = unbounded::<std::result::Result<PathBuf, String>>();

        self.builder(root).build_parallel().run(|| {
            let tx = tx.clone();
            Box::new(move |result| {
                let message = match result {
                    Ok(entry) => match source_file(&entry) {
                        Some(file) => Ok(file),
                        None => return WalkState::Continue,
                    },
                    Err(e) => Err(e.to_string()),
                };
                if tx.send(message).is_err() {
                    return WalkState::Quit;
                }
                WalkState::Continue
            })
        });
        drop(tx);

        let mut files = Vec::new();
        let mut stats = WalkStats::default();
        for message in rx {
            match message {
                Ok(file) => files.push(file),
                Err(e) => stats.record_error(root, e),
            }
        }

        stats.files_found = files.len();
        (files, stats)
    }
}

fn keep_entry(entry: &DirEntry, root: &Path, exclude: &GlobSet, skip_nested: bool) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    let path = entry.path();
    let relative = path.strip_prefix(root).unwrap_or(path);
    if exclude.is_match(relative) {
        return false;
    }

    let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
    if !is_dir {
        return true;
    }
    if is_build_output(entry) {
        return false;
    }
    !(skip_nested && path.join("Cargo.toml").is_file())
}

/// Cargo's target directory, or any directory Cargo tagged as a cache.
fn is_build_output(entry: &DirEntry) -> bool {
    (entry.depth() == 1 && entry.file_name() == "target")
        || entry.path().join("CACHEDIR.TAG").is_file()
}

fn source_file(entry: &DirEntry) -> Option<PathBuf> {
    if !entry.file_type().is_some_and(|t| t.is_file()) {
        return None;
    }
    let path = entry.path();
    (path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION)).then(|| path.to_path_buf())
}

/// Compile exclude patterns; `dir` also covers `dir/**`.
pub fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let trimmed = pattern.trim_end_matches('/');
        for candidate in [trimmed.to_string(), format!("{trimmed}/**")] {
            let glob = Glob::new(&candidate).map_err(|e| Error::Config {
                path: PathBuf::from(CONFIG_FILE),
                reason: format!("exclude pattern {pattern:?}: {e}"),
            })?;
            builder.add(glob);
        }
    }
    builder.build().map_err(|e| Error::Config {
        path: PathBuf::from(CONFIG_FILE),
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[path = "walker_tests.rs"]
mod tests;
