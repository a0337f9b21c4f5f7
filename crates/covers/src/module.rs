// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The package under test and the directories its sources live in.
//!
//! The package directory comes from `CARGO_MANIFEST_DIR`, which Cargo sets for
//! every test run. Targets declared in `Cargo.toml` whose paths leave the
//! package directory are scanned too, together with their module directory.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const MANIFEST: &str = "Cargo.toml";

/// Target tables whose `path` keys can point at sources.
const TARGET_ARRAYS: &[&str] = &["bin", "test", "bench", "example"];

/// Where the sources of one package live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRoot {
    /// Package name from `[package]`.
    pub name: String,
    /// Canonical package directory.
    pub package_dir: PathBuf,
    /// Enclosing workspace root, or the package directory for standalone packages.
    pub workspace_root: PathBuf,
    /// Target files and module directories outside `package_dir`.
    pub extra_roots: Vec<PathBuf>,
}

impl ModuleRoot {
    /// Load the package currently under test.
    pub fn from_env() -> Result<Self> {
        Self::load(&package_dir()?)
    }

    /// Load the package whose manifest sits in `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let package_dir = dir
            .canonicalize()
            .map_err(|e| Error::resolution(dir, e))?;
        let manifest_path = package_dir.join(MANIFEST);
        let content = std::fs::read_to_string(&manifest_path)
            .map_err(|e| Error::resolution(&manifest_path, e))?;
        let manifest: toml::Table = content
            .parse()
            .map_err(|e| Error::resolution(&manifest_path, e))?;

        let Some(name) = manifest
            .get("package")
            .and_then(|p| p.get("name"))
            .and_then(|n| n.as_str())
        else {
            return Err(Error::resolution(
                &manifest_path,
                "manifest has no [package] name",
            ));
        };

        let extra_roots = outside_target_roots(&manifest, &package_dir);
        if !extra_roots.is_empty() {
            tracing::debug!("extra source roots for {}: {:?}", name, extra_roots);
        }

        Ok(Self {
            name: name.to_string(),
            workspace_root: workspace_root(&package_dir),
            package_dir,
            extra_roots,
        })
    }

    /// Every root to scan: the package directory first, then the extras.
    pub fn source_roots(&self) -> Vec<PathBuf> {
        std::iter::once(self.package_dir.clone())
            .chain(self.extra_roots.iter().cloned())
            .collect()
    }
}

/// The package directory of the running test binary.
pub fn package_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("CARGO_MANIFEST_DIR") {
        return Ok(PathBuf::from(dir));
    }
    std::env::current_dir().map_err(|e| Error::resolution(".", e))
}

/// Nearest ancestor of `manifest_dir` whose manifest declares `[workspace]`.
///
/// The search stops at the git root. Falls back to `manifest_dir` itself.
pub fn workspace_root(manifest_dir: &Path) -> PathBuf {
    for dir in manifest_dir.ancestors() {
        if declares_workspace(&dir.join(MANIFEST)) {
            return dir.to_path_buf();
        }
        if dir.join(".git").exists() {
            break;
        }
    }
    manifest_dir.to_path_buf()
}

fn declares_workspace(manifest_path: &Path) -> bool {
    std::fs::read_to_string(manifest_path)
        .ok()
        .and_then(|content| content.parse::<toml::Table>().ok())
        .is_some_and(|manifest| manifest.contains_key("workspace"))
}

/// Target paths declared outside `package_dir`, plus their module directories.
fn outside_target_roots(manifest: &toml::Table, package_dir: &Path) -> Vec<PathBuf> {
    let lib = manifest.get("lib").into_iter();
    let arrays = TARGET_ARRAYS
        .iter()
        .filter_map(|key| manifest.get(*key).and_then(|v| v.as_array()))
        .flatten();

    let mut roots = Vec::new();
    for target in lib.chain(arrays) {
        let Some(path) = target.get("path").and_then(|p| p.as_str()) else {
            continue;
        };
        let Ok(file) = package_dir.join(path).canonicalize() else {
            tracing::debug!("skipping missing target path {}", path);
            continue;
        };
        if file.starts_with(package_dir) {
            continue;
        }
        if let Some(dir) = module_dir(&file).filter(|d| d.is_dir()) {
            roots.push(dir);
        }
        roots.push(file);
    }

    roots.sort();
    roots.dedup();
    roots
}

/// Directory holding the submodules of a target's root file.
fn module_dir(file: &Path) -> Option<PathBuf> {
    let parent = file.parent()?;
    let stem = file.file_stem()?.to_str()?;
    match stem {
        "lib" | "main" | "mod" => Some(parent.to_path_buf()),
        _ => Some(parent.join(stem)),
    }
}

#[cfg(test)]
#[path = "module_tests.rs"]
mod tests;
