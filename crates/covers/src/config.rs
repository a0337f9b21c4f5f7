// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Optional `covers.toml` configuration and its discovery.
//!
//! The file is looked up from the package directory upwards, stopping at the
//! git root. Every field is optional; a missing file means defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Config file name.
pub const CONFIG_FILE: &str = "covers.toml";

/// Environment variable that overrides `instrument.mode`.
pub const MODE_ENV: &str = "COVERS_MODE";

const SUPPORTED_VERSION: i64 = 1;

/// Keys understood in each table. Anything else is reported and ignored.
const KNOWN_KEYS: &[(&str, &[&str])] = &[
    ("version", &[]),
    ("instrument", &["mode"]),
    ("scan", &["include", "exclude", "git_ignore"]),
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: Option<i64>,
    pub instrument: InstrumentConfig,
    pub scan: ScanConfig,

    /// Directory holding the config file; relative include paths start here.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    /// off | count | atomic | set
    pub mode: Option<String>,
}

/// Extra roots and exclusions for source scanning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Additional directories or files to scan, relative to the config file.
    pub include: Vec<String>,

    /// Glob patterns, relative to each scanned root.
    pub exclude: Vec<String>,

    /// Honor `.gitignore` files while walking.
    pub git_ignore: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            git_ignore: true,
        }
    }
}

impl Config {
    /// Include paths made absolute against the config file's directory.
    pub fn include_paths(&self, fallback_base: &Path) -> Vec<PathBuf> {
        let base = self.base_dir.as_deref().unwrap_or(fallback_base);
        self.scan.include.iter().map(|p| base.join(p)).collect()
    }
}

/// Find covers.toml starting from `start_dir` and walking up to git root.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.is_file() {
            return Some(config_path);
        }

        // Stop at git root
        if current.join(".git").exists() {
            return None;
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return None,
        }
    }
}

/// Parse one config file.
pub fn load(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| config_error(path, e))?;
    parse(&content, path)
}

/// Load the config that applies to `package_dir`, or defaults when none exists.
pub fn load_for(package_dir: &Path) -> Result<Config> {
    match find_config(package_dir) {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            load(&path)
        }
        None => Ok(Config::default()),
    }
}

/// Raw mode value for `package_dir`: `COVERS_MODE` first, then the config file.
pub fn resolve_mode(package_dir: &Path) -> Result<Option<String>> {
    let env = std::env::var_os(MODE_ENV).map(|v| v.to_string_lossy().into_owned());
    mode_from(env, package_dir)
}

pub(crate) fn mode_from(env: Option<String>, package_dir: &Path) -> Result<Option<String>> {
    if env.is_some() {
        return Ok(env);
    }
    Ok(load_for(package_dir)?.instrument.mode)
}

fn parse(content: &str, path: &Path) -> Result<Config> {
    let table: toml::Table = content.parse().map_err(|e| config_error(path, e))?;
    warn_unknown_keys(&table, path);

    if let Some(version) = table.get("version") {
        match version.as_integer() {
            Some(SUPPORTED_VERSION) => {}
            _ => {
                return Err(config_error(
                    path,
                    format!("unsupported version {version} (expected {SUPPORTED_VERSION})"),
                ));
            }
        }
    }

    let mut config: Config = table.try_into().map_err(|e| config_error(path, e))?;
    config.base_dir = path.parent().map(Path::to_path_buf);
    Ok(config)
}

fn warn_unknown_keys(table: &toml::Table, path: &Path) {
    for (key, value) in table {
        let Some((_, nested)) = KNOWN_KEYS.iter().find(|(known, _)| known == key) else {
            tracing::warn!("{}: unknown key `{}` ignored", path.display(), key);
            continue;
        };
        if let Some(inner) = value.as_table() {
            for inner_key in inner.keys() {
                if !nested.contains(&inner_key.as_str()) {
                    tracing::warn!(
                        "{}: unknown key `{}.{}` ignored",
                        path.display(),
                        key,
                        inner_key
                    );
                }
            }
        }
    }
}

fn config_error(path: &Path, reason: impl ToString) -> Error {
    Error::Config {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
