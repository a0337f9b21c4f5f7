// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime side of instrumentation: counter cells and the `probe!` macro.
//!
//! Every `covers::probe!()` invocation site owns one process-wide [`Counter`].
//! Cells live in a [`ProbeRegistry`] keyed by the canonical source location of
//! the invocation, so the block index can look up (or create) the same cell by
//! parsing the source file.
//!
//! How cells increment is decided by the process-wide [`Mode`], fixed on first
//! use and never changed afterwards.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;

use crate::config;
use crate::error::{Error, Result};
use crate::module;
use crate::position::Location;

/// How probes record executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Probes do nothing.
    #[default]
    Disabled,
    /// Non-atomic read-modify-write. Cheap, but concurrent hits may be lost.
    Count,
    /// Atomic increment with sequentially consistent reads.
    Atomic,
    /// Records only whether the probe ran. Unusable for deltas.
    Set,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Disabled => "disabled",
            Mode::Count => "count",
            Mode::Atomic => "atomic",
            Mode::Set => "set",
        }
    }

    /// True when probes touch their cells at all.
    pub fn is_enabled(self) -> bool {
        self != Mode::Disabled
    }

    /// True when cell values are execution counts.
    pub fn is_counting(self) -> bool {
        matches!(self, Mode::Count | Mode::Atomic)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "off" | "disabled" | "none" => Ok(Mode::Disabled),
            "count" => Ok(Mode::Count),
            "atomic" => Ok(Mode::Atomic),
            "set" => Ok(Mode::Set),
            _ => Err(Error::WrongMode {
                mode: s.to_string(),
            }),
        }
    }
}

/// The fixed process mode, or the unrecognized value it was configured with.
static MODE: OnceLock<std::result::Result<Mode, String>> = OnceLock::new();

/// Fix the process mode explicitly.
///
/// Must run before the first probe fires or the first setup call. Calling it
/// again with the same mode is a no-op; any other mode is rejected.
pub fn init(mode: Mode) -> Result<()> {
    match MODE.get_or_init(|| Ok(mode)) {
        Ok(current) if *current == mode => Ok(()),
        Ok(current) => Err(Error::ModeConflict {
            current: *current,
            requested: mode,
        }),
        Err(raw) => Err(Error::WrongMode { mode: raw.clone() }),
    }
}

/// The process mode, resolving it from the environment on first use.
///
/// An unrecognized configured value is reported as [`Error::WrongMode`].
pub fn mode() -> Result<Mode> {
    MODE.get_or_init(resolve)
        .clone()
        .map_err(|mode| Error::WrongMode { mode })
}

/// The mode probes actually run under: unrecognized values count as disabled.
pub fn effective_mode() -> Mode {
    match MODE.get_or_init(resolve) {
        Ok(mode) => *mode,
        Err(_) => Mode::Disabled,
    }
}

fn resolve() -> std::result::Result<Mode, String> {
    let raw = match module::package_dir().and_then(|dir| config::resolve_mode(&dir)) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("ignoring covers config while resolving mode: {}", e);
            std::env::var(config::MODE_ENV).ok()
        }
    };
    let Some(raw) = raw else {
        return Ok(Mode::Disabled);
    };
    let mode = raw.parse::<Mode>().map_err(|_| raw)?;
    tracing::debug!("instrumentation mode: {}", mode);
    Ok(mode)
}

/// Identity of a counter cell, unique within its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CounterId(pub u32);

impl fmt::Display for CounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One execution counter.
#[derive(Debug)]
pub struct Counter {
    id: CounterId,
    value: AtomicU32,
}

impl Counter {
    fn new(id: CounterId) -> Self {
        Self {
            id,
            value: AtomicU32::new(0),
        }
    }

    pub fn id(&self) -> CounterId {
        self.id
    }

    /// Record one execution under `mode`.
    #[inline]
    pub fn hit(&self, mode: Mode) {
        match mode {
            Mode::Disabled => {}
            Mode::Count => {
                // Separate load and store: concurrent hits may be lost.
                let value = self.value.load(Ordering::Relaxed);
                self.value.store(value.wrapping_add(1), Ordering::Relaxed);
            }
            Mode::Atomic => {
                self.value.fetch_add(1, Ordering::SeqCst);
            }
            Mode::Set => self.value.store(1, Ordering::Relaxed),
        }
    }

    /// Read the current value with the ordering `mode` calls for.
    pub fn load(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Atomic => self.value.load(Ordering::SeqCst),
            _ => self.value.load(Ordering::Relaxed),
        }
    }
}

/// Process-wide store of counter cells keyed by probe location.
///
/// Cells are leaked so they can be shared as `&'static` by probes and tables.
/// A registry only ever grows, one cell per distinct probe site.
#[derive(Debug, Default)]
pub struct ProbeRegistry {
    cells: DashMap<Location, &'static Counter>,
    next_id: AtomicU32,
    workspace_roots: DashMap<PathBuf, PathBuf>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry every `probe!` site reports into.
    pub fn global() -> &'static ProbeRegistry {
        static REGISTRY: OnceLock<ProbeRegistry> = OnceLock::new();
        REGISTRY.get_or_init(ProbeRegistry::new)
    }

    /// Get or create the cell for a probe at `location`.
    pub fn cell(&self, location: Location) -> &'static Counter {
        *self.cells.entry(location).or_insert_with(|| {
            let id = CounterId(self.next_id.fetch_add(1, Ordering::Relaxed));
            let cell: &'static Counter = Box::leak(Box::new(Counter::new(id)));
            cell
        })
    }

    /// The cell for `location`, if any probe or index has created it.
    pub fn get(&self, location: &Location) -> Option<&'static Counter> {
        self.cells.get(location).map(|cell| *cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Turn a `file!()` path into the canonical path the scanner reports.
    ///
    /// Cargo passes workspace members to rustc relative to the workspace root,
    /// and standalone packages relative to their own directory.
    pub fn source_path(&self, file: &str, manifest_dir: &str) -> PathBuf {
        let file = Path::new(file);
        let joined = if file.is_absolute() {
            file.to_path_buf()
        } else {
            let manifest_dir = Path::new(manifest_dir);
            let root = self
                .workspace_roots
                .entry(manifest_dir.to_path_buf())
                .or_insert_with(|| module::workspace_root(manifest_dir))
                .clone();
            let candidate = root.join(file);
            if candidate.exists() {
                candidate
            } else {
                manifest_dir.join(file)
            }
        };
        std::fs::canonicalize(&joined).unwrap_or(joined)
    }
}

/// One `probe!` invocation site. Built by the macro; not meant for direct use.
#[derive(Debug)]
pub struct Probe {
    file: &'static str,
    line: u32,
    column: u32,
    manifest_dir: &'static str,
    cell: OnceLock<&'static Counter>,
}

impl Probe {
    #[doc(hidden)]
    pub const fn new(file: &'static str, line: u32, column: u32, manifest_dir: &'static str) -> Self {
        Self {
            file,
            line,
            column,
            manifest_dir,
            cell: OnceLock::new(),
        }
    }

    /// Record one execution of this site.
    #[inline]
    pub fn hit(&self) {
        let mode = effective_mode();
        if mode.is_enabled() {
            self.counter().hit(mode);
        }
    }

    /// This site's cell in the global registry.
    pub fn counter(&self) -> &'static Counter {
        self.cell
            .get_or_init(|| ProbeRegistry::global().cell(self.site()))
    }

    /// Canonical location of the invocation.
    pub fn site(&self) -> Location {
        let file = ProbeRegistry::global().source_path(self.file, self.manifest_dir);
        Location::new(file, self.line, self.column)
    }
}

/// Count executions of the enclosing block from this point on.
///
/// The counted range starts at the invocation and runs to the end of the
/// innermost enclosing `{ ... }` block, or up to the next `probe!` inside it.
/// Annotate lines in that range with a `//covers:<tag>` comment to observe the
/// count from a test.
///
/// ```ignore
/// fn parse(input: &str) -> Option<u32> {
///     if input.is_empty() {
///         covers::probe!();
///         return None; //covers:parse-empty
///     }
///     input.parse().ok()
/// }
/// ```
#[macro_export]
macro_rules! probe {
    () => {{
        static PROBE: $crate::instrument::Probe = $crate::instrument::Probe::new(
            ::core::file!(),
            ::core::line!(),
            ::core::column!(),
            ::core::env!("CARGO_MANIFEST_DIR"),
        );
        PROBE.hit();
    }};
}

#[cfg(test)]
#[path = "instrument_tests.rs"]
mod tests;
