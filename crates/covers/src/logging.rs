// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Optional log output for test binaries.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "COVERS_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Install a fmt subscriber writing through the test harness.
///
/// The filter comes from `COVERS_LOG` (default `warn`). Safe to call from
/// every test: only the first call installs anything.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(std::env::var(LOG_ENV).ok().as_deref()))
        .with_test_writer()
        .with_target(false)
        .try_init();
}

fn filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
