// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Update check: compare the local build against the server's latest
//! agent version. The answer is cached as JSON with a TTL so repeated
//! invocations don't hit the server.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ap_core::Clock;
use serde::{Deserialize, Serialize};

use crate::client::{ClientError, ServerApi};

/// How long a cached answer stays valid.
pub const VERSION_CACHE_TTL: Duration = Duration::from_secs(3600);

const CACHE_FILE: &str = "version_cache.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedVersion {
    version: String,
    fetched_at_secs: u64,
}

/// Result of an update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCheck {
    pub current: String,
    pub latest: String,
    pub update_available: bool,
    /// Whether the answer came from the TTL cache.
    pub from_cache: bool,
}

/// Check for a newer agent version, consulting the cache first.
pub async fn check(
    api: &impl ServerApi,
    home: &Path,
    current: &str,
    clock: &impl Clock,
) -> Result<UpdateCheck, ClientError> {
    let cache_path = home.join(CACHE_FILE);

    if let Some(cached) = read_fresh_cache(&cache_path, clock) {
        return Ok(evaluate(current, cached.version, true));
    }

    let latest = api.server_version().await?.version;
    write_cache(&cache_path, &latest, clock);
    Ok(evaluate(current, latest, false))
}

fn evaluate(current: &str, latest: String, from_cache: bool) -> UpdateCheck {
    let update_available = version_key(&latest) > version_key(current);
    UpdateCheck { current: current.to_string(), latest, update_available, from_cache }
}

fn read_fresh_cache(path: &PathBuf, clock: &impl Clock) -> Option<CachedVersion> {
    let raw = fs::read_to_string(path).ok()?;
    let cached: CachedVersion = serde_json::from_str(&raw).ok()?;
    let age = clock.epoch_secs().saturating_sub(cached.fetched_at_secs);
    (age < VERSION_CACHE_TTL.as_secs()).then_some(cached)
}

fn write_cache(path: &Path, version: &str, clock: &impl Clock) {
    let cached =
        CachedVersion { version: version.to_string(), fetched_at_secs: clock.epoch_secs() };
    if let Ok(raw) = serde_json::to_string(&cached) {
        // Cache writes are best effort.
        let _ = fs::create_dir_all(path.parent().unwrap_or(Path::new(".")));
        let _ = fs::write(path, raw);
    }
}

/// Numeric sort key for dotted versions; unparsable parts compare as 0.
fn version_key(version: &str) -> (u64, u64, u64) {
    let mut parts = version.trim_start_matches('v').split('.');
    let mut next = || {
        parts
            .next()
            .and_then(|p| p.chars().take_while(char::is_ascii_digit).collect::<String>().parse().ok())
            .unwrap_or(0)
    };
    (next(), next(), next())
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod tests;
