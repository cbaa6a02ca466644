// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for crash recovery.
//!
//! The whole state serializes to one JSON file, written atomically
//! (temp + rename) with up to three rotating `.bak` copies. Chunk files
//! and blobs live next to it and are reconciled against the loaded
//! state on startup.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ServerState;

/// Current snapshot schema version.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

const MAX_BAK_FILES: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    Version(u32),
}

/// State plus enough envelope to survive format evolution.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "v")]
    pub version: u32,
    pub state: ServerState,
    pub created_at: DateTime<Utc>,
}

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }
    bak(1)
}

/// Write a snapshot atomically, rotating the previous file to `.bak`.
pub fn save(state: &ServerState, path: &Path) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let snapshot = Snapshot {
        version: CURRENT_SNAPSHOT_VERSION,
        state: state.clone(),
        created_at: Utc::now(),
    };
    let raw = serde_json::to_vec(&snapshot)?;

    if path.exists() {
        let _ = fs::copy(path, rotate_bak_path(path));
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, raw)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Load a snapshot; `None` when none exists yet.
pub fn load(path: &Path) -> Result<Option<ServerState>, SnapshotError> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let snapshot: Snapshot = serde_json::from_slice(&raw)?;
    if snapshot.version != CURRENT_SNAPSHOT_VERSION {
        return Err(SnapshotError::Version(snapshot.version));
    }
    Ok(Some(snapshot.state))
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
