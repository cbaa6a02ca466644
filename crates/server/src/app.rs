// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared application state for the HTTP layer.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ap_core::{Clock, SystemClock};
use parking_lot::Mutex;

use crate::storage::ServerState;

/// Tunables, fixed at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// No heartbeat for this long marks an agent offline and requeues
    /// its jobs.
    pub heartbeat_timeout: Duration,
    /// Open upload sessions expire after this.
    pub upload_session_ttl: Duration,
    /// Cadence of the liveness/expiry/retention sweeps.
    pub sweep_interval: Duration,
    /// Latest agent release, served to `ap update`.
    pub agent_version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            heartbeat_timeout: Duration::from_secs(90),
            upload_session_ttl: Duration::from_secs(24 * 3600),
            sweep_interval: Duration::from_secs(15),
            agent_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Everything a handler needs. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    state: Arc<Mutex<ServerState>>,
    data_dir: Arc<PathBuf>,
    config: Arc<ServerConfig>,
    dirty: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(state: ServerState, data_dir: impl Into<PathBuf>, config: ServerConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            data_dir: Arc::new(data_dir.into()),
            config: Arc::new(config),
            dirty: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Read-only access under the lock.
    pub fn read<T>(&self, f: impl FnOnce(&ServerState) -> T) -> T {
        f(&self.state.lock())
    }

    /// Mutating access under the lock; marks the snapshot dirty.
    pub fn mutate<T>(&self, f: impl FnOnce(&mut ServerState) -> T) -> T {
        let result = f(&mut self.state.lock());
        self.dirty.store(true, Ordering::SeqCst);
        result
    }

    /// Take the dirty flag (true means a snapshot is due).
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::SeqCst)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn now_ms(&self) -> u64 {
        SystemClock.epoch_ms()
    }

    /// Directory for an upload session's chunk files.
    pub fn upload_dir(&self, upload_id: &str) -> PathBuf {
        self.data_dir.join("uploads").join(upload_id)
    }

    /// Directory for finalized blobs.
    pub fn blob_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }
}
