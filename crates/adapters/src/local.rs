// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local filesystem adapter.
//!
//! Every location must resolve to a directory under one of the agent's
//! authorized roots. The three rejection cases stay distinguishable
//! through the error detail: not-found, permission-denied, and
//! not-under-an-authorized-root.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{AdapterError, FileMeta, StorageAdapter};

/// Adapter over directories the agent host is allowed to scan.
#[derive(Debug, Clone)]
pub struct LocalAdapter {
    authorized_roots: Vec<PathBuf>,
}

impl LocalAdapter {
    pub fn new(authorized_roots: Vec<PathBuf>) -> Self {
        Self { authorized_roots }
    }

    pub fn authorized_roots(&self) -> &[PathBuf] {
        &self.authorized_roots
    }

    /// Resolve and authorize a location.
    fn validate(&self, location: &str) -> Result<PathBuf, AdapterError> {
        let path = Path::new(location);
        let resolved = path.canonicalize().map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => {
                AdapterError::NotFound(format!("path does not exist: {location}"))
            }
            io::ErrorKind::PermissionDenied => {
                AdapterError::PermissionDenied(format!("cannot access: {location}"))
            }
            _ => AdapterError::ConnectionFailure(format!("cannot resolve {location}: {err}")),
        })?;

        if !resolved.is_dir() {
            return Err(AdapterError::InvalidLocation(format!(
                "not a directory: {location}"
            )));
        }

        let authorized = self.authorized_roots.iter().any(|root| {
            root.canonicalize()
                .map(|root| resolved.starts_with(root))
                .unwrap_or(false)
        });
        if !authorized {
            return Err(AdapterError::PermissionDenied(format!(
                "path is not under an authorized root: {location}"
            )));
        }

        Ok(resolved)
    }
}

/// Recursively collect files under `base`, paths relative and
/// `/`-separated for cross-OS fingerprint stability.
fn walk(base: &Path) -> Result<Vec<FileMeta>, AdapterError> {
    let mut out = Vec::new();
    let mut stack = vec![base.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|err| map_io(&dir, err))?;
        for entry in entries {
            let entry = entry.map_err(|err| map_io(&dir, err))?;
            let path = entry.path();
            let meta = entry.metadata().map_err(|err| map_io(&path, err))?;
            if meta.is_dir() {
                stack.push(path);
                continue;
            }
            if !meta.is_file() {
                continue;
            }
            let relative = path
                .strip_prefix(base)
                .map_err(|_| {
                    AdapterError::InvalidLocation(format!("escaped base dir: {}", path.display()))
                })?
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let last_modified = meta.modified().ok().map(DateTime::<Utc>::from);
            out.push(FileMeta { path: relative, size: meta.len(), last_modified });
        }
    }

    Ok(out)
}

fn map_io(path: &Path, err: io::Error) -> AdapterError {
    match err.kind() {
        io::ErrorKind::NotFound => AdapterError::NotFound(format!("{}", path.display())),
        io::ErrorKind::PermissionDenied => {
            AdapterError::PermissionDenied(format!("{}", path.display()))
        }
        _ => AdapterError::ConnectionFailure(format!("{}: {err}", path.display())),
    }
}

#[async_trait]
impl StorageAdapter for LocalAdapter {
    async fn list_files_with_metadata(
        &self,
        location: &str,
    ) -> Result<Vec<FileMeta>, AdapterError> {
        let base = self.validate(location)?;
        // The walk is blocking filesystem work; keep it off the runtime.
        tokio::task::spawn_blocking(move || walk(&base))
            .await
            .map_err(|err| AdapterError::ConnectionFailure(format!("walk task failed: {err}")))?
    }

    async fn test_connection(&self) -> (bool, String) {
        if self.authorized_roots.is_empty() {
            return (false, "no authorized roots configured".to_string());
        }
        let missing: Vec<String> = self
            .authorized_roots
            .iter()
            .filter(|root| !root.is_dir())
            .map(|root| root.display().to_string())
            .collect();
        if missing.is_empty() {
            (true, format!("{} authorized root(s) accessible", self.authorized_roots.len()))
        } else {
            (false, format!("missing authorized roots: {}", missing.join(", ")))
        }
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
