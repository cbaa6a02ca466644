// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage adapters: one interface over local FS, S3, GCS, and SMB.
//!
//! Every backend normalizes its failures into the four [`AdapterError`]
//! categories so callers get one retry/abort story regardless of where
//! the files live. Transient failures are retried with bounded
//! exponential backoff inside the adapter; permission and not-found
//! errors are terminal.

pub mod credentials;
pub mod gcs;
pub mod local;
pub mod retry;
pub mod s3;
pub mod smb;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use credentials::store::{CredentialStore, VaultError};
pub use credentials::{
    ConnectorCredentials, GcsCredentials, MissingField, S3Credentials, SmbCredentials,
};
pub use gcs::GcsAdapter;
pub use local::LocalAdapter;
pub use retry::RetryPolicy;
pub use s3::S3Adapter;
pub use smb::SmbAdapter;

/// Normalized adapter failure categories.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("connection failure: {0}")]
    ConnectionFailure(String),
    #[error("invalid location: {0}")]
    InvalidLocation(String),
}

impl AdapterError {
    /// Only connection failures are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, AdapterError::ConnectionFailure(_))
    }
}

/// A listed file with the metadata the fingerprinting layer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    /// Path relative to the listed location, `/`-separated on every OS.
    pub path: String,
    pub size: u64,
    /// Absent when the backend does not report modification times.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

/// Uniform listing interface over storage backends.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// List relative file paths under a location.
    async fn list_files(&self, location: &str) -> Result<Vec<String>, AdapterError> {
        Ok(self
            .list_files_with_metadata(location)
            .await?
            .into_iter()
            .map(|meta| meta.path)
            .collect())
    }

    /// List files with size and (when available) modification time.
    async fn list_files_with_metadata(&self, location: &str)
        -> Result<Vec<FileMeta>, AdapterError>;

    /// Cheap reachability probe: `(ok, human-readable message)`.
    async fn test_connection(&self) -> (bool, String);
}
