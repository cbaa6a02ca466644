// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GCS adapter over `object_store`.
//!
//! Locations are `bucket/prefix`, like S3. The store is rebuilt per
//! listed bucket; construction is local and cheap. `Forbidden`-class and
//! `NotFound` errors are terminal, the rest retried.

use async_trait::async_trait;
use futures_util::StreamExt;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;

use crate::credentials::GcsCredentials;
use crate::retry::RetryPolicy;
use crate::{AdapterError, FileMeta, StorageAdapter};

/// Adapter over Google Cloud Storage buckets.
pub struct GcsAdapter {
    service_account_json: String,
    retry: RetryPolicy,
}

impl GcsAdapter {
    /// Validate credentials and build the adapter.
    pub fn connect(creds: &GcsCredentials) -> Result<Self, AdapterError> {
        // Fail early on credentials that cannot possibly work.
        serde_json::from_str::<serde_json::Value>(&creds.service_account_json).map_err(|err| {
            AdapterError::InvalidLocation(format!("invalid service_account_json: {err}"))
        })?;
        Ok(Self {
            service_account_json: creds.service_account_json.clone(),
            retry: RetryPolicy::default(),
        })
    }

    fn store_for(&self, bucket: &str) -> Result<impl ObjectStore, AdapterError> {
        GoogleCloudStorageBuilder::new()
            .with_bucket_name(bucket)
            .with_service_account_key(&self.service_account_json)
            .build()
            .map_err(classify)
    }

    async fn list_once(&self, bucket: &str, prefix: &str) -> Result<Vec<FileMeta>, AdapterError> {
        let store = self.store_for(bucket)?;
        let prefix_path =
            if prefix.is_empty() { None } else { Some(ObjectPath::from(prefix)) };
        let mut stream = store.list(prefix_path.as_ref());

        let mut files = Vec::new();
        while let Some(item) = stream.next().await {
            let meta = item.map_err(classify)?;
            let full = meta.location.to_string();
            let relative = match prefix_path.as_ref() {
                Some(p) => full
                    .strip_prefix(p.as_ref())
                    .map(|rest| rest.trim_start_matches('/').to_string())
                    .unwrap_or(full),
                None => full,
            };
            files.push(FileMeta {
                path: relative,
                size: meta.size as u64,
                last_modified: Some(meta.last_modified),
            });
        }
        Ok(files)
    }
}

/// Map `object_store` errors onto the adapter taxonomy.
fn classify(err: object_store::Error) -> AdapterError {
    let text = err.to_string();
    match err {
        object_store::Error::NotFound { .. } => AdapterError::NotFound(text),
        object_store::Error::PermissionDenied { .. }
        | object_store::Error::Unauthenticated { .. } => AdapterError::PermissionDenied(text),
        object_store::Error::InvalidPath { .. } => AdapterError::InvalidLocation(text),
        _ => AdapterError::ConnectionFailure(text),
    }
}

/// Split `bucket/prefix` (with optional `gs://`) into its parts.
fn parse_location(location: &str) -> Result<(String, String), AdapterError> {
    let trimmed = location.strip_prefix("gs://").unwrap_or(location);
    let trimmed = trimmed.trim_matches('/');
    if trimmed.is_empty() {
        return Err(AdapterError::InvalidLocation(format!(
            "expected bucket[/prefix], got: {location}"
        )));
    }
    match trimmed.split_once('/') {
        Some((bucket, prefix)) => Ok((bucket.to_string(), prefix.trim_matches('/').to_string())),
        None => Ok((trimmed.to_string(), String::new())),
    }
}

#[async_trait]
impl StorageAdapter for GcsAdapter {
    async fn list_files_with_metadata(
        &self,
        location: &str,
    ) -> Result<Vec<FileMeta>, AdapterError> {
        let (bucket, prefix) = parse_location(location)?;
        self.retry.run("gcs list", || self.list_once(&bucket, &prefix)).await
    }

    async fn test_connection(&self) -> (bool, String) {
        // Network checks need a bucket, which lives on the collection; a
        // parse check mirrors what connecting validates.
        match serde_json::from_str::<serde_json::Value>(&self.service_account_json) {
            Ok(value) => {
                let account = value
                    .get("client_email")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown account");
                (true, format!("service account parsed: {account}"))
            }
            Err(err) => (false, format!("invalid service account JSON: {err}")),
        }
    }
}

#[cfg(test)]
#[path = "gcs_tests.rs"]
mod tests;
