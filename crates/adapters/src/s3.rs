// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S3 adapter: paginated listing with bounded retry.
//!
//! Permission failures (`AccessDenied`, `InvalidAccessKeyId`,
//! `SignatureDoesNotMatch`) are terminal; everything else transport-ish
//! goes through the retry policy.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::ProvideErrorMetadata;

use crate::credentials::S3Credentials;
use crate::retry::RetryPolicy;
use crate::{AdapterError, FileMeta, StorageAdapter};

/// Adapter over an S3 (or S3-compatible) endpoint.
pub struct S3Adapter {
    client: aws_sdk_s3::Client,
    retry: RetryPolicy,
}

impl S3Adapter {
    /// Build a client from vault credentials.
    pub async fn connect(creds: &S3Credentials) -> Result<Self, AdapterError> {
        let provider = Credentials::new(
            creds.access_key_id.clone(),
            creds.secret_access_key.clone(),
            None,
            None,
            "aperture-vault",
        );
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(creds.region.clone()))
            .credentials_provider(provider)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &creds.endpoint_url {
            // Path-style addressing for MinIO-style endpoints.
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = aws_sdk_s3::Client::from_conf(builder.build());
        Ok(Self { client, retry: RetryPolicy::default() })
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        token: Option<String>,
    ) -> Result<(Vec<FileMeta>, Option<String>), AdapterError> {
        let mut request = self.client.list_objects_v2().bucket(bucket);
        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }
        if let Some(token) = token {
            request = request.continuation_token(token);
        }

        let response = request.send().await.map_err(|err| {
            let code = err.as_service_error().and_then(|e| e.meta().code().map(str::to_string));
            classify_code(code.as_deref(), err.to_string())
        })?;

        let mut page = Vec::new();
        for object in response.contents() {
            let Some(key) = object.key() else { continue };
            // Keys ending in '/' are zero-byte folder markers.
            if key.ends_with('/') {
                continue;
            }
            let last_modified = object
                .last_modified()
                .and_then(|dt| chrono::DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()));
            page.push(FileMeta {
                path: relative_key(key, prefix),
                size: object.size().unwrap_or(0).max(0) as u64,
                last_modified,
            });
        }

        let next = if response.is_truncated().unwrap_or(false) {
            response.next_continuation_token().map(str::to_string)
        } else {
            None
        };
        Ok((page, next))
    }
}

/// Map an S3 error code onto the adapter taxonomy.
fn classify_code(code: Option<&str>, detail: String) -> AdapterError {
    match code {
        Some("AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch") => {
            AdapterError::PermissionDenied(detail)
        }
        Some("NoSuchBucket" | "NoSuchKey") => AdapterError::NotFound(detail),
        _ => AdapterError::ConnectionFailure(detail),
    }
}

/// Split `bucket/prefix` (with optional `s3://`) into its parts.
fn parse_location(location: &str) -> Result<(String, String), AdapterError> {
    let trimmed = location.strip_prefix("s3://").unwrap_or(location);
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

/// Object key relative to the listed prefix.
fn relative_key(key: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return key.to_string();
    }
    key.strip_prefix(prefix)
        .map(|rest| rest.trim_start_matches('/').to_string())
        .unwrap_or_else(|| key.to_string())
}

#[async_trait]
impl StorageAdapter for S3Adapter {
    async fn list_files_with_metadata(
        &self,
        location: &str,
    ) -> Result<Vec<FileMeta>, AdapterError> {
        let (bucket, prefix) = parse_location(location)?;
        let mut files = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let current = token.clone();
            let (page, next) = self
                .retry
                .run("s3 list_objects_v2", || self.list_page(&bucket, &prefix, current.clone()))
                .await?;
            files.extend(page);
            match next {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        Ok(files)
    }

    async fn test_connection(&self) -> (bool, String) {
        match self.client.list_buckets().send().await {
            Ok(response) => {
                (true, format!("connected; {} bucket(s) visible", response.buckets().len()))
            }
            Err(err) => {
                let code = err.as_service_error().and_then(|e| e.meta().code().map(str::to_string));
                (false, classify_code(code.as_deref(), err.to_string()).to_string())
            }
        }
    }
}

#[cfg(test)]
#[path = "s3_tests.rs"]
mod tests;
