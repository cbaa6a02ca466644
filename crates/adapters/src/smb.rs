// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SMB adapter: session registration plus recursive share traversal.
//!
//! The wire-level client lives behind [`SmbTransport`] so the traversal,
//! re-registration, and retry behavior is testable without a share. A
//! dropped connection re-registers the session and retries; an
//! authentication failure is terminal.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::credentials::SmbCredentials;
use crate::retry::RetryPolicy;
use crate::{AdapterError, FileMeta, StorageAdapter};

/// One directory entry as reported by the share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmbEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Minimal session surface the adapter needs from an SMB client.
#[async_trait]
pub trait SmbTransport: Send + Sync {
    /// (Re-)register the session with the server. Idempotent.
    async fn register(&mut self) -> Result<(), AdapterError>;

    /// List one directory level. `path` is share-relative, `/`-separated,
    /// empty for the share root.
    async fn list_dir(&mut self, share: &str, path: &str) -> Result<Vec<SmbEntry>, AdapterError>;
}

/// Adapter over an SMB share. Locations are `share` or `share/sub/dir`.
pub struct SmbAdapter {
    transport: Mutex<Box<dyn SmbTransport>>,
    retry: RetryPolicy,
}

impl SmbAdapter {
    /// Connect using the native SMB client.
    pub async fn connect(creds: &SmbCredentials) -> Result<Self, AdapterError> {
        let mut transport = native::NativeSmbTransport::new(creds.clone());
        transport.register().await?;
        Ok(Self::with_transport(Box::new(transport)))
    }

    /// Build over any transport (used by tests).
    pub fn with_transport(transport: Box<dyn SmbTransport>) -> Self {
        Self { transport: Mutex::new(transport), retry: RetryPolicy::default() }
    }

    /// Depth-first traversal of one share subtree.
    async fn traverse(
        transport: &mut Box<dyn SmbTransport>,
        share: &str,
        root: &str,
    ) -> Result<Vec<FileMeta>, AdapterError> {
        let mut files = Vec::new();
        let mut stack = vec![root.to_string()];
        while let Some(dir) = stack.pop() {
            for entry in transport.list_dir(share, &dir).await? {
                if entry.name == "." || entry.name == ".." {
                    continue;
                }
                let path = if dir.is_empty() {
                    entry.name.clone()
                } else {
                    format!("{dir}/{}", entry.name)
                };
                if entry.is_dir {
                    stack.push(path);
                } else {
                    files.push(FileMeta {
                        path,
                        size: entry.size,
                        last_modified: entry.modified,
                    });
                }
            }
        }
        // Paths come out relative to the share; make them relative to
        // the listed root so fingerprints do not depend on where the
        // collection sits inside the share.
        if !root.is_empty() {
            for meta in &mut files {
                if let Some(rest) = meta.path.strip_prefix(root) {
                    meta.path = rest.trim_start_matches('/').to_string();
                }
            }
        }
        Ok(files)
    }
}

/// Split `share[/sub/dir]` into share and subtree.
fn parse_location(location: &str) -> Result<(String, String), AdapterError> {
    let trimmed = location.trim_matches(&['/', '\\'][..]);
    if trimmed.is_empty() {
        return Err(AdapterError::InvalidLocation(format!(
            "expected share[/path], got: {location}"
        )));
    }
    let normalized = trimmed.replace('\\', "/");
    match normalized.split_once('/') {
        Some((share, path)) => Ok((share.to_string(), path.trim_matches('/').to_string())),
        None => Ok((normalized, String::new())),
    }
}

#[async_trait]
impl StorageAdapter for SmbAdapter {
    async fn list_files_with_metadata(
        &self,
        location: &str,
    ) -> Result<Vec<FileMeta>, AdapterError> {
        let (share, root) = parse_location(location)?;
        self.retry
            .run("smb traverse", || async {
                let mut transport = self.transport.lock().await;
                match Self::traverse(&mut transport, &share, &root).await {
                    Err(err) if err.is_transient() => {
                        // Dropped session: re-register before the retry
                        // policy sends us around again.
                        transport.register().await?;
                        Err(err)
                    }
                    other => other,
                }
            })
            .await
    }

    async fn test_connection(&self) -> (bool, String) {
        let mut transport = self.transport.lock().await;
        match transport.register().await {
            Ok(()) => (true, "SMB session registered".to_string()),
            Err(err) => (false, err.to_string()),
        }
    }
}

mod native {
    //! Native transport over the `smb` crate.

    use super::*;
    use smb::{Client, ClientConfig, UncPath};
    use std::str::FromStr;

    pub(super) struct NativeSmbTransport {
        creds: SmbCredentials,
        client: Option<Client>,
    }

    impl NativeSmbTransport {
        pub(super) fn new(creds: SmbCredentials) -> Self {
            Self { creds, client: None }
        }

        fn unc(&self, share: &str, path: &str) -> Result<UncPath, AdapterError> {
            let mut raw = format!(r"\\{}\{}", self.creds.server, share);
            if !path.is_empty() {
                raw.push('\\');
                raw.push_str(&path.replace('/', "\\"));
            }
            UncPath::from_str(&raw)
                .map_err(|err| AdapterError::InvalidLocation(format!("bad UNC path: {err}")))
        }

        fn username(&self) -> String {
            match &self.creds.domain {
                Some(domain) if !domain.is_empty() => {
                    format!("{domain}\\{}", self.creds.username)
                }
                _ => self.creds.username.clone(),
            }
        }
    }

    #[async_trait]
    impl SmbTransport for NativeSmbTransport {
        async fn register(&mut self) -> Result<(), AdapterError> {
            self.client = None;
            let client = Client::new(ClientConfig::default());
            let root = self.unc("IPC$", "")?;
            client
                .share_connect(&root, &self.username(), self.creds.password.clone())
                .await
                .map_err(classify_smb)?;
            self.client = Some(client);
            Ok(())
        }

        async fn list_dir(
            &mut self,
            share: &str,
            path: &str,
        ) -> Result<Vec<SmbEntry>, AdapterError> {
            let client = self
                .client
                .as_ref()
                .ok_or_else(|| AdapterError::ConnectionFailure("session not registered".into()))?;
            let unc = self.unc(share, path)?;
            client
                .share_connect(&unc, &self.username(), self.creds.password.clone())
                .await
                .map_err(classify_smb)?;

            let mut entries = Vec::new();
            let listing = client.list_directory(&unc, "*").await.map_err(classify_smb)?;
            for item in listing {
                entries.push(SmbEntry {
                    name: item.file_name.to_string(),
                    is_dir: item.is_directory(),
                    size: item.end_of_file,
                    modified: DateTime::from_timestamp(item.change_time_unix(), 0),
                });
            }
            Ok(entries)
        }
    }

    /// SMB errors: auth → terminal, closed connections → transient.
    fn classify_smb(err: smb::Error) -> AdapterError {
        let text = err.to_string();
        let lowered = text.to_ascii_lowercase();
        if lowered.contains("logon") || lowered.contains("access denied") {
            AdapterError::PermissionDenied(text)
        } else if lowered.contains("not found") || lowered.contains("no such") {
            AdapterError::NotFound(text)
        } else {
            AdapterError::ConnectionFailure(text)
        }
    }
}

#[cfg(test)]
#[path = "smb_tests.rs"]
mod tests;
