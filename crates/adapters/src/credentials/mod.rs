// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connector credentials as tagged variants, one per backend.
//!
//! Credentials arrive from the CLI as loose field maps validated against
//! the connector's credential schema; from there on they are typed.

pub mod store;

use ap_core::ConnectorKind;
use serde::{Deserialize, Serialize};

/// S3 (or S3-compatible) credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO, Ceph).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
}

/// GCS service-account credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcsCredentials {
    /// Full service-account key file contents, as JSON text.
    pub service_account_json: String,
}

/// SMB share credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmbCredentials {
    pub server: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Credentials for one connector, tagged by backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectorCredentials {
    S3(S3Credentials),
    Gcs(GcsCredentials),
    Smb(SmbCredentials),
}

/// A required credential field was missing or empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required credential field: {0}")]
pub struct MissingField(pub String);

impl ConnectorCredentials {
    pub fn kind(&self) -> ConnectorKind {
        match self {
            ConnectorCredentials::S3(_) => ConnectorKind::S3,
            ConnectorCredentials::Gcs(_) => ConnectorKind::Gcs,
            ConnectorCredentials::Smb(_) => ConnectorKind::Smb,
        }
    }

    /// Assemble credentials from loose CLI fields for a connector kind.
    pub fn from_fields(
        kind: ConnectorKind,
        mut get: impl FnMut(&str) -> Option<String>,
    ) -> Result<Self, MissingField> {
        let mut required = |name: &str| -> Result<String, MissingField> {
            match get(name) {
                Some(v) if !v.is_empty() => Ok(v),
                _ => Err(MissingField(name.to_string())),
            }
        };
        Ok(match kind {
            ConnectorKind::S3 => {
                let access_key_id = required("access_key_id")?;
                let secret_access_key = required("secret_access_key")?;
                let region = required("region")?;
                ConnectorCredentials::S3(S3Credentials {
                    access_key_id,
                    secret_access_key,
                    region,
                    endpoint_url: get("endpoint_url").filter(|v| !v.is_empty()),
                })
            }
            ConnectorKind::Gcs => ConnectorCredentials::Gcs(GcsCredentials {
                service_account_json: required("service_account_json")?,
            }),
            ConnectorKind::Smb => {
                let server = required("server")?;
                let username = required("username")?;
                let password = required("password")?;
                ConnectorCredentials::Smb(SmbCredentials {
                    server,
                    username,
                    password,
                    domain: get("domain").filter(|v| !v.is_empty()),
                })
            }
        })
    }

    /// Field names only, for display — never the values.
    pub fn field_names(&self) -> Vec<&'static str> {
        match self {
            ConnectorCredentials::S3(c) => {
                let mut names = vec!["access_key_id", "secret_access_key", "region"];
                if c.endpoint_url.is_some() {
                    names.push("endpoint_url");
                }
                names
            }
            ConnectorCredentials::Gcs(_) => vec!["service_account_json"],
            ConnectorCredentials::Smb(c) => {
                let mut names = vec!["server", "username", "password"];
                if c.domain.is_some() {
                    names.push("domain");
                }
                names
            }
        }
    }
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
