// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connectors: named bindings to remote storage systems.
//!
//! Credentials may live on the server or on an agent. Agent-held
//! credentials never leave the agent; the server only learns "some agent
//! has them" through capability reports and flips `credential_location`
//! accordingly.

use serde::{Deserialize, Serialize};

use crate::guid::Guid;

/// Remote storage families a connector can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    S3,
    Gcs,
    Smb,
}

crate::simple_display! {
    ConnectorKind {
        S3 => "s3",
        Gcs => "gcs",
        Smb => "smb",
    }
}

/// Where the connector's credentials currently live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialLocation {
    Server,
    Agent,
    Pending,
}

crate::simple_display! {
    CredentialLocation {
        Server => "server",
        Agent => "agent",
        Pending => "pending",
    }
}

/// One field of a connector's credential schema, used by the CLI to
/// prompt and validate before storing into the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

/// A named binding to a remote storage system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub guid: Guid,
    pub team_guid: Guid,
    pub kind: ConnectorKind,
    pub name: String,
    pub credential_location: CredentialLocation,
    #[serde(default)]
    pub credential_schema: Vec<CredentialField>,
    pub created_at_ms: u64,
}

impl Connector {
    /// Names of required credential fields missing from `provided`.
    pub fn missing_required<'a>(
        &'a self,
        provided: impl Fn(&str) -> bool,
    ) -> Vec<&'a str> {
        self.credential_schema
            .iter()
            .filter(|f| f.required && !provided(&f.name))
            .map(|f| f.name.as_str())
            .collect()
    }
}

#[cfg(test)]
#[path = "connector_tests.rs"]
mod tests;
