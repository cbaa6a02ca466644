// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registration, heartbeat, and connector capability reporting.

use std::path::PathBuf;

use ap_core::{AgentMetrics, Capability, Guid};
use serde::{Deserialize, Serialize};

/// `POST /agents/register` — authenticated by a short-lived registration
/// token in the body, not a bearer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub token: String,
    pub platform: String,
    /// SHA-256 of the running agent binary (attestation).
    pub checksum: String,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub guid: Guid,
    pub api_key: String,
    pub name: String,
    pub team_guid: Guid,
}

/// `POST /agents/heartbeat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub authorized_roots: Vec<PathBuf>,
    #[serde(default)]
    pub metrics: AgentMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    /// Opaque command strings; agents drop what they don't recognize.
    #[serde(default)]
    pub pending_commands: Vec<String>,
}

/// `GET /agents/version`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

/// `POST /connectors/{guid}/report-capability`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportCapabilityRequest {
    pub has_credentials: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportCapabilityResponse {
    pub acknowledged: bool,
    /// True when this report flipped `credential_location`.
    pub credential_location_updated: bool,
}
