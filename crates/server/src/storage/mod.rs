// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server state: in-memory records, snapshotted to disk.
//!
//! One process owns the state; everything is keyed by GUID. Large
//! payloads never live here — chunk files and blobs go to the data dir
//! and records carry file names.

pub mod snapshot;

use std::collections::HashMap;

use ap_core::{
    AgentIdentity, AgentRuntime, AnalysisResult, Collection, Connector, Guid, Job,
    RetentionPolicy, TeamConfig,
};
use ap_wire::UploadType;
use serde::{Deserialize, Serialize};

/// A tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub guid: Guid,
    pub name: String,
    pub config: TeamConfig,
    pub retention: RetentionPolicy,
}

/// Single-use, expiring token minted for agent registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationToken {
    pub team_guid: Guid,
    pub expires_at_ms: u64,
    pub used: bool,
}

/// An open chunked upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSession {
    pub upload_id: String,
    pub job_guid: Guid,
    pub agent_guid: Guid,
    pub team_guid: Guid,
    pub upload_type: UploadType,
    pub expected_size: u64,
    pub chunk_size: u64,
    pub total_chunks: u32,
    /// One bit per chunk.
    pub received: Vec<bool>,
    pub expires_at_ms: u64,
    /// Blob file (under `blobs/`) once finalized, until job completion
    /// consumes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_blob: Option<String>,
}

impl UploadSession {
    pub fn all_received(&self) -> bool {
        self.received.iter().all(|bit| *bit)
    }

    /// Set one bit; returns false when it was already set.
    pub fn mark_received(&mut self, index: u32) -> bool {
        let slot = &mut self.received[index as usize];
        if *slot {
            return false;
        }
        *slot = true;
        true
    }

    pub fn received_count(&self) -> usize {
        self.received.iter().filter(|bit| **bit).count()
    }
}

/// Everything the control plane knows.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ServerState {
    pub teams: HashMap<Guid, TeamRecord>,
    pub agents: HashMap<Guid, AgentIdentity>,
    pub runtimes: HashMap<Guid, AgentRuntime>,
    /// api_key → agent. Kept in lockstep with `agents`.
    pub api_keys: HashMap<String, Guid>,
    pub registration_tokens: HashMap<String, RegistrationToken>,
    pub jobs: HashMap<Guid, Job>,
    pub results: HashMap<Guid, AnalysisResult>,
    pub collections: HashMap<Guid, Collection>,
    pub connectors: HashMap<Guid, Connector>,
    pub uploads: HashMap<String, UploadSession>,
}

impl ServerState {
    /// Resolve a bearer key to its (non-revoked check is the caller's).
    pub fn agent_by_key(&self, api_key: &str) -> Option<&AgentIdentity> {
        self.api_keys.get(api_key).and_then(|guid| self.agents.get(guid))
    }

    /// Live collections referencing a connector.
    pub fn live_collections_for_connector(&self, connector: &Guid) -> usize {
        self.collections
            .values()
            .filter(|c| c.is_live() && c.connector_guid.as_ref() == Some(connector))
            .count()
    }

    /// Results pointing at `canonical` via `download_report_from`.
    pub fn dependents_of(&self, canonical: &Guid) -> Vec<Guid> {
        let mut dependents: Vec<Guid> = self
            .results
            .values()
            .filter(|r| r.download_report_from.as_ref() == Some(canonical))
            .map(|r| r.guid)
            .collect();
        dependents.sort();
        dependents
    }

    /// The team's retention policy, or defaults when the team is gone.
    pub fn retention_for(&self, team: &Guid) -> RetentionPolicy {
        self.teams.get(team).map(|t| t.retention).unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
