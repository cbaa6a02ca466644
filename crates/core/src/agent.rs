// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server-side agent records.
//!
//! Identity and liveness are split: [`AgentIdentity`] is written once at
//! registration, while [`AgentRuntime`] absorbs the churn of heartbeats
//! (status, capabilities, metrics, pending commands). Routine heartbeats
//! never touch the identity row.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::guid::Guid;

/// Liveness status of a registered agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Online,
    Offline,
    Error,
    Revoked,
}

crate::simple_display! {
    AgentStatus {
        Online => "online",
        Offline => "offline",
        Error => "error",
        Revoked => "revoked",
    }
}

/// Host metrics reported with each heartbeat. Best effort; zero when the
/// agent could not read them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentMetrics {
    #[serde(default)]
    pub cpu_percent: f64,
    #[serde(default)]
    pub memory_percent: f64,
    #[serde(default)]
    pub disk_free_gb: f64,
}

/// Who an agent is. Created at registration, mutated only by revocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub guid: Guid,
    pub team_guid: Guid,
    pub name: String,
    /// Opaque bearer credential, unique per agent, never rotated without
    /// re-registration.
    pub api_key: String,
    pub platform: String,
    pub binary_checksum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at_ms: Option<u64>,
    pub created_at_ms: u64,
}

impl AgentIdentity {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at_ms.is_some()
    }

    /// Soft-revoke: the record stays for audit, the key stops working.
    pub fn revoke(&mut self, now_ms: u64) {
        if self.revoked_at_ms.is_none() {
            self.revoked_at_ms = Some(now_ms);
        }
    }
}

/// Volatile per-agent state, 1:1 with [`AgentIdentity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRuntime {
    pub agent_guid: Guid,
    pub status: AgentStatus,
    pub last_heartbeat_ms: u64,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub authorized_roots: Vec<PathBuf>,
    /// Commands drained into the next heartbeat response.
    #[serde(default)]
    pub pending_commands: Vec<String>,
    #[serde(default)]
    pub metrics: AgentMetrics,
}

impl AgentRuntime {
    pub fn new(agent_guid: Guid, now_ms: u64) -> Self {
        Self {
            agent_guid,
            status: AgentStatus::Online,
            last_heartbeat_ms: now_ms,
            capabilities: Vec::new(),
            authorized_roots: Vec::new(),
            pending_commands: Vec::new(),
            metrics: AgentMetrics::default(),
        }
    }

    /// Absorb one heartbeat and return the drained command queue.
    pub fn heartbeat(
        &mut self,
        capabilities: Vec<Capability>,
        authorized_roots: Vec<PathBuf>,
        metrics: AgentMetrics,
        now_ms: u64,
    ) -> Vec<String> {
        self.status = AgentStatus::Online;
        self.last_heartbeat_ms = now_ms;
        self.capabilities = capabilities;
        self.authorized_roots = authorized_roots;
        self.metrics = metrics;
        std::mem::take(&mut self.pending_commands)
    }

    /// True when no heartbeat arrived within `timeout_ms`.
    pub fn is_stale(&self, now_ms: u64, timeout_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_heartbeat_ms) > timeout_ms
    }

    pub fn push_command(&mut self, command: String) {
        self.pending_commands.push(command);
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
