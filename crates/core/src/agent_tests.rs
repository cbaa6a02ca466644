// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::guid::EntityKind;

fn runtime() -> AgentRuntime {
    AgentRuntime::new(Guid::random(EntityKind::Agent), 1_000_000)
}

#[test]
fn heartbeat_updates_liveness_and_drains_commands() {
    let mut rt = runtime();
    rt.push_command("cancel_job:job_00000000000000000000000000".to_string());

    let drained = rt.heartbeat(
        vec![Capability::LocalFilesystem],
        vec![PathBuf::from("/photos")],
        AgentMetrics { cpu_percent: 12.5, memory_percent: 40.0, disk_free_gb: 250.0 },
        2_000_000,
    );

    assert_eq!(drained.len(), 1);
    assert!(rt.pending_commands.is_empty());
    assert_eq!(rt.status, AgentStatus::Online);
    assert_eq!(rt.last_heartbeat_ms, 2_000_000);
    assert_eq!(rt.capabilities, vec![Capability::LocalFilesystem]);
}

#[test]
fn staleness_is_measured_from_last_heartbeat() {
    let mut rt = runtime();
    rt.heartbeat(vec![], vec![], AgentMetrics::default(), 1_000_000);

    assert!(!rt.is_stale(1_090_000, 90_000));
    assert!(rt.is_stale(1_090_001, 90_000));
}

#[test]
fn revoke_is_idempotent_and_keeps_first_timestamp() {
    let mut identity = AgentIdentity {
        guid: Guid::random(EntityKind::Agent),
        team_guid: Guid::random(EntityKind::Team),
        name: "studio-nas".to_string(),
        api_key: "key".to_string(),
        platform: "linux-x86_64".to_string(),
        binary_checksum: "0".repeat(64),
        revoked_at_ms: None,
        created_at_ms: 1,
    };

    assert!(!identity.is_revoked());
    identity.revoke(100);
    identity.revoke(200);
    assert_eq!(identity.revoked_at_ms, Some(100));
}
