// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::collection::{Collection, CollectionKind, CollectionState};
use crate::connector::{Connector, ConnectorKind, CredentialLocation};
use crate::guid::{EntityKind, Guid};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core types.
pub mod strategies {
    use crate::guid::{EntityKind, Guid};
    use proptest::prelude::*;

    pub fn arb_entity_kind() -> impl Strategy<Value = EntityKind> {
        prop_oneof![
            Just(EntityKind::Agent),
            Just(EntityKind::Job),
            Just(EntityKind::Result),
            Just(EntityKind::Collection),
            Just(EntityKind::Connector),
            Just(EntityKind::Pipeline),
            Just(EntityKind::Team),
        ]
    }

    pub fn arb_guid() -> impl Strategy<Value = Guid> {
        (arb_entity_kind(), any::<u64>(), any::<u64>()).prop_map(|(kind, hi, lo)| {
            Guid::from_uuid(kind, uuid::Uuid::from_u64_pair(hi, lo))
        })
    }
}

// ── Record factories ────────────────────────────────────────────────────

pub fn local_collection(team_guid: Guid, location: &str) -> Collection {
    Collection {
        guid: Guid::random(EntityKind::Collection),
        team_guid,
        kind: CollectionKind::Local,
        location: location.to_string(),
        connector_guid: None,
        state: CollectionState::Live,
        is_accessible: true,
        last_error: None,
        storage_bytes: None,
        file_count: None,
        image_count: None,
        bound_agent_guid: None,
        created_at_ms: 1_000_000,
    }
}

pub fn s3_connector(team_guid: Guid, name: &str) -> Connector {
    Connector {
        guid: Guid::random(EntityKind::Connector),
        team_guid,
        kind: ConnectorKind::S3,
        name: name.to_string(),
        credential_location: CredentialLocation::Pending,
        credential_schema: Vec::new(),
        created_at_ms: 1_000_000,
    }
}
