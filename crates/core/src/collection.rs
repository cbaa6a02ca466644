// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collections: named photo data sources.

use serde::{Deserialize, Serialize};

use crate::guid::Guid;

/// Where a collection's files live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Local,
    S3,
    Gcs,
    Smb,
}

crate::simple_display! {
    CollectionKind {
        Local => "local",
        S3 => "s3",
        Gcs => "gcs",
        Smb => "smb",
    }
}

/// Lifecycle state of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionState {
    Live,
    Archived,
}

/// A named data source jobs can target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub guid: Guid,
    pub team_guid: Guid,
    pub kind: CollectionKind,
    /// Local path, bucket/prefix, or UNC path depending on `kind`.
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_guid: Option<Guid>,
    pub state: CollectionState,
    #[serde(default)]
    pub is_accessible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_count: Option<u64>,
    /// When set, only this agent may claim jobs targeting the collection
    /// (local paths exist on exactly one host).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound_agent_guid: Option<Guid>,
    pub created_at_ms: u64,
}

impl Collection {
    pub fn is_live(&self) -> bool {
        self.state == CollectionState::Live
    }
}
