// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polymorphic addressing for the entity a job or result is about.
//!
//! Jobs and results target one of three entity families through a single
//! `{type, guid, name}` triple instead of per-entity foreign keys. The
//! name is denormalized for fast listing; lookups go through the GUID.

use serde::{Deserialize, Serialize};

use crate::guid::{EntityKind, Guid};

/// Entity families a job or result can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Collection,
    Connector,
    Pipeline,
}

crate::simple_display! {
    TargetKind {
        Collection => "collection",
        Connector => "connector",
        Pipeline => "pipeline",
    }
}

impl TargetKind {
    /// The GUID entity kind that targets of this family carry.
    pub fn entity_kind(self) -> EntityKind {
        match self {
            TargetKind::Collection => EntityKind::Collection,
            TargetKind::Connector => EntityKind::Connector,
            TargetKind::Pipeline => EntityKind::Pipeline,
        }
    }
}

/// What a job or result is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub kind: TargetKind,
    pub guid: Guid,
    /// Denormalized display name, captured at job creation.
    pub name: String,
}

impl Target {
    pub fn new(kind: TargetKind, guid: Guid, name: impl Into<String>) -> Self {
        Self { kind, guid, name: name.into() }
    }

    /// True when the target GUID carries the prefix its family requires.
    pub fn is_coherent(&self) -> bool {
        self.guid.kind() == self.kind.entity_kind()
    }
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;
