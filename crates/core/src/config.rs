// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Team-level tool configuration.
//!
//! Tools are pure functions of the file listing and this config. The
//! subset that participates in input-state fingerprints is fixed: see
//! [`TeamConfig::relevant_config`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Camera id → display name and serial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraMapping {
    pub name: String,
    pub serial: String,
}

/// Configuration a team ships to its agents for tool runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TeamConfig {
    /// Extensions counted as photos, with leading dot (".dng").
    #[serde(default)]
    pub photo_extensions: Vec<String>,
    /// Extensions counted as metadata sidecars (".xmp").
    #[serde(default)]
    pub metadata_extensions: Vec<String>,
    /// Photo extensions that must have a sidecar next to them.
    #[serde(default)]
    pub require_sidecar: Vec<String>,
    #[serde(default)]
    pub camera_mappings: BTreeMap<String, CameraMapping>,
    /// Processing method id → description.
    #[serde(default)]
    pub processing_methods: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_pipeline: Option<String>,
}

impl TeamConfig {
    /// The six keys that feed the input-state configuration hash, each
    /// with deterministic internal ordering. Key names are part of the
    /// fingerprint format and never change.
    pub fn relevant_config(&self) -> Value {
        let mut photo = self.photo_extensions.clone();
        let mut metadata = self.metadata_extensions.clone();
        let mut sidecar = self.require_sidecar.clone();
        photo.sort();
        metadata.sort();
        sidecar.sort();

        let cameras: BTreeMap<&String, Value> = self
            .camera_mappings
            .iter()
            .map(|(id, m)| (id, json!({"name": m.name, "serial": m.serial})))
            .collect();

        json!({
            "photo_extensions": photo,
            "metadata_extensions": metadata,
            "require_sidecar": sidecar,
            "cameras": cameras,
            "processing_methods": self.processing_methods,
            "pipeline": self.default_pipeline,
        })
    }

    /// Case-insensitive extension membership check.
    pub fn is_photo_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.photo_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
    }

    pub fn is_metadata_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.metadata_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
