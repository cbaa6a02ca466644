// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input-state fingerprints for no-change detection.
//!
//! The hash is deterministic across runs, hosts, and implementations:
//! every component has a fixed byte format and a fixed ordering. The
//! server compares fingerprints; it never recomputes them.

use ap_adapters::FileMeta;
use ap_core::{canonical_json, TeamConfig, ToolKind};
use sha2::{Digest, Sha256};

/// Fingerprint computer. Constructed once at startup and passed by
/// reference; it carries no state, the type exists to keep call sites
/// explicit about which fingerprint format they use.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputStateComputer;

impl InputStateComputer {
    /// Hash of the file listing: lines `{path}|{size}|{mtime_unix}`,
    /// sorted lexicographically by path, joined with `\n`. Files with no
    /// modification time (some remote backends) hash with mtime 0.
    pub fn file_list_hash(&self, files: &[FileMeta]) -> (String, u64) {
        let mut sorted: Vec<&FileMeta> = files.iter().collect();
        sorted.sort_by(|a, b| a.path.cmp(&b.path));
        let lines: Vec<String> = sorted
            .iter()
            .map(|meta| {
                let mtime = meta.last_modified.map(|t| t.timestamp()).unwrap_or(0);
                format!("{}|{}|{}", meta.path, meta.size, mtime)
            })
            .collect();
        let digest = Sha256::digest(lines.join("\n").as_bytes());
        (hex::encode(digest), files.len() as u64)
    }

    /// Hash of the relevant configuration subset (canonical JSON).
    pub fn configuration_hash(&self, config: &TeamConfig) -> String {
        hex::encode(Sha256::digest(canonical_json(&config.relevant_config()).as_bytes()))
    }

    /// Combined fingerprint: `{tool}|{file_list_hash}|{configuration_hash}`.
    pub fn input_state_hash(
        &self,
        tool: ToolKind,
        file_list_hash: &str,
        configuration_hash: &str,
    ) -> String {
        let line = format!("{}|{file_list_hash}|{configuration_hash}", tool.as_str());
        hex::encode(Sha256::digest(line.as_bytes()))
    }

    /// Convenience: full fingerprint from a listing and config.
    pub fn compute(&self, tool: ToolKind, files: &[FileMeta], config: &TeamConfig) -> String {
        let (file_hash, _) = self.file_list_hash(files);
        let config_hash = self.configuration_hash(config);
        self.input_state_hash(tool, &file_hash, &config_hash)
    }
}

#[cfg(test)]
#[path = "input_state_tests.rs"]
mod tests;
