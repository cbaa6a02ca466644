// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Analysis tools.
//!
//! Tools are pure functions of the file listing and the team config —
//! no network, no shared state. The executor picks one by [`ToolKind`]
//! and feeds its outcome into the completion payload.

mod pairing;
mod photostats;
mod pipeline;

use ap_adapters::FileMeta;
use ap_core::{TeamConfig, ToolKind};
use serde_json::Value;

pub use pairing::PhotoPairing;
pub use photostats::Photostats;
pub use pipeline::PipelineValidation;

/// What a tool run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub results: Value,
    pub report_html: Option<String>,
    pub files_scanned: u64,
    pub issues_found: u64,
}

/// One analysis tool.
pub trait Tool: Send + Sync {
    fn run(&self, files: &[FileMeta], config: &TeamConfig) -> ToolOutcome;
}

/// Static registry mapping tool kinds to implementations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolRegistry;

impl ToolRegistry {
    pub fn get(&self, kind: ToolKind) -> &'static dyn Tool {
        match kind {
            ToolKind::Photostats => &Photostats,
            ToolKind::PhotoPairing => &PhotoPairing,
            ToolKind::PipelineValidation => &PipelineValidation,
        }
    }
}

/// Lowercased extension (with dot) of a relative path, if any.
pub(crate) fn extension(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    // A leading dot is a hidden file, not an extension.
    name.rfind('.')
        .filter(|&i| i > 0)
        .map(|i| name[i..].to_ascii_lowercase())
        .filter(|ext| ext.len() > 1)
}

/// Path without its extension, used to pair files by stem.
pub(crate) fn stem(path: &str) -> &str {
    match path.rfind('.') {
        Some(i) if !path[..i].ends_with('/') && i > 0 => &path[..i],
        _ => path,
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
