// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable analysis results.
//!
//! A result is the artifact of a finished job. Small result payloads are
//! inlined; large ones live in blob storage and the row keeps only a blob
//! reference. A no-change copy stores no blob at all — it points at the
//! canonical result whose input-state hash it shares.

use serde::{Deserialize, Serialize};

use crate::guid::Guid;
use crate::job::ToolKind;
use crate::target::Target;

/// Terminal outcome of the producing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Completed,
    Failed,
}

crate::simple_display! {
    ResultStatus {
        Completed => "completed",
        Failed => "failed",
    }
}

/// Artifact of a finished job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub guid: Guid,
    pub team_guid: Guid,
    pub job_guid: Guid,
    pub tool: ToolKind,
    pub target: Target,
    #[serde(default)]
    pub context: serde_json::Value,
    pub status: ResultStatus,
    pub duration_seconds: f64,
    pub files_scanned: u64,
    pub issues_found: u64,
    /// Inlined results payload; `None` when the payload lives in a blob
    /// or this row is a no-change copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_json: Option<serde_json::Value>,
    /// Blob file name under the server's blob dir, when not inlined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_blob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_blob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_state_hash: Option<String>,
    #[serde(default)]
    pub no_change_copy: bool,
    /// Canonical result whose blob this row reuses. Required when
    /// `no_change_copy` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_report_from: Option<Guid>,
    pub created_at_ms: u64,
}

impl AnalysisResult {
    /// A no-change copy must reference its canonical result and must not
    /// carry its own payload.
    pub fn no_change_invariant_holds(&self) -> bool {
        if !self.no_change_copy {
            return true;
        }
        self.download_report_from.is_some()
            && self.results_json.is_none()
            && self.results_blob.is_none()
            && self.report_blob.is_none()
    }

    /// Whether this row owns blob files on disk.
    pub fn owns_blobs(&self) -> bool {
        self.results_blob.is_some() || self.report_blob.is_some()
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
