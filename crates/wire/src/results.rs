// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-side result DTOs.

use ap_core::{Guid, ResultStatus, Target, ToolKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row in a result listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub guid: Guid,
    pub job_guid: Guid,
    pub tool: ToolKind,
    pub target: Target,
    pub status: ResultStatus,
    pub files_scanned: u64,
    pub issues_found: u64,
    pub no_change_copy: bool,
    pub created_at_ms: u64,
}

/// Full result detail as returned by `GET /results/{guid}`.
///
/// Large arrays inside `results` are truncated server-side; the download
/// endpoint serves the untruncated blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDetail {
    pub guid: Guid,
    pub job_guid: Guid,
    pub tool: ToolKind,
    pub target: Target,
    pub status: ResultStatus,
    pub duration_seconds: f64,
    pub files_scanned: u64,
    pub issues_found: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_state_hash: Option<String>,
    pub no_change_copy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_report_from: Option<Guid>,
    pub created_at_ms: u64,
}
