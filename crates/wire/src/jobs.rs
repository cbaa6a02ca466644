// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job claim and terminal reporting.
//!
//! Completion and failure payloads are HMAC-signed. The signed value is
//! NOT the request body: it is the canonical JSON of a reduced payload —
//! `{results, files_scanned, issues_found}` for completion,
//! `{error_message}` for failure, `{}` for cancellation — so transport
//! metadata (upload ids, hashes) stays outside the signature.

use ap_core::{Capability, Guid, Target, ToolKind};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// `POST /jobs/claim`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRequest {
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

/// What an agent needs to execute a claimed job. Server-internal fields
/// (retry counts, priorities) stay on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobLease {
    pub guid: Guid,
    pub tool: ToolKind,
    pub target: Target,
    /// Execution context: collection location, connector GUID, pipeline
    /// version — whatever the target type requires.
    #[serde(default)]
    pub context: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub job: JobLease,
    /// Hex-encoded 32-byte HMAC secret for this claim.
    pub signing_secret: String,
}

/// `POST /jobs/{guid}/complete`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteRequest {
    /// Inline results; absent when they went through chunked upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
    pub files_scanned: u64,
    pub issues_found: u64,
    pub duration_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_state_hash: Option<String>,
    /// 64 hex chars: HMAC over [`CompleteRequest::signed_payload`].
    pub signature: String,
    /// Finalized chunked upload carrying the results JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
    /// Finalized chunked upload carrying the HTML report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_upload_id: Option<String>,
}

impl CompleteRequest {
    /// The value the signature covers.
    pub fn signed_payload(&self) -> Value {
        json!({
            "results": self.results,
            "files_scanned": self.files_scanned,
            "issues_found": self.issues_found,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteResponse {
    pub result_guid: Guid,
}

/// `POST /jobs/{guid}/fail`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailRequest {
    pub error_message: String,
    pub signature: String,
}

impl FailRequest {
    pub fn signed_payload(&self) -> Value {
        json!({ "error_message": self.error_message })
    }
}

/// `POST /jobs/{guid}/cancelled` — cooperative cancellation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelledRequest {
    /// HMAC over the canonical empty object `{}`.
    pub signature: String,
}

impl CancelledRequest {
    pub fn signed_payload() -> Value {
        json!({})
    }
}
