// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chunked upload protocol bodies.

use serde::{Deserialize, Serialize};

/// What a chunked upload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadType {
    ResultsJson,
    ReportHtml,
}

ap_core::simple_display! {
    UploadType {
        ResultsJson => "results_json",
        ReportHtml => "report_html",
    }
}

/// `POST /jobs/{job_guid}/uploads/initiate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiateUploadRequest {
    pub upload_type: UploadType,
    pub expected_size: u64,
    /// Requested chunk size; the server may round it and the client must
    /// use the returned value.
    pub chunk_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiateUploadResponse {
    pub upload_id: String,
    pub chunk_size: u64,
    pub total_chunks: u32,
}

/// Body of `200` responses to `PUT /uploads/{id}/{index}`.
///
/// `received: false` means the chunk was already present — the PUT is
/// idempotent and the client treats this as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkResponse {
    pub received: bool,
}

/// `POST /uploads/{id}/finalize`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeRequest {
    /// Lowercase hex SHA-256 of the concatenated content.
    pub checksum: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeResponse {
    pub success: bool,
}
