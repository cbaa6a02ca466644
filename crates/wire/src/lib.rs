// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP protocol DTOs for agent ↔ server communication.
//!
//! Every body is JSON. Optional fields use `skip_serializing_if` so an
//! absent field is truly absent on the wire, not `null`. Auth travels in
//! the `Authorization: Bearer <api_key>` header and is not part of any
//! body here.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod agents;
mod error;
mod jobs;
mod results;
mod uploads;

pub use agents::{
    HeartbeatRequest, HeartbeatResponse, RegisterRequest, RegisterResponse,
    ReportCapabilityRequest, ReportCapabilityResponse, VersionResponse,
};
pub use error::ApiErrorBody;
pub use jobs::{
    CancelledRequest, ClaimRequest, ClaimResponse, CompleteRequest, CompleteResponse,
    FailRequest, JobLease,
};
pub use results::{ResultDetail, ResultSummary};
pub use uploads::{
    ChunkResponse, FinalizeRequest, FinalizeResponse, InitiateUploadRequest,
    InitiateUploadResponse, UploadType,
};
