// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed HTTP client for the control server.
//!
//! The [`ServerApi`] trait is the seam the loop, executor, reporter, and
//! uploader depend on; [`HttpClient`] is the reqwest implementation.
//! Response statuses map onto [`ClientError`] so callers never look at
//! raw status codes: 401 becomes `Revoked` or `AuthRejected` (by the
//! `detail` string), 403 `Forbidden`, 404 `NotFound`, 4xx `BadRequest`,
//! 5xx and transport failures `Connection`.

use std::time::Duration;

use ap_core::{Connector, Guid, Progress, TeamConfig};
use ap_wire::{
    CancelledRequest, ChunkResponse, ClaimRequest, ClaimResponse, CompleteRequest,
    CompleteResponse, FailRequest, FinalizeRequest, FinalizeResponse, HeartbeatRequest,
    HeartbeatResponse, InitiateUploadRequest, InitiateUploadResponse, RegisterRequest,
    RegisterResponse, ReportCapabilityRequest, ReportCapabilityResponse, VersionResponse,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

/// Per-operation timeouts.
const CLAIM_TIMEOUT: Duration = Duration::from_secs(30);
const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(15);
const CHUNK_TIMEOUT: Duration = Duration::from_secs(60);
const FINALIZE_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client-side error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure or 5xx; worth retrying.
    #[error("connection failure: {0}")]
    Connection(String),
    /// 401 whose detail marks the agent as revoked.
    #[error("agent revoked")]
    Revoked,
    /// Any other 401.
    #[error("authentication rejected: {0}")]
    AuthRejected(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// 4xx with a server-provided detail; never retried.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ClientError {
    /// Errors the polling loop counts toward its failure threshold.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ClientError::Connection(_))
    }
}

/// Everything the agent asks of the server.
#[async_trait]
pub trait ServerApi: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ClientError>;
    async fn heartbeat(&self, request: &HeartbeatRequest)
        -> Result<HeartbeatResponse, ClientError>;
    async fn fetch_team_config(&self) -> Result<TeamConfig, ClientError>;
    async fn server_version(&self) -> Result<VersionResponse, ClientError>;

    /// `None` when the server has no work (204).
    async fn claim_job(&self, request: &ClaimRequest)
        -> Result<Option<ClaimResponse>, ClientError>;
    async fn report_progress(&self, job: &Guid, progress: &Progress) -> Result<(), ClientError>;
    async fn complete_job(
        &self,
        job: &Guid,
        request: &CompleteRequest,
    ) -> Result<CompleteResponse, ClientError>;
    async fn fail_job(&self, job: &Guid, request: &FailRequest) -> Result<(), ClientError>;
    async fn report_cancelled(
        &self,
        job: &Guid,
        request: &CancelledRequest,
    ) -> Result<(), ClientError>;

    async fn initiate_upload(
        &self,
        job: &Guid,
        request: &InitiateUploadRequest,
    ) -> Result<InitiateUploadResponse, ClientError>;
    /// Returns the server's `received` flag; an already-present chunk
    /// (`received: false` or 409) is success for the caller.
    async fn put_chunk(
        &self,
        upload_id: &str,
        index: u32,
        bytes: Vec<u8>,
    ) -> Result<bool, ClientError>;
    async fn finalize_upload(&self, upload_id: &str, checksum: &str) -> Result<(), ClientError>;
    async fn cancel_upload(&self, upload_id: &str) -> Result<(), ClientError>;

    async fn report_connector_capability(
        &self,
        connector: &Guid,
        has_credentials: bool,
    ) -> Result<ReportCapabilityResponse, ClientError>;

    /// Connector record (schema, kind) for the CLI's configure flow.
    async fn fetch_connector(&self, connector: &Guid) -> Result<Connector, ClientError>;
}

/// reqwest-backed client with bearer auth.
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send_raw(request).await?;
        response.json().await.map_err(|err| ClientError::Connection(err.to_string()))
    }

    async fn send_raw(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ClientError> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|err| ClientError::Connection(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = read_detail(response).await;
        Err(classify_status(status, detail))
    }
}

/// Extract the `detail` string from an error body, falling back to text.
async fn read_detail(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<ap_wire::ApiErrorBody>(&text)
        .map(|body| body.detail)
        .unwrap_or(text)
}

fn classify_status(status: StatusCode, detail: String) -> ClientError {
    match status {
        StatusCode::UNAUTHORIZED => {
            if detail.contains("revoked") {
                ClientError::Revoked
            } else {
                ClientError::AuthRejected(detail)
            }
        }
        StatusCode::FORBIDDEN => ClientError::Forbidden(detail),
        StatusCode::NOT_FOUND => ClientError::NotFound(detail),
        status if status.is_client_error() => ClientError::BadRequest(detail),
        status => ClientError::Connection(format!("{status}: {detail}")),
    }
}

#[async_trait]
impl ServerApi for HttpClient {
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ClientError> {
        // Registration carries its token in the body; no bearer yet.
        let response = self
            .http
            .post(self.url("/agents/register"))
            .timeout(DEFAULT_TIMEOUT)
            .json(request)
            .send()
            .await
            .map_err(|err| ClientError::Connection(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(|err| ClientError::Connection(err.to_string()));
        }
        let detail = read_detail(response).await;
        Err(classify_status(status, detail))
    }

    async fn heartbeat(
        &self,
        request: &HeartbeatRequest,
    ) -> Result<HeartbeatResponse, ClientError> {
        self.send_json(
            self.http
                .post(self.url("/agents/heartbeat"))
                .timeout(HEARTBEAT_TIMEOUT)
                .json(request),
        )
        .await
    }

    async fn fetch_team_config(&self) -> Result<TeamConfig, ClientError> {
        self.send_json(self.http.get(self.url("/agents/config")).timeout(DEFAULT_TIMEOUT)).await
    }

    async fn server_version(&self) -> Result<VersionResponse, ClientError> {
        self.send_json(self.http.get(self.url("/agents/version")).timeout(DEFAULT_TIMEOUT)).await
    }

    async fn claim_job(
        &self,
        request: &ClaimRequest,
    ) -> Result<Option<ClaimResponse>, ClientError> {
        let response = self
            .send_raw(self.http.post(self.url("/jobs/claim")).timeout(CLAIM_TIMEOUT).json(request))
            .await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        response
            .json()
            .await
            .map(Some)
            .map_err(|err| ClientError::Connection(err.to_string()))
    }

    async fn report_progress(&self, job: &Guid, progress: &Progress) -> Result<(), ClientError> {
        self.send_raw(
            self.http
                .post(self.url(&format!("/jobs/{job}/progress")))
                .timeout(DEFAULT_TIMEOUT)
                .json(progress),
        )
        .await
        .map(|_| ())
    }

    async fn complete_job(
        &self,
        job: &Guid,
        request: &CompleteRequest,
    ) -> Result<CompleteResponse, ClientError> {
        self.send_json(
            self.http
                .post(self.url(&format!("/jobs/{job}/complete")))
                .timeout(DEFAULT_TIMEOUT)
                .json(request),
        )
        .await
    }

    async fn fail_job(&self, job: &Guid, request: &FailRequest) -> Result<(), ClientError> {
        self.send_raw(
            self.http
                .post(self.url(&format!("/jobs/{job}/fail")))
                .timeout(DEFAULT_TIMEOUT)
                .json(request),
        )
        .await
        .map(|_| ())
    }

    async fn report_cancelled(
        &self,
        job: &Guid,
        request: &CancelledRequest,
    ) -> Result<(), ClientError> {
        self.send_raw(
            self.http
                .post(self.url(&format!("/jobs/{job}/cancelled")))
                .timeout(DEFAULT_TIMEOUT)
                .json(request),
        )
        .await
        .map(|_| ())
    }

    async fn initiate_upload(
        &self,
        job: &Guid,
        request: &InitiateUploadRequest,
    ) -> Result<InitiateUploadResponse, ClientError> {
        self.send_json(
            self.http
                .post(self.url(&format!("/jobs/{job}/uploads/initiate")))
                .timeout(DEFAULT_TIMEOUT)
                .json(request),
        )
        .await
    }

    async fn put_chunk(
        &self,
        upload_id: &str,
        index: u32,
        bytes: Vec<u8>,
    ) -> Result<bool, ClientError> {
        let response = self
            .http
            .put(self.url(&format!("/uploads/{upload_id}/{index}")))
            .timeout(CHUNK_TIMEOUT)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|err| ClientError::Connection(err.to_string()))?;

        let status = response.status();
        // 409 means the chunk is already there — idempotent success.
        if status == StatusCode::CONFLICT {
            return Ok(false);
        }
        if status.is_success() {
            let body: ChunkResponse = response
                .json()
                .await
                .map_err(|err| ClientError::Connection(err.to_string()))?;
            return Ok(body.received);
        }
        let detail = read_detail(response).await;
        Err(classify_status(status, detail))
    }

    async fn finalize_upload(&self, upload_id: &str, checksum: &str) -> Result<(), ClientError> {
        let body = FinalizeRequest { checksum: checksum.to_string() };
        let _: FinalizeResponse = self
            .send_json(
                self.http
                    .post(self.url(&format!("/uploads/{upload_id}/finalize")))
                    .timeout(FINALIZE_TIMEOUT)
                    .json(&body),
            )
            .await?;
        Ok(())
    }

    async fn cancel_upload(&self, upload_id: &str) -> Result<(), ClientError> {
        self.send_raw(
            self.http
                .delete(self.url(&format!("/uploads/{upload_id}")))
                .timeout(DEFAULT_TIMEOUT),
        )
        .await
        .map(|_| ())
    }

    async fn report_connector_capability(
        &self,
        connector: &Guid,
        has_credentials: bool,
    ) -> Result<ReportCapabilityResponse, ClientError> {
        self.send_json(
            self.http
                .post(self.url(&format!("/connectors/{connector}/report-capability")))
                .timeout(DEFAULT_TIMEOUT)
                .json(&ReportCapabilityRequest { has_credentials }),
        )
        .await
    }

    async fn fetch_connector(&self, connector: &Guid) -> Result<Connector, ClientError> {
        self.send_json(
            self.http.get(self.url(&format!("/connectors/{connector}"))).timeout(DEFAULT_TIMEOUT),
        )
        .await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
