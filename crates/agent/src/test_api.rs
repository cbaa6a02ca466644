// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted [`ServerApi`] implementation shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use ap_core::{Guid, Progress, TeamConfig};
use ap_wire::*;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::{ClientError, ServerApi};

#[derive(Default)]
pub struct FakeUploads {
    pub next_id: u32,
    /// Override the chunk size returned at initiate (server may round).
    pub chunk_size_override: Option<u64>,
    pub initiated: Vec<(Guid, InitiateUploadRequest)>,
    pub chunks: HashMap<String, HashMap<u32, Vec<u8>>>,
    /// Fail PUTs of chunk `.0` with a connection error, `.1` times.
    pub fail_chunk: Option<(u32, u32)>,
    pub finalized: Vec<(String, String)>,
    pub cancelled: Vec<String>,
    /// Error to return on finalize, once.
    pub finalize_error: Option<ClientError>,
}

#[derive(Default)]
pub struct FakeApi {
    pub claims: Mutex<VecDeque<Result<Option<ClaimResponse>, ClientError>>>,
    pub claim_calls: AtomicU32,
    pub progress: Mutex<Vec<(Guid, Progress, tokio::time::Instant)>>,
    pub progress_delay: Mutex<Duration>,
    pub progress_error: Mutex<Option<ClientError>>,
    pub completions: Mutex<Vec<(Guid, CompleteRequest)>>,
    pub failures: Mutex<Vec<(Guid, FailRequest)>>,
    pub cancelled_jobs: Mutex<Vec<(Guid, CancelledRequest)>>,
    pub team_config: Mutex<TeamConfig>,
    pub config_error: Mutex<Option<ClientError>>,
    pub heartbeat_responses: Mutex<VecDeque<HeartbeatResponse>>,
    pub heartbeat_requests: Mutex<Vec<HeartbeatRequest>>,
    pub uploads: Mutex<FakeUploads>,
    pub capability_reports: Mutex<Vec<(Guid, bool)>>,
    pub connectors: Mutex<HashMap<Guid, ap_core::Connector>>,
    pub version: Mutex<String>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self { version: Mutex::new("0.2.0".to_string()), ..Self::default() }
    }

    pub fn push_claim(&self, claim: Result<Option<ClaimResponse>, ClientError>) {
        self.claims.lock().push_back(claim);
    }

    pub fn stages(&self) -> Vec<String> {
        self.progress.lock().iter().map(|(_, p, _)| p.stage.clone()).collect()
    }
}

#[async_trait]
impl ServerApi for FakeApi {
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ClientError> {
        Ok(RegisterResponse {
            guid: Guid::random(ap_core::EntityKind::Agent),
            api_key: "apk_fake".to_string(),
            name: request.name.clone(),
            team_guid: Guid::random(ap_core::EntityKind::Team),
        })
    }

    async fn heartbeat(
        &self,
        request: &HeartbeatRequest,
    ) -> Result<HeartbeatResponse, ClientError> {
        self.heartbeat_requests.lock().push(request.clone());
        Ok(self
            .heartbeat_responses
            .lock()
            .pop_front()
            .unwrap_or(HeartbeatResponse { pending_commands: Vec::new() }))
    }

    async fn fetch_team_config(&self) -> Result<TeamConfig, ClientError> {
        if let Some(err) = self.config_error.lock().take() {
            return Err(err);
        }
        Ok(self.team_config.lock().clone())
    }

    async fn server_version(&self) -> Result<VersionResponse, ClientError> {
        Ok(VersionResponse { version: self.version.lock().clone() })
    }

    async fn claim_job(
        &self,
        _request: &ClaimRequest,
    ) -> Result<Option<ClaimResponse>, ClientError> {
        self.claim_calls.fetch_add(1, Ordering::SeqCst);
        self.claims.lock().pop_front().unwrap_or(Ok(None))
    }

    async fn report_progress(&self, job: &Guid, progress: &Progress) -> Result<(), ClientError> {
        let delay = *self.progress_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.progress_error.lock().clone() {
            return Err(err);
        }
        self.progress.lock().push((*job, progress.clone(), tokio::time::Instant::now()));
        Ok(())
    }

    async fn complete_job(
        &self,
        job: &Guid,
        request: &CompleteRequest,
    ) -> Result<CompleteResponse, ClientError> {
        self.completions.lock().push((*job, request.clone()));
        Ok(CompleteResponse { result_guid: Guid::random(ap_core::EntityKind::Result) })
    }

    async fn fail_job(&self, job: &Guid, request: &FailRequest) -> Result<(), ClientError> {
        self.failures.lock().push((*job, request.clone()));
        Ok(())
    }

    async fn report_cancelled(
        &self,
        job: &Guid,
        request: &CancelledRequest,
    ) -> Result<(), ClientError> {
        self.cancelled_jobs.lock().push((*job, request.clone()));
        Ok(())
    }

    async fn initiate_upload(
        &self,
        job: &Guid,
        request: &InitiateUploadRequest,
    ) -> Result<InitiateUploadResponse, ClientError> {
        let mut uploads = self.uploads.lock();
        uploads.next_id += 1;
        let upload_id = format!("upl_{}", uploads.next_id);
        uploads.initiated.push((*job, *request));
        let chunk_size = uploads.chunk_size_override.unwrap_or(request.chunk_size);
        let total_chunks = request.expected_size.div_ceil(chunk_size) as u32;
        uploads.chunks.insert(upload_id.clone(), HashMap::new());
        Ok(InitiateUploadResponse { upload_id, chunk_size, total_chunks })
    }

    async fn put_chunk(
        &self,
        upload_id: &str,
        index: u32,
        bytes: Vec<u8>,
    ) -> Result<bool, ClientError> {
        let mut uploads = self.uploads.lock();
        if let Some((fail_index, remaining)) = uploads.fail_chunk {
            if fail_index == index && remaining > 0 {
                uploads.fail_chunk = Some((fail_index, remaining - 1));
                return Err(ClientError::Connection("connection reset".to_string()));
            }
        }
        let chunks = uploads
            .chunks
            .get_mut(upload_id)
            .ok_or_else(|| ClientError::NotFound("upload not found".to_string()))?;
        if chunks.contains_key(&index) {
            return Ok(false);
        }
        chunks.insert(index, bytes);
        Ok(true)
    }

    async fn finalize_upload(&self, upload_id: &str, checksum: &str) -> Result<(), ClientError> {
        let mut uploads = self.uploads.lock();
        if let Some(err) = uploads.finalize_error.take() {
            return Err(err);
        }
        if !uploads.chunks.contains_key(upload_id) {
            return Err(ClientError::NotFound("upload not found".to_string()));
        }
        uploads.finalized.push((upload_id.to_string(), checksum.to_string()));
        Ok(())
    }

    async fn cancel_upload(&self, upload_id: &str) -> Result<(), ClientError> {
        self.uploads.lock().cancelled.push(upload_id.to_string());
        Ok(())
    }

    async fn report_connector_capability(
        &self,
        connector: &Guid,
        has_credentials: bool,
    ) -> Result<ReportCapabilityResponse, ClientError> {
        self.capability_reports.lock().push((*connector, has_credentials));
        Ok(ReportCapabilityResponse { acknowledged: true, credential_location_updated: true })
    }

    async fn fetch_connector(&self, connector: &Guid) -> Result<ap_core::Connector, ClientError> {
        self.connectors
            .lock()
            .get(connector)
            .cloned()
            .ok_or_else(|| ClientError::NotFound("connector not found".to_string()))
    }
}
