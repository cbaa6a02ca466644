// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job executor: one claimed job, end to end.
//!
//! State machine: starting → configuring → running → finalizing, with
//! `failed` reachable from every phase and `cancelled` from the check
//! points (after progress reports, between scan and analyze, before
//! finalize). Tool code itself is never interrupted. Every outcome —
//! including failure to execute — is signed and reported; no exception
//! escapes to the polling loop.

use std::sync::Arc;
use std::time::Instant;

use ap_adapters::{
    AdapterError, ConnectorCredentials, CredentialStore, GcsAdapter, LocalAdapter, S3Adapter,
    SmbAdapter, StorageAdapter,
};
use ap_core::{CollectionKind, Guid, Progress};
use ap_wire::{
    CancelledRequest, ClaimResponse, CompleteRequest, FailRequest, JobLease, UploadType,
};
use serde::Deserialize;
use std::path::PathBuf;

use crate::client::{ClientError, ServerApi};
use crate::input_state::InputStateComputer;
use crate::poll::CancelFlag;
use crate::progress::ProgressReporter;
use crate::tools::{ToolOutcome, ToolRegistry};
use crate::upload::{ChunkedUploader, UploadError, INLINE_JSON_THRESHOLD};

/// Execution context shipped in the job lease.
#[derive(Debug, Clone, Deserialize)]
struct JobContext {
    collection_type: CollectionKind,
    location: String,
    #[serde(default)]
    connector_guid: Option<Guid>,
}

#[derive(Debug, thiserror::Error)]
enum ExecError {
    #[error("cancelled")]
    Cancelled,
    #[error("config fetch: {0}")]
    Config(String),
    #[error("{0}")]
    Adapter(#[from] AdapterError),
    #[error("server: {0}")]
    Client(#[from] ClientError),
    #[error("upload: {0}")]
    Upload(UploadError),
    #[error("signing: {0}")]
    Signing(#[from] ap_core::SigningError),
    #[error("{0}")]
    Internal(String),
}

impl From<UploadError> for ExecError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Cancelled => ExecError::Cancelled,
            other => ExecError::Upload(other),
        }
    }
}

/// Builds the right storage adapter for a job's target.
pub struct AdapterFactory {
    authorized_roots: Vec<PathBuf>,
    vault: Arc<CredentialStore>,
}

impl AdapterFactory {
    pub fn new(authorized_roots: Vec<PathBuf>, vault: Arc<CredentialStore>) -> Self {
        Self { authorized_roots, vault }
    }

    async fn build(
        &self,
        kind: CollectionKind,
        connector: Option<&Guid>,
    ) -> Result<Box<dyn StorageAdapter>, ExecError> {
        if kind == CollectionKind::Local {
            return Ok(Box::new(LocalAdapter::new(self.authorized_roots.clone())));
        }

        let connector = connector.ok_or_else(|| {
            ExecError::Internal(format!("{kind} target without a connector"))
        })?;
        let creds = self
            .vault
            .get(connector)
            .map_err(|err| ExecError::Internal(format!("vault: {err}")))?
            .ok_or_else(|| {
                ExecError::Internal(format!("no stored credentials for {connector}"))
            })?;

        match (kind, creds) {
            (CollectionKind::S3, ConnectorCredentials::S3(creds)) => {
                Ok(Box::new(S3Adapter::connect(&creds).await?))
            }
            (CollectionKind::Gcs, ConnectorCredentials::Gcs(creds)) => {
                Ok(Box::new(GcsAdapter::connect(&creds)?))
            }
            (CollectionKind::Smb, ConnectorCredentials::Smb(creds)) => {
                Ok(Box::new(SmbAdapter::connect(&creds).await?))
            }
            (kind, creds) => Err(ExecError::Internal(format!(
                "credential type {} does not match {kind} target",
                creds.kind()
            ))),
        }
    }
}

/// Executes one job at a time on behalf of the polling loop.
pub struct JobExecutor<A: ServerApi + 'static> {
    api: Arc<A>,
    factory: AdapterFactory,
    tools: ToolRegistry,
    input_state: InputStateComputer,
    inline_threshold: usize,
}

impl<A: ServerApi + 'static> JobExecutor<A> {
    pub fn new(api: Arc<A>, factory: AdapterFactory) -> Self {
        Self {
            api,
            factory,
            tools: ToolRegistry,
            input_state: InputStateComputer,
            inline_threshold: INLINE_JSON_THRESHOLD,
        }
    }

    #[cfg(test)]
    pub fn with_inline_threshold(mut self, threshold: usize) -> Self {
        self.inline_threshold = threshold;
        self
    }

    /// Execute a claim and report its outcome. Never propagates errors;
    /// a single job failure must not crash the loop.
    pub async fn execute(&self, claim: ClaimResponse, cancel: &CancelFlag) {
        let job = claim.job.guid;
        let secret = claim.signing_secret.clone();
        let reporter = ProgressReporter::new(self.api.clone(), job);

        let outcome = self.run(&claim, &reporter, cancel).await;
        reporter.close().await;

        match outcome {
            Ok(()) => tracing::info!("{job} completed"),
            Err(ExecError::Cancelled) => {
                tracing::info!("{job} cancelled");
                self.report_cancelled(&job, &secret).await;
            }
            Err(err) => {
                tracing::warn!("{job} failed: {err}");
                self.report_failure(&job, &secret, &err.to_string()).await;
            }
        }
    }

    async fn run(
        &self,
        claim: &ClaimResponse,
        reporter: &ProgressReporter<A>,
        cancel: &CancelFlag,
    ) -> Result<(), ExecError> {
        let lease = &claim.job;
        let started = Instant::now();
        reporter.report(Progress::stage("starting"));

        // configuring
        let config = self
            .api
            .fetch_team_config()
            .await
            .map_err(|err| ExecError::Config(err.to_string()))?;
        let context: JobContext = serde_json::from_value(lease.context.clone())
            .map_err(|err| ExecError::Config(format!("bad job context: {err}")))?;
        check_point(cancel)?;

        // running: scan
        reporter.report(Progress::stage("scanning"));
        let adapter =
            self.factory.build(context.collection_type, context.connector_guid.as_ref()).await?;
        let files = adapter.list_files_with_metadata(&context.location).await?;
        reporter.report(Progress {
            files_scanned: Some(files.len() as u64),
            total_files: Some(files.len() as u64),
            ..Progress::stage("scanning")
        });
        check_point(cancel)?;

        // running: analyze
        reporter.report(Progress::stage("analyzing"));
        let input_state_hash = self.input_state.compute(lease.tool, &files, &config);
        let outcome = self.tools.get(lease.tool).run(&files, &config);
        check_point(cancel)?;

        // finalizing
        reporter.report(Progress {
            percentage: Some(100.0),
            files_scanned: Some(outcome.files_scanned),
            ..Progress::stage("finalizing")
        });
        self.finalize(lease, &claim.signing_secret, outcome, input_state_hash, started, cancel)
            .await
    }

    async fn finalize(
        &self,
        lease: &JobLease,
        secret: &str,
        outcome: ToolOutcome,
        input_state_hash: String,
        started: Instant,
        cancel: &CancelFlag,
    ) -> Result<(), ExecError> {
        let uploader = ChunkedUploader::new(self.api.clone());
        let results_bytes = serde_json::to_vec(&outcome.results)
            .map_err(|err| ExecError::Internal(format!("results encode: {err}")))?;

        let (results, upload_id) = if results_bytes.len() > self.inline_threshold {
            let uploaded = uploader
                .upload(&lease.guid, UploadType::ResultsJson, &results_bytes, cancel)
                .await?;
            (None, Some(uploaded.upload_id))
        } else {
            (Some(outcome.results.clone()), None)
        };

        // HTML reports always travel chunked.
        let report_upload_id = match &outcome.report_html {
            Some(html) => Some(
                uploader
                    .upload(&lease.guid, UploadType::ReportHtml, html.as_bytes(), cancel)
                    .await?
                    .upload_id,
            ),
            None => None,
        };
        check_point(cancel)?;

        let mut request = CompleteRequest {
            results,
            files_scanned: outcome.files_scanned,
            issues_found: outcome.issues_found,
            duration_seconds: started.elapsed().as_secs_f64(),
            input_state_hash: Some(input_state_hash),
            signature: String::new(),
            upload_id,
            report_upload_id,
        };
        request.signature = ap_core::sign(secret, &request.signed_payload())?;

        self.api.complete_job(&lease.guid, &request).await?;
        Ok(())
    }

    async fn report_cancelled(&self, job: &Guid, secret: &str) {
        let payload = CancelledRequest::signed_payload();
        let signature = match ap_core::sign(secret, &payload) {
            Ok(signature) => signature,
            Err(err) => {
                tracing::error!("cannot sign cancellation for {job}: {err}");
                return;
            }
        };
        if let Err(err) =
            self.api.report_cancelled(job, &CancelledRequest { signature }).await
        {
            tracing::warn!("cancellation report for {job} failed: {err}");
        }
    }

    async fn report_failure(&self, job: &Guid, secret: &str, message: &str) {
        let mut request =
            FailRequest { error_message: message.to_string(), signature: String::new() };
        let signature = match ap_core::sign(secret, &request.signed_payload()) {
            Ok(signature) => signature,
            Err(err) => {
                tracing::error!("cannot sign failure for {job}: {err}");
                return;
            }
        };
        request.signature = signature;
        if let Err(err) = self.api.fail_job(job, &request).await {
            tracing::warn!("failure report for {job} failed: {err}");
        }
    }

}

/// Cancellation check point: cooperative, never preemptive.
fn check_point(cancel: &CancelFlag) -> Result<(), ExecError> {
    if cancel.is_set() {
        return Err(ExecError::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
