// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result persistence: signature verification, terminal transitions,
//! no-change deduplication, and download resolution.
//!
//! Handlers split each operation in two: a state mutation under the
//! lock (here) and blob file moves outside it (the routes). The
//! returned outcome lists exactly which files to rename or discard.

use ap_core::{AnalysisResult, Guid, JobStatus, ResultStatus};
use ap_wire::{CompleteRequest, FailRequest, ResultDetail, ResultSummary, UploadType};
use serde_json::Value;

use crate::error::HttpError;
use crate::storage::ServerState;

/// Max items per large array in listing responses.
pub const RESULT_ITEMS_LIMIT: usize = 20;

/// Array fields that can blow up an API response.
const LARGE_ARRAY_FIELDS: &[&str] = &["paths", "files", "issues", "orphans", "groups", "patterns"];

/// Truncate large arrays, recording original counts under `_truncated`.
/// Download endpoints always serve the full payload.
pub fn truncate_results(results: &Value) -> Value {
    let Some(map) = results.as_object() else { return results.clone() };
    let mut out = map.clone();
    let mut truncated = serde_json::Map::new();

    for field in LARGE_ARRAY_FIELDS {
        if let Some(Value::Array(items)) = out.get_mut(*field) {
            if items.len() > RESULT_ITEMS_LIMIT {
                truncated.insert((*field).to_string(), Value::from(items.len()));
                items.truncate(RESULT_ITEMS_LIMIT);
            }
        }
    }
    if !truncated.is_empty() {
        out.insert("_truncated".to_string(), Value::Object(truncated));
    }
    Value::Object(out)
}

/// File operations a route must perform after a completion commits.
/// Paths are file names inside the blob dir.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub result_guid: Guid,
    /// Finalized upload blobs to rename to their result names.
    pub rename_blobs: Vec<(String, String)>,
    /// Finalized upload blobs that are no longer needed (no-change copy).
    pub discard_blobs: Vec<String>,
}

impl CompletionOutcome {
    fn new(result_guid: Guid) -> Self {
        Self { result_guid, rename_blobs: Vec::new(), discard_blobs: Vec::new() }
    }
}

fn authorized_job<'a>(
    state: &'a ServerState,
    agent_guid: &Guid,
    team_guid: &Guid,
    job_guid: &Guid,
) -> Result<&'a ap_core::Job, HttpError> {
    let job = state
        .jobs
        .get(job_guid)
        .ok_or_else(|| HttpError::NotFound("job not found".to_string()))?;
    if job.agent_guid.as_ref() != Some(agent_guid) || job.team_guid != *team_guid {
        return Err(HttpError::Forbidden("job is not assigned to this agent".to_string()));
    }
    Ok(job)
}

fn verify_signature(
    secret: Option<&String>,
    payload: &Value,
    signature: &str,
) -> Result<(), HttpError> {
    let secret =
        secret.ok_or_else(|| HttpError::BadRequest("job has no signing secret".to_string()))?;
    match ap_core::verify(secret, payload, signature) {
        Ok(true) => Ok(()),
        Ok(false) => Err(HttpError::BadRequest("bad signature".to_string())),
        Err(err) => Err(HttpError::BadRequest(format!("bad signature: {err}"))),
    }
}

/// The canonical completed result for (team, target, tool, hash), if
/// any. Follows a copy to its canonical row.
fn canonical_match(
    state: &ServerState,
    team: &Guid,
    target: &Guid,
    tool: ap_core::ToolKind,
    hash: &str,
) -> Option<Guid> {
    let mut candidates: Vec<&AnalysisResult> = state
        .results
        .values()
        .filter(|r| {
            r.team_guid == *team
                && r.target.guid == *target
                && r.tool == tool
                && r.status == ResultStatus::Completed
                && r.input_state_hash.as_deref() == Some(hash)
        })
        .collect();
    candidates.sort_by_key(|r| std::cmp::Reverse(r.created_at_ms));

    let hit = candidates.first()?;
    match hit.download_report_from {
        Some(canonical) if hit.no_change_copy => Some(canonical),
        _ => Some(hit.guid),
    }
}

/// Take a finalized upload session for this job, returning its blob.
fn consume_upload(
    state: &mut ServerState,
    job_guid: &Guid,
    upload_id: &str,
    expected_type: UploadType,
) -> Result<String, HttpError> {
    let session = state
        .uploads
        .get(upload_id)
        .ok_or_else(|| HttpError::BadRequest(format!("unknown upload {upload_id}")))?;
    if session.job_guid != *job_guid {
        return Err(HttpError::Forbidden("upload belongs to another job".to_string()));
    }
    if session.upload_type != expected_type {
        return Err(HttpError::BadRequest("upload type mismatch".to_string()));
    }
    let blob = session
        .finalized_blob
        .clone()
        .ok_or_else(|| HttpError::BadRequest(format!("upload {upload_id} not finalized")))?;
    state.uploads.remove(upload_id);
    Ok(blob)
}

/// Persist a signed completion. Idempotent per claim: a duplicate
/// complete for an already-completed job returns the existing result.
pub fn persist_completion(
    state: &mut ServerState,
    agent_guid: &Guid,
    team_guid: &Guid,
    job_guid: &Guid,
    request: &CompleteRequest,
    now_ms: u64,
) -> Result<CompletionOutcome, HttpError> {
    let job = authorized_job(state, agent_guid, team_guid, job_guid)?;

    if job.status == JobStatus::Completed {
        let existing = state
            .results
            .values()
            .find(|r| r.job_guid == *job_guid)
            .map(|r| r.guid)
            .ok_or_else(|| HttpError::Internal("completed job lost its result".to_string()))?;
        return Ok(CompletionOutcome::new(existing));
    }
    if job.is_terminal() {
        return Err(HttpError::Conflict(format!("job already {}", job.status)));
    }
    verify_signature(job.signing_secret.as_ref(), &request.signed_payload(), &request.signature)?;

    let tool = job.tool;
    let target = job.target.clone();
    let context = job.context.clone();

    let result_guid = Guid::random(ap_core::EntityKind::Result);
    let mut outcome = CompletionOutcome::new(result_guid);

    // Consume uploads first so a bad upload reference fails the call
    // before any state changes.
    let results_blob = match &request.upload_id {
        Some(upload_id) => {
            Some(consume_upload(state, job_guid, upload_id, UploadType::ResultsJson)?)
        }
        None => None,
    };
    let report_blob = match &request.report_upload_id {
        Some(upload_id) => {
            Some(consume_upload(state, job_guid, upload_id, UploadType::ReportHtml)?)
        }
        None => None,
    };

    let canonical = request
        .input_state_hash
        .as_deref()
        .and_then(|hash| canonical_match(state, team_guid, &target.guid, tool, hash));

    let result = if let Some(canonical) = canonical {
        // No change since the canonical run: reference it, store no blob.
        outcome.discard_blobs.extend(results_blob.into_iter().chain(report_blob));
        AnalysisResult {
            guid: result_guid,
            team_guid: *team_guid,
            job_guid: *job_guid,
            tool,
            target,
            context,
            status: ResultStatus::Completed,
            duration_seconds: request.duration_seconds,
            files_scanned: request.files_scanned,
            issues_found: request.issues_found,
            results_json: None,
            results_blob: None,
            report_blob: None,
            error_message: None,
            input_state_hash: request.input_state_hash.clone(),
            no_change_copy: true,
            download_report_from: Some(canonical),
            created_at_ms: now_ms,
        }
    } else {
        let results_blob = results_blob.map(|old| {
            let new = format!("{result_guid}.results.json");
            outcome.rename_blobs.push((old, new.clone()));
            new
        });
        let report_blob = report_blob.map(|old| {
            let new = format!("{result_guid}.report.html");
            outcome.rename_blobs.push((old, new.clone()));
            new
        });
        AnalysisResult {
            guid: result_guid,
            team_guid: *team_guid,
            job_guid: *job_guid,
            tool,
            target,
            context,
            status: ResultStatus::Completed,
            duration_seconds: request.duration_seconds,
            files_scanned: request.files_scanned,
            issues_found: request.issues_found,
            results_json: request.results.clone(),
            results_blob,
            report_blob,
            error_message: None,
            input_state_hash: request.input_state_hash.clone(),
            no_change_copy: false,
            download_report_from: None,
            created_at_ms: now_ms,
        }
    };

    state.results.insert(result_guid, result);
    if let Some(job) = state.jobs.get_mut(job_guid) {
        job.complete(now_ms)
            .map_err(|err| HttpError::Conflict(err.to_string()))?;
    }
    Ok(outcome)
}

/// Persist a signed failure; writes a failed result row.
pub fn persist_failure(
    state: &mut ServerState,
    agent_guid: &Guid,
    team_guid: &Guid,
    job_guid: &Guid,
    request: &FailRequest,
    now_ms: u64,
) -> Result<(), HttpError> {
    let job = authorized_job(state, agent_guid, team_guid, job_guid)?;
    if job.status == JobStatus::Failed {
        return Ok(());
    }
    if job.is_terminal() {
        return Err(HttpError::Conflict(format!("job already {}", job.status)));
    }
    verify_signature(job.signing_secret.as_ref(), &request.signed_payload(), &request.signature)?;

    let result = AnalysisResult {
        guid: Guid::random(ap_core::EntityKind::Result),
        team_guid: *team_guid,
        job_guid: *job_guid,
        tool: job.tool,
        target: job.target.clone(),
        context: job.context.clone(),
        status: ResultStatus::Failed,
        duration_seconds: 0.0,
        files_scanned: 0,
        issues_found: 0,
        results_json: None,
        results_blob: None,
        report_blob: None,
        error_message: Some(request.error_message.clone()),
        input_state_hash: None,
        no_change_copy: false,
        download_report_from: None,
        created_at_ms: now_ms,
    };
    state.results.insert(result.guid, result);
    if let Some(job) = state.jobs.get_mut(job_guid) {
        job.fail(request.error_message.clone(), now_ms)
            .map_err(|err| HttpError::Conflict(err.to_string()))?;
    }
    Ok(())
}

/// Persist a signed cancellation. No result row is written.
pub fn persist_cancellation(
    state: &mut ServerState,
    agent_guid: &Guid,
    team_guid: &Guid,
    job_guid: &Guid,
    signature: &str,
    now_ms: u64,
) -> Result<(), HttpError> {
    let job = authorized_job(state, agent_guid, team_guid, job_guid)?;
    if job.status == JobStatus::Cancelled {
        return Ok(());
    }
    if job.is_terminal() {
        return Err(HttpError::Conflict(format!("job already {}", job.status)));
    }
    verify_signature(
        job.signing_secret.as_ref(),
        &ap_wire::CancelledRequest::signed_payload(),
        signature,
    )?;
    if let Some(job) = state.jobs.get_mut(job_guid) {
        job.cancel(now_ms).map_err(|err| HttpError::Conflict(err.to_string()))?;
    }
    Ok(())
}

/// Record a progress report; the first one moves the job to running.
pub fn persist_progress(
    state: &mut ServerState,
    agent_guid: &Guid,
    team_guid: &Guid,
    job_guid: &Guid,
    progress: ap_core::Progress,
    now_ms: u64,
) -> Result<(), HttpError> {
    authorized_job(state, agent_guid, team_guid, job_guid)?;
    let Some(job) = state.jobs.get_mut(job_guid) else {
        return Err(HttpError::NotFound("job not found".to_string()));
    };
    if job.is_terminal() {
        // Late report after a terminal transition; ignore.
        return Ok(());
    }
    if job.status == JobStatus::Claimed {
        job.start(now_ms).map_err(|err| HttpError::Conflict(err.to_string()))?;
    }
    job.progress = Some(progress);
    job.updated_at_ms = now_ms;
    Ok(())
}

/// Where a result's payload lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadSource {
    Inline(String),
    Blob(String),
}

/// Resolve the results payload, following a no-change reference.
pub fn resolve_download(state: &ServerState, guid: &Guid) -> Result<DownloadSource, HttpError> {
    let mut current = *guid;
    for _ in 0..8 {
        let result = state
            .results
            .get(&current)
            .ok_or_else(|| HttpError::NotFound("result not found".to_string()))?;
        if let Some(next) = result.download_report_from {
            current = next;
            continue;
        }
        if let Some(blob) = &result.results_blob {
            return Ok(DownloadSource::Blob(blob.clone()));
        }
        if let Some(inline) = &result.results_json {
            return Ok(DownloadSource::Inline(inline.to_string()));
        }
        return Err(HttpError::NotFound("result has no payload".to_string()));
    }
    Err(HttpError::Internal("reference chain too deep".to_string()))
}

/// Listing row.
pub fn summary(result: &AnalysisResult) -> ResultSummary {
    ResultSummary {
        guid: result.guid,
        job_guid: result.job_guid,
        tool: result.tool,
        target: result.target.clone(),
        status: result.status,
        files_scanned: result.files_scanned,
        issues_found: result.issues_found,
        no_change_copy: result.no_change_copy,
        created_at_ms: result.created_at_ms,
    }
}

/// Detail view with truncated arrays.
pub fn detail(state: &ServerState, guid: &Guid) -> Result<ResultDetail, HttpError> {
    let result = state
        .results
        .get(guid)
        .ok_or_else(|| HttpError::NotFound("result not found".to_string()))?;

    // Inline payloads come from this row or, for copies, the canonical.
    let results = match (&result.results_json, result.download_report_from) {
        (Some(inline), _) => Some(inline.clone()),
        (None, Some(canonical)) => {
            state.results.get(&canonical).and_then(|c| c.results_json.clone())
        }
        (None, None) => None,
    };

    Ok(ResultDetail {
        guid: result.guid,
        job_guid: result.job_guid,
        tool: result.tool,
        target: result.target.clone(),
        status: result.status,
        duration_seconds: result.duration_seconds,
        files_scanned: result.files_scanned,
        issues_found: result.issues_found,
        results: results.as_ref().map(truncate_results),
        error_message: result.error_message.clone(),
        input_state_hash: result.input_state_hash.clone(),
        no_change_copy: result.no_change_copy,
        download_report_from: result.download_report_from,
        created_at_ms: result.created_at_ms,
    })
}

#[cfg(test)]
#[path = "results_tests.rs"]
mod tests;
