// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upload sessions: server side of the chunked upload protocol.
//!
//! The state lock covers session bookkeeping only; chunk bytes go to
//! disk outside the lock. Authorization checks both sides: the job must
//! be assigned to the calling agent AND belong to the agent's team.

use std::path::{Path, PathBuf};

use ap_core::Guid;
use ap_wire::InitiateUploadRequest;
use sha2::{Digest, Sha256};

use crate::error::HttpError;
use crate::storage::{ServerState, UploadSession};

/// Smallest chunk the server accepts.
pub const MIN_CHUNK_SIZE: u64 = 64 * 1024;

/// Largest chunk the server accepts.
pub const MAX_CHUNK_SIZE: u64 = 16 * 1024 * 1024;

/// Open sessions per agent.
pub const MAX_SESSIONS_PER_AGENT: usize = 8;

/// Clamp a requested chunk size into the accepted window.
pub fn round_chunk_size(requested: u64) -> u64 {
    requested.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE)
}

/// Look up a session, enforcing agent assignment and tenancy.
fn authorized_session<'a>(
    state: &'a ServerState,
    upload_id: &str,
    agent_guid: &Guid,
    team_guid: &Guid,
) -> Result<&'a UploadSession, HttpError> {
    let session = state
        .uploads
        .get(upload_id)
        .ok_or_else(|| HttpError::NotFound("upload not found".to_string()))?;
    if session.agent_guid != *agent_guid || session.team_guid != *team_guid {
        return Err(HttpError::Forbidden("upload belongs to another agent".to_string()));
    }
    Ok(session)
}

/// Open a session for a job's artifact.
pub fn initiate(
    state: &mut ServerState,
    agent_guid: &Guid,
    team_guid: &Guid,
    job_guid: &Guid,
    request: &InitiateUploadRequest,
    now_ms: u64,
    ttl_ms: u64,
) -> Result<UploadSession, HttpError> {
    let job = state
        .jobs
        .get(job_guid)
        .ok_or_else(|| HttpError::NotFound("job not found".to_string()))?;
    if job.agent_guid.as_ref() != Some(agent_guid) || job.team_guid != *team_guid {
        return Err(HttpError::Forbidden("job is not assigned to this agent".to_string()));
    }
    if request.expected_size == 0 {
        return Err(HttpError::BadRequest("expected_size must be positive".to_string()));
    }
    let open = state.uploads.values().filter(|s| s.agent_guid == *agent_guid).count();
    if open >= MAX_SESSIONS_PER_AGENT {
        return Err(HttpError::Conflict("too many open uploads for this agent".to_string()));
    }

    let chunk_size = round_chunk_size(request.chunk_size);
    let total_chunks = request.expected_size.div_ceil(chunk_size) as u32;
    let session = UploadSession {
        upload_id: format!("upl_{}", hex::encode(uuid_bytes())),
        job_guid: *job_guid,
        agent_guid: *agent_guid,
        team_guid: *team_guid,
        upload_type: request.upload_type,
        expected_size: request.expected_size,
        chunk_size,
        total_chunks,
        received: vec![false; total_chunks as usize],
        expires_at_ms: now_ms + ttl_ms,
        finalized_blob: None,
    };
    state.uploads.insert(session.upload_id.clone(), session.clone());
    Ok(session)
}

fn uuid_bytes() -> [u8; 16] {
    use rand::RngCore;
    let mut raw = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut raw);
    raw
}

/// Pre-write validation for one chunk. `Ok(false)` means the chunk is
/// already present — idempotent success, nothing to write.
pub fn validate_chunk(
    state: &ServerState,
    agent_guid: &Guid,
    team_guid: &Guid,
    upload_id: &str,
    index: u32,
    len: u64,
    now_ms: u64,
) -> Result<bool, HttpError> {
    let session = authorized_session(state, upload_id, agent_guid, team_guid)?;
    if session.expires_at_ms <= now_ms {
        return Err(HttpError::NotFound("upload session expired".to_string()));
    }
    if session.finalized_blob.is_some() {
        return Err(HttpError::Conflict("upload already finalized".to_string()));
    }
    if index >= session.total_chunks {
        return Err(HttpError::BadRequest(format!(
            "chunk index {index} out of range (total {})",
            session.total_chunks
        )));
    }
    if len == 0 || len > session.chunk_size {
        return Err(HttpError::BadRequest(format!(
            "chunk length {len} exceeds chunk size {}",
            session.chunk_size
        )));
    }
    Ok(!session.received[index as usize])
}

/// Record a written chunk; false when another writer got there first.
pub fn record_chunk(state: &mut ServerState, upload_id: &str, index: u32) -> bool {
    state
        .uploads
        .get_mut(upload_id)
        .map(|session| session.mark_received(index))
        .unwrap_or(false)
}

/// Validate that a session is complete and return a copy for assembly.
pub fn prepare_finalize(
    state: &ServerState,
    agent_guid: &Guid,
    team_guid: &Guid,
    upload_id: &str,
    now_ms: u64,
) -> Result<UploadSession, HttpError> {
    let session = authorized_session(state, upload_id, agent_guid, team_guid)?;
    if session.expires_at_ms <= now_ms {
        return Err(HttpError::NotFound("upload session expired".to_string()));
    }
    if !session.all_received() {
        return Err(HttpError::BadRequest(format!(
            "upload incomplete: {}/{} chunks received",
            session.received_count(),
            session.total_chunks
        )));
    }
    Ok(session.clone())
}

/// Mark a session finalized with its assembled blob file.
pub fn commit_finalize(state: &mut ServerState, upload_id: &str, blob_name: String) {
    if let Some(session) = state.uploads.get_mut(upload_id) {
        session.finalized_blob = Some(blob_name);
    }
}

/// Drop a session record (cancellation or consumption).
pub fn remove_session(state: &mut ServerState, upload_id: &str) -> Option<UploadSession> {
    state.uploads.remove(upload_id)
}

/// Remove sessions past their expiry; the caller deletes their files.
pub fn expire_sweep(state: &mut ServerState, now_ms: u64) -> Vec<UploadSession> {
    let expired: Vec<String> = state
        .uploads
        .values()
        .filter(|session| session.expires_at_ms <= now_ms)
        .map(|session| session.upload_id.clone())
        .collect();
    expired
        .iter()
        .filter_map(|upload_id| state.uploads.remove(upload_id))
        .collect()
}

// ── File-side helpers (no state lock held) ──────────────────────────────

pub fn chunk_path(upload_dir: &Path, index: u32) -> PathBuf {
    upload_dir.join(format!("{index}.chunk"))
}

/// Write one chunk file (temp + rename; same-content rewrites are fine).
pub async fn write_chunk(
    upload_dir: &Path,
    index: u32,
    bytes: &[u8],
) -> Result<(), HttpError> {
    tokio::fs::create_dir_all(upload_dir).await?;
    let path = chunk_path(upload_dir, index);
    let tmp = path.with_extension("chunk.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, &path).await?;
    Ok(())
}

/// Stream chunks in index order through SHA-256, compare to the
/// client's checksum, and on match assemble the blob atomically.
/// On mismatch the chunk files stay; the client may re-PUT and retry.
pub async fn assemble(
    upload_dir: &Path,
    session: &UploadSession,
    submitted_checksum: &str,
    blob_path: &Path,
) -> Result<(), HttpError> {
    let mut hasher = Sha256::new();
    let mut content = Vec::with_capacity(session.expected_size as usize);
    for index in 0..session.total_chunks {
        let bytes = tokio::fs::read(chunk_path(upload_dir, index)).await?;
        hasher.update(&bytes);
        content.extend_from_slice(&bytes);
    }
    let actual = hex::encode(hasher.finalize());
    if !actual.eq_ignore_ascii_case(submitted_checksum) {
        return Err(HttpError::BadRequest("checksum mismatch".to_string()));
    }

    if let Some(parent) = blob_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = blob_path.with_extension("tmp");
    tokio::fs::write(&tmp, &content).await?;
    tokio::fs::rename(&tmp, blob_path).await?;

    let _ = tokio::fs::remove_dir_all(upload_dir).await;
    Ok(())
}

/// Delete everything a session left on disk.
pub async fn delete_session_files(upload_dir: &Path, blob_dir: &Path, session: &UploadSession) {
    let _ = tokio::fs::remove_dir_all(upload_dir).await;
    if let Some(blob) = &session.finalized_blob {
        let _ = tokio::fs::remove_file(blob_dir.join(blob)).await;
    }
}

#[cfg(test)]
#[path = "uploads_tests.rs"]
mod tests;
