// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chunked upload endpoints.
//!
//! The state lock never spans file IO: each handler validates under the
//! lock, touches disk, then records the outcome under the lock again.

use ap_core::{EntityKind, Guid};
use ap_wire::{
    ChunkResponse, FinalizeRequest, FinalizeResponse, InitiateUploadRequest,
    InitiateUploadResponse,
};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::auth::AuthedAgent;
use crate::error::HttpError;
use crate::uploads;

/// R7 — open an upload session for a job artifact.
pub async fn initiate(
    State(app): State<AppState>,
    agent: AuthedAgent,
    Path(guid): Path<String>,
    Json(request): Json<InitiateUploadRequest>,
) -> Result<(StatusCode, Json<InitiateUploadResponse>), HttpError> {
    let job_guid = Guid::parse_expected(EntityKind::Job, &guid)?;
    let now = app.now_ms();
    let ttl = app.config().upload_session_ttl.as_millis() as u64;

    let session = app.mutate(|state| {
        uploads::initiate(state, &agent.guid, &agent.team_guid, &job_guid, &request, now, ttl)
    })?;
    Ok((
        StatusCode::CREATED,
        Json(InitiateUploadResponse {
            upload_id: session.upload_id,
            chunk_size: session.chunk_size,
            total_chunks: session.total_chunks,
        }),
    ))
}

/// R8 — idempotent chunk PUT.
pub async fn put_chunk(
    State(app): State<AppState>,
    agent: AuthedAgent,
    Path((upload_id, index)): Path<(String, u32)>,
    body: Bytes,
) -> Result<Json<ChunkResponse>, HttpError> {
    let now = app.now_ms();
    let fresh = app.read(|state| {
        uploads::validate_chunk(
            state,
            &agent.guid,
            &agent.team_guid,
            &upload_id,
            index,
            body.len() as u64,
            now,
        )
    })?;
    if !fresh {
        // Already have this chunk — do not rewrite.
        return Ok(Json(ChunkResponse { received: false }));
    }

    uploads::write_chunk(&app.upload_dir(&upload_id), index, &body).await?;
    let received = app.mutate(|state| uploads::record_chunk(state, &upload_id, index));
    Ok(Json(ChunkResponse { received }))
}

/// R9 — verify the checksum and assemble the blob.
pub async fn finalize(
    State(app): State<AppState>,
    agent: AuthedAgent,
    Path(upload_id): Path<String>,
    Json(request): Json<FinalizeRequest>,
) -> Result<Json<FinalizeResponse>, HttpError> {
    let now = app.now_ms();
    let session = app.read(|state| {
        uploads::prepare_finalize(state, &agent.guid, &agent.team_guid, &upload_id, now)
    })?;

    let blob_name = format!("{upload_id}.blob");
    uploads::assemble(
        &app.upload_dir(&upload_id),
        &session,
        &request.checksum,
        &app.blob_dir().join(&blob_name),
    )
    .await?;

    app.mutate(|state| uploads::commit_finalize(state, &upload_id, blob_name));
    Ok(Json(FinalizeResponse { success: true }))
}

/// R10 — best-effort cancellation.
pub async fn cancel(
    State(app): State<AppState>,
    agent: AuthedAgent,
    Path(upload_id): Path<String>,
) -> Result<StatusCode, HttpError> {
    let session = app.mutate(|state| {
        let authorized = state
            .uploads
            .get(&upload_id)
            .map(|s| s.agent_guid == agent.guid && s.team_guid == agent.team_guid)
            .unwrap_or(false);
        if authorized {
            uploads::remove_session(state, &upload_id)
        } else {
            None
        }
    });

    match session {
        Some(session) => {
            uploads::delete_session_files(&app.upload_dir(&upload_id), &app.blob_dir(), &session)
                .await;
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(HttpError::NotFound("upload not found".to_string())),
    }
}
