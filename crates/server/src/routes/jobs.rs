// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job claim and terminal reporting.

use ap_core::{EntityKind, Guid, Progress};
use ap_wire::{
    CancelledRequest, ClaimRequest, ClaimResponse, CompleteRequest, CompleteResponse,
    FailRequest, JobLease,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::app::AppState;
use crate::auth::AuthedAgent;
use crate::dispatcher;
use crate::error::HttpError;
use crate::results;

fn job_guid(raw: &str) -> Result<Guid, HttpError> {
    Ok(Guid::parse_expected(EntityKind::Job, raw)?)
}

/// R3 — atomic claim; 204 when nothing is eligible.
pub async fn claim(
    State(app): State<AppState>,
    agent: AuthedAgent,
    Json(request): Json<ClaimRequest>,
) -> Result<Response, HttpError> {
    let now = app.now_ms();
    let claimed = app.mutate(|state| {
        dispatcher::claim_job(state, &agent.guid, &agent.team_guid, &request.capabilities, now)
    });

    match claimed {
        None => Ok(StatusCode::NO_CONTENT.into_response()),
        Some(claimed) => {
            let response = ClaimResponse {
                job: JobLease {
                    guid: claimed.job.guid,
                    tool: claimed.job.tool,
                    target: claimed.job.target.clone(),
                    context: claimed.context,
                },
                signing_secret: claimed.signing_secret,
            };
            Ok(Json(response).into_response())
        }
    }
}

/// R4 — progress report.
pub async fn progress(
    State(app): State<AppState>,
    agent: AuthedAgent,
    Path(guid): Path<String>,
    Json(progress): Json<Progress>,
) -> Result<StatusCode, HttpError> {
    let guid = job_guid(&guid)?;
    let now = app.now_ms();
    app.mutate(|state| {
        results::persist_progress(state, &agent.guid, &agent.team_guid, &guid, progress, now)
    })?;
    Ok(StatusCode::OK)
}

/// R5 — signed completion.
pub async fn complete(
    State(app): State<AppState>,
    agent: AuthedAgent,
    Path(guid): Path<String>,
    Json(request): Json<CompleteRequest>,
) -> Result<Json<CompleteResponse>, HttpError> {
    let guid = job_guid(&guid)?;
    let now = app.now_ms();
    let outcome = app.mutate(|state| {
        results::persist_completion(state, &agent.guid, &agent.team_guid, &guid, &request, now)
    })?;

    // Blob moves happen outside the state lock.
    let blob_dir = app.blob_dir();
    for (old, new) in &outcome.rename_blobs {
        tokio::fs::rename(blob_dir.join(old), blob_dir.join(new)).await?;
    }
    for old in &outcome.discard_blobs {
        let _ = tokio::fs::remove_file(blob_dir.join(old)).await;
    }

    Ok(Json(CompleteResponse { result_guid: outcome.result_guid }))
}

/// R6 — signed failure.
pub async fn fail(
    State(app): State<AppState>,
    agent: AuthedAgent,
    Path(guid): Path<String>,
    Json(request): Json<FailRequest>,
) -> Result<StatusCode, HttpError> {
    let guid = job_guid(&guid)?;
    let now = app.now_ms();
    app.mutate(|state| {
        results::persist_failure(state, &agent.guid, &agent.team_guid, &guid, &request, now)
    })?;
    Ok(StatusCode::OK)
}

/// Cooperative cancellation report (signed empty payload).
pub async fn cancelled(
    State(app): State<AppState>,
    agent: AuthedAgent,
    Path(guid): Path<String>,
    Json(request): Json<CancelledRequest>,
) -> Result<StatusCode, HttpError> {
    let guid = job_guid(&guid)?;
    let now = app.now_ms();
    app.mutate(|state| {
        results::persist_cancellation(
            state,
            &agent.guid,
            &agent.team_guid,
            &guid,
            &request.signature,
            now,
        )
    })?;
    Ok(StatusCode::OK)
}
