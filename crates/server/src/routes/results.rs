// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result reads and downloads.

use ap_core::{EntityKind, Guid};
use ap_wire::{ResultDetail, ResultSummary};
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::app::AppState;
use crate::auth::AuthedAgent;
use crate::error::HttpError;
use crate::results::{self, DownloadSource};

fn result_guid(raw: &str) -> Result<Guid, HttpError> {
    Ok(Guid::parse_expected(EntityKind::Result, raw)?)
}

/// Tenant-scoped ownership check shared by the read endpoints.
fn owned(app: &AppState, agent: &AuthedAgent, guid: &Guid) -> Result<(), HttpError> {
    app.read(|state| match state.results.get(guid) {
        Some(result) if result.team_guid == agent.team_guid => Ok(()),
        _ => Err(HttpError::NotFound("result not found".to_string())),
    })
}

pub async fn list(
    State(app): State<AppState>,
    agent: AuthedAgent,
) -> Json<Vec<ResultSummary>> {
    let mut rows = app.read(|state| {
        state
            .results
            .values()
            .filter(|result| result.team_guid == agent.team_guid)
            .map(results::summary)
            .collect::<Vec<_>>()
    });
    rows.sort_by_key(|row| std::cmp::Reverse(row.created_at_ms));
    Json(rows)
}

pub async fn get_result(
    State(app): State<AppState>,
    agent: AuthedAgent,
    Path(guid): Path<String>,
) -> Result<Json<ResultDetail>, HttpError> {
    let guid = result_guid(&guid)?;
    owned(&app, &agent, &guid)?;
    app.read(|state| results::detail(state, &guid)).map(Json)
}

/// Full, untruncated payload — served from disk for blob-backed rows,
/// following a no-change reference when present.
pub async fn download(
    State(app): State<AppState>,
    agent: AuthedAgent,
    Path(guid): Path<String>,
) -> Result<Response, HttpError> {
    let guid = result_guid(&guid)?;
    owned(&app, &agent, &guid)?;
    let source = app.read(|state| results::resolve_download(state, &guid))?;

    let bytes = match source {
        DownloadSource::Inline(json) => json.into_bytes(),
        DownloadSource::Blob(name) => tokio::fs::read(app.blob_dir().join(name)).await?,
    };
    Ok(([(header::CONTENT_TYPE, "application/json")], bytes).into_response())
}
