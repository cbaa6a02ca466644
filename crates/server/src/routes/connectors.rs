// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connector reads, deletion guard, and capability reporting.

use ap_core::{Connector, CredentialLocation, EntityKind, Guid};
use ap_wire::{ReportCapabilityRequest, ReportCapabilityResponse};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::auth::AuthedAgent;
use crate::error::HttpError;

fn connector_guid(raw: &str) -> Result<Guid, HttpError> {
    Ok(Guid::parse_expected(EntityKind::Connector, raw)?)
}

pub async fn get_connector(
    State(app): State<AppState>,
    agent: AuthedAgent,
    Path(guid): Path<String>,
) -> Result<Json<Connector>, HttpError> {
    let guid = connector_guid(&guid)?;
    app.read(|state| {
        state
            .connectors
            .get(&guid)
            .filter(|connector| connector.team_guid == agent.team_guid)
            .cloned()
            .map(Json)
            .ok_or_else(|| HttpError::NotFound("connector not found".to_string()))
    })
}

/// Deleting a connector still referenced by live collections fails with
/// a count-bearing error.
pub async fn delete_connector(
    State(app): State<AppState>,
    agent: AuthedAgent,
    Path(guid): Path<String>,
) -> Result<StatusCode, HttpError> {
    let guid = connector_guid(&guid)?;
    app.mutate(|state| {
        let connector = state
            .connectors
            .get(&guid)
            .filter(|connector| connector.team_guid == agent.team_guid)
            .ok_or_else(|| HttpError::NotFound("connector not found".to_string()))?;
        let live = state.live_collections_for_connector(&connector.guid);
        if live > 0 {
            return Err(HttpError::Conflict(format!(
                "connector is referenced by {live} live collection(s)"
            )));
        }
        state.connectors.remove(&guid);
        Ok(StatusCode::NO_CONTENT)
    })
}

/// R11 — an agent reports whether it holds credentials locally.
pub async fn report_capability(
    State(app): State<AppState>,
    agent: AuthedAgent,
    Path(guid): Path<String>,
    Json(request): Json<ReportCapabilityRequest>,
) -> Result<Json<ReportCapabilityResponse>, HttpError> {
    let guid = connector_guid(&guid)?;
    let updated = app.mutate(|state| {
        let connector = state
            .connectors
            .get_mut(&guid)
            .filter(|connector| connector.team_guid == agent.team_guid)
            .ok_or_else(|| HttpError::NotFound("connector not found".to_string()))?;

        let target = if request.has_credentials {
            CredentialLocation::Agent
        } else {
            CredentialLocation::Pending
        };
        // Server-held credentials are never flipped by agent reports.
        if connector.credential_location == CredentialLocation::Server
            || connector.credential_location == target
        {
            return Ok(false);
        }
        connector.credential_location = target;
        tracing::info!(
            "connector {guid} credential location -> {} (reported by {})",
            connector.credential_location,
            agent.name
        );
        Ok(true)
    })?;
    Ok(Json(ReportCapabilityResponse {
        acknowledged: true,
        credential_location_updated: updated,
    }))
}
