// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent lifecycle: registration, heartbeat, config, version.

use ap_core::{AgentIdentity, AgentRuntime, EntityKind, Guid, TeamConfig};
use ap_wire::{
    HeartbeatRequest, HeartbeatResponse, RegisterRequest, RegisterResponse, VersionResponse,
};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::auth::{self, AuthedAgent};
use crate::error::HttpError;

/// R1 — token-authenticated registration.
pub async fn register(
    State(app): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), HttpError> {
    let now = app.now_ms();
    let response = app.mutate(|state| {
        let team_guid = auth::consume_registration_token(state, &request.token, now)?;

        let duplicate = state
            .agents
            .values()
            .any(|a| a.team_guid == team_guid && a.name == request.name && !a.is_revoked());
        if duplicate {
            return Err(HttpError::Conflict(format!(
                "agent name already registered: {}",
                request.name
            )));
        }

        let guid = Guid::random(EntityKind::Agent);
        let api_key = auth::mint_api_key();
        state.agents.insert(
            guid,
            AgentIdentity {
                guid,
                team_guid,
                name: request.name.clone(),
                api_key: api_key.clone(),
                platform: request.platform.clone(),
                binary_checksum: request.checksum.clone(),
                revoked_at_ms: None,
                created_at_ms: now,
            },
        );
        state.api_keys.insert(api_key.clone(), guid);

        let mut runtime = AgentRuntime::new(guid, now);
        runtime.capabilities = request.capabilities.clone();
        state.runtimes.insert(guid, runtime);

        tracing::info!("registered agent {guid} ({}) for team {team_guid}", request.name);
        Ok(RegisterResponse { guid, api_key, name: request.name.clone(), team_guid })
    })?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// R2 — heartbeat; drains the command channel.
pub async fn heartbeat(
    State(app): State<AppState>,
    agent: AuthedAgent,
    Json(request): Json<HeartbeatRequest>,
) -> Result<Json<HeartbeatResponse>, HttpError> {
    let now = app.now_ms();
    let pending_commands = app.mutate(|state| {
        let runtime = state
            .runtimes
            .entry(agent.guid)
            .or_insert_with(|| AgentRuntime::new(agent.guid, now));
        runtime.heartbeat(request.capabilities, request.authorized_roots, request.metrics, now)
    });
    Ok(Json(HeartbeatResponse { pending_commands }))
}

/// Team tool configuration, fetched by the executor per job.
pub async fn team_config(
    State(app): State<AppState>,
    agent: AuthedAgent,
) -> Result<Json<TeamConfig>, HttpError> {
    app.read(|state| {
        state
            .teams
            .get(&agent.team_guid)
            .map(|team| Json(team.config.clone()))
            .ok_or_else(|| HttpError::NotFound("team not found".to_string()))
    })
}

/// Latest agent release, for `ap update`.
pub async fn version(
    State(app): State<AppState>,
    _agent: AuthedAgent,
) -> Json<VersionResponse> {
    Json(VersionResponse { version: app.config().agent_version.clone() })
}
