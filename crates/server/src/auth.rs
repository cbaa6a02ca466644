// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer authentication for agent endpoints.
//!
//! `Authorization: Bearer <api_key>` resolves to a registered agent.
//! Revoked agents get a 401 whose detail says "revoked" so the polling
//! loop can exit with the right code. Registration is the one endpoint
//! that authenticates differently (single-use token in the body).

use ap_core::{AgentIdentity, Guid};
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::app::AppState;
use crate::error::HttpError;
use crate::storage::ServerState;

/// The authenticated caller of an agent endpoint.
#[derive(Debug, Clone)]
pub struct AuthedAgent {
    pub guid: Guid,
    pub team_guid: Guid,
    pub name: String,
}

impl From<&AgentIdentity> for AuthedAgent {
    fn from(identity: &AgentIdentity) -> Self {
        Self { guid: identity.guid, team_guid: identity.team_guid, name: identity.name.clone() }
    }
}

/// Resolve a bearer key against the state.
pub fn authenticate(state: &ServerState, bearer: &str) -> Result<AuthedAgent, HttpError> {
    let identity = state
        .agent_by_key(bearer)
        .ok_or_else(|| HttpError::Unauthorized("invalid API key".to_string()))?;
    if identity.is_revoked() {
        return Err(HttpError::Unauthorized("agent revoked".to_string()));
    }
    Ok(identity.into())
}

fn bearer_from(parts: &Parts) -> Result<String, HttpError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| HttpError::Unauthorized("missing Authorization header".to_string()))?;
    header
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| HttpError::Unauthorized("expected Bearer authorization".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthedAgent {
    type Rejection = HttpError;

    async fn from_request_parts(
        parts: &mut Parts,
        app: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = bearer_from(parts)?;
        app.read(|state| authenticate(state, &bearer))
    }
}

/// Validate and consume a registration token.
pub fn consume_registration_token(
    state: &mut ServerState,
    token: &str,
    now_ms: u64,
) -> Result<Guid, HttpError> {
    let record = state
        .registration_tokens
        .get_mut(token)
        .ok_or_else(|| HttpError::Unauthorized("invalid registration token".to_string()))?;
    if record.used {
        return Err(HttpError::Unauthorized("registration token already used".to_string()));
    }
    if record.expires_at_ms <= now_ms {
        return Err(HttpError::Unauthorized("registration token expired".to_string()));
    }
    record.used = true;
    Ok(record.team_guid)
}

/// Mint an opaque agent API key.
pub fn mint_api_key() -> String {
    use rand::RngCore;
    let mut raw = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut raw);
    format!("apk_{}", hex::encode(raw))
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
