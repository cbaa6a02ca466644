// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collection reads. GUID validation runs before any lookup, so
//! numeric and wrong-prefix IDs fail with 400s, never 404s.

use ap_core::{Collection, EntityKind, Guid};
use axum::extract::{Path, State};
use axum::Json;

use crate::app::AppState;
use crate::auth::AuthedAgent;
use crate::error::HttpError;

pub async fn get_collection(
    State(app): State<AppState>,
    agent: AuthedAgent,
    Path(guid): Path<String>,
) -> Result<Json<Collection>, HttpError> {
    let guid = Guid::parse_expected(EntityKind::Collection, &guid)?;
    app.read(|state| {
        state
            .collections
            .get(&guid)
            .filter(|collection| collection.team_guid == agent.team_guid)
            .cloned()
            .map(Json)
            .ok_or_else(|| HttpError::NotFound("collection not found".to_string()))
    })
}
