// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface of `apd`.

mod agents;
mod collections;
mod connectors;
mod jobs;
mod results;
mod uploads;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::app::AppState;

/// The full agent-facing router.
pub fn router(app: AppState) -> Router {
    Router::new()
        .route("/agents/register", post(agents::register))
        .route("/agents/heartbeat", post(agents::heartbeat))
        .route("/agents/config", get(agents::team_config))
        .route("/agents/version", get(agents::version))
        .route("/jobs/claim", post(jobs::claim))
        .route("/jobs/:guid/progress", post(jobs::progress))
        .route("/jobs/:guid/complete", post(jobs::complete))
        .route("/jobs/:guid/fail", post(jobs::fail))
        .route("/jobs/:guid/cancelled", post(jobs::cancelled))
        .route("/jobs/:guid/uploads/initiate", post(uploads::initiate))
        .route("/uploads/:id/finalize", post(uploads::finalize))
        .route("/uploads/:id/:index", put(uploads::put_chunk))
        .route("/uploads/:id", delete(uploads::cancel))
        .route("/collections/:guid", get(collections::get_collection))
        .route(
            "/connectors/:guid",
            get(connectors::get_connector).delete(connectors::delete_connector),
        )
        .route("/connectors/:guid/report-capability", post(connectors::report_capability))
        .route("/results", get(results::list))
        .route("/results/:guid", get(results::get_result))
        .route("/results/:guid/download", get(results::download))
        .with_state(app)
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
