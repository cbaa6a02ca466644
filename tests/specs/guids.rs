// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GUID validation at the HTTP boundary.

use ap_core::{EntityKind, Guid};

use super::support;

#[tokio::test]
async fn numeric_ids_get_the_dedicated_error() {
    let server = support::start_server().await;
    let agent = server.register_agent("spec-agent", &server.registration_token).await;

    let (status, body) =
        support::get_json(&server.base_url, &agent.api_key, "/collections/123").await;
    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
    assert!(body["detail"]
        .as_str()
        .expect("detail")
        .contains("Numeric IDs are no longer supported"));
}

#[tokio::test]
async fn wrong_prefix_is_rejected_before_lookup() {
    let server = support::start_server().await;
    let agent = server.register_agent("spec-agent", &server.registration_token).await;
    let connector_shaped = Guid::random(EntityKind::Connector);

    let (status, body) = support::get_json(
        &server.base_url,
        &agent.api_key,
        &format!("/collections/{connector_shaped}"),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().expect("detail").contains("prefix mismatch"));
}

#[tokio::test]
async fn uppercase_input_yields_canonical_lowercase_output() {
    let server = support::start_server().await;
    let agent = server.register_agent("spec-agent", &server.registration_token).await;
    let collection = support::collection_dir();
    let (collection_guid, _) = server.seed_local_job(collection.path());

    let upper = collection_guid.to_string().to_ascii_uppercase();
    let (status, body) =
        support::get_json(&server.base_url, &agent.api_key, &format!("/collections/{upper}"))
            .await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body["guid"], collection_guid.to_string());
}

#[tokio::test]
async fn malformed_guids_in_job_routes_are_rejected() {
    let server = support::start_server().await;
    let agent = server.register_agent("spec-agent", &server.registration_token).await;

    let response = reqwest::Client::new()
        .post(format!("{}/jobs/not-a-guid/progress", server.base_url))
        .bearer_auth(&agent.api_key)
        .json(&serde_json::json!({"stage": "scanning"}))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}
