// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::app::ServerConfig;
use crate::auth::mint_api_key;
use crate::storage::{RegistrationToken, ServerState, TeamRecord};
use ap_core::test_support::local_collection;
use ap_core::{
    AgentIdentity, AgentRuntime, Capability, EntityKind, Guid, JobBuilder, Target, TargetKind,
};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

struct Fixture {
    app: crate::app::AppState,
    router: axum::Router,
    api_key: String,
    team: Guid,
    collection: Guid,
    job: Guid,
    _data: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let mut state = ServerState::default();
    let team = Guid::random(EntityKind::Team);
    state.teams.insert(
        team,
        TeamRecord {
            guid: team,
            name: "studio".to_string(),
            config: ap_core::TeamConfig::default(),
            retention: ap_core::RetentionPolicy::default(),
        },
    );
    state.registration_tokens.insert(
        "tok_fresh".to_string(),
        RegistrationToken { team_guid: team, expires_at_ms: u64::MAX, used: false },
    );

    let agent_guid = Guid::random(EntityKind::Agent);
    let api_key = mint_api_key();
    state.agents.insert(
        agent_guid,
        AgentIdentity {
            guid: agent_guid,
            team_guid: team,
            name: "studio-nas".to_string(),
            api_key: api_key.clone(),
            platform: "linux-x86_64".to_string(),
            binary_checksum: "0".repeat(64),
            revoked_at_ms: None,
            created_at_ms: 1,
        },
    );
    state.api_keys.insert(api_key.clone(), agent_guid);
    state.runtimes.insert(agent_guid, AgentRuntime::new(agent_guid, 1));

    let collection = local_collection(team, "/photos/archive");
    let collection_guid = collection.guid;
    let job = JobBuilder::default()
        .team(team)
        .target(Target::new(TargetKind::Collection, collection_guid, "archive"))
        .build();
    let job_guid = job.guid;
    state.collections.insert(collection_guid, collection);
    state.jobs.insert(job_guid, job);

    let data = tempfile::tempdir().unwrap();
    let app = crate::app::AppState::new(state, data.path(), ServerConfig::default());
    Fixture {
        app: app.clone(),
        router: router(app),
        api_key,
        team,
        collection: collection_guid,
        job: job_guid,
        _data: data,
    }
}

fn get(fx: &Fixture, path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {}", fx.api_key))
        .body(Body::empty())
        .unwrap()
}

fn post_json(fx: &Fixture, path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {}", fx.api_key))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn numeric_ids_are_rejected_before_lookup() {
    let fx = fixture();
    let response = fx.router.clone().oneshot(get(&fx, "/collections/123")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("Numeric IDs are no longer supported"));
}

#[tokio::test]
async fn wrong_prefix_is_a_prefix_mismatch() {
    let fx = fixture();
    let con = Guid::random(EntityKind::Connector);
    let response =
        fx.router.clone().oneshot(get(&fx, &format!("/collections/{con}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("prefix mismatch"));
}

#[tokio::test]
async fn uppercase_guids_resolve_to_canonical_lowercase() {
    let fx = fixture();
    let upper = fx.collection.to_string().to_ascii_uppercase();
    let response =
        fx.router.clone().oneshot(get(&fx, &format!("/collections/{upper}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["guid"], fx.collection.to_string());
}

#[tokio::test]
async fn missing_bearer_is_401() {
    let fx = fixture();
    let request =
        Request::builder().uri("/results").body(Body::empty()).unwrap();
    let response = fx.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_works_once_per_token() {
    let fx = fixture();
    let response = fx
        .router
        .clone()
        .oneshot(post_json(
            &fx,
            "/agents/register",
            json!({
                "name": "laptop",
                "token": "tok_fresh",
                "platform": "macos-aarch64",
                "checksum": "1".repeat(64),
                "capabilities": ["local_filesystem"],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let registered = body_json(response).await;
    let team: Guid = serde_json::from_value(registered["team_guid"].clone()).unwrap();
    assert_eq!(team, fx.team);

    // Reuse of the single-use token fails.
    let reuse = fx
        .router
        .clone()
        .oneshot(post_json(
            &fx,
            "/agents/register",
            json!({
                "name": "other",
                "token": "tok_fresh",
                "platform": "macos-aarch64",
                "checksum": "1".repeat(64),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(reuse.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn claim_with_no_eligible_jobs_is_204() {
    let fx = fixture();
    // The seeded agent lacks the photostats capability in this request.
    let response = fx
        .router
        .clone()
        .oneshot(post_json(&fx, "/jobs/claim", json!({"capabilities": []})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn claim_then_signed_complete_round_trips() {
    let fx = fixture();
    let capabilities: Vec<String> =
        vec![Capability::tool("photostats", "1.0").to_string(), "local_filesystem".to_string()];

    let response = fx
        .router
        .clone()
        .oneshot(post_json(&fx, "/jobs/claim", json!({"capabilities": capabilities})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let claim = body_json(response).await;
    assert_eq!(claim["job"]["guid"], fx.job.to_string());
    assert_eq!(claim["job"]["context"]["location"], "/photos/archive");
    let secret = claim["signing_secret"].as_str().unwrap().to_string();

    let payload =
        json!({"results": {"total_files": 10}, "files_scanned": 10, "issues_found": 0});
    let signature = ap_core::sign(&secret, &payload).unwrap();
    let response = fx
        .router
        .clone()
        .oneshot(post_json(
            &fx,
            &format!("/jobs/{}/complete", fx.job),
            json!({
                "results": {"total_files": 10},
                "files_scanned": 10,
                "issues_found": 0,
                "duration_seconds": 1.25,
                "input_state_hash": "a".repeat(64),
                "signature": signature,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let completed = body_json(response).await;
    let result_guid = completed["result_guid"].as_str().unwrap().to_string();

    // Scenario: reading the result back yields the inline payload.
    let response =
        fx.router.clone().oneshot(get(&fx, &format!("/results/{result_guid}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    assert_eq!(detail["results"]["total_files"], 10);
}

#[tokio::test]
async fn tampered_signature_is_400() {
    let fx = fixture();
    let capabilities =
        vec![Capability::tool("photostats", "1.0").to_string(), "local_filesystem".to_string()];
    let response = fx
        .router
        .clone()
        .oneshot(post_json(&fx, "/jobs/claim", json!({"capabilities": capabilities})))
        .await
        .unwrap();
    let claim = body_json(response).await;
    let secret = claim["signing_secret"].as_str().unwrap().to_string();

    let payload = json!({"results": null, "files_scanned": 1, "issues_found": 0});
    let signature = ap_core::sign(&secret, &payload).unwrap();
    let response = fx
        .router
        .clone()
        .oneshot(post_json(
            &fx,
            &format!("/jobs/{}/complete", fx.job),
            json!({
                // files_scanned differs from the signed payload
                "files_scanned": 2,
                "issues_found": 0,
                "duration_seconds": 1.0,
                "signature": signature,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("bad signature"));
}

#[tokio::test]
async fn connector_delete_is_guarded_by_live_collections() {
    let fx = fixture();
    let connector = ap_core::test_support::s3_connector(fx.team, "minio");
    let connector_guid = connector.guid;
    fx.app.mutate(|state| {
        state.connectors.insert(connector_guid, connector.clone());
        if let Some(collection) = state.collections.get_mut(&fx.collection) {
            collection.connector_guid = Some(connector_guid);
        }
    });

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/connectors/{connector_guid}"))
        .header(header::AUTHORIZATION, format!("Bearer {}", fx.api_key))
        .body(Body::empty())
        .unwrap();
    let response = fx.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("1 live collection"));

    // Archive the collection; deletion now goes through.
    fx.app.mutate(|state| {
        if let Some(collection) = state.collections.get_mut(&fx.collection) {
            collection.state = ap_core::CollectionState::Archived;
        }
    });
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/connectors/{connector_guid}"))
        .header(header::AUTHORIZATION, format!("Bearer {}", fx.api_key))
        .body(Body::empty())
        .unwrap();
    let response = fx.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn capability_report_flips_credential_location() {
    let fx = fixture();
    let connector = ap_core::test_support::s3_connector(fx.team, "minio");
    let connector_guid = connector.guid;
    fx.app.mutate(|state| {
        state.connectors.insert(connector_guid, connector);
    });

    let response = fx
        .router
        .clone()
        .oneshot(post_json(
            &fx,
            &format!("/connectors/{connector_guid}/report-capability"),
            json!({"has_credentials": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["credential_location_updated"], true);

    // Second identical report changes nothing.
    let response = fx
        .router
        .clone()
        .oneshot(post_json(
            &fx,
            &format!("/connectors/{connector_guid}/report-capability"),
            json!({"has_credentials": true}),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["credential_location_updated"], false);
}

#[tokio::test]
async fn heartbeat_returns_pending_commands() {
    let fx = fixture();
    let response = fx
        .router
        .clone()
        .oneshot(post_json(
            &fx,
            "/agents/heartbeat",
            json!({"capabilities": ["local_filesystem"], "authorized_roots": ["/photos"], "metrics": {}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["pending_commands"], json!([]));
}
