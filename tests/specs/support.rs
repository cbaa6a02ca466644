// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Harness: an in-process `apd` plus seeded tenant records.

use std::path::Path;
use std::sync::Arc;

use ap_core::{
    Capability, EntityKind, Guid, JobBuilder, RetentionPolicy, Target, TargetKind, TeamConfig,
    ToolKind,
};
use ap_server::routes::router;
use ap_server::storage::{RegistrationToken, ServerState, TeamRecord};
use ap_server::{AppState, ServerConfig};

pub struct TestServer {
    pub base_url: String,
    pub app: AppState,
    pub team: Guid,
    pub registration_token: String,
    _data: tempfile::TempDir,
}

/// Boot a server with one team and one fresh registration token.
pub async fn start_server() -> TestServer {
    let mut state = ServerState::default();
    let team = Guid::random(EntityKind::Team);
    state.teams.insert(
        team,
        TeamRecord {
            guid: team,
            name: "spec-team".to_string(),
            config: team_config(),
            retention: RetentionPolicy::default(),
        },
    );
    let registration_token = "reg_spec_token".to_string();
    state.registration_tokens.insert(
        registration_token.clone(),
        RegistrationToken { team_guid: team, expires_at_ms: u64::MAX, used: false },
    );

    let data = tempfile::tempdir().expect("tempdir");
    let app = AppState::new(state, data.path(), ServerConfig::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let serve_app = app.clone();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router(serve_app)).await;
    });

    TestServer {
        base_url: format!("http://{addr}"),
        app,
        team,
        registration_token,
        _data: data,
    }
}

pub fn team_config() -> TeamConfig {
    TeamConfig {
        photo_extensions: vec![".dng".into(), ".nef".into()],
        metadata_extensions: vec![".xmp".into()],
        require_sidecar: vec![".dng".into()],
        ..TeamConfig::default()
    }
}

/// A registered spec agent: authenticated client plus identity.
pub struct SpecAgent {
    pub api: Arc<ap_agent::HttpClient>,
    pub guid: Guid,
    pub api_key: String,
}

impl TestServer {
    /// Register an agent over HTTP and return a ready client + identity.
    pub async fn register_agent(&self, name: &str, token: &str) -> SpecAgent {
        use ap_agent::ServerApi;

        let client = ap_agent::HttpClient::new(self.base_url.clone(), "");
        let response = client
            .register(&ap_wire::RegisterRequest {
                name: name.to_string(),
                token: token.to_string(),
                platform: "linux-x86_64".to_string(),
                checksum: "0".repeat(64),
                capabilities: vec![Capability::tool("photostats", "1.0")],
            })
            .await
            .expect("register");
        SpecAgent {
            api: Arc::new(ap_agent::HttpClient::new(
                self.base_url.clone(),
                response.api_key.clone(),
            )),
            guid: response.guid,
            api_key: response.api_key,
        }
    }

    /// Mint an extra registration token (each one is single use).
    pub fn mint_token(&self, token: &str) {
        let team = self.team;
        self.app.mutate(|state| {
            state.registration_tokens.insert(
                token.to_string(),
                RegistrationToken { team_guid: team, expires_at_ms: u64::MAX, used: false },
            );
        });
    }

    /// Seed a live local collection and one queued photostats job on it.
    pub fn seed_local_job(&self, location: &Path) -> (Guid, Guid) {
        let collection = ap_core::test_support::local_collection(
            self.team,
            &location.to_string_lossy(),
        );
        let collection_guid = collection.guid;
        let job = JobBuilder::default()
            .team(self.team)
            .tool(ToolKind::Photostats)
            .target(Target::new(TargetKind::Collection, collection_guid, "spec-collection"))
            .build();
        let job_guid = job.guid;

        self.app.mutate(|state| {
            state.collections.insert(collection_guid, collection);
            state.jobs.insert(job_guid, job);
        });
        (collection_guid, job_guid)
    }
}

/// A local collection directory with a few photo files.
pub fn collection_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path().join("2025")).expect("mkdir");
    for (name, size) in [
        ("2025/img_0001.dng", 2048),
        ("2025/img_0001.xmp", 64),
        ("2025/img_0002.dng", 4096),
    ] {
        std::fs::write(dir.path().join(name), vec![7u8; size]).expect("write");
    }
    dir
}

/// Agent-side worker wired to a server and a local collection root.
pub fn executor_for(
    api: Arc<ap_agent::HttpClient>,
    home: &Path,
    root: &Path,
) -> ap_agent::JobExecutor<ap_agent::HttpClient> {
    let vault = Arc::new(ap_adapters::CredentialStore::new(home));
    let factory = ap_agent::AdapterFactory::new(vec![root.to_path_buf()], vault);
    ap_agent::JobExecutor::new(api, factory)
}

/// Capabilities a spec agent claims with.
pub fn spec_capabilities() -> Vec<Capability> {
    vec![Capability::tool("photostats", "1.0"), Capability::LocalFilesystem]
}

/// Small helper: authorized GET returning parsed JSON.
pub async fn get_json(
    base_url: &str,
    api_key: &str,
    path: &str,
) -> (reqwest::StatusCode, serde_json::Value) {
    let response = reqwest::Client::new()
        .get(format!("{base_url}{path}"))
        .bearer_auth(api_key)
        .send()
        .await
        .expect("request");
    let status = response.status();
    let body = response.text().await.expect("body");
    let json = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

