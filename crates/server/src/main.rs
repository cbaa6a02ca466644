// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `apd` — the Aperture control server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ap_core::{Clock, EntityKind, Guid, RetentionPolicy, TeamConfig};
use ap_server::storage::{snapshot, RegistrationToken, ServerState, TeamRecord};
use ap_server::{routes, AppState, ServerConfig};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "apd", about = "Aperture control server", version)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8700")]
    bind: SocketAddr,

    /// State, chunk, and blob directory.
    #[arg(long, default_value = "./apd-data")]
    data_dir: PathBuf,

    /// Seconds without a heartbeat before an agent is marked offline.
    #[arg(long, default_value_t = 90)]
    heartbeat_timeout_secs: u64,

    /// Upload session TTL in hours.
    #[arg(long, default_value_t = 24)]
    upload_ttl_hours: u64,

    /// Latest agent release version served to `ap update`.
    #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
    agent_version: String,

    /// Registration token to seed on first start (printed when omitted).
    #[arg(long)]
    registration_token: Option<String>,
}

fn init_tracing(data_dir: &std::path::Path) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(data_dir.join("logs"), "apd.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();
    guard
}

/// First start: one default team plus a registration token.
fn bootstrap(state: &mut ServerState, token: Option<String>, now_ms: u64) {
    let team_guid = Guid::random(EntityKind::Team);
    state.teams.insert(
        team_guid,
        TeamRecord {
            guid: team_guid,
            name: "default".to_string(),
            config: TeamConfig::default(),
            retention: RetentionPolicy::default(),
        },
    );

    let token = token.unwrap_or_else(|| {
        use rand::RngCore;
        let mut raw = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut raw);
        format!("reg_{}", hex::encode(raw))
    });
    // One week to enroll the first agents.
    state.registration_tokens.insert(
        token.clone(),
        RegistrationToken {
            team_guid,
            expires_at_ms: now_ms + 7 * 24 * 3600 * 1000,
            used: false,
        },
    );
    tracing::info!("bootstrapped team {team_guid}; registration token: {token}");
}

async fn sweeps(app: AppState, shutdown: CancellationToken) {
    let interval = app.config().sweep_interval;
    let heartbeat_timeout = app.config().heartbeat_timeout.as_millis() as u64;
    let mut retention_due = std::time::Instant::now();

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.cancelled() => return,
        }
        let now = app.now_ms();

        let liveness = app.mutate(|state| ap_server::liveness::sweep(state, now, heartbeat_timeout));
        if !liveness.offlined.is_empty() {
            tracing::info!(
                "liveness sweep: {} offline, {} requeued, {} failed",
                liveness.offlined.len(),
                liveness.requeued.len(),
                liveness.failed.len()
            );
        }

        let expired = app.mutate(|state| ap_server::uploads::expire_sweep(state, now));
        for session in &expired {
            ap_server::uploads::delete_session_files(
                &app.upload_dir(&session.upload_id),
                &app.blob_dir(),
                session,
            )
            .await;
            tracing::info!("expired upload session {}", session.upload_id);
        }

        // Retention runs hourly; it walks every result.
        if retention_due.elapsed() >= Duration::from_secs(3600) {
            retention_due = std::time::Instant::now();
            let outcome = app.mutate(|state| ap_server::retention::sweep(state, now));
            let blob_dir = app.blob_dir();
            for (old, new) in &outcome.rename_blobs {
                let _ = tokio::fs::rename(blob_dir.join(old), blob_dir.join(new)).await;
            }
            for blob in &outcome.delete_blobs {
                let _ = tokio::fs::remove_file(blob_dir.join(blob)).await;
            }
            if !outcome.jobs_deleted.is_empty() || !outcome.results_deleted.is_empty() {
                tracing::info!(
                    "retention sweep: {} job(s), {} result(s) deleted, {} promoted",
                    outcome.jobs_deleted.len(),
                    outcome.results_deleted.len(),
                    outcome.promoted.len()
                );
            }
        }

        if app.take_dirty() {
            let path = app.snapshot_path();
            let state = app.read(Clone::clone);
            if let Err(err) = snapshot::save(&state, &path) {
                tracing::error!("snapshot save failed: {err}");
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    std::fs::create_dir_all(&args.data_dir)?;
    let _log_guard = init_tracing(&args.data_dir);

    let config = ServerConfig {
        heartbeat_timeout: Duration::from_secs(args.heartbeat_timeout_secs),
        upload_session_ttl: Duration::from_secs(args.upload_ttl_hours * 3600),
        sweep_interval: Duration::from_secs(15),
        agent_version: args.agent_version.clone(),
    };

    let snapshot_path = args.data_dir.join("state.json");
    let mut state = snapshot::load(&snapshot_path)?.unwrap_or_default();
    if state.teams.is_empty() {
        let now = ap_core::SystemClock.epoch_ms();
        bootstrap(&mut state, args.registration_token.clone(), now);
        snapshot::save(&state, &snapshot_path)?;
    }

    let app = AppState::new(state, &args.data_dir, config);
    let shutdown = CancellationToken::new();
    let sweeper = tokio::spawn(sweeps(app.clone(), shutdown.clone()));

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!("apd listening on {}", args.bind);

    let serve_shutdown = shutdown.clone();
    axum::serve(listener, routes::router(app.clone()))
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = serve_shutdown.cancelled() => {}
            }
        })
        .await?;

    shutdown.cancel();
    let _ = sweeper.await;

    // Final snapshot so a clean stop loses nothing.
    let state = app.read(Clone::clone);
    snapshot::save(&state, &app.snapshot_path())?;
    tracing::info!("apd stopped");
    Ok(())
}
