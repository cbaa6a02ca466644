// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ap run` — the long-lived worker: polling loop plus heartbeat task.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ap_adapters::CredentialStore;
use ap_agent::{AdapterFactory, HeartbeatTask, JobExecutor, PollingLoop};

use crate::color;
use crate::exit_error::ExitError;

pub async fn run(home: &Path) -> Result<(), ExitError> {
    let (config, client) = super::client_for(home)?;
    let api = Arc::new(client);
    let vault = Arc::new(CredentialStore::new(home));
    let capabilities = super::advertised_capabilities(&config, &vault);

    let factory = AdapterFactory::new(config.authorized_roots.clone(), vault);
    let executor = JobExecutor::new(api.clone(), factory);
    let polling = PollingLoop::new(
        api.clone(),
        executor,
        capabilities.clone(),
        Duration::from_secs(config.poll_interval_secs),
    );
    let handle = polling.handle();

    // Heartbeats and command dispatch run independently of any job.
    let heartbeat = HeartbeatTask::new(
        api,
        handle.clone(),
        Duration::from_secs(config.heartbeat_interval_secs),
        capabilities,
        config.authorized_roots.clone(),
    );
    let heartbeat_task = tokio::spawn(heartbeat.run());

    let signal_handle = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            signal_handle.request_shutdown();
        }
    });

    println!("{} polling {} as {}", color::ok("ok"), config.server_url, config.name);
    let status = polling.run().await;
    handle.request_shutdown();
    let _ = heartbeat_task.await;

    match status.code() {
        0 => {
            println!("{} {status}", color::ok("ok"));
            Ok(())
        }
        code => Err(ExitError::new(code, status.to_string())),
    }
}
