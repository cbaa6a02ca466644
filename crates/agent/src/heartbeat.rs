// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat task.
//!
//! Runs independently of the polling loop so a long adapter listing
//! never stalls liveness. Each beat reports capabilities, authorized
//! roots, and host metrics; the response carries pending commands,
//! which are parsed and routed here. Heartbeat failures are logged and
//! skipped — the claim path decides when auth problems are fatal.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ap_core::{AgentCommand, Capability};
use ap_wire::HeartbeatRequest;

use crate::client::ServerApi;
use crate::metrics;
use crate::poll::LoopHandle;

/// Periodic heartbeat with command dispatch.
pub struct HeartbeatTask<A: ServerApi + 'static> {
    api: Arc<A>,
    handle: LoopHandle,
    interval: Duration,
    capabilities: Vec<Capability>,
    authorized_roots: Vec<PathBuf>,
}

impl<A: ServerApi + 'static> HeartbeatTask<A> {
    pub fn new(
        api: Arc<A>,
        handle: LoopHandle,
        interval: Duration,
        capabilities: Vec<Capability>,
        authorized_roots: Vec<PathBuf>,
    ) -> Self {
        Self { api, handle, interval, capabilities, authorized_roots }
    }

    /// Beat until shutdown.
    pub async fn run(self) {
        let shutdown = self.handle.shutdown_token();
        loop {
            self.beat().await;
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.cancelled() => return,
            }
        }
    }

    /// One heartbeat round-trip plus command dispatch.
    pub async fn beat(&self) {
        let request = HeartbeatRequest {
            capabilities: self.capabilities.clone(),
            authorized_roots: self.authorized_roots.clone(),
            metrics: metrics::collect(),
        };
        match self.api.heartbeat(&request).await {
            Ok(response) => {
                for raw in &response.pending_commands {
                    self.dispatch(raw);
                }
            }
            Err(err) => tracing::warn!("heartbeat failed: {err}"),
        }
    }

    fn dispatch(&self, raw: &str) {
        match AgentCommand::parse(raw) {
            AgentCommand::CancelJob(job) => {
                if self.handle.request_job_cancellation(&job) {
                    tracing::info!("cancellation signaled for {job}");
                } else {
                    // Cancel for a job we are not running: drop silently.
                    tracing::debug!("cancel for {job} ignored (not running)");
                }
            }
            AgentCommand::Unknown(raw) => {
                tracing::warn!("unknown command ignored: {raw}");
            }
        }
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
