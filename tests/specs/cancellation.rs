// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative cancellation: the command travels via heartbeat, the
//! executor observes the flag, and the job ends `cancelled` with no
//! result row.

use ap_agent::{CancelFlag, ServerApi};
use ap_core::{AgentMetrics, JobStatus};
use ap_wire::{ClaimRequest, HeartbeatRequest};

use super::support;

#[tokio::test]
async fn cancel_command_arrives_via_heartbeat_and_job_ends_cancelled() {
    let server = support::start_server().await;
    let agent = server.register_agent("spec-agent", &server.registration_token).await;
    let collection = support::collection_dir();
    let home = tempfile::tempdir().expect("home");
    let (_, job_guid) = server.seed_local_job(collection.path());

    let claim = agent
        .api
        .claim_job(&ClaimRequest { capabilities: support::spec_capabilities() })
        .await
        .expect("claim")
        .expect("job");

    // Server broadcasts the cancellation to the claiming agent.
    let outcome = server
        .app
        .mutate(|state| ap_server::dispatcher::cancel_job(state, &job_guid, 1))
        .expect("job exists");
    assert_eq!(outcome, ap_server::dispatcher::CancelOutcome::SignalSent);

    // The next heartbeat carries the command.
    let response = agent
        .api
        .heartbeat(&HeartbeatRequest {
            capabilities: support::spec_capabilities(),
            authorized_roots: vec![collection.path().to_path_buf()],
            metrics: AgentMetrics::default(),
        })
        .await
        .expect("heartbeat");
    assert_eq!(response.pending_commands, vec![format!("cancel_job:{job_guid}")]);

    // The executor observes the flag at its first check point.
    let cancel = CancelFlag::default();
    cancel.set();
    let executor = support::executor_for(agent.api.clone(), home.path(), collection.path());
    executor.execute(claim, &cancel).await;

    assert_eq!(
        server.app.read(|state| state.jobs[&job_guid].status),
        JobStatus::Cancelled
    );
    let results = server.app.read(|state| state.results.len());
    assert_eq!(results, 0, "cancellation writes no result");
}

#[tokio::test]
async fn queued_jobs_cancel_without_an_agent() {
    let server = support::start_server().await;
    let collection = support::collection_dir();
    let (_, job_guid) = server.seed_local_job(collection.path());

    let outcome = server
        .app
        .mutate(|state| ap_server::dispatcher::cancel_job(state, &job_guid, 1))
        .expect("job exists");
    assert_eq!(outcome, ap_server::dispatcher::CancelOutcome::Cancelled);
    assert_eq!(
        server.app.read(|state| state.jobs[&job_guid].status),
        JobStatus::Cancelled
    );
}
