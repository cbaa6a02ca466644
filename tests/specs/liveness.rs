// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent death: heartbeat timeout requeues the claim for another agent.

use ap_agent::{CancelFlag, ServerApi};
use ap_core::{AgentStatus, JobStatus};
use ap_wire::ClaimRequest;

use super::support;

const TIMEOUT_MS: u64 = 90_000;

#[tokio::test]
async fn crashed_agents_job_is_requeued_and_finished_elsewhere() {
    let server = support::start_server().await;
    let first = server.register_agent("doomed", &server.registration_token).await;
    server.mint_token("reg_second");
    let second = server.register_agent("survivor", "reg_second").await;

    let collection = support::collection_dir();
    let home = tempfile::tempdir().expect("home");
    let (_, job_guid) = server.seed_local_job(collection.path());

    // First agent claims, then "crashes" (no more heartbeats).
    let claim = first
        .api
        .claim_job(&ClaimRequest { capabilities: support::spec_capabilities() })
        .await
        .expect("claim")
        .expect("job");
    assert_eq!(claim.job.guid, job_guid);
    let first_secret = claim.signing_secret.clone();

    // The sweep fires after the heartbeat window.
    let now = server.app.read(|state| state.runtimes[&first.guid].last_heartbeat_ms);
    let outcome = server.app.mutate(|state| {
        ap_server::liveness::sweep(state, now + TIMEOUT_MS + 1, TIMEOUT_MS)
    });
    assert!(outcome.offlined.contains(&first.guid));
    assert_eq!(outcome.requeued, vec![job_guid]);

    let (status, retry_count) = server
        .app
        .read(|state| (state.jobs[&job_guid].status, state.jobs[&job_guid].retry_count));
    assert_eq!(status, JobStatus::Queued);
    assert_eq!(retry_count, 1);
    assert_eq!(
        server.app.read(|state| state.runtimes[&first.guid].status),
        AgentStatus::Offline
    );

    // Another eligible agent claims and completes it with a new secret.
    let claim = second
        .api
        .claim_job(&ClaimRequest { capabilities: support::spec_capabilities() })
        .await
        .expect("claim")
        .expect("requeued job");
    assert_eq!(claim.job.guid, job_guid);
    assert_ne!(claim.signing_secret, first_secret);

    let executor = support::executor_for(second.api.clone(), home.path(), collection.path());
    executor.execute(claim, &CancelFlag::default()).await;

    assert_eq!(
        server.app.read(|state| state.jobs[&job_guid].status),
        JobStatus::Completed
    );
}
