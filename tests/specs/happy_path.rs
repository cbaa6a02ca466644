// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Claim → execute → signed complete, end to end.

use ap_agent::{CancelFlag, ServerApi};
use ap_core::JobStatus;
use ap_wire::ClaimRequest;

use super::support;

#[tokio::test]
async fn claim_execute_complete_round_trips() {
    let server = support::start_server().await;
    let agent = server.register_agent("spec-agent", &server.registration_token).await;
    let collection = support::collection_dir();
    let home = tempfile::tempdir().expect("home");
    let (_collection_guid, job_guid) = server.seed_local_job(collection.path());

    // Claim over HTTP.
    let claim = agent
        .api
        .claim_job(&ClaimRequest { capabilities: support::spec_capabilities() })
        .await
        .expect("claim call")
        .expect("a job should be eligible");
    assert_eq!(claim.job.guid, job_guid);
    assert_eq!(claim.signing_secret.len(), 64);
    assert_eq!(
        server.app.read(|state| state.jobs[&job_guid].status),
        JobStatus::Claimed
    );

    // Execute for real against the local collection.
    let executor = support::executor_for(agent.api.clone(), home.path(), collection.path());
    executor.execute(claim, &CancelFlag::default()).await;

    // Job completed, result persisted, signature accepted.
    assert_eq!(
        server.app.read(|state| state.jobs[&job_guid].status),
        JobStatus::Completed
    );
    let result_guid = server
        .app
        .read(|state| state.results.values().find(|r| r.job_guid == job_guid).map(|r| r.guid))
        .expect("result row");

    let (status, detail) =
        support::get_json(&server.base_url, &agent.api_key, &format!("/results/{result_guid}"))
            .await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(detail["results"]["total_files"], 3);
    assert_eq!(detail["files_scanned"], 3);
    assert_eq!(detail["no_change_copy"], false);

    // Nothing else to claim.
    let empty = agent
        .api
        .claim_job(&ClaimRequest { capabilities: support::spec_capabilities() })
        .await
        .expect("claim call");
    assert!(empty.is_none());
}

#[tokio::test]
async fn failures_are_signed_and_recorded() {
    let server = support::start_server().await;
    let agent = server.register_agent("spec-agent", &server.registration_token).await;
    let collection = support::collection_dir();
    let home = tempfile::tempdir().expect("home");
    let (_, job_guid) = server.seed_local_job(collection.path());

    let claim = agent
        .api
        .claim_job(&ClaimRequest { capabilities: support::spec_capabilities() })
        .await
        .expect("claim call")
        .expect("job");

    // Point the executor at a root that does not contain the collection.
    let other_root = tempfile::tempdir().expect("root");
    let executor = support::executor_for(agent.api.clone(), home.path(), other_root.path());
    executor.execute(claim, &CancelFlag::default()).await;

    let (status, error) = server.app.read(|state| {
        let job = &state.jobs[&job_guid];
        (job.status, job.error_message.clone())
    });
    assert_eq!(status, JobStatus::Failed);
    assert!(error.expect("error message").contains("authorized root"));

    // A failed result row exists for the audit trail.
    let failed = server.app.read(|state| {
        state.results.values().any(|r| {
            r.job_guid == job_guid && r.status == ap_core::ResultStatus::Failed
        })
    });
    assert!(failed);
}
