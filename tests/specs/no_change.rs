// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Running the same tool twice over an unchanged collection stores the
//! payload once.

use ap_agent::{CancelFlag, ServerApi};
use ap_core::{JobBuilder, Target, TargetKind, ToolKind};
use ap_wire::ClaimRequest;

use super::support;

#[tokio::test]
async fn second_run_becomes_a_no_change_copy() {
    let server = support::start_server().await;
    let agent = server.register_agent("spec-agent", &server.registration_token).await;
    let collection = support::collection_dir();
    let home = tempfile::tempdir().expect("home");
    let (collection_guid, first_job) = server.seed_local_job(collection.path());

    let executor = support::executor_for(agent.api.clone(), home.path(), collection.path());

    // First run.
    let claim = agent
        .api
        .claim_job(&ClaimRequest { capabilities: support::spec_capabilities() })
        .await
        .expect("claim")
        .expect("job");
    executor.execute(claim, &CancelFlag::default()).await;
    let first_result = server
        .app
        .read(|state| {
            state.results.values().find(|r| r.job_guid == first_job).map(|r| r.guid)
        })
        .expect("first result");

    // Second job on the same target; nothing on disk changed.
    let team = server.team;
    let second_job = server.app.mutate(|state| {
        let job = JobBuilder::default()
            .team(team)
            .tool(ToolKind::Photostats)
            .target(Target::new(TargetKind::Collection, collection_guid, "spec-collection"))
            .build();
        let guid = job.guid;
        state.jobs.insert(guid, job);
        guid
    });

    let claim = agent
        .api
        .claim_job(&ClaimRequest { capabilities: support::spec_capabilities() })
        .await
        .expect("claim")
        .expect("second job");
    assert_eq!(claim.job.guid, second_job);
    executor.execute(claim, &CancelFlag::default()).await;

    let copy = server
        .app
        .read(|state| state.results.values().find(|r| r.job_guid == second_job).cloned())
        .expect("second result");
    assert!(copy.no_change_copy);
    assert_eq!(copy.download_report_from, Some(first_result));
    assert!(copy.results_json.is_none(), "blob is not duplicated");
    assert!(copy.no_change_invariant_holds());

    // Fingerprints match across the two runs.
    let originals_hash = server
        .app
        .read(|state| state.results[&first_result].input_state_hash.clone());
    assert_eq!(copy.input_state_hash, originals_hash);

    // Download through the copy serves the full original payload.
    let (status, body) = support::get_json(
        &server.base_url,
        &agent.api_key,
        &format!("/results/{}/download", copy.guid),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body["total_files"], 3);
}

#[tokio::test]
async fn a_changed_file_breaks_the_match() {
    let server = support::start_server().await;
    let agent = server.register_agent("spec-agent", &server.registration_token).await;
    let collection = support::collection_dir();
    let home = tempfile::tempdir().expect("home");
    let (collection_guid, first_job) = server.seed_local_job(collection.path());

    let executor = support::executor_for(agent.api.clone(), home.path(), collection.path());
    let claim = agent
        .api
        .claim_job(&ClaimRequest { capabilities: support::spec_capabilities() })
        .await
        .expect("claim")
        .expect("job");
    executor.execute(claim, &CancelFlag::default()).await;
    let _ = first_job;

    // Touch the collection: add a file.
    std::fs::write(collection.path().join("2025/img_0003.dng"), vec![1u8; 128]).expect("write");

    let team = server.team;
    let second_job = server.app.mutate(|state| {
        let job = JobBuilder::default()
            .team(team)
            .tool(ToolKind::Photostats)
            .target(Target::new(TargetKind::Collection, collection_guid, "spec-collection"))
            .build();
        let guid = job.guid;
        state.jobs.insert(guid, job);
        guid
    });
    let claim = agent
        .api
        .claim_job(&ClaimRequest { capabilities: support::spec_capabilities() })
        .await
        .expect("claim")
        .expect("job");
    executor.execute(claim, &CancelFlag::default()).await;

    let second = server
        .app
        .read(|state| state.results.values().find(|r| r.job_guid == second_job).cloned())
        .expect("second result");
    assert!(!second.no_change_copy);
    assert!(second.results_json.is_some());
}
