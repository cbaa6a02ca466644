// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_api::FakeApi;
use ap_core::{EntityKind, Target, TargetKind, ToolKind};
use serde_json::json;

struct Fixture {
    api: Arc<FakeApi>,
    executor: JobExecutor<FakeApi>,
    _home: tempfile::TempDir,
    collection: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let home = tempfile::tempdir().unwrap();
    let collection = tempfile::tempdir().unwrap();
    std::fs::write(collection.path().join("img_0001.dng"), vec![0u8; 64]).unwrap();
    std::fs::write(collection.path().join("img_0001.xmp"), b"<xmp/>").unwrap();

    let api = Arc::new(FakeApi::new());
    let vault = Arc::new(CredentialStore::new(home.path()));
    let factory = AdapterFactory::new(vec![collection.path().to_path_buf()], vault);
    let executor = JobExecutor::new(api.clone(), factory);
    Fixture { api, executor, _home: home, collection }
}

fn local_claim(fixture: &Fixture) -> ClaimResponse {
    ClaimResponse {
        job: JobLease {
            guid: Guid::random(EntityKind::Job),
            tool: ToolKind::Photostats,
            target: Target::new(
                TargetKind::Collection,
                Guid::random(EntityKind::Collection),
                "studio",
            ),
            context: json!({
                "collection_type": "local",
                "location": fixture.collection.path(),
            }),
        },
        signing_secret: ap_core::signing::generate_secret(),
    }
}

#[tokio::test(start_paused = true)]
async fn happy_path_completes_with_a_valid_signature() {
    let fx = fixture();
    let claim = local_claim(&fx);
    let secret = claim.signing_secret.clone();
    let job = claim.job.guid;
    let cancel = CancelFlag::default();

    fx.executor.execute(claim, &cancel).await;

    let completions = fx.api.completions.lock();
    assert_eq!(completions.len(), 1);
    let (completed_job, request) = &completions[0];
    assert_eq!(*completed_job, job);
    assert_eq!(request.files_scanned, 2);
    assert!(request.results.is_some());
    assert!(request.upload_id.is_none());
    assert_eq!(request.input_state_hash.as_ref().map(String::len), Some(64));
    assert!(ap_core::verify(&secret, &request.signed_payload(), &request.signature).unwrap());
    assert!(fx.api.failures.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn first_progress_stage_is_starting() {
    let fx = fixture();
    let claim = local_claim(&fx);
    fx.executor.execute(claim, &CancelFlag::default()).await;

    let stages = fx.api.stages();
    assert_eq!(stages.first().map(String::as_str), Some("starting"));
}

#[tokio::test(start_paused = true)]
async fn config_fetch_error_fails_the_job_signed() {
    let fx = fixture();
    *fx.api.config_error.lock() = Some(ClientError::Connection("down".into()));
    let claim = local_claim(&fx);
    let secret = claim.signing_secret.clone();

    fx.executor.execute(claim, &CancelFlag::default()).await;

    let failures = fx.api.failures.lock();
    assert_eq!(failures.len(), 1);
    let (_, request) = &failures[0];
    assert!(request.error_message.contains("config fetch"));
    assert!(ap_core::verify(&secret, &request.signed_payload(), &request.signature).unwrap());
    assert!(fx.api.completions.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn malformed_context_fails_the_job() {
    let fx = fixture();
    let mut claim = local_claim(&fx);
    claim.job.context = json!({"collection_type": "warp-drive"});

    fx.executor.execute(claim, &CancelFlag::default()).await;

    let failures = fx.api.failures.lock();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].1.error_message.contains("bad job context"));
}

#[tokio::test(start_paused = true)]
async fn missing_location_fails_with_adapter_error() {
    let fx = fixture();
    let mut claim = local_claim(&fx);
    claim.job.context = json!({
        "collection_type": "local",
        "location": fx.collection.path().join("nope"),
    });

    fx.executor.execute(claim, &CancelFlag::default()).await;

    let failures = fx.api.failures.lock();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].1.error_message.contains("not found"));
}

#[tokio::test(start_paused = true)]
async fn pre_set_cancel_flag_reports_cancelled_not_failed() {
    let fx = fixture();
    let claim = local_claim(&fx);
    let secret = claim.signing_secret.clone();
    let cancel = CancelFlag::default();
    cancel.set();

    fx.executor.execute(claim, &cancel).await;

    let cancelled = fx.api.cancelled_jobs.lock();
    assert_eq!(cancelled.len(), 1);
    let (_, request) = &cancelled[0];
    assert!(ap_core::verify(
        &secret,
        &ap_wire::CancelledRequest::signed_payload(),
        &request.signature
    )
    .unwrap());
    assert!(fx.api.completions.lock().is_empty());
    assert!(fx.api.failures.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn oversized_results_route_through_chunked_upload() {
    let fx = fixture();
    let executor = JobExecutor::new(
        fx.api.clone(),
        AdapterFactory::new(
            vec![fx.collection.path().to_path_buf()],
            Arc::new(CredentialStore::new(fx._home.path())),
        ),
    )
    .with_inline_threshold(0);
    let claim = local_claim(&fx);
    let secret = claim.signing_secret.clone();

    executor.execute(claim, &CancelFlag::default()).await;

    let completions = fx.api.completions.lock();
    assert_eq!(completions.len(), 1);
    let (_, request) = &completions[0];
    assert!(request.results.is_none());
    assert!(request.upload_id.is_some());
    // Signature still covers the (absent) inline results.
    assert!(ap_core::verify(&secret, &request.signed_payload(), &request.signature).unwrap());

    let uploads = fx.api.uploads.lock();
    assert_eq!(uploads.initiated.len(), 1);
    assert_eq!(uploads.finalized.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn remote_target_without_credentials_fails() {
    let fx = fixture();
    let mut claim = local_claim(&fx);
    claim.job.context = json!({
        "collection_type": "s3",
        "location": "bucket/prefix",
        "connector_guid": Guid::random(EntityKind::Connector),
    });

    fx.executor.execute(claim, &CancelFlag::default()).await;

    let failures = fx.api.failures.lock();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].1.error_message.contains("no stored credentials"));
}
