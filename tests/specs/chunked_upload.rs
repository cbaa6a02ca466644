// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chunked upload against the real session endpoints: 12 MiB in 5 MiB
//! chunks, finalize by checksum, download byte-for-byte.

use ap_agent::{CancelFlag, ChunkedUploader, ServerApi};
use ap_wire::{ClaimRequest, CompleteRequest, UploadType};
use sha2::{Digest, Sha256};

use super::support;

fn big_payload() -> Vec<u8> {
    // 12 MiB of non-repeating-ish bytes.
    (0..12 * 1024 * 1024usize).map(|i| (i * 31 % 251) as u8).collect()
}

#[tokio::test]
async fn twelve_mib_upload_round_trips() {
    let server = support::start_server().await;
    let agent = server.register_agent("spec-agent", &server.registration_token).await;
    let collection = support::collection_dir();
    let (_, job_guid) = server.seed_local_job(collection.path());

    let claim = agent
        .api
        .claim_job(&ClaimRequest { capabilities: support::spec_capabilities() })
        .await
        .expect("claim call")
        .expect("job");
    let secret = claim.signing_secret.clone();

    let payload = big_payload();
    let checksum = hex::encode(Sha256::digest(&payload));

    let uploader = ChunkedUploader::new(agent.api.clone());
    let cancel = CancelFlag::default();
    let outcome = uploader
        .upload(&job_guid, UploadType::ResultsJson, &payload, &cancel)
        .await
        .expect("upload");
    assert_eq!(outcome.checksum, checksum);
    assert_eq!(outcome.content_size, payload.len() as u64);

    // Session is finalized server-side with three 5 MiB chunks.
    let total_chunks = server
        .app
        .read(|state| state.uploads[&outcome.upload_id].total_chunks);
    assert_eq!(total_chunks, 3);

    // Complete the job referencing the upload.
    let mut request = CompleteRequest {
        results: None,
        files_scanned: 3,
        issues_found: 0,
        duration_seconds: 2.0,
        input_state_hash: Some("d".repeat(64)),
        signature: String::new(),
        upload_id: Some(outcome.upload_id.clone()),
        report_upload_id: None,
    };
    request.signature = ap_core::sign(&secret, &request.signed_payload()).expect("sign");
    let completed = agent.api.complete_job(&job_guid, &request).await.expect("complete");

    // Download returns the full 12 MiB with the same digest.
    let response = reqwest::Client::new()
        .get(format!(
            "{}/results/{}/download",
            server.base_url, completed.result_guid
        ))
        .bearer_auth(&agent.api_key)
        .send()
        .await
        .expect("download");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let bytes = response.bytes().await.expect("bytes");
    assert_eq!(bytes.len(), payload.len());
    assert_eq!(hex::encode(Sha256::digest(&bytes)), checksum);
}

#[tokio::test]
async fn duplicate_chunk_puts_are_idempotent() {
    let server = support::start_server().await;
    let agent = server.register_agent("spec-agent", &server.registration_token).await;
    let collection = support::collection_dir();
    let (_, job_guid) = server.seed_local_job(collection.path());
    let _claim = agent
        .api
        .claim_job(&ClaimRequest { capabilities: support::spec_capabilities() })
        .await
        .expect("claim call")
        .expect("job");

    let session = agent
        .api
        .initiate_upload(
            &job_guid,
            &ap_wire::InitiateUploadRequest {
                upload_type: UploadType::ResultsJson,
                expected_size: 128 * 1024,
                chunk_size: 64 * 1024,
            },
        )
        .await
        .expect("initiate");

    let chunk = vec![9u8; 64 * 1024];
    let first = agent.api.put_chunk(&session.upload_id, 0, chunk.clone()).await.expect("put");
    let second = agent.api.put_chunk(&session.upload_id, 0, chunk).await.expect("re-put");
    assert!(first, "first delivery is received");
    assert!(!second, "second delivery reports already-present");

    let received = server
        .app
        .read(|state| state.uploads[&session.upload_id].received.clone());
    assert_eq!(received, vec![true, false]);
}

#[tokio::test]
async fn wrong_checksum_leaves_the_session_open() {
    let server = support::start_server().await;
    let agent = server.register_agent("spec-agent", &server.registration_token).await;
    let collection = support::collection_dir();
    let (_, job_guid) = server.seed_local_job(collection.path());
    let _claim = agent
        .api
        .claim_job(&ClaimRequest { capabilities: support::spec_capabilities() })
        .await
        .expect("claim call")
        .expect("job");

    let session = agent
        .api
        .initiate_upload(
            &job_guid,
            &ap_wire::InitiateUploadRequest {
                upload_type: UploadType::ResultsJson,
                expected_size: 64 * 1024,
                chunk_size: 64 * 1024,
            },
        )
        .await
        .expect("initiate");
    agent
        .api
        .put_chunk(&session.upload_id, 0, vec![1u8; 64 * 1024])
        .await
        .expect("put");

    let err = agent
        .api
        .finalize_upload(&session.upload_id, &"0".repeat(64))
        .await
        .expect_err("finalize must fail");
    assert!(err.to_string().contains("checksum mismatch"));

    // Session survives for a retry with the right checksum.
    let still_open = server.app.read(|state| state.uploads.contains_key(&session.upload_id));
    assert!(still_open);
}
