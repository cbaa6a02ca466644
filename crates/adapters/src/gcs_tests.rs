// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::credentials::GcsCredentials;
use yare::parameterized;

#[parameterized(
    bucket_only = { "press-archive", "press-archive", "" },
    with_prefix = { "press-archive/2025", "press-archive", "2025" },
    scheme = { "gs://press-archive/2025/raw", "press-archive", "2025/raw" },
)]
fn parse_location_splits_bucket_and_prefix(input: &str, bucket: &str, prefix: &str) {
    let (b, p) = parse_location(input).unwrap();
    assert_eq!(b, bucket);
    assert_eq!(p, prefix);
}

#[test]
fn parse_location_rejects_empty() {
    assert!(matches!(parse_location("gs://"), Err(AdapterError::InvalidLocation(_))));
}

#[test]
fn connect_rejects_malformed_service_account_json() {
    let creds = GcsCredentials { service_account_json: "not-json".to_string() };
    assert!(matches!(
        GcsAdapter::connect(&creds),
        Err(AdapterError::InvalidLocation(_))
    ));
}

#[tokio::test]
async fn test_connection_reports_the_account_email() {
    let creds = GcsCredentials {
        service_account_json:
            r#"{"type":"service_account","client_email":"scanner@example.iam.gserviceaccount.com","private_key":"k"}"#
                .to_string(),
    };
    let adapter = GcsAdapter::connect(&creds).unwrap();
    let (ok, message) = adapter.test_connection().await;
    assert!(ok);
    assert!(message.contains("scanner@example.iam.gserviceaccount.com"));
}

#[test]
fn not_found_classification_is_terminal() {
    let err = classify(object_store::Error::NotFound {
        path: "press-archive/x".to_string(),
        source: "missing".into(),
    });
    assert!(matches!(err, AdapterError::NotFound(_)));
    assert!(!err.is_transient());
}
