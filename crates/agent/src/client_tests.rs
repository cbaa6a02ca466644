// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn revoked_detail_maps_to_revoked() {
    let err = classify_status(StatusCode::UNAUTHORIZED, "agent revoked".to_string());
    assert_eq!(err, ClientError::Revoked);
}

#[test]
fn other_401_is_auth_rejected() {
    let err = classify_status(StatusCode::UNAUTHORIZED, "invalid API key".to_string());
    assert_eq!(err, ClientError::AuthRejected("invalid API key".to_string()));
}

#[parameterized(
    forbidden = { StatusCode::FORBIDDEN },
    not_found = { StatusCode::NOT_FOUND },
    unprocessable = { StatusCode::UNPROCESSABLE_ENTITY },
)]
fn client_errors_are_not_recoverable(status: StatusCode) {
    assert!(!classify_status(status, String::new()).is_recoverable());
}

#[parameterized(
    bad_gateway = { StatusCode::BAD_GATEWAY },
    unavailable = { StatusCode::SERVICE_UNAVAILABLE },
    internal = { StatusCode::INTERNAL_SERVER_ERROR },
)]
fn server_errors_are_recoverable(status: StatusCode) {
    assert!(classify_status(status, String::new()).is_recoverable());
}

#[test]
fn base_url_trailing_slash_is_normalized() {
    let client = HttpClient::new("http://localhost:8700/", "key");
    assert_eq!(client.url("/jobs/claim"), "http://localhost:8700/jobs/claim");
}
