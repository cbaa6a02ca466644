// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    bucket_only = { "media-archive", "media-archive", "" },
    with_prefix = { "media-archive/2025/weddings", "media-archive", "2025/weddings" },
    scheme = { "s3://media-archive/raw", "media-archive", "raw" },
    trailing_slash = { "media-archive/raw/", "media-archive", "raw" },
)]
fn parse_location_splits_bucket_and_prefix(input: &str, bucket: &str, prefix: &str) {
    let (b, p) = parse_location(input).unwrap();
    assert_eq!(b, bucket);
    assert_eq!(p, prefix);
}

#[parameterized(
    empty = { "" },
    scheme_only = { "s3://" },
    slashes = { "///" },
)]
fn parse_location_rejects_empty_buckets(input: &str) {
    assert!(matches!(parse_location(input), Err(AdapterError::InvalidLocation(_))));
}

#[parameterized(
    access_denied = { Some("AccessDenied") },
    bad_key_id = { Some("InvalidAccessKeyId") },
    bad_signature = { Some("SignatureDoesNotMatch") },
)]
fn auth_codes_are_terminal(code: Option<&str>) {
    let err = classify_code(code, "boom".into());
    assert!(matches!(err, AdapterError::PermissionDenied(_)));
    assert!(!err.is_transient());
}

#[test]
fn missing_bucket_is_not_found() {
    assert!(matches!(
        classify_code(Some("NoSuchBucket"), "gone".into()),
        AdapterError::NotFound(_)
    ));
}

#[parameterized(
    throttled = { Some("SlowDown") },
    internal = { Some("InternalError") },
    no_code = { None },
)]
fn other_codes_are_transient(code: Option<&str>) {
    assert!(classify_code(code, "retry me".into()).is_transient());
}

#[test]
fn relative_key_strips_the_listed_prefix() {
    assert_eq!(relative_key("2025/raw/img.dng", "2025/raw"), "img.dng");
    assert_eq!(relative_key("2025/raw/sub/img.dng", "2025/raw"), "sub/img.dng");
    assert_eq!(relative_key("other/img.dng", "2025/raw"), "other/img.dng");
    assert_eq!(relative_key("img.dng", ""), "img.dng");
}
