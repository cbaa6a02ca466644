// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn s3_from_fields_requires_the_core_triple() {
    let map = fields(&[("access_key_id", "AKIA..."), ("secret_access_key", "s3cr3t")]);
    let err =
        ConnectorCredentials::from_fields(ConnectorKind::S3, |k| map.get(k).cloned()).unwrap_err();
    assert_eq!(err, MissingField("region".to_string()));
}

#[test]
fn s3_endpoint_is_optional() {
    let map = fields(&[
        ("access_key_id", "AKIA..."),
        ("secret_access_key", "s3cr3t"),
        ("region", "eu-central-1"),
    ]);
    let creds =
        ConnectorCredentials::from_fields(ConnectorKind::S3, |k| map.get(k).cloned()).unwrap();
    assert_eq!(creds.kind(), ConnectorKind::S3);
    match creds {
        ConnectorCredentials::S3(c) => assert!(c.endpoint_url.is_none()),
        other => panic!("wrong variant: {other:?}"),
    }
}

#[test]
fn smb_domain_is_optional_and_empty_counts_as_absent() {
    let map = fields(&[
        ("server", "nas.local"),
        ("username", "scan"),
        ("password", "pw"),
        ("domain", ""),
    ]);
    let creds =
        ConnectorCredentials::from_fields(ConnectorKind::Smb, |k| map.get(k).cloned()).unwrap();
    match creds {
        ConnectorCredentials::Smb(c) => assert!(c.domain.is_none()),
        other => panic!("wrong variant: {other:?}"),
    }
}

#[test]
fn empty_required_field_is_missing() {
    let map = fields(&[("service_account_json", "")]);
    let err =
        ConnectorCredentials::from_fields(ConnectorKind::Gcs, |k| map.get(k).cloned()).unwrap_err();
    assert_eq!(err, MissingField("service_account_json".to_string()));
}

#[test]
fn serde_tags_by_backend_type() {
    let creds = ConnectorCredentials::Smb(SmbCredentials {
        server: "nas.local".into(),
        username: "scan".into(),
        password: "pw".into(),
        domain: None,
    });
    let json = serde_json::to_value(&creds).unwrap();
    assert_eq!(json["type"], "smb");
    let back: ConnectorCredentials = serde_json::from_value(json).unwrap();
    assert_eq!(back, creds);
}

#[test]
fn field_names_never_contain_values() {
    let creds = ConnectorCredentials::S3(S3Credentials {
        access_key_id: "AKIAEXAMPLE".into(),
        secret_access_key: "verysecret".into(),
        region: "us-east-1".into(),
        endpoint_url: Some("https://minio.local".into()),
    });
    let names = creds.field_names().join(",");
    assert!(names.contains("endpoint_url"));
    assert!(!names.contains("verysecret"));
}
