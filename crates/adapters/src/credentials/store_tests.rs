// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::credentials::SmbCredentials;
use ap_core::{EntityKind, Guid};

fn smb_creds() -> ConnectorCredentials {
    ConnectorCredentials::Smb(SmbCredentials {
        server: "nas.local".into(),
        username: "scan".into(),
        password: "hunter2".into(),
        domain: None,
    })
}

fn vault() -> (tempfile::TempDir, CredentialStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = CredentialStore::new(dir.path().join("agent-home"));
    (dir, store)
}

#[test]
fn store_then_get_round_trips() {
    let (_dir, store) = vault();
    let guid = Guid::random(EntityKind::Connector);

    store.store(&guid, &smb_creds(), None).unwrap();
    assert_eq!(store.get(&guid).unwrap(), Some(smb_creds()));
}

#[test]
fn master_key_is_created_lazily_on_first_store() {
    let (_dir, store) = vault();
    assert!(!store.has_master_key());

    store.store(&Guid::random(EntityKind::Connector), &smb_creds(), None).unwrap();
    assert!(store.has_master_key());
    assert_eq!(std::fs::read(store.master_key_path()).unwrap().len(), 32);
}

#[cfg(unix)]
#[test]
fn key_and_blobs_are_owner_only() {
    use std::os::unix::fs::PermissionsExt;
    let (_dir, store) = vault();
    let guid = Guid::random(EntityKind::Connector);
    store.store(&guid, &smb_creds(), None).unwrap();

    let key_mode =
        std::fs::metadata(store.master_key_path()).unwrap().permissions().mode() & 0o777;
    assert_eq!(key_mode, 0o600);
}

#[test]
fn blob_on_disk_is_not_plaintext() {
    let (_dir, store) = vault();
    let guid = Guid::random(EntityKind::Connector);
    store.store(&guid, &smb_creds(), None).unwrap();

    let blob_dir = store.master_key_path().parent().unwrap().join("credentials");
    let blob = std::fs::read(blob_dir.join(format!("{guid}.blob"))).unwrap();
    let raw = String::from_utf8_lossy(&blob);
    assert!(!raw.contains("hunter2"));
    assert!(!raw.contains("nas.local"));
}

#[test]
fn metadata_round_trips_separately() {
    let (_dir, store) = vault();
    let guid = Guid::random(EntityKind::Connector);
    let metadata = serde_json::json!({"configured_by": "ap connectors configure"});

    store.store(&guid, &smb_creds(), Some(metadata.clone())).unwrap();
    assert_eq!(store.get_metadata(&guid).unwrap(), Some(metadata));
}

#[test]
fn absent_connector_reads_as_none() {
    let (_dir, store) = vault();
    let guid = Guid::random(EntityKind::Connector);
    assert_eq!(store.get(&guid).unwrap(), None);
    assert_eq!(store.get_metadata(&guid).unwrap(), None);
}

#[test]
fn corrupt_blob_reads_as_none() {
    let (_dir, store) = vault();
    let guid = Guid::random(EntityKind::Connector);
    store.store(&guid, &smb_creds(), None).unwrap();

    let blob_path = store.master_key_path().parent().unwrap().join("credentials").join(
        format!("{guid}.blob"),
    );
    std::fs::write(&blob_path, b"garbage").unwrap();
    assert_eq!(store.get(&guid).unwrap(), None);
}

#[test]
fn delete_is_idempotent() {
    let (_dir, store) = vault();
    let guid = Guid::random(EntityKind::Connector);
    store.store(&guid, &smb_creds(), None).unwrap();

    store.delete(&guid).unwrap();
    store.delete(&guid).unwrap();
    assert_eq!(store.get(&guid).unwrap(), None);
}

#[test]
fn list_returns_sorted_connector_guids() {
    let (_dir, store) = vault();
    let a = Guid::random(EntityKind::Connector);
    let b = Guid::random(EntityKind::Connector);
    store.store(&a, &smb_creds(), None).unwrap();
    store.store(&b, &smb_creds(), None).unwrap();

    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(store.list().unwrap(), expected);
}

#[test]
fn non_connector_guids_are_rejected() {
    let (_dir, store) = vault();
    let job = Guid::random(EntityKind::Job);
    assert!(matches!(
        store.store(&job, &smb_creds(), None),
        Err(VaultError::NotAConnector(_))
    ));
    assert!(matches!(store.get(&job), Err(VaultError::NotAConnector(_))));
}
