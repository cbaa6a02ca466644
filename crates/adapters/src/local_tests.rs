// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;

fn fixture() -> (tempfile::TempDir, LocalAdapter) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("photos");
    fs::create_dir_all(root.join("2025/wedding")).unwrap();
    fs::write(root.join("2025/wedding/img_0001.dng"), b"raw-bytes").unwrap();
    fs::write(root.join("2025/wedding/img_0001.xmp"), b"<xmp/>").unwrap();
    fs::write(root.join("top.dng"), b"x").unwrap();
    let adapter = LocalAdapter::new(vec![root]);
    (dir, adapter)
}

#[tokio::test]
async fn lists_files_recursively_with_relative_slash_paths() {
    let (dir, adapter) = fixture();
    let location = dir.path().join("photos");

    let mut files = adapter.list_files(location.to_str().unwrap()).await.unwrap();
    files.sort();
    assert_eq!(
        files,
        vec!["2025/wedding/img_0001.dng", "2025/wedding/img_0001.xmp", "top.dng"]
    );
}

#[tokio::test]
async fn metadata_carries_size_and_mtime() {
    let (dir, adapter) = fixture();
    let location = dir.path().join("photos");

    let metas = adapter
        .list_files_with_metadata(location.to_str().unwrap())
        .await
        .unwrap();
    let raw = metas.iter().find(|m| m.path.ends_with("img_0001.dng")).unwrap();
    assert_eq!(raw.size, 9);
    assert!(raw.last_modified.is_some());
}

#[tokio::test]
async fn missing_path_is_not_found() {
    let (dir, adapter) = fixture();
    let location = dir.path().join("photos/nope");

    let err = adapter.list_files(location.to_str().unwrap()).await.unwrap_err();
    assert!(matches!(err, AdapterError::NotFound(_)));
}

#[tokio::test]
async fn file_location_is_invalid() {
    let (dir, adapter) = fixture();
    let location = dir.path().join("photos/top.dng");

    let err = adapter.list_files(location.to_str().unwrap()).await.unwrap_err();
    assert!(matches!(err, AdapterError::InvalidLocation(_)));
}

#[tokio::test]
async fn outside_authorized_roots_is_permission_denied() {
    let (dir, adapter) = fixture();
    let outside = dir.path().join("elsewhere");
    fs::create_dir_all(&outside).unwrap();

    let err = adapter.list_files(outside.to_str().unwrap()).await.unwrap_err();
    match err {
        AdapterError::PermissionDenied(detail) => {
            assert!(detail.contains("authorized root"), "detail: {detail}");
        }
        other => panic!("expected PermissionDenied, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_reports_missing_roots() {
    let adapter = LocalAdapter::new(vec![PathBuf::from("/definitely/not/here")]);
    let (ok, message) = adapter.test_connection().await;
    assert!(!ok);
    assert!(message.contains("missing"));

    let (dir, adapter) = fixture();
    let _ = dir;
    let (ok, _) = adapter.test_connection().await;
    assert!(ok);
}
