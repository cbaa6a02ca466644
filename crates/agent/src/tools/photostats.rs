// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collection inventory statistics.

use std::collections::BTreeMap;

use ap_adapters::FileMeta;
use ap_core::TeamConfig;
use serde_json::json;

use super::{extension, Tool, ToolOutcome};

/// Per-extension counts, byte totals, and camera breakdown by filename
/// prefix (e.g. `Z8-001_0042.dng` → camera serial `Z8-001`).
pub struct Photostats;

impl Tool for Photostats {
    fn run(&self, files: &[FileMeta], config: &TeamConfig) -> ToolOutcome {
        let mut by_extension: BTreeMap<String, u64> = BTreeMap::new();
        let mut by_camera: BTreeMap<String, u64> = BTreeMap::new();
        let mut total_bytes: u64 = 0;
        let mut photo_files: u64 = 0;
        let mut metadata_files: u64 = 0;
        let mut unrecognized: u64 = 0;

        for meta in files {
            total_bytes += meta.size;
            let ext = extension(&meta.path).unwrap_or_default();
            *by_extension.entry(ext.clone()).or_default() += 1;

            if config.is_photo_extension(&ext) {
                photo_files += 1;
                if let Some(serial) = camera_serial(&meta.path, config) {
                    *by_camera.entry(serial).or_default() += 1;
                }
            } else if config.is_metadata_extension(&ext) {
                metadata_files += 1;
            } else {
                unrecognized += 1;
            }
        }

        ToolOutcome {
            results: json!({
                "total_files": files.len(),
                "total_bytes": total_bytes,
                "photo_files": photo_files,
                "metadata_files": metadata_files,
                "unrecognized_files": unrecognized,
                "by_extension": by_extension,
                "by_camera": by_camera,
            }),
            report_html: None,
            files_scanned: files.len() as u64,
            // Files no extension list claims are worth flagging.
            issues_found: unrecognized,
        }
    }
}

/// Match a known camera serial as the filename prefix before `_`.
fn camera_serial(path: &str, config: &TeamConfig) -> Option<String> {
    let name = path.rsplit('/').next()?;
    let prefix = name.split('_').next()?;
    config
        .camera_mappings
        .values()
        .find(|mapping| mapping.serial == prefix)
        .map(|mapping| mapping.serial.clone())
}
