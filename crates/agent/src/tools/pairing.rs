// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RAW/sidecar pairing analysis.

use std::collections::{BTreeMap, BTreeSet};

use ap_adapters::FileMeta;
use ap_core::TeamConfig;
use serde_json::json;

use super::{extension, stem, Tool, ToolOutcome};

/// Pairs photos with their metadata sidecars by shared stem and reports
/// orphans on both sides. Photos whose extension is listed in
/// `require_sidecar` count as issues when unpaired.
pub struct PhotoPairing;

impl Tool for PhotoPairing {
    fn run(&self, files: &[FileMeta], config: &TeamConfig) -> ToolOutcome {
        // stem → extensions present
        let mut groups: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        for meta in files {
            if let Some(ext) = extension(&meta.path) {
                groups.entry(stem(&meta.path)).or_default().insert(ext);
            }
        }

        let mut paired: u64 = 0;
        let mut photos_missing_sidecar: Vec<String> = Vec::new();
        let mut orphan_sidecars: Vec<String> = Vec::new();
        let mut issues: u64 = 0;

        for (stem, extensions) in &groups {
            let has_photo = extensions.iter().any(|e| config.is_photo_extension(e));
            let has_sidecar = extensions.iter().any(|e| config.is_metadata_extension(e));
            match (has_photo, has_sidecar) {
                (true, true) => paired += 1,
                (true, false) => {
                    let required = extensions.iter().any(|e| {
                        config.require_sidecar.iter().any(|r| r.eq_ignore_ascii_case(e))
                    });
                    if required {
                        issues += 1;
                        photos_missing_sidecar.push((*stem).to_string());
                    }
                }
                (false, true) => {
                    issues += 1;
                    orphan_sidecars.push((*stem).to_string());
                }
                (false, false) => {}
            }
        }

        ToolOutcome {
            results: json!({
                "groups": groups.len(),
                "paired": paired,
                "photos_missing_sidecar": photos_missing_sidecar,
                "orphans": orphan_sidecars,
            }),
            report_html: None,
            files_scanned: files.len() as u64,
            issues_found: issues,
        }
    }
}
