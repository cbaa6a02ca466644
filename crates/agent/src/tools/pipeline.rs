// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Processing-pipeline naming validation.

use ap_adapters::FileMeta;
use ap_core::TeamConfig;
use serde_json::json;

use super::{stem, Tool, ToolOutcome};

/// Validates that processed files carry a known processing-method
/// suffix (`<name>-<method>.<ext>`). Photos with unknown suffixes are
/// violations; the pipeline name comes from the team config.
pub struct PipelineValidation;

impl Tool for PipelineValidation {
    fn run(&self, files: &[FileMeta], config: &TeamConfig) -> ToolOutcome {
        let methods: Vec<&String> = config.processing_methods.keys().collect();
        let mut validated: u64 = 0;
        let mut violations: Vec<String> = Vec::new();

        for meta in files {
            let Some(ext) = super::extension(&meta.path) else { continue };
            if !config.is_photo_extension(&ext) {
                continue;
            }
            let base = stem(&meta.path);
            match base.rsplit_once('-') {
                Some((_, suffix)) if methods.iter().any(|m| m.as_str() == suffix) => {
                    validated += 1;
                }
                // Originals without a method suffix are fine; files that
                // look processed but name an unknown method are not.
                Some((_, suffix)) if !suffix.is_empty() && suffix.chars().all(char::is_alphanumeric) => {
                    violations.push(meta.path.clone());
                }
                _ => {}
            }
        }

        let issues = violations.len() as u64;
        ToolOutcome {
            results: json!({
                "pipeline": config.default_pipeline,
                "validated": validated,
                "paths": violations,
                "known_methods": methods,
            }),
            report_html: None,
            files_scanned: files.len() as u64,
            issues_found: issues,
        }
    }
}
