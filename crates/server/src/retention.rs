// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retention sweep.
//!
//! Jobs age out by status. Completed results age out by team policy,
//! except the `preserve_per_collection` most recent per (target, tool).
//! Before a canonical result with live no-change dependents is deleted,
//! its payload is promoted to the most recent surviving dependent and
//! the remaining dependents are repointed — a copy must never dangle.

use std::collections::{HashMap, HashSet};

use ap_core::{Guid, JobStatus, ResultStatus, ToolKind};

use crate::storage::ServerState;

const DAY_MS: u64 = 24 * 60 * 60 * 1000;

/// What one sweep did, including the blob file work the caller owes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RetentionOutcome {
    pub jobs_deleted: Vec<Guid>,
    pub results_deleted: Vec<Guid>,
    /// (old canonical, promoted dependent)
    pub promoted: Vec<(Guid, Guid)>,
    /// Blob files (in the blob dir) to rename: promotion moves.
    pub rename_blobs: Vec<(String, String)>,
    /// Blob files to delete with their rows.
    pub delete_blobs: Vec<String>,
}

/// Apply every team's retention policy once.
pub fn sweep(state: &mut ServerState, now_ms: u64) -> RetentionOutcome {
    let mut outcome = RetentionOutcome::default();
    sweep_jobs(state, now_ms, &mut outcome);
    let scheduled = select_results(state, now_ms);
    promote_canonicals(state, &scheduled, &mut outcome);
    delete_results(state, scheduled, &mut outcome);
    outcome
}

fn sweep_jobs(state: &mut ServerState, now_ms: u64, outcome: &mut RetentionOutcome) {
    let expired: Vec<Guid> = state
        .jobs
        .values()
        .filter_map(|job| {
            let policy = state.retention_for(&job.team_guid);
            let days = match job.status {
                JobStatus::Completed => policy.job_completed_days,
                JobStatus::Failed | JobStatus::Cancelled => policy.job_failed_days,
                _ => return None,
            };
            if days == 0 {
                return None;
            }
            let age = now_ms.saturating_sub(job.updated_at_ms);
            (age > u64::from(days) * DAY_MS).then_some(job.guid)
        })
        .collect();

    for guid in &expired {
        state.jobs.remove(guid);
    }
    outcome.jobs_deleted = expired;
}

/// Completed results past their threshold, minus the preserved head of
/// each (target, tool) group.
fn select_results(state: &ServerState, now_ms: u64) -> Vec<Guid> {
    let mut groups: HashMap<(Guid, Guid, ToolKind), Vec<(u64, Guid)>> = HashMap::new();
    for result in state.results.values() {
        if result.status != ResultStatus::Completed {
            continue;
        }
        groups
            .entry((result.team_guid, result.target.guid, result.tool))
            .or_default()
            .push((result.created_at_ms, result.guid));
    }

    let mut scheduled = Vec::new();
    for ((team, _, _), mut members) in groups {
        let policy = state.retention_for(&team);
        if policy.result_completed_days == 0 {
            continue;
        }
        let threshold = u64::from(policy.result_completed_days) * DAY_MS;
        members.sort_by_key(|(created, _)| std::cmp::Reverse(*created));
        for (created, guid) in members.into_iter().skip(policy.preserve_per_collection as usize)
        {
            if now_ms.saturating_sub(created) > threshold {
                scheduled.push(guid);
            }
        }
    }
    scheduled.sort();
    scheduled
}

/// Move canonical payloads onto their most recent surviving dependent.
fn promote_canonicals(
    state: &mut ServerState,
    scheduled: &[Guid],
    outcome: &mut RetentionOutcome,
) {
    let dying: HashSet<Guid> = scheduled.iter().copied().collect();

    for guid in scheduled {
        let survivors: Vec<Guid> = state
            .dependents_of(guid)
            .into_iter()
            .filter(|dep| !dying.contains(dep))
            .collect();
        let Some(promoted) = survivors
            .iter()
            .max_by_key(|dep| state.results.get(dep).map(|r| r.created_at_ms).unwrap_or(0))
            .copied()
        else {
            continue;
        };

        let Some(canonical) = state.results.get_mut(guid) else { continue };
        let results_json = canonical.results_json.take();
        let results_blob = canonical.results_blob.take();
        let report_blob = canonical.report_blob.take();

        if let Some(dependent) = state.results.get_mut(&promoted) {
            dependent.no_change_copy = false;
            dependent.download_report_from = None;
            dependent.results_json = results_json;
            dependent.results_blob = results_blob.map(|old| {
                let new = format!("{promoted}.results.json");
                outcome.rename_blobs.push((old, new.clone()));
                new
            });
            dependent.report_blob = report_blob.map(|old| {
                let new = format!("{promoted}.report.html");
                outcome.rename_blobs.push((old, new.clone()));
                new
            });
        }

        for result in state.results.values_mut() {
            if result.guid != promoted && result.download_report_from == Some(*guid) {
                result.download_report_from = Some(promoted);
            }
        }
        outcome.promoted.push((*guid, promoted));
        tracing::info!("promoted {promoted} to canonical before deleting {guid}");
    }
}

fn delete_results(state: &mut ServerState, scheduled: Vec<Guid>, outcome: &mut RetentionOutcome) {
    for guid in scheduled {
        if let Some(result) = state.results.remove(&guid) {
            outcome
                .delete_blobs
                .extend(result.results_blob.into_iter().chain(result.report_blob));
            outcome.results_deleted.push(guid);
        }
    }
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;
