// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::storage::TeamRecord;
use ap_core::{
    AnalysisResult, EntityKind, JobBuilder, RetentionPolicy, Target, TargetKind,
};

fn team_with_policy(state: &mut ServerState, policy: RetentionPolicy) -> Guid {
    let guid = Guid::random(EntityKind::Team);
    state.teams.insert(
        guid,
        TeamRecord {
            guid,
            name: "studio".to_string(),
            config: ap_core::TeamConfig::default(),
            retention: policy,
        },
    );
    guid
}

fn completed_result(
    team: Guid,
    target: Guid,
    created_at_ms: u64,
    blob: Option<&str>,
) -> AnalysisResult {
    AnalysisResult {
        guid: Guid::random(EntityKind::Result),
        team_guid: team,
        job_guid: Guid::random(EntityKind::Job),
        tool: ToolKind::Photostats,
        target: Target::new(TargetKind::Collection, target, "c"),
        context: serde_json::Value::Null,
        status: ResultStatus::Completed,
        duration_seconds: 1.0,
        files_scanned: 1,
        issues_found: 0,
        results_json: blob.is_none().then(|| serde_json::json!({"n": 1})),
        results_blob: blob.map(str::to_string),
        report_blob: None,
        error_message: None,
        input_state_hash: Some("h".repeat(64)),
        no_change_copy: false,
        download_report_from: None,
        created_at_ms,
    }
}

const DAY: u64 = 24 * 60 * 60 * 1000;

#[test]
fn old_terminal_jobs_age_out_by_status() {
    let mut state = ServerState::default();
    let team = team_with_policy(&mut state, RetentionPolicy::default());

    let mut done = JobBuilder::default().team(team).build();
    done.claim(Guid::random(EntityKind::Agent), "ab".repeat(32), 0).unwrap();
    done.complete(0).unwrap();
    let done_guid = done.guid;
    state.jobs.insert(done_guid, done);

    let queued = JobBuilder::default().team(team).build();
    let queued_guid = queued.guid;
    state.jobs.insert(queued_guid, queued);

    // Default: completed jobs keep for 2 days.
    let outcome = sweep(&mut state, 2 * DAY);
    assert!(outcome.jobs_deleted.is_empty());

    let outcome = sweep(&mut state, 2 * DAY + 1);
    assert_eq!(outcome.jobs_deleted, vec![done_guid]);
    assert!(state.jobs.contains_key(&queued_guid), "non-terminal jobs are kept");
}

#[test]
fn unlimited_result_retention_deletes_nothing() {
    let mut state = ServerState::default();
    let team = team_with_policy(&mut state, RetentionPolicy::default());
    let target = Guid::random(EntityKind::Collection);
    let result = completed_result(team, target, 0, None);
    state.results.insert(result.guid, result);

    let outcome = sweep(&mut state, 1000 * DAY);
    assert!(outcome.results_deleted.is_empty());
}

#[test]
fn preserve_per_collection_survives_the_sweep() {
    let mut state = ServerState::default();
    let mut policy = RetentionPolicy::default();
    policy.result_completed_days = 7;
    policy.preserve_per_collection = 2;
    let team = team_with_policy(&mut state, policy);
    let target = Guid::random(EntityKind::Collection);

    let guids: Vec<Guid> = (0..5u64)
        .map(|i| {
            let result = completed_result(team, target, i * DAY, None);
            let guid = result.guid;
            state.results.insert(guid, result);
            guid
        })
        .collect();

    let outcome = sweep(&mut state, 100 * DAY);

    // The two most recent stay, everything older goes.
    assert_eq!(outcome.results_deleted.len(), 3);
    assert!(state.results.contains_key(&guids[4]));
    assert!(state.results.contains_key(&guids[3]));
    assert!(!state.results.contains_key(&guids[0]));
}

#[test]
fn recent_results_are_kept_even_beyond_the_preserve_count() {
    let mut state = ServerState::default();
    let mut policy = RetentionPolicy::default();
    policy.result_completed_days = 7;
    policy.preserve_per_collection = 1;
    let team = team_with_policy(&mut state, policy);
    let target = Guid::random(EntityKind::Collection);

    let now = 100 * DAY;
    for age_days in [1u64, 2, 3] {
        let result = completed_result(team, target, now - age_days * DAY, None);
        state.results.insert(result.guid, result);
    }

    let outcome = sweep(&mut state, now);
    assert!(outcome.results_deleted.is_empty(), "all are younger than the threshold");
}

#[test]
fn deleting_a_canonical_promotes_its_most_recent_dependent() {
    let mut state = ServerState::default();
    let mut policy = RetentionPolicy::default();
    policy.result_completed_days = 7;
    policy.preserve_per_collection = 1;
    let team = team_with_policy(&mut state, policy);
    let target = Guid::random(EntityKind::Collection);

    // Old canonical with a blob, two newer no-change copies.
    let canonical = completed_result(team, target, 0, Some("old.results.json"));
    let canonical_guid = canonical.guid;
    state.results.insert(canonical_guid, canonical);

    let mut copies = Vec::new();
    for created in [50 * DAY, 99 * DAY] {
        let mut copy = completed_result(team, target, created, None);
        copy.no_change_copy = true;
        copy.results_json = None;
        copy.download_report_from = Some(canonical_guid);
        copies.push(copy.guid);
        state.results.insert(copy.guid, copy);
    }

    let outcome = sweep(&mut state, 100 * DAY);

    // Canonical and the older copy age out; the newest copy survives
    // because of preserve_per_collection = 1.
    assert!(outcome.results_deleted.contains(&canonical_guid));
    assert_eq!(outcome.promoted, vec![(canonical_guid, copies[1])]);

    let promoted = &state.results[&copies[1]];
    assert!(!promoted.no_change_copy);
    assert!(promoted.download_report_from.is_none());
    assert_eq!(
        promoted.results_blob.as_deref(),
        Some(format!("{}.results.json", copies[1]).as_str())
    );
    assert_eq!(
        outcome.rename_blobs,
        vec![("old.results.json".to_string(), format!("{}.results.json", copies[1]))]
    );
    // The renamed blob must not also be scheduled for deletion.
    assert!(outcome.delete_blobs.is_empty());
}

#[test]
fn copies_dying_with_their_canonical_need_no_promotion() {
    let mut state = ServerState::default();
    let mut policy = RetentionPolicy::default();
    policy.result_completed_days = 7;
    policy.preserve_per_collection = 1;
    let team = team_with_policy(&mut state, policy);
    let target = Guid::random(EntityKind::Collection);

    let canonical = completed_result(team, target, 0, Some("old.results.json"));
    let canonical_guid = canonical.guid;
    state.results.insert(canonical_guid, canonical);

    let mut copy = completed_result(team, target, DAY, None);
    copy.no_change_copy = true;
    copy.results_json = None;
    copy.download_report_from = Some(canonical_guid);
    state.results.insert(copy.guid, copy);

    // A fresh unrelated result keeps the group's preserved slot.
    let fresh = completed_result(team, target, 100 * DAY, None);
    state.results.insert(fresh.guid, fresh);

    let outcome = sweep(&mut state, 100 * DAY);
    assert!(outcome.promoted.is_empty());
    assert_eq!(outcome.results_deleted.len(), 2);
    assert_eq!(outcome.delete_blobs, vec!["old.results.json".to_string()]);
}
