// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn defaults_match_the_documented_policy() {
    let policy = RetentionPolicy::default();
    assert_eq!(policy.job_completed_days, 2);
    assert_eq!(policy.job_failed_days, 7);
    assert_eq!(policy.result_completed_days, 0);
    assert_eq!(policy.preserve_per_collection, 1);
}

#[test]
fn apply_updates_only_provided_fields() {
    let mut policy = RetentionPolicy::default();
    policy
        .apply(RetentionUpdate { job_failed_days: Some(30), ..Default::default() })
        .unwrap();
    assert_eq!(policy.job_failed_days, 30);
    assert_eq!(policy.job_completed_days, 2);
}

#[parameterized(
    three_days = { 3 },
    six_days = { 6 },
    next_year = { 366 },
)]
fn out_of_set_days_are_rejected(days: u32) {
    let mut policy = RetentionPolicy::default();
    let err = policy
        .apply(RetentionUpdate { result_completed_days: Some(days), ..Default::default() })
        .unwrap_err();
    assert_eq!(err, RetentionError::InvalidDays(days));
    // Rejected updates leave the policy untouched.
    assert_eq!(policy, RetentionPolicy::default());
}

#[test]
fn bad_preserve_count_rejects_whole_update() {
    let mut policy = RetentionPolicy::default();
    let err = policy
        .apply(RetentionUpdate {
            job_completed_days: Some(7),
            preserve_per_collection: Some(4),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err, RetentionError::InvalidPreserveCount(4));
    assert_eq!(policy.job_completed_days, 2);
}
