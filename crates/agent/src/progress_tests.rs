// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::client::ClientError;
use crate::test_api::FakeApi;
use ap_core::EntityKind;

fn stage(name: &str) -> Progress {
    Progress::stage(name)
}

fn reporter(api: &Arc<FakeApi>) -> ProgressReporter<FakeApi> {
    ProgressReporter::new(api.clone(), Guid::random(EntityKind::Job))
}

async fn settle() {
    // Let spawned send tasks run under paused time.
    tokio::time::sleep(Duration::from_millis(5)).await;
}

#[tokio::test(start_paused = true)]
async fn first_report_sends_immediately() {
    let api = Arc::new(FakeApi::new());
    let reporter = reporter(&api);

    reporter.report(stage("scanning"));
    settle().await;

    assert_eq!(api.stages(), vec!["scanning"]);
}

#[tokio::test(start_paused = true)]
async fn rapid_reports_coalesce_to_the_latest() {
    let api = Arc::new(FakeApi::new());
    let reporter = reporter(&api);

    reporter.report(stage("a"));
    settle().await;
    reporter.report(stage("b"));
    reporter.report(stage("c"));
    reporter.report(stage("d"));

    // After the interval the drain flushes only the latest.
    tokio::time::sleep(MIN_REPORT_INTERVAL + Duration::from_millis(50)).await;
    assert_eq!(api.stages(), vec!["a", "d"]);
}

#[tokio::test(start_paused = true)]
async fn sends_are_spaced_by_the_min_interval() {
    let api = Arc::new(FakeApi::new());
    let reporter = reporter(&api);

    reporter.report(stage("a"));
    settle().await;
    reporter.report(stage("b"));
    tokio::time::sleep(MIN_REPORT_INTERVAL + Duration::from_millis(50)).await;

    let sent = api.progress.lock();
    assert_eq!(sent.len(), 2);
    let gap = sent[1].2.duration_since(sent[0].2);
    assert!(gap >= MIN_REPORT_INTERVAL, "gap {gap:?}");
}

#[tokio::test(start_paused = true)]
async fn close_flushes_the_pending_report() {
    let api = Arc::new(FakeApi::new());
    let reporter = reporter(&api);

    reporter.report(stage("a"));
    settle().await;
    reporter.report(stage("final"));
    reporter.close().await;

    assert_eq!(api.stages(), vec!["a", "final"]);
}

#[tokio::test(start_paused = true)]
async fn reports_after_close_are_dropped() {
    let api = Arc::new(FakeApi::new());
    let reporter = reporter(&api);

    reporter.close().await;
    reporter.report(stage("late"));
    settle().await;

    assert!(api.stages().is_empty());
}

#[tokio::test(start_paused = true)]
async fn api_errors_are_swallowed() {
    let api = Arc::new(FakeApi::new());
    *api.progress_error.lock() = Some(ClientError::Connection("down".into()));
    let reporter = reporter(&api);

    reporter.report(stage("a"));
    settle().await;

    // Reporter recovered: the next send goes through once the API does.
    *api.progress_error.lock() = None;
    tokio::time::sleep(MIN_REPORT_INTERVAL).await;
    reporter.report(stage("b"));
    settle().await;
    assert_eq!(api.stages(), vec!["b"]);
}

#[tokio::test(start_paused = true)]
async fn order_is_never_inverted() {
    let api = Arc::new(FakeApi::new());
    let reporter = reporter(&api);

    for i in 0..20 {
        reporter.report(stage(&format!("s{i}")));
        tokio::time::sleep(Duration::from_millis(150)).await;
    }
    reporter.close().await;

    let stages = api.stages();
    let mut indices: Vec<usize> =
        stages.iter().map(|s| s[1..].parse().unwrap()).collect();
    let sorted = {
        let mut c = indices.clone();
        c.sort_unstable();
        c
    };
    assert_eq!(indices, sorted);
    indices.dedup();
    assert_eq!(indices.len(), stages.len(), "no duplicates");
}
