// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ap_core::{AgentRuntime, EntityKind, JobBuilder};

const TIMEOUT: u64 = 90_000;

struct Fixture {
    state: ServerState,
    agent: Guid,
    job: Guid,
}

fn fixture(max_retries: u32) -> Fixture {
    let mut state = ServerState::default();
    let agent = Guid::random(EntityKind::Agent);
    state.runtimes.insert(agent, AgentRuntime::new(agent, 1_000_000));

    let mut job = JobBuilder::default().max_retries(max_retries).build();
    job.claim(agent, "ab".repeat(32), 1_000_001).unwrap();
    let guid = job.guid;
    state.jobs.insert(guid, job);
    Fixture { state, agent, job: guid }
}

#[test]
fn fresh_agents_are_left_alone() {
    let mut fx = fixture(3);
    let outcome = sweep(&mut fx.state, 1_000_000 + TIMEOUT, TIMEOUT);
    assert_eq!(outcome, LivenessOutcome::default());
    assert_eq!(fx.state.jobs[&fx.job].status, JobStatus::Claimed);
}

#[test]
fn stale_agent_goes_offline_and_its_job_requeues() {
    let mut fx = fixture(3);
    let outcome = sweep(&mut fx.state, 1_000_001 + TIMEOUT, TIMEOUT);

    assert_eq!(outcome.offlined, vec![fx.agent]);
    assert_eq!(outcome.requeued, vec![fx.job]);
    assert!(outcome.failed.is_empty());

    let job = &fx.state.jobs[&fx.job];
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.retry_count, 1);
    assert!(job.agent_guid.is_none());
    assert!(job.signing_secret.is_none());
    assert_eq!(fx.state.runtimes[&fx.agent].status, AgentStatus::Offline);
}

#[test]
fn exhausted_retries_fail_the_job_instead() {
    let mut fx = fixture(0);
    let outcome = sweep(&mut fx.state, 2_000_000 + TIMEOUT, TIMEOUT);

    assert_eq!(outcome.failed, vec![fx.job]);
    assert!(outcome.requeued.is_empty());
    let job = &fx.state.jobs[&fx.job];
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error_message.as_deref().unwrap().contains("retries exhausted"));
}

#[test]
fn offline_agents_are_not_swept_twice() {
    let mut fx = fixture(3);
    sweep(&mut fx.state, 1_000_001 + TIMEOUT, TIMEOUT);
    let second = sweep(&mut fx.state, 1_000_002 + 2 * TIMEOUT, TIMEOUT);
    assert_eq!(second, LivenessOutcome::default());
}

#[test]
fn requeued_jobs_can_be_claimed_again() {
    let mut fx = fixture(3);
    sweep(&mut fx.state, 1_000_001 + TIMEOUT, TIMEOUT);

    let other = Guid::random(EntityKind::Agent);
    let job = fx.state.jobs.get_mut(&fx.job).unwrap();
    job.claim(other, "cd".repeat(32), 2_000_000).unwrap();
    assert_eq!(job.agent_guid, Some(other));
}
