// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ap_core::test_support::local_collection;
use ap_core::{AgentRuntime, EntityKind, JobBuilder, Target, ToolKind};

struct Fixture {
    state: ServerState,
    team: Guid,
    agent: Guid,
}

fn fixture() -> Fixture {
    let mut state = ServerState::default();
    let team = Guid::random(EntityKind::Team);
    let agent = Guid::random(EntityKind::Agent);
    state.runtimes.insert(agent, AgentRuntime::new(agent, 1));
    Fixture { state, team, agent }
}

fn caps() -> Vec<Capability> {
    vec![Capability::tool("photostats", "1.0"), Capability::LocalFilesystem]
}

fn queued_job(fx: &mut Fixture, priority: i32, created_at: u64) -> Guid {
    let collection = local_collection(fx.team, "/photos");
    let job = JobBuilder::default()
        .team(fx.team)
        .target(Target::new(TargetKind::Collection, collection.guid, "photos"))
        .priority(priority)
        .created_at_ms(created_at)
        .build();
    let guid = job.guid;
    fx.state.collections.insert(collection.guid, collection);
    fx.state.jobs.insert(guid, job);
    guid
}

#[test]
fn claim_hands_out_the_job_once() {
    let mut fx = fixture();
    let job = queued_job(&mut fx, 0, 1);

    let claimed =
        claim_job(&mut fx.state, &fx.agent, &fx.team, &caps(), 10).unwrap();
    assert_eq!(claimed.job.guid, job);
    assert_eq!(claimed.signing_secret.len(), 64);
    assert_eq!(fx.state.jobs[&job].status, JobStatus::Claimed);
    assert_eq!(fx.state.jobs[&job].agent_guid, Some(fx.agent));

    // Nothing left to claim.
    assert!(claim_job(&mut fx.state, &fx.agent, &fx.team, &caps(), 11).is_none());
}

#[test]
fn claim_prefers_priority_then_age() {
    let mut fx = fixture();
    let _low_new = queued_job(&mut fx, 0, 100);
    let high = queued_job(&mut fx, 5, 200);
    let _high_newer = queued_job(&mut fx, 5, 300);

    let claimed = claim_job(&mut fx.state, &fx.agent, &fx.team, &caps(), 10).unwrap();
    assert_eq!(claimed.job.guid, high, "highest priority, oldest first");
}

#[test]
fn claim_respects_capabilities() {
    let mut fx = fixture();
    queued_job(&mut fx, 0, 1);

    let only_pairing = vec![Capability::tool("photo_pairing", "1.0")];
    assert!(claim_job(&mut fx.state, &fx.agent, &fx.team, &only_pairing, 10).is_none());
}

#[test]
fn claim_respects_tenancy() {
    let mut fx = fixture();
    queued_job(&mut fx, 0, 1);
    let other_team = Guid::random(EntityKind::Team);

    assert!(claim_job(&mut fx.state, &fx.agent, &other_team, &caps(), 10).is_none());
}

#[test]
fn bound_collections_only_go_to_their_agent() {
    let mut fx = fixture();
    let job = queued_job(&mut fx, 0, 1);
    let bound_to = Guid::random(EntityKind::Agent);
    let target = fx.state.jobs[&job].target.guid;
    fx.state.collections.get_mut(&target).unwrap().bound_agent_guid = Some(bound_to);

    assert!(claim_job(&mut fx.state, &fx.agent, &fx.team, &caps(), 10).is_none());
    let claimed = claim_job(&mut fx.state, &bound_to, &fx.team, &caps(), 11).unwrap();
    assert_eq!(claimed.job.guid, job);
}

#[test]
fn local_targets_require_the_filesystem_capability() {
    let mut fx = fixture();
    queued_job(&mut fx, 0, 1);

    let no_fs = vec![Capability::tool("photostats", "1.0")];
    assert!(claim_job(&mut fx.state, &fx.agent, &fx.team, &no_fs, 10).is_none());
}

#[test]
fn claim_builds_context_from_the_collection() {
    let mut fx = fixture();
    queued_job(&mut fx, 0, 1);

    let claimed = claim_job(&mut fx.state, &fx.agent, &fx.team, &caps(), 10).unwrap();
    assert_eq!(claimed.context["collection_type"], "local");
    assert_eq!(claimed.context["location"], "/photos");
}

#[test]
fn cancel_queued_is_immediate() {
    let mut fx = fixture();
    let job = queued_job(&mut fx, 0, 1);

    assert_eq!(cancel_job(&mut fx.state, &job, 20), Some(CancelOutcome::Cancelled));
    assert_eq!(fx.state.jobs[&job].status, JobStatus::Cancelled);
}

#[test]
fn cancel_claimed_queues_a_command_once() {
    let mut fx = fixture();
    let job = queued_job(&mut fx, 0, 1);
    claim_job(&mut fx.state, &fx.agent, &fx.team, &caps(), 10).unwrap();

    assert_eq!(cancel_job(&mut fx.state, &job, 20), Some(CancelOutcome::SignalSent));
    assert_eq!(cancel_job(&mut fx.state, &job, 21), Some(CancelOutcome::SignalSent));

    let commands = &fx.state.runtimes[&fx.agent].pending_commands;
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0], format!("cancel_job:{job}"));
    // The job itself is still claimed until the agent reports.
    assert_eq!(fx.state.jobs[&job].status, JobStatus::Claimed);
}

#[test]
fn cancel_terminal_is_a_no_op() {
    let mut fx = fixture();
    let job = queued_job(&mut fx, 0, 1);
    claim_job(&mut fx.state, &fx.agent, &fx.team, &caps(), 10).unwrap();
    fx.state.jobs.get_mut(&job).unwrap().complete(15).unwrap();

    assert_eq!(cancel_job(&mut fx.state, &job, 20), Some(CancelOutcome::AlreadyTerminal));
}
