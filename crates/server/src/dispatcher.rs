// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job dispatch: atomic claims and the command channel.
//!
//! Claim selection and mutation happen under one state lock, so a job
//! is handed to at most one agent. Selection order: highest priority
//! first, oldest first within a priority.

use ap_core::{
    signing, AgentCommand, Capability, Collection, Guid, Job, JobStatus, TargetKind,
};
use serde_json::json;

use crate::storage::ServerState;

/// What `POST /jobs/claim` hands back.
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    pub job: Job,
    pub signing_secret: String,
    /// Execution context derived from the target at claim time.
    pub context: serde_json::Value,
}

/// Whether this agent can take this job.
fn eligible(
    state: &ServerState,
    job: &Job,
    agent_guid: &Guid,
    team_guid: &Guid,
    capabilities: &[Capability],
) -> bool {
    if job.status != JobStatus::Queued || job.team_guid != *team_guid {
        return false;
    }
    if !capabilities.iter().any(|cap| cap.covers_tool(job.tool)) {
        return false;
    }
    if job.target.kind == TargetKind::Collection {
        let Some(collection) = state.collections.get(&job.target.guid) else {
            return false;
        };
        if let Some(bound) = &collection.bound_agent_guid {
            if bound != agent_guid {
                return false;
            }
        }
        if collection.kind == ap_core::CollectionKind::Local
            && !capabilities.iter().any(|cap| matches!(cap, Capability::LocalFilesystem))
        {
            return false;
        }
        if let Some(connector) = &collection.connector_guid {
            if !capabilities.iter().any(|cap| cap.covers_connector(connector)) {
                return false;
            }
        }
    }
    true
}

/// Execution context the agent needs for a collection target.
fn context_for(collection: &Collection) -> serde_json::Value {
    json!({
        "collection_type": collection.kind,
        "location": collection.location,
        "connector_guid": collection.connector_guid,
    })
}

/// Atomically claim the best eligible job for an agent.
///
/// Must be called with the state lock held for the whole selection +
/// mutation (the callers do — `AppState::mutate`).
pub fn claim_job(
    state: &mut ServerState,
    agent_guid: &Guid,
    team_guid: &Guid,
    capabilities: &[Capability],
    now_ms: u64,
) -> Option<ClaimedJob> {
    let mut best: Option<&Job> = None;
    for job in state.jobs.values() {
        if !eligible(state, job, agent_guid, team_guid, capabilities) {
            continue;
        }
        let better = match best {
            None => true,
            Some(current) => (job.priority, std::cmp::Reverse(job.created_at_ms))
                > (current.priority, std::cmp::Reverse(current.created_at_ms)),
        };
        if better {
            best = Some(job);
        }
    }
    let guid = best.map(|job| job.guid)?;

    let context = state
        .jobs
        .get(&guid)
        .filter(|job| job.context.is_null() && job.target.kind == TargetKind::Collection)
        .and_then(|job| state.collections.get(&job.target.guid))
        .map(context_for);

    let job = state.jobs.get_mut(&guid)?;
    let secret = signing::generate_secret();
    // Transition cannot fail: eligibility saw Queued under this lock.
    job.claim(*agent_guid, secret.clone(), now_ms).ok()?;
    if let Some(context) = context {
        job.context = context;
    }
    Some(ClaimedJob { job: job.clone(), signing_secret: secret, context: job.context.clone() })
}

/// Outcome of a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Job was still queued; cancelled directly.
    Cancelled,
    /// Job is held by an agent; a command was queued for it.
    SignalSent,
    /// Job already reached a terminal state.
    AlreadyTerminal,
}

/// Cancel a job: immediately when queued, via the agent's command
/// channel when claimed or running.
pub fn cancel_job(
    state: &mut ServerState,
    job_guid: &Guid,
    now_ms: u64,
) -> Option<CancelOutcome> {
    let job = state.jobs.get_mut(job_guid)?;
    match job.status {
        JobStatus::Queued => {
            // Cannot fail from Queued.
            job.cancel(now_ms).ok()?;
            Some(CancelOutcome::Cancelled)
        }
        JobStatus::Claimed | JobStatus::Running => {
            let agent = job.agent_guid?;
            let command = AgentCommand::cancel(*job_guid).to_string();
            if let Some(runtime) = state.runtimes.get_mut(&agent) {
                if !runtime.pending_commands.contains(&command) {
                    runtime.push_command(command);
                }
            }
            Some(CancelOutcome::SignalSent)
        }
        _ => Some(CancelOutcome::AlreadyTerminal),
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
