// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent liveness: mark silent agents offline and recover their jobs.

use ap_core::{AgentStatus, Guid, JobStatus};

use crate::storage::ServerState;

/// What one sweep did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LivenessOutcome {
    pub offlined: Vec<Guid>,
    pub requeued: Vec<Guid>,
    pub failed: Vec<Guid>,
}

/// Mark agents without a heartbeat in `timeout_ms` offline, and return
/// their claimed/running jobs to the queue — or fail them when retries
/// are exhausted.
pub fn sweep(state: &mut ServerState, now_ms: u64, timeout_ms: u64) -> LivenessOutcome {
    let mut outcome = LivenessOutcome::default();

    let stale: Vec<Guid> = state
        .runtimes
        .values()
        .filter(|rt| rt.status == AgentStatus::Online && rt.is_stale(now_ms, timeout_ms))
        .map(|rt| rt.agent_guid)
        .collect();

    for agent in stale {
        if let Some(runtime) = state.runtimes.get_mut(&agent) {
            runtime.status = AgentStatus::Offline;
        }
        outcome.offlined.push(agent);
        tracing::warn!("agent {agent} missed its heartbeat window; marked offline");

        let held: Vec<Guid> = state
            .jobs
            .values()
            .filter(|job| {
                matches!(job.status, JobStatus::Claimed | JobStatus::Running)
                    && job.agent_guid == Some(agent)
            })
            .map(|job| job.guid)
            .collect();

        for guid in held {
            let Some(job) = state.jobs.get_mut(&guid) else { continue };
            if job.retries_exhausted() {
                if job.fail("retries exhausted after agent loss", now_ms).is_ok() {
                    outcome.failed.push(guid);
                    tracing::warn!("{guid} failed: retries exhausted");
                }
            } else if job.requeue(now_ms).is_ok() {
                outcome.requeued.push(guid);
                tracing::info!("{guid} re-queued (retry {})", job.retry_count);
            }
        }
    }

    outcome
}

#[cfg(test)]
#[path = "liveness_tests.rs"]
mod tests;
