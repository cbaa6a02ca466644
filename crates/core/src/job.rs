// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job model and status state machine.
//!
//! A job is a short-lived, tool-typed unit of work. Status moves
//! monotonically from `queued` toward one terminal state, with a single
//! exception: a claimed or running job whose agent dies is re-queued
//! (`claimed → queued`) until its retries are exhausted. Cancellation
//! may land in any non-terminal state.

use serde::{Deserialize, Serialize};

use crate::guid::Guid;
use crate::target::Target;

/// Analysis tools an agent can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Photostats,
    PhotoPairing,
    PipelineValidation,
}

impl ToolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolKind::Photostats => "photostats",
            ToolKind::PhotoPairing => "photo_pairing",
            ToolKind::PipelineValidation => "pipeline_validation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "photostats" => ToolKind::Photostats,
            "photo_pairing" => ToolKind::PhotoPairing,
            "pipeline_validation" => ToolKind::PipelineValidation,
            _ => return None,
        })
    }
}

crate::simple_display! {
    ToolKind {
        Photostats => "photostats",
        PhotoPairing => "photo_pairing",
        PipelineValidation => "pipeline_validation",
    }
}

/// Job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Claimed,
    Running,
    Completed,
    Failed,
    Cancelled,
}

crate::simple_display! {
    JobStatus {
        Queued => "queued",
        Claimed => "claimed",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }

    /// Whether a transition to `to` is legal from this status.
    pub fn can_transition(self, to: JobStatus) -> bool {
        use JobStatus::*;
        match (self, to) {
            // Cancellation may arrive in any non-terminal state.
            (from, Cancelled) => !from.is_terminal(),
            (Queued, Claimed) => true,
            // Re-queue after agent death; failure when retries run out.
            (Claimed | Running, Queued) => true,
            (Queued | Claimed | Running, Failed) => true,
            (Claimed, Running) => true,
            (Claimed | Running, Completed) => true,
            _ => false,
        }
    }
}

/// Attempted an illegal status transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid job transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// A progress snapshot reported by the executing agent.
///
/// Fields with no value are omitted on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub stage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_scanned: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_files: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Progress {
    pub fn stage(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            percentage: None,
            files_scanned: None,
            total_files: None,
            current_file: None,
            message: None,
        }
    }
}

/// A scheduled unit of analysis work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub guid: Guid,
    pub team_guid: Guid,
    pub tool: ToolKind,
    pub status: JobStatus,
    pub priority: i32,
    pub retry_count: u32,
    pub max_retries: u32,
    /// Agent currently holding the claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_guid: Option<Guid>,
    /// Hex-encoded 32-byte secret minted at claim, used for result HMAC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    pub target: Target,
    /// Display/context payload (e.g. collection location, pipeline version).
    #[serde(default)]
    pub context: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Job {
    pub fn new(
        guid: Guid,
        team_guid: Guid,
        tool: ToolKind,
        target: Target,
        priority: i32,
        max_retries: u32,
        now_ms: u64,
    ) -> Self {
        Self {
            guid,
            team_guid,
            tool,
            status: JobStatus::Queued,
            priority,
            retry_count: 0,
            max_retries,
            agent_guid: None,
            signing_secret: None,
            progress: None,
            target,
            context: serde_json::Value::Null,
            error_message: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    fn transition(&mut self, to: JobStatus, now_ms: u64) -> Result<(), TransitionError> {
        if !self.status.can_transition(to) {
            return Err(TransitionError { from: self.status, to });
        }
        self.status = to;
        self.updated_at_ms = now_ms;
        Ok(())
    }

    /// Hand the job to an agent together with a freshly minted secret.
    pub fn claim(
        &mut self,
        agent: Guid,
        signing_secret: String,
        now_ms: u64,
    ) -> Result<(), TransitionError> {
        self.transition(JobStatus::Claimed, now_ms)?;
        self.agent_guid = Some(agent);
        self.signing_secret = Some(signing_secret);
        Ok(())
    }

    /// First progress report from the claiming agent.
    pub fn start(&mut self, now_ms: u64) -> Result<(), TransitionError> {
        self.transition(JobStatus::Running, now_ms)
    }

    /// Return a dead agent's job to the queue, burning one retry.
    ///
    /// Clears the claim and the minted secret; a later claim mints a new
    /// one. Callers check [`Job::retries_exhausted`] first and fail the
    /// job instead when it returns true.
    pub fn requeue(&mut self, now_ms: u64) -> Result<(), TransitionError> {
        self.transition(JobStatus::Queued, now_ms)?;
        self.agent_guid = None;
        self.signing_secret = None;
        self.progress = None;
        self.retry_count += 1;
        Ok(())
    }

    pub fn retries_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }

    pub fn complete(&mut self, now_ms: u64) -> Result<(), TransitionError> {
        self.transition(JobStatus::Completed, now_ms)
    }

    pub fn fail(&mut self, error: impl Into<String>, now_ms: u64) -> Result<(), TransitionError> {
        self.transition(JobStatus::Failed, now_ms)?;
        self.error_message = Some(error.into());
        Ok(())
    }

    pub fn cancel(&mut self, now_ms: u64) -> Result<(), TransitionError> {
        self.transition(JobStatus::Cancelled, now_ms)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use builder::JobBuilder;

#[cfg(any(test, feature = "test-support"))]
mod builder {
    use super::*;
    use crate::guid::EntityKind;
    use crate::target::TargetKind;

    /// Test builder producing a queued job with sensible defaults.
    pub struct JobBuilder {
        tool: ToolKind,
        team_guid: Guid,
        target: Option<Target>,
        priority: i32,
        max_retries: u32,
        now_ms: u64,
    }

    impl Default for JobBuilder {
        fn default() -> Self {
            Self {
                tool: ToolKind::Photostats,
                team_guid: Guid::random(EntityKind::Team),
                target: None,
                priority: 0,
                max_retries: 3,
                now_ms: 1_000_000,
            }
        }
    }

    impl JobBuilder {
        pub fn tool(mut self, tool: ToolKind) -> Self {
            self.tool = tool;
            self
        }

        pub fn team(mut self, team_guid: Guid) -> Self {
            self.team_guid = team_guid;
            self
        }

        pub fn target(mut self, target: Target) -> Self {
            self.target = Some(target);
            self
        }

        pub fn priority(mut self, priority: i32) -> Self {
            self.priority = priority;
            self
        }

        pub fn max_retries(mut self, max_retries: u32) -> Self {
            self.max_retries = max_retries;
            self
        }

        pub fn created_at_ms(mut self, now_ms: u64) -> Self {
            self.now_ms = now_ms;
            self
        }

        pub fn build(self) -> Job {
            let target = self.target.unwrap_or_else(|| {
                Target::new(
                    TargetKind::Collection,
                    Guid::random(EntityKind::Collection),
                    "test-collection",
                )
            });
            Job::new(
                Guid::random(EntityKind::Job),
                self.team_guid,
                self.tool,
                target,
                self.priority,
                self.max_retries,
                self.now_ms,
            )
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
