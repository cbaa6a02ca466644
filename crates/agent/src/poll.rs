// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The polling loop: a single-threaded cooperative scheduler.
//!
//! One job executes at a time. Shutdown and job cancellation are two
//! separate flags: shutdown unblocks the poll wait and ends the loop at
//! the next iteration boundary; cancellation only ever targets the
//! currently executing job and never interrupts the wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ap_core::{Capability, Guid};
use ap_wire::ClaimRequest;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::client::{ClientError, ServerApi};
use crate::executor::JobExecutor;

/// Consecutive claim failures before the loop gives up.
pub const MAX_POLL_FAILURES: u32 = 10;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Shutdown was requested.
    Clean,
    /// The server reports this agent as revoked.
    Revoked,
    /// The server rejected our credentials.
    AuthRejected,
    /// Too many consecutive connection failures.
    FailureThreshold,
}

impl ExitStatus {
    /// Process exit code for this outcome.
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Clean => 0,
            ExitStatus::Revoked => 2,
            ExitStatus::AuthRejected => 3,
            ExitStatus::FailureThreshold => 4,
        }
    }
}

ap_core::simple_display! {
    ExitStatus {
        Clean => "clean shutdown",
        Revoked => "agent revoked",
        AuthRejected => "authentication rejected",
        FailureThreshold => "consecutive failure threshold exceeded",
    }
}

/// Cooperative cancellation flag checked at executor check points.
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Shared handle for signaling the loop from other tasks (heartbeat,
/// signal handlers).
#[derive(Clone)]
pub struct LoopHandle {
    shutdown: CancellationToken,
    cancel: Arc<CancelFlag>,
    current: Arc<Mutex<Option<Guid>>>,
}

impl LoopHandle {
    pub fn new() -> Self {
        Self {
            shutdown: CancellationToken::new(),
            cancel: Arc::new(CancelFlag::default()),
            current: Arc::new(Mutex::new(None)),
        }
    }

    /// Idempotent; unblocks any poll wait.
    pub fn request_shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Signal the executor if (and only if) `job` is currently running.
    /// Returns whether the signal was delivered.
    pub fn request_job_cancellation(&self, job: &Guid) -> bool {
        let current = self.current.lock();
        match current.as_ref() {
            Some(running) if running == job => {
                self.cancel.set();
                true
            }
            _ => false,
        }
    }

    /// The job being executed, if any.
    pub fn current_job(&self) -> Option<Guid> {
        *self.current.lock()
    }

    pub(crate) fn cancel_flag(&self) -> Arc<CancelFlag> {
        self.cancel.clone()
    }

    #[cfg(test)]
    pub(crate) fn set_current_for_test(&self, job: Option<Guid>) {
        *self.current.lock() = job;
    }

    pub(crate) fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

impl Default for LoopHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Claims, executes, and finalizes one job at a time.
pub struct PollingLoop<A: ServerApi + 'static> {
    api: Arc<A>,
    executor: JobExecutor<A>,
    capabilities: Vec<Capability>,
    poll_interval: Duration,
    max_poll_failures: u32,
    handle: LoopHandle,
}

impl<A: ServerApi + 'static> PollingLoop<A> {
    pub fn new(
        api: Arc<A>,
        executor: JobExecutor<A>,
        capabilities: Vec<Capability>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            api,
            executor,
            capabilities,
            poll_interval,
            max_poll_failures: MAX_POLL_FAILURES,
            handle: LoopHandle::new(),
        }
    }

    #[cfg(test)]
    pub fn with_max_failures(mut self, max: u32) -> Self {
        self.max_poll_failures = max;
        self
    }

    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    /// Block until shutdown or a terminal condition.
    pub async fn run(&self) -> ExitStatus {
        let cancel = self.handle.cancel_flag();
        let mut failures: u32 = 0;

        loop {
            if self.handle.is_shutdown_requested() {
                return ExitStatus::Clean;
            }

            let request = ClaimRequest { capabilities: self.capabilities.clone() };
            match self.api.claim_job(&request).await {
                Ok(Some(claim)) => {
                    failures = 0;
                    let job_guid = claim.job.guid;
                    tracing::info!("claimed {job_guid} tool={}", claim.job.tool);
                    *self.handle.current.lock() = Some(job_guid);
                    cancel.clear();

                    // A failing job must never take the loop down with it;
                    // execute() reports its own outcome and returns.
                    self.executor.execute(claim, &cancel).await;

                    *self.handle.current.lock() = None;
                    cancel.clear();
                    // Drain available work before sleeping again.
                }
                Ok(None) => {
                    failures = 0;
                    self.wait_for_next_poll().await;
                }
                Err(ClientError::Revoked) => {
                    tracing::error!("server reports agent revoked; stopping");
                    return ExitStatus::Revoked;
                }
                Err(ClientError::AuthRejected(detail)) => {
                    tracing::error!("authentication rejected: {detail}; stopping");
                    return ExitStatus::AuthRejected;
                }
                Err(err) => {
                    failures += 1;
                    tracing::warn!(
                        "claim failed ({failures}/{}): {err}",
                        self.max_poll_failures
                    );
                    if failures >= self.max_poll_failures {
                        return ExitStatus::FailureThreshold;
                    }
                    self.wait_for_next_poll().await;
                }
            }
        }
    }

    /// Sleep one poll interval; returns early only on shutdown.
    /// Job cancellation does not interrupt the wait.
    async fn wait_for_next_poll(&self) {
        tokio::select! {
            _ = tokio::time::sleep(self.poll_interval) => {}
            _ = self.handle.shutdown.cancelled() => {}
        }
    }
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
