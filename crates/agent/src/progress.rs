// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coalescing progress reporter.
//!
//! Contract: at most one report in flight, at most one queued. A queued
//! report is replaced by newer ones, so intermediates are dropped but
//! order is never inverted. API errors are logged and swallowed — a
//! progress hiccup must not fail the job.

use std::sync::Arc;
use std::time::Duration;

use ap_core::{Guid, Progress};
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::client::ServerApi;

/// Minimum spacing between sends.
pub const MIN_REPORT_INTERVAL: Duration = Duration::from_secs(1);

struct State {
    last_send_at: Option<Instant>,
    in_flight: bool,
    pending: Option<Progress>,
    drain_scheduled: bool,
    closed: bool,
}

struct Inner<A> {
    api: Arc<A>,
    job: Guid,
    min_interval: Duration,
    state: Mutex<State>,
}

/// Rate-limited progress channel for one job execution.
pub struct ProgressReporter<A: ServerApi + 'static> {
    inner: Arc<Inner<A>>,
}

impl<A: ServerApi + 'static> ProgressReporter<A> {
    pub fn new(api: Arc<A>, job: Guid) -> Self {
        Self::with_interval(api, job, MIN_REPORT_INTERVAL)
    }

    pub fn with_interval(api: Arc<A>, job: Guid, min_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                job,
                min_interval,
                state: Mutex::new(State {
                    last_send_at: None,
                    in_flight: false,
                    pending: None,
                    drain_scheduled: false,
                    closed: false,
                }),
            }),
        }
    }

    /// Queue or send one report. Never blocks on the network.
    pub fn report(&self, progress: Progress) {
        let mut state = self.inner.state.lock();
        if state.closed {
            return;
        }
        let now = Instant::now();
        let due = state
            .last_send_at
            .map_or(true, |last| now.duration_since(last) >= self.inner.min_interval);

        if due && !state.in_flight {
            state.in_flight = true;
            state.last_send_at = Some(now);
            drop(state);
            tokio::spawn(send(self.inner.clone(), progress));
        } else {
            // Replace any queued report with the latest.
            state.pending = Some(progress);
            if !state.drain_scheduled {
                state.drain_scheduled = true;
                drop(state);
                tokio::spawn(drain(self.inner.clone()));
            }
        }
    }

    /// Stop the reporter and flush any queued report synchronously
    /// (best effort; errors swallowed).
    pub async fn close(&self) {
        let pending = {
            let mut state = self.inner.state.lock();
            state.closed = true;
            state.pending.take()
        };
        if let Some(progress) = pending {
            if let Err(err) = self.inner.api.report_progress(&self.inner.job, &progress).await {
                tracing::warn!("final progress report failed: {err}");
            }
        }
    }
}

async fn send<A: ServerApi>(inner: Arc<Inner<A>>, progress: Progress) {
    if let Err(err) = inner.api.report_progress(&inner.job, &progress).await {
        tracing::warn!("progress report failed: {err}");
    }
    inner.state.lock().in_flight = false;
}

/// Background task that flushes the pending slot once the interval
/// allows, then exits when there is nothing left to do.
async fn drain<A: ServerApi>(inner: Arc<Inner<A>>) {
    loop {
        let wait = {
            let mut state = inner.state.lock();
            if state.closed || state.pending.is_none() {
                // Unschedule under the same lock that observed "nothing
                // to do" so a racing report() sees a consistent picture.
                state.drain_scheduled = false;
                return;
            }
            match state.last_send_at {
                Some(last) => (last + inner.min_interval).saturating_duration_since(Instant::now()),
                None => Duration::ZERO,
            }
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        let progress = {
            let mut state = inner.state.lock();
            if state.closed {
                state.drain_scheduled = false;
                return;
            }
            if state.in_flight {
                // A send is still running; come back shortly.
                drop(state);
                tokio::time::sleep(Duration::from_millis(10)).await;
                continue;
            }
            let Some(progress) = state.pending.take() else {
                state.drain_scheduled = false;
                return;
            };
            state.in_flight = true;
            state.last_send_at = Some(Instant::now());
            progress
        };

        if let Err(err) = inner.api.report_progress(&inner.job, &progress).await {
            tracing::warn!("progress report failed: {err}");
        }
        inner.state.lock().in_flight = false;
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
