// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded exponential backoff for transient adapter failures.

use std::future::Future;
use std::time::Duration;

use crate::AdapterError;

/// Retry policy: `max_attempts` tries total, backoff doubling from
/// `initial_backoff` between them. Only transient errors are retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, initial_backoff: Duration::from_secs(1) }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (0-based): 1 s, 2 s, 4 s, …
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff * 2u32.saturating_pow(attempt)
    }

    /// Run `op` until it succeeds, fails terminally, or runs out of
    /// attempts. Terminal errors pass through untouched.
    pub async fn run<T, Fut>(
        &self,
        what: &str,
        mut op: impl FnMut() -> Fut,
    ) -> Result<T, AdapterError>
    where
        Fut: Future<Output = Result<T, AdapterError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Err(err) if err.is_transient() && attempt + 1 < self.max_attempts => {
                    let backoff = self.backoff(attempt);
                    tracing::warn!(
                        "{what} attempt {} failed, retrying in {:?}: {err}",
                        attempt + 1,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
