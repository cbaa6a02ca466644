// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-team retention policy.
//!
//! Day values come from a fixed option set (0 = unlimited); the sweep in
//! the server applies them. `preserve_per_collection` bounds how many
//! recent results per (target, tool) survive a sweep regardless of age.

use serde::{Deserialize, Serialize};

/// Allowed day options for retention periods.
pub const VALID_RETENTION_DAYS: &[u32] = &[0, 1, 2, 5, 7, 14, 30, 90, 180, 365];

/// Allowed preserve-count options.
pub const VALID_PRESERVE_COUNTS: &[u32] = &[1, 2, 3, 5, 10];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetentionError {
    #[error("invalid retention days {0}; allowed: {VALID_RETENTION_DAYS:?}")]
    InvalidDays(u32),
    #[error("invalid preserve count {0}; allowed: {VALID_PRESERVE_COUNTS:?}")]
    InvalidPreserveCount(u32),
}

/// Team retention settings, all fields bounded to their option sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Days to retain completed jobs (0 = unlimited).
    pub job_completed_days: u32,
    /// Days to retain failed jobs (0 = unlimited).
    pub job_failed_days: u32,
    /// Days to retain completed results (0 = unlimited).
    pub result_completed_days: u32,
    /// Minimum results to keep per (target, tool) combination.
    pub preserve_per_collection: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            job_completed_days: 2,
            job_failed_days: 7,
            result_completed_days: 0,
            preserve_per_collection: 1,
        }
    }
}

/// Partial update; only provided fields change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_completed_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_failed_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_completed_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserve_per_collection: Option<u32>,
}

impl RetentionPolicy {
    /// Apply a partial update, validating every provided value.
    pub fn apply(&mut self, update: RetentionUpdate) -> Result<(), RetentionError> {
        for days in [
            update.job_completed_days,
            update.job_failed_days,
            update.result_completed_days,
        ]
        .into_iter()
        .flatten()
        {
            if !VALID_RETENTION_DAYS.contains(&days) {
                return Err(RetentionError::InvalidDays(days));
            }
        }
        if let Some(count) = update.preserve_per_collection {
            if !VALID_PRESERVE_COUNTS.contains(&count) {
                return Err(RetentionError::InvalidPreserveCount(count));
            }
        }

        if let Some(v) = update.job_completed_days {
            self.job_completed_days = v;
        }
        if let Some(v) = update.job_failed_days {
            self.job_failed_days = v;
        }
        if let Some(v) = update.result_completed_days {
            self.result_completed_days = v;
        }
        if let Some(v) = update.preserve_per_collection {
            self.preserve_per_collection = v;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;
