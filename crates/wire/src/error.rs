// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error body shared by every endpoint.

use serde::{Deserialize, Serialize};

/// JSON body of non-2xx responses: `{"detail": "..."}`.
///
/// The detail string is specific enough for client-side retry policy
/// decisions (`"revoked"`, `"checksum mismatch"`, `"prefix mismatch"`, …).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub detail: String,
}

impl ApiErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self { detail: detail.into() }
    }
}
