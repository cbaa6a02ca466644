// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ap-server: the control plane (`apd`).
//!
//! HTTP handlers are thin; the behavior lives in plain functions over
//! [`storage::ServerState`] so dispatch, liveness, uploads, and
//! retention are testable without a socket. State is one mutex — the
//! claim path's lock-select-mutate is this server's `SKIP LOCKED`.

pub mod app;
pub mod auth;
pub mod dispatcher;
pub mod error;
pub mod liveness;
pub mod results;
pub mod retention;
pub mod routes;
pub mod storage;
pub mod uploads;

pub use app::{AppState, ServerConfig};
pub use error::HttpError;
pub use storage::{RegistrationToken, ServerState, TeamRecord, UploadSession};
