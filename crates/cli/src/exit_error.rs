// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.
//!
//! Codes: 1 usage, 2 connection/authentication, 3 precondition (e.g.
//! not registered), 4 fatal runtime (failure threshold).

use std::fmt;

use ap_agent::{client::ClientError, config::ConfigError};

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(1, message)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<ClientError> for ExitError {
    fn from(err: ClientError) -> Self {
        match &err {
            // Transport and auth problems share exit code 2.
            ClientError::Connection(_)
            | ClientError::Revoked
            | ClientError::AuthRejected(_) => Self::connection(err.to_string()),
            _ => Self::usage(err.to_string()),
        }
    }
}

impl From<ConfigError> for ExitError {
    fn from(err: ConfigError) -> Self {
        match &err {
            ConfigError::NotRegistered(_) => {
                Self::precondition(format!("{err}; run `ap register` first"))
            }
            _ => Self::usage(err.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
