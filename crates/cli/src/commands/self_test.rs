// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ap self-test` — one status line per environment check.

use std::path::Path;

use ap_adapters::CredentialStore;
use ap_agent::selftest;

use crate::exit_error::ExitError;
use crate::output;

pub async fn run(home: &Path) -> Result<(), ExitError> {
    let (config, client) = super::client_for(home)?;
    let vault = CredentialStore::new(home);

    let outcomes = selftest::run_all(&client, &config, &vault).await;
    let mut passed = 0;
    let mut failed = 0;
    for outcome in &outcomes {
        output::status_line(outcome.ok, outcome.name, &outcome.detail);
        if outcome.ok {
            passed += 1;
        } else {
            failed += 1;
        }
    }

    if output::summary(passed, failed) {
        Ok(())
    } else {
        Err(ExitError::new(2, format!("{failed} self-test check(s) failed")))
    }
}
