// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent self-test: environment checks behind `ap self-test`.
//!
//! Each check is independent and reports one status line; the command
//! exits nonzero when any check fails.

use ap_adapters::{
    ConnectorCredentials, CredentialStore, LocalAdapter, SmbCredentials, StorageAdapter,
};
use ap_core::{EntityKind, Guid, TeamConfig, ToolKind};

use crate::client::ServerApi;
use crate::config::AgentConfig;
use crate::tools::ToolRegistry;

/// Result of one self-test check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub ok: bool,
    pub detail: String,
}

impl CheckOutcome {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self { name, ok: true, detail: detail.into() }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self { name, ok: false, detail: detail.into() }
    }
}

/// Run every check. Never short-circuits; operators want the full list.
pub async fn run_all(
    api: &impl ServerApi,
    config: &AgentConfig,
    vault: &CredentialStore,
) -> Vec<CheckOutcome> {
    vec![
        check_config(config),
        check_server(api).await,
        check_vault(vault),
        check_roots(config).await,
        check_tools(),
    ]
}

fn check_config(config: &AgentConfig) -> CheckOutcome {
    CheckOutcome::pass(
        "config",
        format!("registered as {} against {}", config.name, config.server_url),
    )
}

async fn check_server(api: &impl ServerApi) -> CheckOutcome {
    match api.server_version().await {
        Ok(version) => CheckOutcome::pass("server", format!("reachable, version {}", version.version)),
        Err(err) => CheckOutcome::fail("server", err.to_string()),
    }
}

/// Store, read back, and delete a probe credential.
fn check_vault(vault: &CredentialStore) -> CheckOutcome {
    let probe = Guid::random(EntityKind::Connector);
    let creds = ConnectorCredentials::Smb(SmbCredentials {
        server: "self-test".into(),
        username: "probe".into(),
        password: "probe".into(),
        domain: None,
    });
    let round_trip = vault
        .store(&probe, &creds, None)
        .and_then(|()| vault.get(&probe))
        .map(|read| read.as_ref() == Some(&creds));
    let _ = vault.delete(&probe);

    match round_trip {
        Ok(true) => CheckOutcome::pass("vault", "encrypt/decrypt round-trip OK"),
        Ok(false) => CheckOutcome::fail("vault", "read back different credentials"),
        Err(err) => CheckOutcome::fail("vault", err.to_string()),
    }
}

async fn check_roots(config: &AgentConfig) -> CheckOutcome {
    if config.authorized_roots.is_empty() {
        return CheckOutcome::pass("roots", "no authorized roots configured (remote-only agent)");
    }
    let adapter = LocalAdapter::new(config.authorized_roots.clone());
    let (ok, detail) = adapter.test_connection().await;
    if ok {
        CheckOutcome::pass("roots", detail)
    } else {
        CheckOutcome::fail("roots", detail)
    }
}

fn check_tools() -> CheckOutcome {
    let registry = ToolRegistry;
    let config = TeamConfig::default();
    for kind in [ToolKind::Photostats, ToolKind::PhotoPairing, ToolKind::PipelineValidation] {
        let outcome = registry.get(kind).run(&[], &config);
        if outcome.files_scanned != 0 {
            return CheckOutcome::fail("tools", format!("{kind} misbehaved on empty input"));
        }
    }
    CheckOutcome::pass("tools", "3 tools registered")
}

#[cfg(test)]
#[path = "selftest_tests.rs"]
mod tests;
