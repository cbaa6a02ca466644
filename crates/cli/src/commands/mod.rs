// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations.

pub mod connectors;
pub mod register;
pub mod run;
pub mod self_test;
pub mod sync;
pub mod update;

use std::path::Path;

use ap_agent::{AgentConfig, HttpClient};

use crate::exit_error::ExitError;

/// Load the saved config and build an authenticated client.
pub(crate) fn client_for(home: &Path) -> Result<(AgentConfig, HttpClient), ExitError> {
    let config = AgentConfig::load(home)?;
    let client = HttpClient::new(config.server_url.clone(), config.api_key.clone());
    Ok((config, client))
}

/// Capabilities this agent advertises: every tool, local filesystem,
/// and one entry per vaulted connector.
pub(crate) fn advertised_capabilities(
    config: &AgentConfig,
    vault: &ap_adapters::CredentialStore,
) -> Vec<ap_core::Capability> {
    let mut capabilities = vec![
        ap_core::Capability::tool("photostats", "1.0"),
        ap_core::Capability::tool("photo_pairing", "1.0"),
        ap_core::Capability::tool("pipeline_validation", "1.0"),
    ];
    if !config.authorized_roots.is_empty() {
        capabilities.push(ap_core::Capability::LocalFilesystem);
    }
    if let Ok(connectors) = vault.list() {
        capabilities.extend(connectors.into_iter().map(ap_core::Capability::connector));
    }
    capabilities
}
