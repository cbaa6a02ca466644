// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ap sync` — refresh server-side knowledge of this agent: one
//! heartbeat with fresh capabilities plus a capability report per
//! vaulted connector.

use std::path::Path;

use ap_adapters::CredentialStore;
use ap_agent::client::ServerApi;
use ap_agent::metrics;
use ap_wire::HeartbeatRequest;

use crate::color;
use crate::exit_error::ExitError;

pub async fn run(home: &Path) -> Result<(), ExitError> {
    let (config, client) = super::client_for(home)?;
    let vault = CredentialStore::new(home);
    let capabilities = super::advertised_capabilities(&config, &vault);

    let team_config = client.fetch_team_config().await?;
    println!(
        "team config: {} photo / {} metadata extension(s), pipeline {}",
        team_config.photo_extensions.len(),
        team_config.metadata_extensions.len(),
        team_config.default_pipeline.as_deref().unwrap_or("-")
    );

    client
        .heartbeat(&HeartbeatRequest {
            capabilities: capabilities.clone(),
            authorized_roots: config.authorized_roots.clone(),
            metrics: metrics::collect(),
        })
        .await?;
    println!("{} heartbeat sent ({} capabilities)", color::ok("ok"), capabilities.len());

    let connectors = vault
        .list()
        .map_err(|err| ExitError::new(4, format!("vault: {err}")))?;
    for connector in connectors {
        // Capability reports are best effort; a failure is a warning.
        match client.report_connector_capability(&connector, true).await {
            Ok(response) if response.credential_location_updated => {
                println!("{} {connector} marked agent-held", color::ok("ok"));
            }
            Ok(_) => println!("{} {connector} already up to date", color::ok("ok")),
            Err(err) => {
                println!("{} {connector}: {err}", color::warn("warn"));
            }
        }
    }
    Ok(())
}
