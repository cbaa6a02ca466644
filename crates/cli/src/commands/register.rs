// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ap register` — enroll this host with the control server.

use std::path::{Path, PathBuf};

use ap_agent::client::ServerApi;
use ap_agent::{attestation, AgentConfig, HttpClient};
use ap_wire::RegisterRequest;

use crate::color;
use crate::exit_error::ExitError;

pub async fn run(
    home: &Path,
    server: &str,
    token: &str,
    name: &str,
    roots: Vec<PathBuf>,
) -> Result<(), ExitError> {
    if AgentConfig::load(home).is_ok() {
        return Err(ExitError::precondition(format!(
            "already registered (config exists under {})",
            home.display()
        )));
    }

    let attestation = attestation::current()
        .map_err(|err| ExitError::new(4, format!("cannot attest binary: {err}")))?;

    let client = HttpClient::new(server, "");
    let response = client
        .register(&RegisterRequest {
            name: name.to_string(),
            token: token.to_string(),
            platform: attestation.platform.clone(),
            checksum: attestation.checksum.clone(),
            capabilities: Vec::new(),
        })
        .await?;

    let config = AgentConfig {
        server_url: server.trim_end_matches('/').to_string(),
        api_key: response.api_key.clone(),
        agent_guid: response.guid,
        team_guid: response.team_guid,
        name: response.name.clone(),
        authorized_roots: roots,
        poll_interval_secs: ap_agent::config::DEFAULT_POLL_INTERVAL_SECS,
        heartbeat_interval_secs: ap_agent::config::DEFAULT_HEARTBEAT_INTERVAL_SECS,
    };
    config
        .save(home)
        .map_err(|err| ExitError::new(4, format!("cannot save config: {err}")))?;

    println!("{} registered as {} ({})", color::ok("ok"), response.name, response.guid);
    println!("platform {}  checksum {}", attestation.platform, &attestation.checksum[..12]);
    Ok(())
}
