// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ap connectors` — manage the local credential vault.
//!
//! Credential values never leave this host; the server only learns
//! "this agent holds credentials" via capability reports, and those are
//! warnings when they fail, never hard errors.

use std::collections::HashMap;
use std::path::Path;

use ap_adapters::{ConnectorCredentials, CredentialStore};
use ap_agent::client::ServerApi;
use ap_core::{EntityKind, Guid};
use clap::Subcommand;

use crate::color;
use crate::exit_error::ExitError;
use crate::output;

#[derive(Subcommand, Debug)]
pub enum ConnectorCommand {
    /// Connectors with credentials in the local vault.
    List,
    /// Store credentials for a connector.
    Configure {
        /// Connector GUID (`con_…`).
        guid: String,
        /// Credential fields as `key=value` (repeatable).
        #[arg(short = 'f', long = "field")]
        fields: Vec<String>,
    },
    /// Probe a connector with its stored credentials.
    Test {
        guid: String,
    },
    /// Delete stored credentials.
    Remove {
        guid: String,
    },
    /// Show stored metadata (never values).
    Show {
        guid: String,
    },
}

pub async fn run(home: &Path, command: ConnectorCommand) -> Result<(), ExitError> {
    match command {
        ConnectorCommand::List => list(home),
        ConnectorCommand::Configure { guid, fields } => configure(home, &guid, fields).await,
        ConnectorCommand::Test { guid } => super::test::run(home, None, Some(guid)).await,
        ConnectorCommand::Remove { guid } => remove(home, &guid).await,
        ConnectorCommand::Show { guid } => show(home, &guid),
    }
}

fn parse_guid(raw: &str) -> Result<Guid, ExitError> {
    Guid::parse_expected(EntityKind::Connector, raw)
        .map_err(|err| ExitError::usage(err.to_string()))
}

fn list(home: &Path) -> Result<(), ExitError> {
    let vault = CredentialStore::new(home);
    let connectors =
        vault.list().map_err(|err| ExitError::new(4, format!("vault: {err}")))?;
    if connectors.is_empty() {
        println!("no connector credentials stored");
        return Ok(());
    }
    for guid in connectors {
        let kind = vault
            .get(&guid)
            .ok()
            .flatten()
            .map(|creds| creds.kind().to_string())
            .unwrap_or_else(|| "unreadable".to_string());
        println!("{guid}  {kind}");
    }
    Ok(())
}

async fn configure(home: &Path, raw: &str, fields: Vec<String>) -> Result<(), ExitError> {
    let guid = parse_guid(raw)?;
    let (_config, client) = super::client_for(home)?;

    // The server's schema drives validation before anything is stored.
    let connector = client.fetch_connector(&guid).await?;
    let mut values: HashMap<String, String> = HashMap::new();
    for field in &fields {
        let (key, value) = field.split_once('=').ok_or_else(|| {
            ExitError::usage(format!("field must be key=value, got: {field}"))
        })?;
        values.insert(key.to_string(), value.to_string());
    }

    let missing = connector.missing_required(|name| values.contains_key(name));
    if !missing.is_empty() {
        return Err(ExitError::usage(format!(
            "missing required field(s) for {}: {}",
            connector.name,
            missing.join(", ")
        )));
    }

    let creds =
        ConnectorCredentials::from_fields(connector.kind, |name| values.get(name).cloned())
            .map_err(|err| ExitError::usage(err.to_string()))?;

    let vault = CredentialStore::new(home);
    vault
        .store(
            &guid,
            &creds,
            Some(serde_json::json!({"connector_name": connector.name})),
        )
        .map_err(|err| ExitError::new(4, format!("vault: {err}")))?;
    output::status_line(true, "stored", &format!("{} ({})", connector.name, creds.kind()));

    // Best effort; the next heartbeat repeats the capability anyway.
    match client.report_connector_capability(&guid, true).await {
        Ok(_) => output::status_line(true, "reported", "capability sent to server"),
        Err(err) => println!("{} capability report failed: {err}", color::warn("warn")),
    }
    Ok(())
}

async fn remove(home: &Path, raw: &str) -> Result<(), ExitError> {
    let guid = parse_guid(raw)?;
    let vault = CredentialStore::new(home);
    vault.delete(&guid).map_err(|err| ExitError::new(4, format!("vault: {err}")))?;
    output::status_line(true, "removed", &guid.to_string());

    if let Ok((_, client)) = super::client_for(home) {
        if let Err(err) = client.report_connector_capability(&guid, false).await {
            println!("{} capability report failed: {err}", color::warn("warn"));
        }
    }
    Ok(())
}

fn show(home: &Path, raw: &str) -> Result<(), ExitError> {
    let guid = parse_guid(raw)?;
    let vault = CredentialStore::new(home);
    let creds = vault
        .get(&guid)
        .map_err(|err| ExitError::new(4, format!("vault: {err}")))?
        .ok_or_else(|| ExitError::precondition(format!("no stored credentials for {guid}")))?;

    println!("connector : {guid}");
    println!("type      : {}", creds.kind());
    println!("fields    : {}", creds.field_names().join(", "));
    if let Ok(Some(metadata)) = vault.get_metadata(&guid) {
        println!("metadata  : {metadata}");
    }
    Ok(())
}
