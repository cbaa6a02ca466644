// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ap` — the Aperture agent CLI.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod color;
mod commands;
mod exit_error;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use exit_error::ExitError;

#[derive(Parser, Debug)]
#[command(name = "ap", about = "Aperture analysis agent", version)]
struct Cli {
    /// Agent home directory (config, vault, caches).
    #[arg(long, env = "AP_AGENT_HOME")]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register this host with the control server.
    Register {
        /// Control server base URL.
        #[arg(long)]
        server: String,
        /// Single-use registration token from the operator.
        #[arg(long)]
        token: String,
        /// Agent display name.
        #[arg(long)]
        name: String,
        /// Authorized local roots (repeatable).
        #[arg(long = "root")]
        roots: Vec<PathBuf>,
    },
    /// Run the polling loop until shutdown.
    Run,
    /// Refresh team config and re-report connector capabilities.
    Sync,
    /// Test access to a local path or a connector.
    Test {
        /// Local directory to test against the authorized roots.
        #[arg(long, conflicts_with = "connector")]
        path: Option<PathBuf>,
        /// Connector GUID to test with vault credentials.
        #[arg(long)]
        connector: Option<String>,
    },
    /// Check the agent environment end to end.
    #[command(name = "self-test")]
    SelfTest,
    /// Manage connector credentials in the local vault.
    Connectors {
        #[command(subcommand)]
        command: commands::connectors::ConnectorCommand,
    },
    /// Check for a newer agent release.
    Update,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version print normally; real parse errors are
            // argument errors (exit 1).
            if err.use_stderr() {
                eprintln!("{err}");
                std::process::exit(1);
            }
            let _ = err.print();
            std::process::exit(0);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let home = cli.home.unwrap_or_else(ap_agent::AgentConfig::default_home);
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("{}", color::err(&format!("runtime: {err}")));
            std::process::exit(4);
        }
    };

    let outcome: Result<(), ExitError> = runtime.block_on(async {
        match cli.command {
            Command::Register { server, token, name, roots } => {
                commands::register::run(&home, &server, &token, &name, roots).await
            }
            Command::Run => commands::run::run(&home).await,
            Command::Sync => commands::sync::run(&home).await,
            Command::Test { path, connector } => {
                commands::test::run(&home, path, connector).await
            }
            Command::SelfTest => commands::self_test::run(&home).await,
            Command::Connectors { command } => commands::connectors::run(&home, command).await,
            Command::Update => commands::update::run(&home).await,
        }
    });

    match outcome {
        Ok(()) => {}
        Err(err) => {
            eprintln!("{}", color::err(&err.message));
            std::process::exit(err.code);
        }
    }
}
