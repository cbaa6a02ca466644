// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent configuration file.
//!
//! TOML at `<home>/agent.toml`, written by `ap register` and loaded once
//! at startup; everything downstream borrows the loaded value.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ap_core::Guid;
use serde::{Deserialize, Serialize};

/// Default poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default heartbeat interval in seconds.
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("agent is not registered (no config at {0})")]
    NotRegistered(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config encode error: {0}")]
    Encode(#[from] toml::ser::Error),
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_heartbeat_interval() -> u64 {
    DEFAULT_HEARTBEAT_INTERVAL_SECS
}

/// Persistent agent identity and behavior knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub server_url: String,
    pub api_key: String,
    pub agent_guid: Guid,
    pub team_guid: Guid,
    pub name: String,
    /// Absolute paths local-filesystem targets must lie under.
    #[serde(default)]
    pub authorized_roots: Vec<PathBuf>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,
}

impl AgentConfig {
    /// Default agent home: `~/.aperture-agent`.
    pub fn default_home() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".aperture-agent")
    }

    pub fn path_in(home: &Path) -> PathBuf {
        home.join("agent.toml")
    }

    /// Load from the agent home; a missing file means not registered.
    pub fn load(home: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_in(home);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::NotRegistered(path))
            }
            Err(err) => return Err(err.into()),
        };
        Ok(toml::from_str(&raw)?)
    }

    /// Persist to the agent home (write-temp + rename).
    pub fn save(&self, home: &Path) -> Result<(), ConfigError> {
        fs::create_dir_all(home)?;
        let path = Self::path_in(home);
        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, toml::to_string_pretty(self)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
