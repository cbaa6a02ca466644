// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability strings advertised by agents.
//!
//! Agents report what they can do on every heartbeat and claim:
//! `tool:<name>:<version>`, `connector:<guid>`, `local_filesystem`.
//! Anything else is carried verbatim as [`Capability::Unknown`] so old
//! servers and new agents can coexist — unknown is data, not an error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::guid::{EntityKind, Guid};
use crate::job::ToolKind;

/// One advertised agent capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Can run a tool at a given version, e.g. `tool:photostats:1.0`.
    Tool { name: String, version: String },
    /// Holds credentials for a connector, e.g. `connector:con_…`.
    Connector(Guid),
    /// Can scan local paths under its authorized roots.
    LocalFilesystem,
    /// Unrecognized capability, preserved as-is.
    Unknown(String),
}

impl Capability {
    pub fn tool(name: impl Into<String>, version: impl Into<String>) -> Self {
        Capability::Tool { name: name.into(), version: version.into() }
    }

    pub fn connector(guid: Guid) -> Self {
        Capability::Connector(guid)
    }

    /// True when this capability covers the given tool kind (any version).
    pub fn covers_tool(&self, tool: ToolKind) -> bool {
        matches!(self, Capability::Tool { name, .. } if name == tool.as_str())
    }

    /// True when this capability declares credentials for the connector.
    pub fn covers_connector(&self, guid: &Guid) -> bool {
        matches!(self, Capability::Connector(g) if g == guid)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Tool { name, version } => write!(f, "tool:{name}:{version}"),
            Capability::Connector(guid) => write!(f, "connector:{guid}"),
            Capability::LocalFilesystem => f.write_str("local_filesystem"),
            Capability::Unknown(s) => f.write_str(s),
        }
    }
}

impl FromStr for Capability {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "local_filesystem" {
            return Ok(Capability::LocalFilesystem);
        }
        if let Some(rest) = s.strip_prefix("tool:") {
            if let Some((name, version)) = rest.split_once(':') {
                if !name.is_empty() && !version.is_empty() {
                    return Ok(Capability::tool(name, version));
                }
            }
        }
        if let Some(rest) = s.strip_prefix("connector:") {
            if let Ok(guid) = Guid::parse_expected(EntityKind::Connector, rest) {
                return Ok(Capability::Connector(guid));
            }
        }
        Ok(Capability::Unknown(s.to_string()))
    }
}

impl Serialize for Capability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Capability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        // Infallible: unrecognized strings become Capability::Unknown.
        Ok(s.parse().unwrap_or(Capability::Unknown(s)))
    }
}

#[cfg(test)]
#[path = "capability_tests.rs"]
mod tests;
