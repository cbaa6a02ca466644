// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ap-core: Domain types shared by the Aperture agent and control server.

pub mod macros;

pub mod agent;
pub mod capability;
pub mod clock;
pub mod collection;
pub mod command;
pub mod config;
pub mod connector;
pub mod guid;
pub mod job;
pub mod result;
pub mod retention;
pub mod signing;
pub mod target;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use agent::{AgentIdentity, AgentMetrics, AgentRuntime, AgentStatus};
pub use capability::Capability;
pub use clock::{Clock, FakeClock, SystemClock};
pub use collection::{Collection, CollectionKind, CollectionState};
pub use command::AgentCommand;
pub use config::{CameraMapping, TeamConfig};
pub use connector::{Connector, ConnectorKind, CredentialField, CredentialLocation};
pub use guid::{EntityKind, Guid, GuidError, GUID_LEN};
#[cfg(any(test, feature = "test-support"))]
pub use job::JobBuilder;
pub use job::{Job, JobStatus, Progress, ToolKind, TransitionError};
pub use result::{AnalysisResult, ResultStatus};
pub use retention::{RetentionError, RetentionPolicy, RetentionUpdate};
pub use signing::{canonical_json, sign, verify, SigningError};
pub use target::{Target, TargetKind};
