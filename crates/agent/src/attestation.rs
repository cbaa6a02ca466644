// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Binary attestation for registration.
//!
//! The agent hashes its own executable and sends the digest with its
//! platform string at registration; the server compares against
//! known-good releases.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// What the agent attests about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attestation {
    /// 64 hex chars: SHA-256 of the running executable.
    pub checksum: String,
    /// `<os>-<arch>`, e.g. `linux-x86_64`.
    pub platform: String,
}

/// Attestation of the currently running binary.
pub fn current() -> io::Result<Attestation> {
    let exe = std::env::current_exe()?;
    Ok(Attestation { checksum: hash_file(&exe)?, platform: platform() })
}

/// Platform string reported at registration.
pub fn platform() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

/// Streaming SHA-256 of a file.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
#[path = "attestation_tests.rs"]
mod tests;
