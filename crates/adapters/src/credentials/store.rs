// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Encrypted on-disk credential vault.
//!
//! Layout under the agent home:
//!
//! ```text
//! <base>/
//!   master.key          32 random bytes, mode 0600
//!   credentials/
//!     <connector_guid>.blob   AES-256-GCM: 12-byte nonce || ciphertext
//! ```
//!
//! The plaintext is the canonical JSON of `{connector_guid, credentials,
//! metadata, stored_at}`. The master key is generated lazily on first
//! store and never rotated here — rotation is an operator procedure
//! (decrypt all, re-encrypt all).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use ap_core::{canonical_json, EntityKind, Guid};
use rand::RngCore;
use serde_json::{json, Value};

use super::ConnectorCredentials;

const MASTER_KEY_FILE: &str = "master.key";
const CREDENTIALS_DIR: &str = "credentials";
const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("not a connector GUID: {0}")]
    NotAConnector(Guid),
    #[error("master key is corrupt (wrong length)")]
    BadMasterKey,
    #[error("encryption failure")]
    Crypto,
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Agent-local encrypted storage for connector credentials.
pub struct CredentialStore {
    base_dir: PathBuf,
}

impl CredentialStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    pub fn master_key_path(&self) -> PathBuf {
        self.base_dir.join(MASTER_KEY_FILE)
    }

    fn credentials_dir(&self) -> PathBuf {
        self.base_dir.join(CREDENTIALS_DIR)
    }

    fn blob_path(&self, connector: &Guid) -> PathBuf {
        self.credentials_dir().join(format!("{connector}.blob"))
    }

    pub fn has_master_key(&self) -> bool {
        self.master_key_path().exists()
    }

    /// Encrypt and persist credentials for a connector.
    pub fn store(
        &self,
        connector: &Guid,
        credentials: &ConnectorCredentials,
        metadata: Option<Value>,
    ) -> Result<(), VaultError> {
        check_connector(connector)?;
        self.ensure_dirs()?;
        let key = self.load_or_create_key()?;

        let plaintext = canonical_json(&json!({
            "connector_guid": connector,
            "credentials": credentials,
            "metadata": metadata,
            "stored_at": chrono::Utc::now().timestamp(),
        }));
        let blob = encrypt(&key, plaintext.as_bytes())?;
        write_private_atomic(&self.blob_path(connector), &blob)?;
        tracing::debug!("stored credentials for {connector}");
        Ok(())
    }

    /// Decrypt credentials; `None` on absent or undecipherable blobs.
    pub fn get(&self, connector: &Guid) -> Result<Option<ConnectorCredentials>, VaultError> {
        check_connector(connector)?;
        match self.read_plaintext(connector)? {
            Some(value) => Ok(value
                .get("credentials")
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok())),
            None => Ok(None),
        }
    }

    /// Metadata stored alongside the credentials, if any.
    pub fn get_metadata(&self, connector: &Guid) -> Result<Option<Value>, VaultError> {
        check_connector(connector)?;
        match self.read_plaintext(connector)? {
            Some(value) => Ok(value.get("metadata").filter(|m| !m.is_null()).cloned()),
            None => Ok(None),
        }
    }

    /// Remove stored credentials. Idempotent.
    pub fn delete(&self, connector: &Guid) -> Result<(), VaultError> {
        check_connector(connector)?;
        match fs::remove_file(self.blob_path(connector)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Connector GUIDs with stored credentials.
    pub fn list(&self) -> Result<Vec<Guid>, VaultError> {
        let dir = self.credentials_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut guids = Vec::new();
        for entry in fs::read_dir(dir)? {
            let name = entry?.file_name();
            let Some(stem) = name.to_string_lossy().strip_suffix(".blob").map(str::to_string)
            else {
                continue;
            };
            if let Ok(guid) = Guid::parse_expected(EntityKind::Connector, &stem) {
                guids.push(guid);
            }
        }
        guids.sort();
        Ok(guids)
    }

    fn read_plaintext(&self, connector: &Guid) -> Result<Option<Value>, VaultError> {
        let path = self.blob_path(connector);
        let blob = match fs::read(&path) {
            Ok(blob) => blob,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let Ok(key) = self.load_key() else { return Ok(None) };
        let Some(plaintext) = decrypt(&key, &blob) else {
            tracing::warn!("undecipherable credential blob for {connector}");
            return Ok(None);
        };
        Ok(serde_json::from_slice(&plaintext).ok())
    }

    fn ensure_dirs(&self) -> Result<(), VaultError> {
        fs::create_dir_all(self.credentials_dir())?;
        restrict_dir(&self.base_dir)?;
        restrict_dir(&self.credentials_dir())?;
        Ok(())
    }

    fn load_key(&self) -> Result<[u8; KEY_LEN], VaultError> {
        let raw = fs::read(self.master_key_path())?;
        raw.try_into().map_err(|_| VaultError::BadMasterKey)
    }

    fn load_or_create_key(&self) -> Result<[u8; KEY_LEN], VaultError> {
        if self.has_master_key() {
            return self.load_key();
        }
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        write_private_atomic(&self.master_key_path(), &key)?;
        tracing::info!("generated vault master key");
        Ok(key)
    }
}

fn check_connector(guid: &Guid) -> Result<(), VaultError> {
    if guid.kind() != EntityKind::Connector {
        return Err(VaultError::NotAConnector(*guid));
    }
    Ok(())
}

fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| VaultError::Crypto)?;
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| VaultError::Crypto)?;
    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

fn decrypt(key: &[u8; KEY_LEN], blob: &[u8]) -> Option<Vec<u8>> {
    if blob.len() <= NONCE_LEN {
        return None;
    }
    let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(key).ok()?;
    cipher.decrypt(Nonce::from_slice(nonce), ciphertext).ok()
}

/// Write-temp-then-rename with owner-only permissions.
fn write_private_atomic(path: &Path, bytes: &[u8]) -> Result<(), VaultError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    restrict_file(&tmp)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(unix)]
fn restrict_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn restrict_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn restrict_file(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_file(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
