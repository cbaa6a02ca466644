// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result payload signing: HMAC-SHA256 over canonical JSON.
//!
//! The server mints a 32-byte secret at claim time; the agent signs its
//! completion and failure payloads with it. Canonical form: object keys
//! sorted lexicographically, no insignificant whitespace, numbers as
//! serde_json renders them. The canonicalizer walks the value itself so
//! the result does not depend on map-ordering features elsewhere in the
//! dependency graph.

use hmac::{Hmac, Mac};
use rand::RngCore;
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of the raw signing secret in bytes.
pub const SECRET_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error("signing secret is not valid hex of {SECRET_LEN} bytes")]
    BadSecret,
    #[error("signature is not 64 hex chars")]
    BadSignature,
}

/// Mint a fresh signing secret as 64 lowercase hex chars.
pub fn generate_secret() -> String {
    let mut raw = [0u8; SECRET_LEN];
    rand::thread_rng().fill_bytes(&mut raw);
    hex::encode(raw)
}

/// Decode a hex signing secret back to raw bytes.
pub fn decode_secret(secret_hex: &str) -> Result<[u8; SECRET_LEN], SigningError> {
    let bytes = hex::decode(secret_hex).map_err(|_| SigningError::BadSecret)?;
    bytes.try_into().map_err(|_| SigningError::BadSecret)
}

/// Render the canonical JSON form used for signing.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                if let Some(v) = map.get(*key) {
                    write_canonical(v, out);
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Sign a payload, returning 64 lowercase hex chars.
pub fn sign(secret_hex: &str, payload: &Value) -> Result<String, SigningError> {
    let secret = decode_secret(secret_hex)?;
    let mut mac =
        HmacSha256::new_from_slice(&secret).map_err(|_| SigningError::BadSecret)?;
    mac.update(canonical_json(payload).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a payload signature in constant time.
pub fn verify(secret_hex: &str, payload: &Value, signature: &str) -> Result<bool, SigningError> {
    let secret = decode_secret(secret_hex)?;
    let expected = hex::decode(signature).map_err(|_| SigningError::BadSignature)?;
    if expected.len() != 32 {
        return Err(SigningError::BadSignature);
    }
    let mut mac =
        HmacSha256::new_from_slice(&secret).map_err(|_| SigningError::BadSecret)?;
    mac.update(canonical_json(payload).as_bytes());
    Ok(mac.verify_slice(&expected).is_ok())
}

#[cfg(test)]
#[path = "signing_tests.rs"]
mod tests;
