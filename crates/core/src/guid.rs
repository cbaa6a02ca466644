// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External identifiers: `<3-letter-prefix>_<26-char-Crockford-Base32>`.
//!
//! The 26-character body encodes a 128-bit UUID in Crockford Base32
//! (alphabet without `i`, `l`, `o`, `u`). Input is case-insensitive;
//! output is canonical lowercase. Numeric database IDs never cross the
//! API boundary, so bare digits are rejected with a dedicated error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Crockford Base32 alphabet, lowercase. Index is the 5-bit value.
const ALPHABET: &[u8; 32] = b"0123456789abcdefghjkmnpqrstvwxyz";

/// Total length of a rendered GUID: 3 prefix chars, `_`, 26 body chars.
pub const GUID_LEN: usize = 30;

/// Entity types addressable by GUID, one 3-letter prefix each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Agent,
    Job,
    Result,
    Collection,
    Connector,
    Pipeline,
    Release,
    Performer,
    Organizer,
    Location,
    Category,
    Team,
}

impl EntityKind {
    /// The 3-letter prefix for this entity type.
    pub fn prefix(self) -> &'static str {
        match self {
            EntityKind::Agent => "agt",
            EntityKind::Job => "job",
            EntityKind::Result => "res",
            EntityKind::Collection => "col",
            EntityKind::Connector => "con",
            EntityKind::Pipeline => "pip",
            EntityKind::Release => "rel",
            EntityKind::Performer => "prf",
            EntityKind::Organizer => "org",
            EntityKind::Location => "loc",
            EntityKind::Category => "cat",
            EntityKind::Team => "tea",
        }
    }

    /// Look up an entity kind by prefix (lowercase only).
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Some(match prefix {
            "agt" => EntityKind::Agent,
            "job" => EntityKind::Job,
            "res" => EntityKind::Result,
            "col" => EntityKind::Collection,
            "con" => EntityKind::Connector,
            "pip" => EntityKind::Pipeline,
            "rel" => EntityKind::Release,
            "prf" => EntityKind::Performer,
            "org" => EntityKind::Organizer,
            "loc" => EntityKind::Location,
            "cat" => EntityKind::Category,
            "tea" => EntityKind::Team,
            _ => return None,
        })
    }
}

crate::simple_display! {
    EntityKind {
        Agent => "agent",
        Job => "job",
        Result => "result",
        Collection => "collection",
        Connector => "connector",
        Pipeline => "pipeline",
        Release => "release",
        Performer => "performer",
        Organizer => "organizer",
        Location => "location",
        Category => "category",
        Team => "team",
    }
}

/// Why a GUID string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuidError {
    /// Bare digits — a legacy numeric database ID.
    #[error("Numeric IDs are no longer supported; use the GUID form")]
    NumericId,
    /// Structurally invalid: wrong length, missing separator, or a
    /// character outside the Crockford alphabet.
    #[error("malformed GUID: {0}")]
    Malformed(String),
    /// Well-formed, but the prefix names no known entity type.
    #[error("unknown GUID prefix: {0}")]
    UnknownPrefix(String),
    /// Well-formed, but the prefix does not match the expected entity type.
    #[error("GUID prefix mismatch: expected {expected}, got {got}")]
    PrefixMismatch { expected: &'static str, got: String },
}

/// A typed external identifier.
///
/// Equality follows the decoded value, so a `Guid` parsed from
/// uppercase input compares equal to its lowercase rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guid {
    kind: EntityKind,
    id: Uuid,
}

impl Guid {
    /// Mint a fresh random GUID for the given entity type.
    pub fn random(kind: EntityKind) -> Self {
        Self { kind, id: Uuid::new_v4() }
    }

    /// Build a GUID from a known UUID body.
    pub fn from_uuid(kind: EntityKind, id: Uuid) -> Self {
        Self { kind, id }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn uuid(&self) -> Uuid {
        self.id
    }

    /// Parse any well-formed GUID, inferring the entity type from the prefix.
    pub fn parse(s: &str) -> Result<Self, GuidError> {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GuidError::NumericId);
        }
        if s.len() != GUID_LEN || s.as_bytes()[3] != b'_' {
            return Err(GuidError::Malformed(s.to_string()));
        }
        let prefix = s[..3].to_ascii_lowercase();
        let kind = EntityKind::from_prefix(&prefix)
            .ok_or_else(|| GuidError::UnknownPrefix(prefix.clone()))?;
        let id = decode_body(&s[4..]).ok_or_else(|| GuidError::Malformed(s.to_string()))?;
        Ok(Self { kind, id })
    }

    /// Parse a GUID that must belong to the given entity type.
    ///
    /// Endpoints call this before any state lookup so that wrong-prefix
    /// IDs fail fast with a prefix-mismatch error.
    pub fn parse_expected(kind: EntityKind, s: &str) -> Result<Self, GuidError> {
        let guid = Self::parse(s)?;
        if guid.kind != kind {
            return Err(GuidError::PrefixMismatch {
                expected: kind.prefix(),
                got: guid.kind.prefix().to_string(),
            });
        }
        Ok(guid)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut body = [0u8; 26];
        encode_body(self.id, &mut body);
        // Invariant: ALPHABET is ASCII, so the body is valid UTF-8.
        write!(f, "{}_{}", self.kind.prefix(), std::str::from_utf8(&body).unwrap_or_default())
    }
}

impl FromStr for Guid {
    type Err = GuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Guid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Guid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Guid::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Encode a 128-bit UUID into 26 Crockford Base32 characters.
///
/// 26 × 5 = 130 bits; the leading character carries only the top 3 bits,
/// so its value is always in `0..8`.
fn encode_body(id: Uuid, out: &mut [u8; 26]) {
    let v = id.as_u128();
    for (i, slot) in out.iter_mut().enumerate() {
        let shift = 125 - 5 * i;
        *slot = ALPHABET[((v >> shift) & 0x1f) as usize];
    }
}

/// Decode 26 Crockford Base32 characters into a UUID.
///
/// Case-insensitive. Returns `None` on characters outside the alphabet
/// or when the leading character would overflow 128 bits.
fn decode_body(body: &str) -> Option<Uuid> {
    let bytes = body.as_bytes();
    if bytes.len() != 26 {
        return None;
    }
    let mut v: u128 = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let d = decode_char(b)?;
        if i == 0 && d > 7 {
            return None;
        }
        v = (v << 5) | u128::from(d);
    }
    Some(Uuid::from_u128(v))
}

fn decode_char(b: u8) -> Option<u8> {
    let b = b.to_ascii_lowercase();
    ALPHABET.iter().position(|&a| a == b).map(|p| p as u8)
}

#[cfg(test)]
#[path = "guid_tests.rs"]
mod tests;
