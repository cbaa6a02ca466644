// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ap_core::EntityKind;
use crate::storage::RegistrationToken;

fn state_with_agent(revoked: bool) -> (ServerState, String, Guid) {
    let mut state = ServerState::default();
    let guid = Guid::random(EntityKind::Agent);
    let api_key = mint_api_key();
    let mut identity = AgentIdentity {
        guid,
        team_guid: Guid::random(EntityKind::Team),
        name: "studio-nas".to_string(),
        api_key: api_key.clone(),
        platform: "linux-x86_64".to_string(),
        binary_checksum: "0".repeat(64),
        revoked_at_ms: None,
        created_at_ms: 1,
    };
    if revoked {
        identity.revoke(2);
    }
    state.api_keys.insert(api_key.clone(), guid);
    state.agents.insert(guid, identity);
    (state, api_key, guid)
}

#[test]
fn valid_key_authenticates() {
    let (state, key, guid) = state_with_agent(false);
    let authed = authenticate(&state, &key).unwrap();
    assert_eq!(authed.guid, guid);
}

#[test]
fn unknown_key_is_rejected() {
    let (state, _, _) = state_with_agent(false);
    let err = authenticate(&state, "apk_nope").unwrap_err();
    assert_eq!(err, HttpError::Unauthorized("invalid API key".to_string()));
}

#[test]
fn revoked_agent_gets_the_revoked_detail() {
    let (state, key, _) = state_with_agent(true);
    let err = authenticate(&state, &key).unwrap_err();
    assert!(err.to_string().contains("revoked"));
}

#[test]
fn registration_token_is_single_use_and_expiring() {
    let mut state = ServerState::default();
    let team = Guid::random(EntityKind::Team);
    state.registration_tokens.insert(
        "tok_1".to_string(),
        RegistrationToken { team_guid: team, expires_at_ms: 1_000, used: false },
    );

    assert_eq!(consume_registration_token(&mut state, "tok_1", 500).unwrap(), team);
    // Second use fails.
    let err = consume_registration_token(&mut state, "tok_1", 600).unwrap_err();
    assert!(err.to_string().contains("already used"));

    state.registration_tokens.insert(
        "tok_2".to_string(),
        RegistrationToken { team_guid: team, expires_at_ms: 1_000, used: false },
    );
    let err = consume_registration_token(&mut state, "tok_2", 1_000).unwrap_err();
    assert!(err.to_string().contains("expired"));
}

#[test]
fn minted_keys_are_distinct_and_prefixed() {
    let a = mint_api_key();
    let b = mint_api_key();
    assert_ne!(a, b);
    assert!(a.starts_with("apk_"));
    assert_eq!(a.len(), 4 + 48);
}
