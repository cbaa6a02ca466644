// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ap_core::{EntityKind, Guid};

#[test]
fn numeric_guid_surfaces_the_contract_detail() {
    let err: HttpError = Guid::parse("123").unwrap_err().into();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert!(err.to_string().contains("Numeric IDs are no longer supported"));
}

#[test]
fn prefix_mismatch_surfaces_prefix_mismatch() {
    let con = Guid::random(EntityKind::Connector).to_string();
    let err: HttpError =
        Guid::parse_expected(EntityKind::Collection, &con).unwrap_err().into();
    assert!(err.to_string().contains("prefix mismatch"));
}

#[test]
fn statuses_map_one_to_one() {
    assert_eq!(HttpError::Unauthorized(String::new()).status(), StatusCode::UNAUTHORIZED);
    assert_eq!(HttpError::Forbidden(String::new()).status(), StatusCode::FORBIDDEN);
    assert_eq!(HttpError::Conflict(String::new()).status(), StatusCode::CONFLICT);
    assert_eq!(
        HttpError::Unprocessable(String::new()).status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
}
