// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn target_coherence_checks_guid_prefix() {
    let good = Target::new(
        TargetKind::Collection,
        Guid::random(EntityKind::Collection),
        "archive-2025",
    );
    assert!(good.is_coherent());

    let bad = Target::new(
        TargetKind::Collection,
        Guid::random(EntityKind::Connector),
        "archive-2025",
    );
    assert!(!bad.is_coherent());
}

#[test]
fn serde_uses_snake_case_kind() {
    let target = Target::new(
        TargetKind::Pipeline,
        Guid::random(EntityKind::Pipeline),
        "wedding-flow",
    );
    let json = serde_json::to_value(&target).unwrap();
    assert_eq!(json["kind"], "pipeline");
    assert_eq!(json["name"], "wedding-flow");
}
