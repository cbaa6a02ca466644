// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::new();
    let start = clock.epoch_ms();
    clock.advance(Duration::from_secs(90));
    assert_eq!(clock.epoch_ms(), start + 90_000);
}

#[test]
fn fake_clock_set() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(42);
    assert_eq!(clock.epoch_ms(), 42);
    assert_eq!(clock.epoch_secs(), 0);
}

#[test]
fn system_clock_is_past_2020() {
    let clock = SystemClock;
    assert!(clock.epoch_secs() > 1_577_836_800);
}

#[test]
fn clones_share_time() {
    let clock = FakeClock::new();
    let other = clock.clone();
    clock.advance(Duration::from_millis(500));
    assert_eq!(other.epoch_ms(), clock.epoch_ms());
}
