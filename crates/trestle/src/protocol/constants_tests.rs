// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn scope_wire_values_round_trip() {
    for scope in [
        CommandScope::Engine,
        CommandScope::Train,
        CommandScope::Switch,
        CommandScope::Route,
        CommandScope::Acc,
        CommandScope::Irda,
        CommandScope::Base,
        CommandScope::Sync,
        CommandScope::Block,
    ] {
        assert_eq!(CommandScope::from_u8(scope.as_u8()), Some(scope));
    }
    assert_eq!(CommandScope::from_u8(0), None);
    assert_eq!(CommandScope::from_u8(15), None);
}

#[test]
fn address_ranges_per_scope() {
    assert!(CommandScope::Engine.is_valid_address(1));
    assert!(CommandScope::Engine.is_valid_address(9999));
    assert!(!CommandScope::Engine.is_valid_address(0));
    assert!(!CommandScope::Switch.is_valid_address(100));
    assert!(CommandScope::Base.is_valid_address(0));
    assert!(!CommandScope::Base.is_valid_address(1));
    assert!(CommandScope::Sync.is_valid_address(99));
}

#[test]
fn tmcc2_speed_bands_cover_the_range() {
    assert_eq!(RRSpeed::from_tmcc2_step(0), RRSpeed::StopHold);
    assert_eq!(RRSpeed::from_tmcc2_step(1), RRSpeed::Roll);
    assert_eq!(RRSpeed::from_tmcc2_step(92), RRSpeed::Medium);
    assert_eq!(RRSpeed::from_tmcc2_step(199), RRSpeed::Highball);
    // every band's own step maps back to itself
    for &band in RRSpeed::ALL {
        assert_eq!(RRSpeed::from_tmcc2_step(band.tmcc2_step()), band);
        assert_eq!(RRSpeed::from_tmcc1_step(band.tmcc1_step()), band);
    }
}
