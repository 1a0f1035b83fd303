// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn halt_is_exact_and_system_scoped() {
    let (cmd, address, data, scope) = Tmcc1Command::decode(0xFFFF).unwrap();
    assert_eq!(cmd, Tmcc1Command::Halt);
    assert_eq!(address, 0);
    assert_eq!(data, 0);
    assert_eq!(scope, CommandScope::System);
}

#[test]
fn switch_out_decodes_with_address() {
    let word = 0x401F | (5 << 7);
    let (cmd, address, _, scope) = Tmcc1Command::decode(word).unwrap();
    assert_eq!(cmd, Tmcc1Command::SwitchOut);
    assert_eq!(address, 5);
    assert_eq!(scope, CommandScope::Switch);
}

#[test]
fn switch_thru_and_out_are_distinct() {
    let thru = 0x4000 | (9 << 7);
    let (cmd, _, _, _) = Tmcc1Command::decode(thru).unwrap();
    assert_eq!(cmd, Tmcc1Command::SwitchThru);
}

#[test]
fn engine_numeric_decodes_with_data() {
    let word = 0x0010 | (12 << 7) | 6;
    let (cmd, address, data, scope) = Tmcc1Command::decode(word).unwrap();
    assert_eq!(cmd, Tmcc1Command::Numeric);
    assert_eq!(address, 12);
    assert_eq!(data, 6);
    assert_eq!(scope, CommandScope::Engine);
}

#[test]
fn train_modifier_retags_engine_commands() {
    let word = (0x001C | (9 << 7)) & TRAIN_PURIFIER | TRAIN_MODIFIER;
    let (cmd, address, _, scope) = Tmcc1Command::decode(word).unwrap();
    assert_eq!(cmd, Tmcc1Command::BlowHornOne);
    assert_eq!(address, 9);
    assert_eq!(scope, CommandScope::Train);
}

#[test]
fn route_fire_uses_five_address_bits() {
    let word = 0xD01F | (31 << 7);
    let (cmd, address, _, scope) = Tmcc1Command::decode(word).unwrap();
    assert_eq!(cmd, Tmcc1Command::RouteFire);
    assert_eq!(address, 31);
    assert_eq!(scope, CommandScope::Route);
}

#[test]
fn sync_family_decodes_without_address() {
    let (cmd, address, _, scope) = Tmcc1Command::decode(0xF0F0).unwrap();
    assert_eq!(cmd, Tmcc1Command::Register);
    assert_eq!(address, 0);
    assert_eq!(scope, CommandScope::Sync);
    assert!(cmd.is_sync());

    let (cmd, _, _, _) = Tmcc1Command::decode(0xF0F5).unwrap();
    assert_eq!(cmd, Tmcc1Command::SyncComplete);
}

#[test]
fn aliases_never_decode_directly() {
    // RESET shares NUMERIC's opcode with data pinned at 0
    let word = 0x0010 | (3 << 7);
    let (cmd, _, data, _) = Tmcc1Command::decode(word).unwrap();
    assert_eq!(cmd, Tmcc1Command::Numeric);
    assert_eq!(data, 0);
    assert_eq!(Tmcc1Command::alias_for(cmd, data), Some(Tmcc1Command::Reset));
}

#[test]
fn alias_reverse_lookup_prefers_latest_declaration() {
    // FUNC_MINUS and SMOKE_OFF both pin NUMERIC data=8
    assert_eq!(
        Tmcc1Command::alias_for(Tmcc1Command::Numeric, 8),
        Some(Tmcc1Command::SmokeOff)
    );
    assert_eq!(
        Tmcc1Command::alias_for(Tmcc1Command::AbsoluteSpeed, 0),
        Some(Tmcc1Command::SpeedStopHold)
    );
}

#[test]
fn unknown_words_are_rejected() {
    assert!(Tmcc1Command::decode(0xF0E0).is_none());
}

#[test]
fn aux1_prefixed_entries_are_flagged() {
    assert!(Tmcc1Command::StartUpImmediate.def().aux1_prefixed);
    assert!(Tmcc1Command::ShutdownImmediate.def().aux1_prefixed);
    assert!(!Tmcc1Command::Numeric.def().aux1_prefixed);
}
