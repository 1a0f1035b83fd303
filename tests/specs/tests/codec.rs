// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Codec round-trip specs across the catalog: every legal address and data
//! value survives serialize/parse unchanged.

use trestle::protocol::command_req::{CommandId, CommandReq};
use trestle::protocol::constants::CommandScope;
use trestle::protocol::multibyte::{
    DialogCommand, EffectsCommand, LightingCommand, MaskingCommand, ParamCommand, RsEffectsCommand,
};
use trestle::protocol::tmcc1::Tmcc1Command;
use trestle::protocol::tmcc2::Tmcc2Command;

fn round_trip(req: &CommandReq) {
    let bytes = req.as_bytes();
    let parsed = CommandReq::from_bytes(&bytes).unwrap_or_else(|e| {
        panic!("{:?} failed to parse its own bytes {bytes:02X?}: {e}", req.command())
    });
    assert_eq!(parsed.command(), req.command(), "command for {bytes:02X?}");
    assert_eq!(parsed.address(), req.address(), "address for {bytes:02X?}");
    assert_eq!(parsed.data(), req.data(), "data for {bytes:02X?}");
    assert_eq!(parsed.as_bytes(), bytes, "bytes for {:?}", req.command());
}

#[test]
fn every_tmcc1_switch_and_accessory_round_trips() {
    for cmd in [
        Tmcc1Command::SwitchThru,
        Tmcc1Command::SwitchOut,
        Tmcc1Command::SwitchSetAddress,
        Tmcc1Command::AccSetAddress,
        Tmcc1Command::AccAux1OptOne,
        Tmcc1Command::AccAux2OptOne,
        Tmcc1Command::AccFrontCoupler,
        Tmcc1Command::AccBoost,
    ] {
        for address in [1u32, 50, 99] {
            round_trip(&CommandReq::tmcc1(cmd, address).unwrap());
        }
    }
    for key in 0..=9 {
        round_trip(&CommandReq::tmcc1_data(Tmcc1Command::AccNumeric, 12, key).unwrap());
    }
}

#[test]
fn every_tmcc1_speed_step_round_trips() {
    for address in [1u32, 45, 99] {
        for speed in 0..=31 {
            round_trip(&CommandReq::tmcc1_data(Tmcc1Command::AbsoluteSpeed, address, speed).unwrap());
        }
    }
}

#[test]
fn every_tmcc2_speed_step_round_trips() {
    for address in [1u32, 99] {
        for speed in 0..=199 {
            round_trip(&CommandReq::tmcc2_data(Tmcc2Command::AbsoluteSpeed, address, speed).unwrap());
        }
    }
}

#[test]
fn relative_speed_covers_the_signed_range() {
    for delta in -5..=5 {
        round_trip(&CommandReq::tmcc1_data(Tmcc1Command::RelativeSpeed, 9, delta).unwrap());
        round_trip(&CommandReq::tmcc2_data(Tmcc2Command::RelativeSpeed, 9, delta).unwrap());
    }
}

#[test]
fn quilling_horn_and_bell_ranges_round_trip() {
    for intensity in 0..=15 {
        round_trip(&CommandReq::tmcc2_data(Tmcc2Command::QuillingHorn, 7, intensity).unwrap());
    }
    for position in 2..=5 {
        round_trip(&CommandReq::tmcc2_data(Tmcc2Command::BellSliderPosition, 7, position).unwrap());
    }
    for ding in 0..=3 {
        round_trip(&CommandReq::tmcc2_data(Tmcc2Command::BellOneShotDing, 7, ding).unwrap());
    }
}

#[test]
fn four_digit_engines_round_trip_across_commands() {
    for address in [100u32, 1234, 9999] {
        round_trip(&CommandReq::tmcc2(Tmcc2Command::RingBell, address).unwrap());
        round_trip(&CommandReq::tmcc2_data(Tmcc2Command::AbsoluteSpeed, address, 92).unwrap());
        round_trip(
            &CommandReq::param(
                ParamCommand::Effects(EffectsCommand::SmokeHigh),
                address,
                CommandScope::Engine,
            )
            .unwrap(),
        );
    }
}

#[test]
fn the_whole_parameter_catalog_round_trips() {
    let dialogs = DialogCommand::ALL.iter().map(|&c| ParamCommand::Dialog(c));
    let effects = EffectsCommand::ALL.iter().map(|&c| ParamCommand::Effects(c));
    let rs = RsEffectsCommand::ALL.iter().map(|&c| ParamCommand::RsEffects(c));
    let masking = MaskingCommand::ALL.iter().map(|&c| ParamCommand::Masking(c));
    let lighting = LightingCommand::ALL.iter().map(|&c| ParamCommand::Lighting(c));

    for command in dialogs.chain(effects).chain(rs).chain(masking).chain(lighting) {
        for scope in [CommandScope::Engine, CommandScope::Train] {
            round_trip(&CommandReq::param(command, 22, scope).unwrap());
        }
    }
}

#[test]
fn sync_admin_frames_round_trip() {
    for cmd in [
        Tmcc1Command::Register,
        Tmcc1Command::Disconnect,
        Tmcc1Command::SyncBegin,
        Tmcc1Command::Synchronizing,
        Tmcc1Command::SyncComplete,
        Tmcc1Command::KeepAlive,
        Tmcc1Command::Resync,
        Tmcc1Command::Quit,
    ] {
        round_trip(&CommandReq::tmcc1(cmd, 0).unwrap());
    }
}

#[test]
fn alias_bytes_decode_to_their_semantic_intent() {
    // RESET == NUMERIC 0 on the wire, in both directions
    let reset = CommandReq::tmcc2(Tmcc2Command::Reset, 18).unwrap();
    let numeric = CommandReq::tmcc2_data(Tmcc2Command::Numeric, 18, 0).unwrap();
    assert_eq!(reset.as_bytes(), numeric.as_bytes());
    let parsed = CommandReq::from_bytes(&reset.as_bytes()).unwrap();
    assert_eq!(parsed.semantic(), CommandId::Tmcc2(Tmcc2Command::Reset));

    // named speeds are ABSOLUTE_SPEED with a pinned step
    let medium = CommandReq::tmcc2(Tmcc2Command::SpeedMedium, 7).unwrap();
    let absolute = CommandReq::tmcc2_data(Tmcc2Command::AbsoluteSpeed, 7, 92).unwrap();
    assert_eq!(medium.as_bytes(), absolute.as_bytes());
}
