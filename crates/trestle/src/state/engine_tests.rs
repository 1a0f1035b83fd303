// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::pdi::comp_data::pack_rpm_labor;
use crate::protocol::command_req::CommandReq;
use crate::protocol::constants::CommandScope;

fn apply2(state: &mut EngineState, cmd: Tmcc2Command, address: u32, data: i32) {
    let req = CommandReq::new(CommandId::Tmcc2(cmd), address, data, None).unwrap();
    state.apply_command(&req);
}

#[test]
fn absolute_speed_sets_target_and_derives_rpm() {
    let mut state = EngineState::default();
    apply2(&mut state, Tmcc2Command::AbsoluteSpeed, 1234, 92);
    assert_eq!(state.speed, Some(92));
    assert_eq!(state.target_speed, Some(92));
    assert_eq!(state.rpm, Some(4));
}

#[test]
fn steam_types_do_not_derive_rpm() {
    let mut state = EngineState { engine_type: Some(1), ..EngineState::default() };
    apply2(&mut state, Tmcc2Command::AbsoluteSpeed, 7, 92);
    assert_eq!(state.speed, Some(92));
    assert_eq!(state.rpm, None);
}

#[test]
fn relative_speed_clamps_to_the_range() {
    let mut state = EngineState { speed: Some(3), ..EngineState::default() };
    apply2(&mut state, Tmcc2Command::RelativeSpeed, 7, -5);
    assert_eq!(state.speed, Some(0));
    apply2(&mut state, Tmcc2Command::RelativeSpeed, 7, 5);
    assert_eq!(state.speed, Some(5));
}

#[test]
fn reset_zeroes_motion_and_restores_labor() {
    let mut state = EngineState {
        speed: Some(80),
        rpm: Some(5),
        labor: Some(25),
        ..EngineState::default()
    };
    // RESET arrives on the wire as NUMERIC 0
    apply2(&mut state, Tmcc2Command::Numeric, 7, 0);
    assert_eq!(state.speed, Some(0));
    assert_eq!(state.target_speed, Some(0));
    assert_eq!(state.rpm, Some(0));
    assert_eq!(state.labor, Some(12));
}

#[test]
fn shutdown_numeric_drops_rpm_but_not_speed() {
    let mut state = EngineState { speed: Some(40), rpm: Some(3), ..EngineState::default() };
    apply2(&mut state, Tmcc2Command::Numeric, 7, 5);
    assert_eq!(state.rpm, Some(0));
    assert_eq!(state.speed, Some(40));
}

#[test]
fn direction_commands_toggle() {
    let mut state = EngineState::default();
    apply2(&mut state, Tmcc2Command::ForwardDirection, 7, 0);
    assert_eq!(state.direction, Some(EngineDirection::Forward));
    apply2(&mut state, Tmcc2Command::ToggleDirection, 7, 0);
    assert_eq!(state.direction, Some(EngineDirection::Reverse));
    apply2(&mut state, Tmcc2Command::ReverseDirection, 7, 0);
    assert_eq!(state.direction, Some(EngineDirection::Reverse));
}

#[test]
fn rpm_and_labor_are_independent_fields() {
    let mut state = EngineState::default();
    apply2(&mut state, Tmcc2Command::EngineLabor, 7, 20);
    apply2(&mut state, Tmcc2Command::DieselRpm, 7, 5);
    assert_eq!(state.labor, Some(20));
    assert_eq!(state.rpm, Some(5));
    apply2(&mut state, Tmcc2Command::DieselRpm, 7, 2);
    assert_eq!(state.labor, Some(20), "labor must survive an RPM update");
}

#[test]
fn momentum_presets() {
    let mut state = EngineState::default();
    apply2(&mut state, Tmcc2Command::MomentumHigh, 7, 0);
    assert_eq!(state.momentum, Some(7));
    apply2(&mut state, Tmcc2Command::Momentum, 7, 2);
    assert_eq!(state.momentum, Some(2));
}

#[test]
fn smoke_effect_commands_map_to_base_levels() {
    let mut state = EngineState::default();
    let req = CommandReq::param(
        ParamCommand::Effects(EffectsCommand::SmokeMedium),
        7,
        CommandScope::Engine,
    )
    .unwrap();
    state.apply_command(&req);
    assert_eq!(state.smoke, Some(2));
}

#[test]
fn halt_zeroes_motion_only() {
    let mut state = EngineState {
        speed: Some(60),
        rpm: Some(4),
        labor: Some(20),
        ..EngineState::default()
    };
    state.halt();
    assert_eq!(state.speed, Some(0));
    assert_eq!(state.rpm, Some(0));
    assert_eq!(state.labor, Some(20));
}

#[test]
fn record_application_converts_base_units() {
    let mut state = EngineState::default();
    let record = EngineRecord {
        speed: Some(50),
        momentum: Some(127),
        train_brake: Some(15),
        rpm_labor: Some(pack_rpm_labor(3, 20)),
        control_type: Some(2),
        road_name: Some("NYC".to_owned()),
        ..EngineRecord::default()
    };
    state.apply_record(&record);
    assert_eq!(state.speed, Some(50));
    assert_eq!(state.momentum, Some(7));
    assert_eq!(state.train_brake, Some(7));
    assert_eq!(state.rpm, Some(3));
    assert_eq!(state.labor, Some(20));
    assert!(state.is_legacy());
    assert_eq!(state.road_name.as_deref(), Some("NYC"));
}

#[test]
fn speed_max_prefers_the_tightest_cap() {
    let state = EngineState {
        max_speed: Some(120),
        speed_limit: Some(90),
        ..EngineState::default()
    };
    assert_eq!(state.speed_max(), 90);
    assert_eq!(EngineState::default().speed_max(), 199);
}

#[test]
fn record_round_trip_through_state() {
    let state = EngineState {
        speed: Some(44),
        rpm: Some(2),
        labor: Some(14),
        momentum: Some(3),
        road_name: Some("PRR".to_owned()),
        ..EngineState::default()
    };
    let image = state.to_record(None).to_record(CommandScope::Engine, false);
    let mut restored = EngineState::default();
    restored.apply_record(&EngineRecord::parse(&image, CommandScope::Engine));
    assert_eq!(restored.speed, Some(44));
    assert_eq!(restored.rpm, Some(2));
    assert_eq!(restored.labor, Some(14));
    assert_eq!(restored.momentum, Some(3));
    assert_eq!(restored.road_name.as_deref(), Some("PRR"));
}
