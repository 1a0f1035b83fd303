// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end dispatch specs: raw bytes in through the listener, state
//! observable in the store.

use std::time::Duration;

use trestle::pdi::base_req::BaseReq;
use trestle::pdi::comp_data::{EngineRecord, ENGINE_RECORD_LEN};
use trestle::pdi::constants::PdiCommand;
use trestle::pdi::req::PdiReq;
use trestle::protocol::command_req::CommandReq;
use trestle::protocol::constants::CommandScope;
use trestle::protocol::tmcc1::Tmcc1Command;
use trestle::protocol::tmcc2::Tmcc2Command;

use trestle_specs::Core;

#[tokio::test]
async fn four_digit_speed_updates_the_engine_mirror() {
    let core = Core::assemble();
    // engine 1234 to speed 92: F8 00 5C "1234"
    core.listener.offer(&[0xF8, 0x00, 0x5C, 0x31, 0x32, 0x33, 0x34]);
    assert!(core.settled(1).await);

    let cell = core.store.get(CommandScope::Engine, 1234).unwrap();
    cell.read(|state| {
        let engine = state.engine().unwrap();
        assert_eq!(engine.speed, Some(92));
        assert_eq!(engine.rpm, Some(4));
    });
}

#[tokio::test]
async fn switch_command_inside_a_tmcc_rx_frame_reaches_subscribers() {
    let core = Core::assemble();

    let inner = CommandReq::tmcc1(Tmcc1Command::SwitchOut, 5).unwrap();
    let mut payload = vec![PdiCommand::TmccRx.as_u8()];
    payload.extend_from_slice(&inner.as_bytes());
    core.listener.offer(&trestle::pdi::frame::encode(&payload));

    assert!(core.settled(1).await);
    let cell = core.store.get(CommandScope::Switch, 5).unwrap();
    assert!(cell.read(|s| s.switch().map(|s| s.is_out()).unwrap_or(false)));

    // the carrier surfaced under the switch scope for device subscribers
    let seen = core.seen.lock();
    assert_eq!(seen[0].scope(), CommandScope::Switch);
    assert_eq!(seen[0].address(), 5);
}

#[tokio::test]
async fn halt_zeroes_every_engine_and_train() {
    let core = Core::assemble();
    core.listener
        .offer(&CommandReq::tmcc2_data(Tmcc2Command::AbsoluteSpeed, 7, 60).unwrap().as_bytes());
    core.listener
        .offer(&CommandReq::tmcc2_data(Tmcc2Command::AbsoluteSpeed, 1234, 90).unwrap().as_bytes());
    assert!(core.settled(2).await);

    core.listener.offer(&CommandReq::tmcc1(Tmcc1Command::Halt, 0).unwrap().as_bytes());
    assert!(core.settled(3).await);
    tokio::time::sleep(Duration::from_millis(20)).await;

    for address in [7u32, 1234] {
        let cell = core.store.get(CommandScope::Engine, address).unwrap();
        cell.read(|state| {
            let engine = state.engine().unwrap();
            assert_eq!(engine.speed, Some(0), "engine {address}");
            assert_eq!(engine.rpm, Some(0), "engine {address}");
        });
    }
}

#[tokio::test]
async fn base_memory_record_hydrates_road_name_and_control_type() {
    let core = Core::assemble();

    let record = EngineRecord {
        speed: Some(50),
        control_type: Some(2),
        road_name: Some("SANTA FE".to_owned()),
        ..EngineRecord::default()
    };
    let base = BaseReq {
        command: PdiCommand::BaseMemory,
        tmcc_id: 17,
        scope: CommandScope::Engine,
        start: 0,
        length: ENGINE_RECORD_LEN as u16,
        data: record.to_record(CommandScope::Engine, false),
    };
    core.listener.offer(&PdiReq::Base(base).as_frame());

    assert!(core.settled(1).await);
    let cell = core.store.get(CommandScope::Engine, 17).unwrap();
    cell.read(|state| {
        let engine = state.engine().unwrap();
        assert_eq!(engine.speed, Some(50));
        assert!(engine.is_legacy());
        assert_eq!(engine.road_name.as_deref(), Some("SANTA FE"));
    });
}

#[tokio::test]
async fn corrupt_pdi_frames_count_and_do_not_dispatch() {
    let core = Core::assemble();
    let mut frame = PdiReq::Ping.as_frame();
    let checksum_slot = frame.len() - 2;
    frame[checksum_slot] ^= 0xFF;
    core.listener.offer(&frame);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(core.seen.lock().is_empty());
    assert_eq!(core.counters.count(trestle::error::ProtocolError::InvalidFrame), 1);
}

#[tokio::test]
async fn listener_resyncs_after_line_noise() {
    let core = Core::assemble();
    let mut stream = vec![0x17, 0x2A]; // garbage
    stream.extend_from_slice(&CommandReq::tmcc2(Tmcc2Command::RingBell, 9).unwrap().as_bytes());
    core.listener.offer(&stream);

    assert!(core.settled(1).await);
    assert_eq!(core.seen.lock()[0].address(), 9);
    assert!(core.counters.count(trestle::error::ProtocolError::UnknownOpcode) >= 2);
}

#[tokio::test]
async fn watchers_observe_version_changes() {
    let core = Core::assemble();
    let cell = core.store.get_or_create(CommandScope::Engine, 3).unwrap();
    let version = cell.version();

    let waiter = {
        let cell = cell.clone();
        tokio::spawn(async move { cell.changed(version).await })
    };
    core.listener
        .offer(&CommandReq::tmcc2_data(Tmcc2Command::AbsoluteSpeed, 3, 12).unwrap().as_bytes());

    let next = tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("watcher timed out")
        .expect("watcher task failed");
    assert!(next > version);
}
