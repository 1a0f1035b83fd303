// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::comm::message::Message;
use crate::protocol::command_req::CommandReq;
use crate::protocol::tmcc1::Tmcc1Command;
use crate::protocol::tmcc2::Tmcc2Command;

fn speed(address: u32, step: i32) -> Message {
    Message::Tmcc(CommandReq::tmcc2_data(Tmcc2Command::AbsoluteSpeed, address, step).unwrap())
}

#[test]
fn states_are_created_lazily_on_first_observation() {
    let store = ComponentStateStore::new();
    assert!(store.get(CommandScope::Switch, 22).is_none());

    store.handle(&Message::Tmcc(CommandReq::tmcc1(Tmcc1Command::SwitchOut, 22).unwrap()));
    let cell = store.get(CommandScope::Switch, 22).unwrap();
    cell.read(|state| {
        assert_eq!(state.address(), 22);
        assert!(state.switch().map(|s| s.is_out()).unwrap_or(false));
    });
}

#[test]
fn invalid_addresses_never_create_states() {
    let store = ComponentStateStore::new();
    assert!(store.get_or_create(CommandScope::Switch, 100).is_err());
    assert!(store.get_or_create(CommandScope::Engine, 0).is_err());
    assert!(store.get_or_create(CommandScope::Engine, 10000).is_err());
    assert!(store.get_or_create(CommandScope::Base, 0).is_ok());
}

#[test]
fn halt_fans_out_to_every_engine_and_train() {
    let store = ComponentStateStore::new();
    store.handle(&speed(7, 60));
    store.handle(&speed(1234, 90));
    let train = Message::Tmcc(
        CommandReq::tmcc2_data(Tmcc2Command::AbsoluteSpeed, 12, 40)
            .map(|mut req| {
                req.set_scope(CommandScope::Train).ok();
                req
            })
            .unwrap(),
    );
    store.handle(&train);

    store.handle(&Message::Tmcc(CommandReq::tmcc1(Tmcc1Command::Halt, 0).unwrap()));

    for (scope, address) in [
        (CommandScope::Engine, 7),
        (CommandScope::Engine, 1234),
        (CommandScope::Train, 12),
    ] {
        let cell = store.get(scope, address).unwrap();
        cell.read(|state| {
            let engine = state.engine().unwrap();
            assert_eq!(engine.speed, Some(0), "{scope} {address}");
            assert_eq!(engine.rpm, Some(0), "{scope} {address}");
        });
    }
}

#[test]
fn broadcast_address_applies_to_all_of_a_scope() {
    let store = ComponentStateStore::new();
    store.handle(&Message::Tmcc(CommandReq::tmcc1(Tmcc1Command::SwitchOut, 3).unwrap()));
    store.handle(&Message::Tmcc(CommandReq::tmcc1(Tmcc1Command::SwitchOut, 8).unwrap()));

    store.handle(&Message::Tmcc(CommandReq::tmcc1(Tmcc1Command::SwitchThru, 99).unwrap()));

    for address in [3, 8] {
        let cell = store.get(CommandScope::Switch, address).unwrap();
        assert!(cell.read(|s| s.switch().map(|s| s.is_thru()).unwrap_or(false)));
    }
    // the broadcast itself creates no address-99 record
    assert!(store.get(CommandScope::Switch, 99).is_none());
}

#[test]
fn sync_begin_clears_the_store() {
    let store = ComponentStateStore::new();
    store.handle(&speed(7, 60));
    assert!(store.get(CommandScope::Engine, 7).is_some());

    store.handle(&Message::Tmcc(CommandReq::tmcc1(Tmcc1Command::SyncBegin, 0).unwrap()));
    assert!(store.get(CommandScope::Engine, 7).is_none());
    assert_eq!(store.sync_status(), SyncStatus::Synchronizing);

    store.handle(&Message::Tmcc(CommandReq::tmcc1(Tmcc1Command::SyncComplete, 0).unwrap()));
    assert_eq!(store.sync_status(), SyncStatus::Synchronized);
}

#[test]
fn addresses_come_back_sorted() {
    let store = ComponentStateStore::new();
    for address in [9, 2, 41] {
        store.handle(&speed(address, 10));
    }
    assert_eq!(store.addresses(CommandScope::Engine), vec![2, 9, 41]);
}

#[test]
fn updates_bump_the_cell_version() {
    let store = ComponentStateStore::new();
    store.handle(&speed(7, 10));
    let cell = store.get(CommandScope::Engine, 7).unwrap();
    let v1 = cell.version();
    store.handle(&speed(7, 20));
    assert!(cell.version() > v1);
}
