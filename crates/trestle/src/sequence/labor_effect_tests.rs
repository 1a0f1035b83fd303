// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::comm::message::Message;

fn store_with_labor(address: u32, labor: i32) -> ComponentStateStore {
    let store = ComponentStateStore::new();
    let msg = Message::Tmcc(
        CommandReq::new(CommandId::Tmcc2(Tmcc2Command::EngineLabor), address, labor, None).unwrap(),
    );
    store.handle(&msg);
    store
}

#[test]
fn up_steps_the_current_labor() {
    let store = store_with_labor(7, 20);
    let seq = up(7, CommandScope::Engine, &store).unwrap();
    assert_eq!(seq.entries().len(), 1);
    assert_eq!(seq.entries()[0].req.data(), 21);
}

#[test]
fn down_steps_toward_zero() {
    let store = store_with_labor(7, 20);
    let seq = down(7, CommandScope::Engine, &store).unwrap();
    assert_eq!(seq.entries()[0].req.data(), 19);
}

#[test]
fn clamps_at_the_wheel_limits() {
    let store = store_with_labor(7, 31);
    let seq = up(7, CommandScope::Engine, &store).unwrap();
    assert_eq!(seq.entries()[0].req.data(), 31);

    let store = store_with_labor(8, 0);
    let seq = down(8, CommandScope::Engine, &store).unwrap();
    assert_eq!(seq.entries()[0].req.data(), 0);
}

#[test]
fn unknown_state_starts_from_the_default() {
    let store = ComponentStateStore::new();
    let seq = up(9, CommandScope::Engine, &store).unwrap();
    assert_eq!(seq.entries()[0].req.data(), 13);
}
