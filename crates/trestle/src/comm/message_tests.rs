// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::pdi::req::TmccCarrier;
use crate::protocol::tmcc2::Tmcc2Command;

#[test]
fn tmcc_messages_expose_scope_and_address() {
    let msg = Message::Tmcc(CommandReq::tmcc2(Tmcc2Command::RingBell, 22).unwrap());
    assert_eq!(msg.scope(), CommandScope::Engine);
    assert_eq!(msg.address(), 22);
    assert!(!msg.is_halt());
}

#[test]
fn encapsulated_tmcc_dispatches_under_its_own_scope() {
    let inner = CommandReq::tmcc1(crate::protocol::tmcc1::Tmcc1Command::SwitchOut, 5).unwrap();
    let msg = Message::Pdi(PdiReq::Tmcc(TmccCarrier {
        command: crate::pdi::constants::PdiCommand::TmccRx,
        req: inner,
    }));
    assert_eq!(msg.scope(), CommandScope::Switch);
    assert_eq!(msg.address(), 5);
    assert!(msg.tmcc().is_some());
}

#[test]
fn sync_commands_are_surfaced() {
    let msg = Message::Tmcc(
        CommandReq::tmcc1(crate::protocol::tmcc1::Tmcc1Command::SyncComplete, 0).unwrap(),
    );
    assert_eq!(msg.sync_command(), Some(crate::protocol::tmcc1::Tmcc1Command::SyncComplete));
    assert_eq!(
        Message::Tmcc(CommandReq::tmcc2(Tmcc2Command::RingBell, 1).unwrap()).sync_command(),
        None
    );
}

#[test]
fn wire_bytes_match_the_underlying_codec() {
    let req = CommandReq::tmcc2(Tmcc2Command::RingBell, 7).unwrap();
    let expected = req.as_bytes();
    assert_eq!(Message::Tmcc(req).as_bytes(), expected);

    let ping = Message::Pdi(PdiReq::Ping);
    assert_eq!(ping.as_bytes(), PdiReq::Ping.as_frame());
}
