// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sequence-engine specs: composite intents expand, schedule, and cancel
//! through the comm buffer.

use std::time::Duration;

use trestle::protocol::command_req::{CommandId, CommandReq};
use trestle::protocol::constants::CommandScope;
use trestle::protocol::tmcc2::Tmcc2Command;
use trestle::sequence::{grade_crossing, ramped_speed, SequenceLauncher};

use trestle_specs::Core;

async fn drain(
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<Vec<u8>>,
    wait: Duration,
) -> Vec<Vec<u8>> {
    tokio::time::sleep(wait).await;
    let mut out = Vec::new();
    while let Ok(bytes) = rx.try_recv() {
        out.push(bytes);
    }
    out
}

#[tokio::test]
async fn grade_crossing_delivers_the_opening_blast_immediately() {
    let core = Core::assemble();
    let mut outbound = core.tap_outbound();

    let seq = grade_crossing::build(7, CommandScope::Engine).unwrap();
    let _handle = seq.send(&core.buffer);

    // only the zero-delay entries transmit right away
    let sent = drain(&mut outbound, Duration::from_millis(200)).await;
    assert_eq!(sent.len(), 7);
    let first = CommandReq::from_bytes(&sent[0]).unwrap();
    assert_eq!(first.command(), CommandId::Tmcc2(Tmcc2Command::QuillingHorn));
    assert_eq!(first.data(), 15);
    let last = CommandReq::from_bytes(&sent[6]).unwrap();
    assert_eq!(last.data(), 8);
}

#[tokio::test]
async fn cancelling_a_sequence_stops_the_later_blasts() {
    let core = Core::assemble();
    let mut outbound = core.tap_outbound();

    let seq = grade_crossing::build(7, CommandScope::Engine).unwrap();
    let handle = seq.send(&core.buffer);

    let opening = drain(&mut outbound, Duration::from_millis(200)).await;
    assert_eq!(opening.len(), 7);
    handle.cancel();

    let rest = drain(&mut outbound, Duration::from_millis(1200)).await;
    assert!(rest.is_empty(), "cancelled entries still transmitted: {}", rest.len());
}

#[tokio::test]
async fn ramped_speed_converges_on_the_wire() {
    let core = Core::assemble();

    // seed current speed through the dispatcher
    core.listener
        .offer(&CommandReq::tmcc2_data(Tmcc2Command::AbsoluteSpeed, 7, 10).unwrap().as_bytes());
    assert!(core.settled(1).await);

    let seq = ramped_speed::build(
        7,
        CommandScope::Engine,
        19,
        false,
        false,
        &core.store,
        ramped_speed::labor_delta,
    )
    .unwrap();

    let mut outbound = core.tap_outbound();
    let _handle = seq.send(&core.buffer);
    let sent = drain(&mut outbound, Duration::from_millis(1500)).await;

    let speeds: Vec<i32> = sent
        .iter()
        .filter_map(|bytes| CommandReq::from_bytes(bytes).ok())
        .filter(|req| req.command() == CommandId::Tmcc2(Tmcc2Command::AbsoluteSpeed))
        .map(|req| req.data())
        .collect();
    assert_eq!(speeds, vec![13, 16, 19]);
}

#[tokio::test]
async fn identical_ramps_are_debounced_while_pending() {
    let core = Core::assemble();
    let launcher = SequenceLauncher::new(core.buffer.clone());

    let seq = grade_crossing::build(4, CommandScope::Engine).unwrap();
    assert!(launcher.launch(&seq).is_some());
    assert!(launcher.launch(&seq).is_none(), "duplicate intent must be held off");
}
