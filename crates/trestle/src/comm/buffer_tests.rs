// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::*;
use crate::protocol::command_req::CommandReq;
use crate::protocol::tmcc1::Tmcc1Command;
use crate::protocol::tmcc2::Tmcc2Command;

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
async fn entries_drain_in_enqueue_order() {
    let cancel = CancellationToken::new();
    let buffer = CommBuffer::spawn(cancel.clone());
    let mut sink = buffer.add_sink(SinkKind::Server);

    buffer.enqueue_bytes(vec![1], Duration::ZERO);
    buffer.enqueue_bytes(vec![2], Duration::ZERO);
    buffer.enqueue_bytes(vec![3], Duration::ZERO);

    let sent = drain(&mut sink, Duration::from_millis(100)).await;
    assert_eq!(sent, vec![vec![1], vec![2], vec![3]]);
    cancel.cancel();
}

#[tokio::test]
async fn delayed_entries_wait_their_turn() {
    let cancel = CancellationToken::new();
    let buffer = CommBuffer::spawn(cancel.clone());
    let mut sink = buffer.add_sink(SinkKind::Server);

    buffer.enqueue_bytes(vec![2], Duration::from_millis(80));
    buffer.enqueue_bytes(vec![1], Duration::ZERO);

    let early = drain(&mut sink, Duration::from_millis(30)).await;
    assert_eq!(early, vec![vec![1]]);
    let late = drain(&mut sink, Duration::from_millis(100)).await;
    assert_eq!(late, vec![vec![2]]);
    cancel.cancel();
}

#[tokio::test]
async fn serial_sinks_skip_pdi_frames() {
    let cancel = CancellationToken::new();
    let buffer = CommBuffer::spawn(cancel.clone());
    let mut serial = buffer.add_sink(SinkKind::Serial);
    let mut base = buffer.add_sink(SinkKind::Base3);

    buffer.enqueue_pdi(&crate::pdi::req::PdiReq::Ping, Duration::ZERO);
    let tmcc = CommandReq::tmcc2(Tmcc2Command::RingBell, 7).unwrap();
    buffer.enqueue_bytes(tmcc.as_bytes(), Duration::ZERO);

    let serial_sent = drain(&mut serial, Duration::from_millis(100)).await;
    assert_eq!(serial_sent, vec![tmcc.as_bytes()]);

    // the base sink sees the ping plus the TMCC bytes wrapped in a carrier
    let base_sent = drain(&mut base, Duration::ZERO).await;
    assert_eq!(base_sent.len(), 2);
    let wrapped = crate::pdi::req::PdiReq::from_frame(&base_sent[1]).unwrap();
    assert_eq!(wrapped.command(), crate::pdi::constants::PdiCommand::TmccTx);
    cancel.cancel();
}

#[tokio::test]
async fn aux1_prefixed_commands_send_the_prefix_first() {
    let cancel = CancellationToken::new();
    let buffer = CommBuffer::spawn(cancel.clone());
    let mut sink = buffer.add_sink(SinkKind::Server);

    let req = CommandReq::tmcc1(Tmcc1Command::StartUpImmediate, 12).unwrap();
    buffer.enqueue_command(&req, Duration::ZERO, 1, Duration::ZERO);

    let sent = drain(&mut sink, Duration::from_millis(100)).await;
    assert_eq!(sent.len(), 2);
    let prefix = CommandReq::from_bytes(&sent[0]).unwrap();
    assert_eq!(
        prefix.command(),
        crate::protocol::command_req::CommandId::Tmcc1(Tmcc1Command::Aux1OptionOne)
    );
    assert_eq!(sent[1], req.as_bytes());
    cancel.cancel();
}

#[tokio::test]
async fn reset_schedules_its_derived_effects() {
    let cancel = CancellationToken::new();
    let buffer = CommBuffer::spawn(cancel.clone());
    let mut sink = buffer.add_sink(SinkKind::Server);

    let reset = CommandReq::tmcc2(Tmcc2Command::Reset, 18).unwrap();
    buffer.enqueue_command(&reset, Duration::ZERO, 1, Duration::ZERO);

    let sent = drain(&mut sink, Duration::from_millis(100)).await;
    // the reset itself plus speed/rpm/labor follow-ons
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[0], reset.as_bytes());
    cancel.cancel();
}

#[tokio::test]
async fn duration_repeats_at_the_interval() {
    let cancel = CancellationToken::new();
    let buffer = CommBuffer::spawn(cancel.clone());
    let mut sink = buffer.add_sink(SinkKind::Server);

    let horn = CommandReq::tmcc2_data(Tmcc2Command::QuillingHorn, 7, 10).unwrap();
    // 100ms interval hint over a 350ms hold: 1 initial + 3 repeats
    buffer.enqueue_command(&horn, Duration::ZERO, 1, Duration::from_millis(350));

    let sent = drain(&mut sink, Duration::from_millis(500)).await;
    assert_eq!(sent.len(), 4);
    cancel.cancel();
}

#[tokio::test]
async fn cancelled_sequences_stop_transmitting() {
    let cancel = CancellationToken::new();
    let buffer = CommBuffer::spawn(cancel.clone());
    let mut sink = buffer.add_sink(SinkKind::Server);

    let handle = buffer.enqueue_sequence(vec![
        (vec![1], Duration::ZERO),
        (vec![2], Duration::from_millis(150)),
        (vec![3], Duration::from_millis(200)),
    ]);
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.cancel();

    let sent = drain(&mut sink, Duration::from_millis(300)).await;
    assert_eq!(sent, vec![vec![1]]);
    cancel.cancel();
}

#[tokio::test]
async fn send_request_builds_validates_and_schedules() {
    let cancel = CancellationToken::new();
    let buffer = CommBuffer::spawn(cancel.clone());
    assert!(!buffer.has_sink(SinkKind::Server));
    let mut sink = buffer.add_sink(SinkKind::Server);
    assert!(buffer.has_sink(SinkKind::Server));

    let req = send_request(
        &buffer,
        crate::protocol::command_req::CommandId::Tmcc2(Tmcc2Command::RingBell),
        22,
        0,
        None,
    )
    .unwrap();
    let sent = drain(&mut sink, Duration::from_millis(100)).await;
    assert_eq!(sent, vec![req.as_bytes()]);

    // invalid fields are never queued
    let err = send_request(
        &buffer,
        crate::protocol::command_req::CommandId::Tmcc2(Tmcc2Command::AbsoluteSpeed),
        22,
        500,
        None,
    )
    .unwrap_err();
    assert_eq!(err, crate::error::ProtocolError::OutOfRange);
    cancel.cancel();
}

#[test]
fn tmcc_wrapping_picks_the_window_size() {
    let short = CommandReq::tmcc2(Tmcc2Command::RingBell, 7).unwrap().as_bytes();
    assert_eq!(wrap_tmcc_bytes(&short).len(), 1);

    let four_digit = CommandReq::tmcc2(Tmcc2Command::RingBell, 1234).unwrap().as_bytes();
    let frames = wrap_tmcc_bytes(&four_digit);
    assert_eq!(frames.len(), 1);
    let parsed = crate::pdi::req::PdiReq::from_frame(&frames[0]).unwrap();
    assert_eq!(parsed.command(), crate::pdi::constants::PdiCommand::Tmcc4Tx);

    let multibyte = CommandReq::param(
        crate::protocol::multibyte::ParamCommand::Effects(
            crate::protocol::multibyte::EffectsCommand::SmokeHigh,
        ),
        22,
        crate::protocol::constants::CommandScope::Engine,
    )
    .unwrap()
    .as_bytes();
    // three 3-byte words, one carrier frame each
    assert_eq!(wrap_tmcc_bytes(&multibyte).len(), 3);
}
