// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sample() -> BlockReq {
    BlockReq {
        command: PdiCommand::BlockRx,
        block_id: 4,
        prev_block_id: Some(3),
        next_block_id: Some(5),
        flags: 0b1_0011, // occupied, entered, left-to-right
        sensor_track_id: Some(2),
        switch_id: Some(7),
        motive_id: Some(1234),
        motive_scope: Some(CommandScope::Engine),
        motive_direction: Some(Direction::LeftToRight),
        name: Some("EAST SIDING".to_owned()),
    }
}

#[test]
fn block_report_round_trips() {
    let req = sample();
    let parsed = BlockReq::parse(&req.payload()).unwrap();
    assert_eq!(parsed, req);
}

#[test]
fn flag_accessors() {
    let req = sample();
    assert!(req.is_occupied());
    assert!(req.is_entered());
    assert!(!req.is_slowed());
    assert!(!req.is_stopped());
    assert_eq!(req.direction(), Direction::LeftToRight);
}

#[test]
fn links_are_ids_with_zero_meaning_none() {
    let mut req = sample();
    req.prev_block_id = None;
    req.motive_id = None;
    req.motive_scope = None;
    let payload = req.payload();
    assert_eq!(payload[2], 0);
    let parsed = BlockReq::parse(&payload).unwrap();
    assert_eq!(parsed.prev_block_id, None);
    assert_eq!(parsed.motive_id, None);
}

#[test]
fn short_payloads_are_invalid() {
    assert!(BlockReq::parse(&[PdiCommand::BlockRx.as_u8(), 4]).is_err());
}
