// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;
use crate::protocol::command_req::CommandId;

#[test]
fn pattern_has_the_four_blasts() {
    let seq = build(7, CommandScope::Engine).unwrap();

    // expand repeats into individual blasts
    let blasts: Vec<(i32, Duration)> = seq
        .entries()
        .iter()
        .flat_map(|e| std::iter::repeat((e.req.data(), e.delay)).take(e.repeat as usize))
        .collect();

    let intensities: Vec<i32> = blasts.iter().map(|(data, _)| *data).collect();
    assert_eq!(
        intensities,
        vec![
            15, 15, 15, 15, 15, 0, 8, // first
            8, 8, 8, 8, 0, 8, 8, // second
            8, 0, 15, 15, 15, 15, 15, 15, // third
            15, 15, 15, 15, 15, 15, 4, 4, 4, 0, // fourth
        ]
    );

    for entry in seq.entries() {
        assert_eq!(entry.req.command(), CommandId::Tmcc2(Tmcc2Command::QuillingHorn));
        assert_eq!(entry.req.address(), 7);
    }
}

#[test]
fn blasts_step_at_the_documented_delays() {
    let seq = build(7, CommandScope::Engine).unwrap();
    let delays: Vec<Duration> =
        seq.entries().iter().map(|e| e.delay).collect::<std::collections::BTreeSet<_>>().into_iter().collect();
    assert_eq!(
        delays,
        vec![
            Duration::ZERO,
            Duration::from_millis(1100),
            Duration::from_millis(2200),
            Duration::from_millis(3250),
        ]
    );
    assert_eq!(seq.span(), Duration::from_millis(3250));
}

#[test]
fn works_for_trains_too() {
    let seq = build(3, CommandScope::Train).unwrap();
    assert!(seq.entries().iter().all(|e| e.req.scope() == CommandScope::Train));
}
