// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Grade-crossing signal: the long-long-short-long quilling-horn pattern.

use std::time::Duration;

use crate::error::ProtocolError;
use crate::protocol::command_req::CommandReq;
use crate::protocol::constants::CommandScope;
use crate::protocol::tmcc2::Tmcc2Command;
use crate::sequence::{SequenceKind, SequenceReq};

/// Build the fixed blast pattern for one engine or train.
pub fn build(address: u32, scope: CommandScope) -> Result<SequenceReq, ProtocolError> {
    let horn = |intensity: i32| {
        CommandReq::new(
            crate::protocol::command_req::CommandId::Tmcc2(Tmcc2Command::QuillingHorn),
            address,
            intensity,
            Some(scope),
        )
    };
    let full = horn(15)?;
    let mid = horn(8)?;
    let low = horn(4)?;
    let rest = horn(0)?;

    let mut seq = SequenceReq::new(SequenceKind::GradeCrossing, address, scope, 0);

    // first blast
    let mut delay = Duration::ZERO;
    seq.add_with(full.clone(), delay, 5);
    seq.add_delayed(rest.clone(), delay);
    seq.add_delayed(mid.clone(), delay);

    // second blast
    delay += Duration::from_millis(1100);
    seq.add_with(mid.clone(), delay, 4);
    seq.add_delayed(rest.clone(), delay);
    seq.add_with(mid.clone(), delay, 2);

    // third blast
    delay += Duration::from_millis(1100);
    seq.add_delayed(mid, delay);
    seq.add_delayed(rest.clone(), delay);
    seq.add_with(full.clone(), delay, 6);

    // fourth blast
    delay += Duration::from_millis(1050);
    seq.add_with(full, delay, 6);
    seq.add_with(low, delay, 3);
    seq.add_delayed(rest, delay);

    Ok(seq)
}

#[cfg(test)]
#[path = "grade_crossing_tests.rs"]
mod tests;
