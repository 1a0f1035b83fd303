// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Labor-effect nudges: read current labor from the store, step it by one,
//! clamped to the 0-31 wheel.

use crate::error::ProtocolError;
use crate::protocol::command_req::{CommandId, CommandReq};
use crate::protocol::constants::CommandScope;
use crate::protocol::tmcc2::Tmcc2Command;
use crate::sequence::{SequenceKind, SequenceReq};
use crate::state::store::ComponentStateStore;

fn build(
    kind: SequenceKind,
    address: u32,
    scope: CommandScope,
    step: i32,
    store: &ComponentStateStore,
) -> Result<SequenceReq, ProtocolError> {
    let current = store
        .get(scope, address)
        .and_then(|cell| cell.read(|s| s.engine().map(|e| e.labor_or_default())))
        .unwrap_or(crate::protocol::constants::DEFAULT_ENGINE_LABOR);
    let labor = (i32::from(current) + step).clamp(0, 31);
    let mut seq = SequenceReq::new(kind, address, scope, labor);
    seq.add(CommandReq::new(
        CommandId::Tmcc2(Tmcc2Command::EngineLabor),
        address,
        labor,
        Some(scope),
    )?);
    Ok(seq)
}

pub fn up(
    address: u32,
    scope: CommandScope,
    store: &ComponentStateStore,
) -> Result<SequenceReq, ProtocolError> {
    build(SequenceKind::LaborEffectUp, address, scope, 1, store)
}

pub fn down(
    address: u32,
    scope: CommandScope,
    store: &ComponentStateStore,
) -> Result<SequenceReq, ProtocolError> {
    build(SequenceKind::LaborEffectDown, address, scope, -1, store)
}

#[cfg(test)]
#[path = "labor_effect_tests.rs"]
mod tests;
