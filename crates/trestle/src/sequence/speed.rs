// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Direct speed intents: absolute speed with its derived RPM, and the
//! railroad-speed form with tower/engineer dialog.

use std::time::Duration;

use crate::error::ProtocolError;
use crate::protocol::command_req::{CommandId, CommandReq};
use crate::protocol::constants::{CommandScope, RRSpeed};
use crate::protocol::multibyte::ParamCommand;
use crate::protocol::tmcc2::{speed_to_rpm, Tmcc2Command};
use crate::sequence::ramped_speed::dialog_for;
use crate::sequence::{SequenceKind, SequenceReq};
use crate::state::store::ComponentStateStore;

/// ABSOLUTE_SPEED plus the matching DIESEL_RPM, clamped to the engine's
/// speed cap when the store knows it.
pub fn absolute_speed_rpm(
    address: u32,
    scope: CommandScope,
    speed: i32,
    store: &ComponentStateStore,
) -> Result<SequenceReq, ProtocolError> {
    let cap = store
        .get(scope, address)
        .and_then(|cell| cell.read(|s| s.engine().map(|e| e.speed_max())));
    let speed = cap.map_or(speed, |max| speed.min(max));
    let mut seq = SequenceReq::new(SequenceKind::AbsoluteSpeedRpm, address, scope, speed);
    seq.add(CommandReq::new(
        CommandId::Tmcc2(Tmcc2Command::AbsoluteSpeed),
        address,
        speed,
        Some(scope),
    )?);
    seq.add(CommandReq::new(
        CommandId::Tmcc2(Tmcc2Command::DieselRpm),
        address,
        i32::from(speed_to_rpm(speed)),
        Some(scope),
    )?);
    Ok(seq)
}

/// Railroad-speed change announced by the tower and acknowledged by the
/// engineer.
pub fn speed_with_dialog(
    address: u32,
    scope: CommandScope,
    band: RRSpeed,
) -> Result<SequenceReq, ProtocolError> {
    let speed = band.tmcc2_step();
    let mut seq = SequenceReq::new(SequenceKind::SpeedWithDialog, address, scope, speed);
    let dialogs = dialog_for(band);
    if let Some((tower, _)) = dialogs {
        seq.add(CommandReq::param(ParamCommand::Dialog(tower), address, scope)?);
    }
    seq.add_delayed(
        CommandReq::new(CommandId::Tmcc2(Tmcc2Command::AbsoluteSpeed), address, speed, Some(scope))?,
        Duration::from_secs(3),
    );
    seq.add_delayed(
        CommandReq::new(
            CommandId::Tmcc2(Tmcc2Command::DieselRpm),
            address,
            i32::from(speed_to_rpm(speed)),
            Some(scope),
        )?,
        Duration::from_secs(4),
    );
    if let Some((_, engineer)) = dialogs {
        seq.add_delayed(
            CommandReq::param(ParamCommand::Dialog(engineer), address, scope)?,
            Duration::from_secs(6),
        );
    }
    Ok(seq)
}

#[cfg(test)]
#[path = "speed_tests.rs"]
mod tests;
