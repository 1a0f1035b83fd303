// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Horn and bell tone selection: set a slider position and prove it with a
//! blast or a ding, plus the steward-chatter one-shot.

use std::time::Duration;

use rand::prelude::IndexedRandom;

use crate::error::ProtocolError;
use crate::protocol::command_req::{CommandId, CommandReq};
use crate::protocol::constants::CommandScope;
use crate::protocol::multibyte::{DialogCommand, ParamCommand};
use crate::protocol::tmcc2::Tmcc2Command;
use crate::sequence::{SequenceKind, SequenceReq};

fn aux1(address: u32, scope: CommandScope) -> Result<CommandReq, ProtocolError> {
    CommandReq::new(CommandId::Tmcc2(Tmcc2Command::Aux1OptionOne), address, 0, Some(scope))
}

/// Select a horn tone (quilling intensity) and blow it twice.
pub fn set_horn_tone(
    address: u32,
    scope: CommandScope,
    tone: i32,
) -> Result<SequenceReq, ProtocolError> {
    let mut seq = SequenceReq::new(SequenceKind::SetHornTone, address, scope, tone);
    seq.add(aux1(address, scope)?);
    seq.add_delayed(
        CommandReq::new(CommandId::Tmcc2(Tmcc2Command::QuillingHorn), address, tone, Some(scope))?,
        Duration::from_millis(200),
    );
    seq.add_with(
        CommandReq::new(CommandId::Tmcc2(Tmcc2Command::BlowHornOne), address, 0, Some(scope))?,
        Duration::from_millis(400),
        2,
    );
    Ok(seq)
}

/// Select a bell slider position (2-5) and prove it with one ding.
pub fn set_bell_tone(
    address: u32,
    scope: CommandScope,
    position: i32,
) -> Result<SequenceReq, ProtocolError> {
    let mut seq = SequenceReq::new(SequenceKind::SetBellTone, address, scope, position);
    seq.add(aux1(address, scope)?);
    seq.add_delayed(
        CommandReq::new(
            CommandId::Tmcc2(Tmcc2Command::BellSliderPosition),
            address,
            position,
            Some(scope),
        )?,
        Duration::from_millis(200),
    );
    seq.add_delayed(
        CommandReq::new(CommandId::Tmcc2(Tmcc2Command::BellOneShotDing), address, 3, Some(scope))?,
        Duration::from_millis(400),
    );
    Ok(seq)
}

/// Cycle the horn through its mid tone, twice over.
pub fn cycle_horn_tone(address: u32, scope: CommandScope) -> Result<SequenceReq, ProtocolError> {
    let mut seq = SequenceReq::new(SequenceKind::CycleHornTone, address, scope, 0);
    seq.add(aux1(address, scope)?);
    seq.add_delayed(
        CommandReq::new(CommandId::Tmcc2(Tmcc2Command::QuillingHorn), address, 2, Some(scope))?,
        Duration::from_millis(200),
    );
    seq.add_with(
        CommandReq::new(CommandId::Tmcc2(Tmcc2Command::BlowHornOne), address, 0, Some(scope))?,
        Duration::from_millis(400),
        2,
    );
    Ok(seq)
}

/// Cycle the bell to its lowest slider position with a proving ding.
pub fn cycle_bell_tone(address: u32, scope: CommandScope) -> Result<SequenceReq, ProtocolError> {
    let mut seq = SequenceReq::new(SequenceKind::CycleBellTone, address, scope, 0);
    seq.add(aux1(address, scope)?);
    seq.add_delayed(
        CommandReq::new(
            CommandId::Tmcc2(Tmcc2Command::BellSliderPosition),
            address,
            2,
            Some(scope),
        )?,
        Duration::from_millis(200),
    );
    seq.add_delayed(
        CommandReq::new(CommandId::Tmcc2(Tmcc2Command::BellOneShotDing), address, 3, Some(scope))?,
        Duration::from_millis(400),
    );
    Ok(seq)
}

/// A random bit of steward chatter from a StationSounds car.
pub fn steward_chatter(address: u32, scope: CommandScope) -> Result<SequenceReq, ProtocolError> {
    const CHATTER: &[DialogCommand] = &[
        DialogCommand::StewardWelcomeAboard,
        DialogCommand::StewardFirstSeating,
        DialogCommand::StewardSecondSeating,
        DialogCommand::StewardLoungeCarOpen,
    ];
    let mut rng = rand::rng();
    let dialog = *CHATTER.choose(&mut rng).unwrap_or(&DialogCommand::StewardWelcomeAboard);
    let mut seq = SequenceReq::new(SequenceKind::StewardChatter, address, scope, 0);
    seq.add(CommandReq::param(ParamCommand::Dialog(dialog), address, scope)?);
    Ok(seq)
}

#[cfg(test)]
#[path = "tone_tests.rs"]
mod tests;
