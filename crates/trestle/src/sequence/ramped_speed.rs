// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ramped speed changes: a geometric walk from the current speed to the
//! target, with coupled RPM and engine-labor commands, paced by momentum,
//! and optional tower/engineer dialog bookends.

use std::time::Duration;

use crate::error::ProtocolError;
use crate::protocol::command_req::{CommandId, CommandReq};
use crate::protocol::constants::{CommandScope, RRSpeed};
use crate::protocol::multibyte::{DialogCommand, ParamCommand};
use crate::protocol::tmcc1::Tmcc1Command;
use crate::protocol::tmcc2::{speed_to_rpm, Tmcc2Command};
use crate::sequence::{SequenceKind, SequenceReq};
use crate::state::store::ComponentStateStore;

/// Labor response to a speed change; swappable because the stock curve is a
/// tuned heuristic, not hardware truth.
pub type LaborPolicy = fn(cur_speed: i32, new_speed: i32, cur_labor: u8) -> u8;

/// Default labor curve: effort climbs with acceleration and relaxes on
/// deceleration.
pub fn labor_delta(cur_speed: i32, new_speed: i32, cur_labor: u8) -> u8 {
    let delta = new_speed - cur_speed;
    let labor = i32::from(cur_labor);
    if delta > 0 {
        let rise = ((f64::from(delta) * 0.09546) - 0.5401).round().max(0.0) as i32;
        (labor + rise).clamp(0, 31) as u8
    } else if delta < 0 {
        let drop = ((f64::from(-delta) * 0.060_30) + 0.010_52).round().max(0.0) as i32;
        (labor - drop).clamp(0, 31) as u8
    } else {
        cur_labor
    }
}

/// Tower/engineer dialog pair for a railroad speed band, when the sound set
/// defines one.
pub fn dialog_for(band: RRSpeed) -> Option<(DialogCommand, DialogCommand)> {
    match band {
        RRSpeed::StopHold => {
            Some((DialogCommand::TowerSpeedStopHold, DialogCommand::EngineerSpeedStopHold))
        }
        RRSpeed::Roll => None,
        RRSpeed::Restricted => {
            Some((DialogCommand::TowerSpeedRestricted, DialogCommand::EngineerSpeedRestricted))
        }
        RRSpeed::Slow => Some((DialogCommand::TowerSpeedSlow, DialogCommand::EngineerSpeedSlow)),
        RRSpeed::Medium => {
            Some((DialogCommand::TowerSpeedMedium, DialogCommand::EngineerSpeedMedium))
        }
        RRSpeed::Limited => {
            Some((DialogCommand::TowerSpeedLimited, DialogCommand::EngineerSpeedLimited))
        }
        RRSpeed::Normal => {
            Some((DialogCommand::TowerSpeedNormal, DialogCommand::EngineerSpeedNormal))
        }
        RRSpeed::Highball => {
            Some((DialogCommand::TowerSpeedHighball, DialogCommand::EngineerSpeedHighball))
        }
    }
}

/// Expand a ramped speed change for `(scope, address)`.
pub fn build(
    address: u32,
    scope: CommandScope,
    target: i32,
    dialog: bool,
    is_tmcc: bool,
    store: &ComponentStateStore,
    policy: LaborPolicy,
) -> Result<SequenceReq, ProtocolError> {
    let kind = if dialog { SequenceKind::RampedSpeedDialog } else { SequenceKind::RampedSpeed };
    let mut seq = SequenceReq::new(kind, address, scope, target);

    let band = if is_tmcc {
        RRSpeed::from_tmcc1_step(target)
    } else {
        RRSpeed::from_tmcc2_step(target)
    };
    let dialogs = dialog_for(band).filter(|_| dialog);

    let abs_speed = |speed: i32| -> Result<CommandReq, ProtocolError> {
        if is_tmcc {
            CommandReq::new(CommandId::Tmcc1(Tmcc1Command::AbsoluteSpeed), address, speed, Some(scope))
        } else {
            CommandReq::new(CommandId::Tmcc2(Tmcc2Command::AbsoluteSpeed), address, speed, Some(scope))
        }
    };
    let diesel_rpm = |rpm: u8| {
        CommandReq::new(CommandId::Tmcc2(Tmcc2Command::DieselRpm), address, i32::from(rpm), Some(scope))
    };
    let engine_labor = |labor: u8| {
        CommandReq::new(
            CommandId::Tmcc2(Tmcc2Command::EngineLabor),
            address,
            i32::from(labor),
            Some(scope),
        )
    };
    let dialog_req = |cmd: DialogCommand| {
        CommandReq::param(ParamCommand::Dialog(cmd), address, scope)
    };

    let snapshot = store
        .get(scope, address)
        .and_then(|cell| cell.read(|s| s.engine().cloned()));
    let current = snapshot.as_ref().and_then(|e| e.speed);

    let Some((engine, cur_speed)) = snapshot.as_ref().zip(current) else {
        // no state record yet: fall back to a direct speed set
        if let Some((tower, engineer)) = dialogs {
            seq.add(dialog_req(tower)?);
            seq.add_delayed(abs_speed(target)?, Duration::from_secs(3));
            if !is_tmcc {
                seq.add_delayed(diesel_rpm(speed_to_rpm(target))?, Duration::from_secs(4));
            }
            seq.add_delayed(dialog_req(engineer)?, Duration::from_secs(6));
        } else {
            seq.add(abs_speed(target)?);
            if !is_tmcc {
                seq.add_delayed(diesel_rpm(speed_to_rpm(target))?, Duration::from_secs(4));
            }
        }
        return Ok(seq);
    };

    let legacy = engine.is_legacy() || !is_tmcc;
    let target = target.min(engine.speed_max());
    let momentum = engine.momentum;
    let step = match momentum {
        Some(m) if m >= 7 => 1,
        Some(m) if m >= 6 => 2,
        _ => 3,
    };
    let step_delay =
        Duration::from_millis(200 + u64::from(momentum.unwrap_or(0)) * 10);

    let mut delay = Duration::ZERO;
    if let Some((tower, _)) = dialogs {
        seq.add(dialog_req(tower)?);
    }

    if cur_speed == target {
        seq.add(abs_speed(target)?);
    } else {
        let init_labor = engine.labor_or_default();
        let mut cur_labor = policy(cur_speed, target, init_labor);
        seq.add_delayed(engine_labor(cur_labor)?, delay);
        let mut cur_rpm = engine.rpm;
        // decelerating: drop the prime mover up front
        if legacy && cur_speed > target {
            let rpm = speed_to_rpm(target);
            seq.add_delayed(diesel_rpm(rpm)?, delay);
            cur_rpm = Some(rpm);
        }
        let accelerating = cur_speed < target;
        let mut speed = cur_speed;
        loop {
            speed = if accelerating {
                (speed + step).min(target)
            } else {
                (speed - step).max(target)
            };
            seq.add_delayed(abs_speed(speed)?, delay);
            if legacy {
                let labor = policy(speed, target, init_labor);
                if labor != cur_labor {
                    seq.add_delayed(engine_labor(labor)?, delay);
                    cur_labor = labor;
                }
                if accelerating {
                    let rpm = speed_to_rpm(speed);
                    if Some(rpm) != cur_rpm {
                        seq.add_delayed(diesel_rpm(rpm)?, delay);
                        cur_rpm = Some(rpm);
                    }
                }
            }
            if speed == target {
                break;
            }
            delay += step_delay;
        }
        // settle labor back to its resting value
        if legacy {
            seq.add_delayed(engine_labor(init_labor)?, delay);
        }
    }

    if let Some((_, engineer)) = dialogs {
        let at = delay.max(Duration::from_millis(2500));
        seq.add_delayed(dialog_req(engineer)?, at);
    }
    Ok(seq)
}

#[cfg(test)]
#[path = "ramped_speed_tests.rs"]
mod tests;
