// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine and train state: speed, direction, momentum, sound coupling, and
//! consist membership, kept current from the command stream and from Base 3
//! records.

use serde_json::json;

use crate::pdi::comp_data::{
    momentum_to_tmcc, train_brake_to_tmcc, unpack_rpm_labor, ConsistComponent, EngineRecord,
};
use crate::protocol::command_req::{CommandId, CommandReq};
use crate::protocol::constants::{ControlType, DEFAULT_ENGINE_LABOR, RPM_ENGINE_TYPES};
use crate::protocol::multibyte::{EffectsCommand, ParamCommand};
use crate::protocol::tmcc1::Tmcc1Command;
use crate::protocol::tmcc2::{speed_to_rpm, Tmcc2Command};

/// Which way the locomotive is pointed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineDirection {
    Forward,
    Reverse,
}

/// Mutable engine (or train) state fields.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    pub speed: Option<i32>,
    pub target_speed: Option<i32>,
    pub direction: Option<EngineDirection>,
    pub momentum: Option<u8>,
    pub train_brake: Option<u8>,
    pub rpm: Option<u8>,
    pub labor: Option<u8>,
    pub smoke: Option<u8>,
    pub speed_limit: Option<u8>,
    pub max_speed: Option<u8>,
    pub control_type: Option<ControlType>,
    pub sound_type: Option<u8>,
    pub engine_type: Option<u8>,
    pub road_name: Option<String>,
    pub road_number: Option<String>,
    /// Trains only: membership, head to tail.
    pub consist_flags: Option<u8>,
    pub consist: Vec<ConsistComponent>,
}

impl EngineState {
    pub fn is_legacy(&self) -> bool {
        self.control_type.map(ControlType::is_legacy).unwrap_or(false)
    }

    /// Engines addressed over the Legacy syntax derive RPM from speed; an
    /// unhydrated record is assumed to be a diesel-style sound set.
    fn derives_rpm(&self) -> bool {
        self.engine_type
            .map(|t| RPM_ENGINE_TYPES.contains(&t))
            .unwrap_or(true)
    }

    pub fn labor_or_default(&self) -> u8 {
        self.labor.unwrap_or(DEFAULT_ENGINE_LABOR)
    }

    /// Highest commandable speed for this engine.
    pub fn speed_max(&self) -> i32 {
        let cap = self
            .max_speed
            .into_iter()
            .chain(self.speed_limit)
            .filter(|&s| s != 0)
            .min();
        match cap {
            Some(limit) => i32::from(limit),
            None if self.is_legacy() || self.control_type.is_none() => 199,
            None => 31,
        }
    }

    /// Apply one observed TMCC command.
    pub fn apply_command(&mut self, req: &CommandReq) {
        match req.semantic() {
            CommandId::Tmcc2(cmd) => self.apply_tmcc2(cmd, req.data()),
            CommandId::Tmcc1(cmd) => self.apply_tmcc1(cmd, req.data()),
            CommandId::Param(ParamCommand::Effects(cmd)) => self.apply_effect(cmd),
            _ => {}
        }
    }

    fn apply_tmcc2(&mut self, cmd: Tmcc2Command, data: i32) {
        match cmd {
            Tmcc2Command::AbsoluteSpeed | Tmcc2Command::SpeedStopHold | Tmcc2Command::SpeedRoll
            | Tmcc2Command::SpeedRestricted | Tmcc2Command::SpeedSlow | Tmcc2Command::SpeedMedium
            | Tmcc2Command::SpeedLimited | Tmcc2Command::SpeedNormal | Tmcc2Command::SpeedHighball => {
                self.set_speed(data);
            }
            Tmcc2Command::RelativeSpeed => {
                let next = (self.speed.unwrap_or(0) + data).clamp(0, self.speed_max());
                self.set_speed(next);
            }
            Tmcc2Command::StopImmediate => self.stop(),
            Tmcc2Command::Reset => self.stop(),
            Tmcc2Command::ShutdownDelayed | Tmcc2Command::ShutdownImmediate => {
                self.rpm = Some(0);
                self.labor = Some(DEFAULT_ENGINE_LABOR);
            }
            Tmcc2Command::ForwardDirection => self.direction = Some(EngineDirection::Forward),
            Tmcc2Command::ReverseDirection => self.direction = Some(EngineDirection::Reverse),
            Tmcc2Command::ToggleDirection => {
                self.direction = match self.direction {
                    Some(EngineDirection::Forward) => Some(EngineDirection::Reverse),
                    Some(EngineDirection::Reverse) => Some(EngineDirection::Forward),
                    None => None,
                };
            }
            Tmcc2Command::Momentum => self.momentum = Some(data as u8),
            Tmcc2Command::MomentumLow => self.momentum = Some(0),
            Tmcc2Command::MomentumMedium => self.momentum = Some(3),
            Tmcc2Command::MomentumHigh => self.momentum = Some(7),
            Tmcc2Command::TrainBrake => self.train_brake = Some(data as u8),
            Tmcc2Command::DieselRpm => self.rpm = Some(data as u8),
            Tmcc2Command::EngineLabor | Tmcc2Command::EngineLaborDefault => {
                self.labor = Some(data as u8);
            }
            Tmcc2Command::ClearConsist => {
                self.consist.clear();
                self.consist_flags = None;
            }
            _ => {}
        }
    }

    fn apply_tmcc1(&mut self, cmd: Tmcc1Command, data: i32) {
        match cmd {
            Tmcc1Command::AbsoluteSpeed
            | Tmcc1Command::SpeedStopHold
            | Tmcc1Command::SpeedRoll
            | Tmcc1Command::SpeedRestricted
            | Tmcc1Command::SpeedSlow
            | Tmcc1Command::SpeedMedium
            | Tmcc1Command::SpeedLimited
            | Tmcc1Command::SpeedNormal
            | Tmcc1Command::SpeedHighball => {
                self.speed = Some(data);
                self.target_speed = Some(data);
            }
            Tmcc1Command::StopImmediate | Tmcc1Command::Reset => {
                self.speed = Some(0);
                self.target_speed = Some(0);
                self.rpm = Some(0);
            }
            Tmcc1Command::RelativeSpeed => {
                let next = (self.speed.unwrap_or(0) + data).clamp(0, 31);
                self.speed = Some(next);
                self.target_speed = Some(next);
            }
            Tmcc1Command::ForwardDirection => self.direction = Some(EngineDirection::Forward),
            Tmcc1Command::ReverseDirection => self.direction = Some(EngineDirection::Reverse),
            Tmcc1Command::ToggleDirection => {
                self.direction = match self.direction {
                    Some(EngineDirection::Forward) => Some(EngineDirection::Reverse),
                    Some(EngineDirection::Reverse) => Some(EngineDirection::Forward),
                    None => None,
                };
            }
            Tmcc1Command::MomentumLow => self.momentum = Some(0),
            Tmcc1Command::MomentumMedium => self.momentum = Some(3),
            Tmcc1Command::MomentumHigh => self.momentum = Some(7),
            Tmcc1Command::SmokeOn => self.smoke = Some(1),
            Tmcc1Command::SmokeOff => self.smoke = Some(0),
            Tmcc1Command::ClearConsist => {
                self.consist.clear();
                self.consist_flags = None;
            }
            _ => {}
        }
    }

    fn apply_effect(&mut self, cmd: EffectsCommand) {
        match cmd {
            EffectsCommand::SmokeOff => self.smoke = Some(0),
            EffectsCommand::SmokeLow => self.smoke = Some(1),
            EffectsCommand::SmokeMedium => self.smoke = Some(2),
            EffectsCommand::SmokeHigh => self.smoke = Some(3),
            _ => {}
        }
    }

    fn set_speed(&mut self, speed: i32) {
        self.speed = Some(speed);
        self.target_speed = Some(speed);
        if self.derives_rpm() {
            self.rpm = Some(speed_to_rpm(speed));
        }
    }

    fn stop(&mut self) {
        self.speed = Some(0);
        self.target_speed = Some(0);
        self.rpm = Some(0);
        self.labor = Some(DEFAULT_ENGINE_LABOR);
    }

    /// HALT fan-out: zero motion and sound-motor state.
    pub fn halt(&mut self) {
        self.speed = Some(0);
        self.target_speed = Some(0);
        self.rpm = Some(0);
    }

    /// Bulk-apply a full Base 3 record image.
    pub fn apply_record(&mut self, record: &EngineRecord) {
        if let Some(speed) = record.speed {
            self.speed = Some(i32::from(speed));
        }
        if let Some(target) = record.target_speed {
            self.target_speed = Some(i32::from(target));
        }
        if let Some(brake) = record.train_brake {
            self.train_brake = Some(train_brake_to_tmcc(brake));
        }
        if let Some(rpm_labor) = record.rpm_labor {
            let (rpm, labor) = unpack_rpm_labor(rpm_labor);
            self.rpm = Some(rpm);
            self.labor = Some(labor);
        }
        if let Some(momentum) = record.momentum {
            self.momentum = Some(momentum_to_tmcc(momentum));
        }
        if record.road_name.is_some() {
            self.road_name.clone_from(&record.road_name);
        }
        if record.road_number.is_some() {
            self.road_number.clone_from(&record.road_number);
        }
        if let Some(engine_type) = record.engine_type {
            self.engine_type = Some(engine_type);
        }
        if let Some(control) = record.control_type {
            self.control_type = ControlType::from_u8(control);
        }
        if let Some(sound) = record.sound_type {
            self.sound_type = Some(sound);
        }
        if let Some(smoke) = record.smoke {
            self.smoke = Some(smoke.min(3));
        }
        if let Some(limit) = record.speed_limit {
            self.speed_limit = Some(limit);
        }
        if let Some(max) = record.max_speed {
            self.max_speed = Some(max);
        }
        if record.consist_flags.is_some() {
            self.consist_flags = record.consist_flags;
        }
        if !record.consist.is_empty() {
            self.consist.clone_from(&record.consist);
        }
    }

    /// Rebuild the Base 3 record view of this state.
    pub fn to_record(&self, tmcc_id4: Option<u32>) -> EngineRecord {
        let rpm_labor = match (self.rpm, self.labor) {
            (None, None) => None,
            (rpm, labor) => Some(crate::pdi::comp_data::pack_rpm_labor(
                rpm.unwrap_or(0),
                labor.unwrap_or(DEFAULT_ENGINE_LABOR),
            )),
        };
        EngineRecord {
            speed: self.speed.map(|s| s.clamp(0, 199) as u8),
            target_speed: self.target_speed.map(|s| s.clamp(0, 199) as u8),
            train_brake: self.train_brake.map(crate::pdi::comp_data::train_brake_to_base),
            rpm_labor,
            fuel_level: None,
            water_level: None,
            momentum: self.momentum.map(crate::pdi::comp_data::momentum_to_base),
            road_name: self.road_name.clone(),
            road_number: self.road_number.clone(),
            engine_type: self.engine_type,
            control_type: self.control_type.map(|c| c as u8),
            sound_type: self.sound_type,
            engine_class: None,
            smoke: self.smoke,
            speed_limit: self.speed_limit,
            max_speed: self.max_speed,
            consist_flags: self.consist_flags,
            consist: self.consist.clone(),
            tmcc_id4,
            timestamp: None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "speed": self.speed,
            "target_speed": self.target_speed,
            "direction": self.direction.map(|d| match d {
                EngineDirection::Forward => "forward",
                EngineDirection::Reverse => "reverse",
            }),
            "momentum": self.momentum,
            "train_brake": self.train_brake,
            "rpm": self.rpm,
            "labor": self.labor,
            "smoke": self.smoke,
            "speed_limit": self.speed_limit,
            "max_speed": self.max_speed,
            "road_name": self.road_name,
            "road_number": self.road_number,
            "is_legacy": self.is_legacy(),
            "consist": self.consist.iter().map(|c| json!({
                "tmcc_id": c.tmcc_id,
                "head": c.is_head(),
                "tail": c.is_tail(),
                "forward": c.is_forward(),
            })).collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
