// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LCS device requests (ASC2, BPC2, STM2, AMC2, IRDA): GET/SET queries and
//! the RX reports those devices push through the Base 3.

use crate::error::ProtocolError;
use crate::pdi::constants::{action, LcsDevice, PdiCommand};
use crate::protocol::constants::{CommandScope, Direction};

/// One LCS device packet: `[cmd, tmcc_id, action, data...]`. The top bit of
/// a received action byte flags a device-reported error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LcsReq {
    pub device: LcsDevice,
    pub command: PdiCommand,
    pub tmcc_id: u8,
    pub action: u8,
    pub error: bool,
    pub data: Vec<u8>,
}

impl LcsReq {
    pub fn get(device: LcsDevice, tmcc_id: u8, action: u8) -> Self {
        LcsReq {
            device,
            command: device.get_command(),
            tmcc_id,
            action,
            error: false,
            data: Vec::new(),
        }
    }

    pub fn set(device: LcsDevice, tmcc_id: u8, action: u8, data: Vec<u8>) -> Self {
        LcsReq { device, command: device.set_command(), tmcc_id, action, error: false, data }
    }

    /// CONFIG query used during discovery.
    pub fn config(device: LcsDevice, tmcc_id: u8) -> Self {
        Self::get(device, tmcc_id, action::CONFIG)
    }

    pub fn info(device: LcsDevice, tmcc_id: u8) -> Self {
        Self::get(device, tmcc_id, action::INFO)
    }

    pub fn scope(&self) -> CommandScope {
        self.device.scope()
    }

    pub fn is_config(&self) -> bool {
        self.action == action::CONFIG
    }

    /// Operating mode reported by a CONFIG response.
    pub fn mode(&self) -> Option<u8> {
        if self.is_config() {
            self.data.first().copied()
        } else {
            None
        }
    }

    /// On/off state from a CONTROL response.
    pub fn state_value(&self) -> Option<u8> {
        if (action::CONTROL1..=action::CONTROL5).contains(&self.action) {
            self.data.first().copied()
        } else {
            None
        }
    }

    /// IRDA DATA report: `[direction, motive_scope, motive_id:u16le]`.
    pub fn irda_report(&self) -> Option<(Direction, CommandScope, u32)> {
        if self.device != LcsDevice::Irda || self.action != action::DATA || self.data.len() < 4 {
            return None;
        }
        let direction = Direction::from_u8(self.data[0]);
        let scope = CommandScope::from_u8(self.data[1])?;
        let id = u32::from(u16::from_le_bytes([self.data[2], self.data[3]]));
        Some((direction, scope, id))
    }

    pub fn parse(payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() < 3 {
            return Err(ProtocolError::InvalidFrame);
        }
        let command = PdiCommand::from_u8(payload[0]).ok_or(ProtocolError::UnknownOpcode)?;
        let device = command.lcs_device().ok_or(ProtocolError::UnknownOpcode)?;
        let raw_action = payload[2];
        let error = raw_action & action::ERROR_FLAG != 0;
        Ok(LcsReq {
            device,
            command,
            tmcc_id: payload[1],
            action: raw_action & !action::ERROR_FLAG,
            error,
            data: payload[3..].to_vec(),
        })
    }

    pub fn payload(&self) -> Vec<u8> {
        let mut out = vec![self.command.as_u8(), self.tmcc_id, self.action];
        out.extend_from_slice(&self.data);
        out
    }
}

#[cfg(test)]
#[path = "lcs_req_tests.rs"]
mod tests;
