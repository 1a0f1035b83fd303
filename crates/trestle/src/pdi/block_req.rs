// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Track-block occupancy reports: logical block state pushed over PDI.

use crate::error::ProtocolError;
use crate::pdi::comp_data::{decode_text, encode_text};
use crate::pdi::constants::PdiCommand;
use crate::protocol::constants::{CommandScope, Direction};

pub const BLOCK_NAME_LEN: usize = 33;

const FLAG_OCCUPIED: u8 = 1 << 0;
const FLAG_ENTERED: u8 = 1 << 1;
const FLAG_SLOWED: u8 = 1 << 2;
const FLAG_STOPPED: u8 = 1 << 3;
const FLAG_LEFT_TO_RIGHT: u8 = 1 << 4;

/// One block report. Prev/next links are block ids, not references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReq {
    pub command: PdiCommand,
    pub block_id: u8,
    pub prev_block_id: Option<u8>,
    pub next_block_id: Option<u8>,
    pub flags: u8,
    pub sensor_track_id: Option<u8>,
    pub switch_id: Option<u8>,
    pub motive_id: Option<u16>,
    pub motive_scope: Option<CommandScope>,
    pub motive_direction: Option<Direction>,
    pub name: Option<String>,
}

impl BlockReq {
    pub fn is_occupied(&self) -> bool {
        self.flags & FLAG_OCCUPIED != 0
    }

    pub fn is_entered(&self) -> bool {
        self.flags & FLAG_ENTERED != 0
    }

    pub fn is_slowed(&self) -> bool {
        self.flags & FLAG_SLOWED != 0
    }

    pub fn is_stopped(&self) -> bool {
        self.flags & FLAG_STOPPED != 0
    }

    pub fn direction(&self) -> Direction {
        if self.flags & FLAG_LEFT_TO_RIGHT != 0 {
            Direction::LeftToRight
        } else {
            Direction::RightToLeft
        }
    }

    pub fn parse(payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() < 11 {
            return Err(ProtocolError::InvalidFrame);
        }
        let command = PdiCommand::from_u8(payload[0]).ok_or(ProtocolError::UnknownOpcode)?;
        let nonzero = |b: u8| if b == 0 { None } else { Some(b) };
        let motive_id = u16::from_le_bytes([payload[7], payload[8]]);
        let name = if payload.len() > 11 {
            decode_text(&payload[11..]).filter(|n| !n.is_empty())
        } else {
            None
        };
        Ok(BlockReq {
            command,
            block_id: payload[1],
            prev_block_id: nonzero(payload[2]),
            next_block_id: nonzero(payload[3]),
            flags: payload[4],
            sensor_track_id: nonzero(payload[5]),
            switch_id: nonzero(payload[6]),
            motive_id: if motive_id == 0 { None } else { Some(motive_id) },
            motive_scope: CommandScope::from_u8(payload[9]),
            motive_direction: Some(Direction::from_u8(payload[10])),
            name,
        })
    }

    pub fn payload(&self) -> Vec<u8> {
        let mut out = vec![
            self.command.as_u8(),
            self.block_id,
            self.prev_block_id.unwrap_or(0),
            self.next_block_id.unwrap_or(0),
            self.flags,
            self.sensor_track_id.unwrap_or(0),
            self.switch_id.unwrap_or(0),
        ];
        out.extend_from_slice(&self.motive_id.unwrap_or(0).to_le_bytes());
        out.push(self.motive_scope.map(CommandScope::as_u8).unwrap_or(0));
        out.push(self.motive_direction.unwrap_or(Direction::Unknown) as u8);
        out.extend_from_slice(&encode_text(self.name.as_deref(), BLOCK_NAME_LEN));
        out
    }
}

#[cfg(test)]
#[path = "block_req_tests.rs"]
mod tests;
