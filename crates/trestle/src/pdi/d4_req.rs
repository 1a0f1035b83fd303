// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! D4 record operations: four-digit-addressed engine/train records with
//! QUERY/UPDATE byte-range access and COUNT/MAP/FIRST_REC/NEXT_REC
//! enumeration.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ProtocolError;
use crate::pdi::comp_data::{self, EngineRecord};
use crate::pdi::constants::{D4Action, PdiCommand, D4_END_OF_RECORDS};
use crate::protocol::constants::CommandScope;

/// Midnight, Jan 1 2020 UTC: the epoch D4 timestamps count from.
pub const LIONEL_EPOCH: u64 = 1_577_836_800;

/// Seconds since the Lionel epoch, truncated to 32 bits.
pub fn lionel_timestamp() -> u32 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    now.saturating_sub(LIONEL_EPOCH) as u32
}

/// One D4 operation. Record numbers are internal slots; QUERY/UPDATE carry a
/// byte range plus a little-endian timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct D4Req {
    pub command: PdiCommand,
    pub record_no: u16,
    pub action: D4Action,
    pub post_action: u16,
    pub start: u8,
    pub length: u8,
    pub timestamp: Option<u32>,
    pub data: Vec<u8>,
    pub count: Option<u16>,
    pub next_record_no: Option<u16>,
    pub map_tmcc_id: Option<u32>,
}

impl D4Req {
    fn base(command: PdiCommand, record_no: u16, action: D4Action) -> Self {
        D4Req {
            command,
            record_no,
            action,
            post_action: 0,
            start: 0,
            length: 0,
            timestamp: None,
            data: Vec::new(),
            count: None,
            next_record_no: None,
            map_tmcc_id: None,
        }
    }

    pub fn count(command: PdiCommand) -> Self {
        Self::base(command, 0, D4Action::Count)
    }

    pub fn first_rec(command: PdiCommand) -> Self {
        Self::base(command, 0, D4Action::FirstRec)
    }

    pub fn next_rec(command: PdiCommand, record_no: u16) -> Self {
        let mut req = Self::base(command, record_no, D4Action::NextRec);
        req.length = comp_data::ENGINE_RECORD_LEN as u8;
        req
    }

    pub fn map(command: PdiCommand, tmcc_id: u32) -> Self {
        let mut req = Self::base(command, 0, D4Action::Map);
        req.map_tmcc_id = Some(tmcc_id);
        req
    }

    pub fn query(command: PdiCommand, record_no: u16, start: u8, length: u8) -> Self {
        let mut req = Self::base(command, record_no, D4Action::Query);
        req.start = start;
        req.length = length;
        req
    }

    pub fn update(command: PdiCommand, record_no: u16, start: u8, data: Vec<u8>) -> Self {
        let mut req = Self::base(command, record_no, D4Action::Update);
        req.start = start;
        req.length = data.len() as u8;
        req.data = data;
        req
    }

    /// Scope the state layer files this request under.
    pub fn scope(&self) -> CommandScope {
        match self.action {
            D4Action::Count | D4Action::FirstRec => CommandScope::Base,
            _ if self.command == PdiCommand::D4Train => CommandScope::Train,
            _ => CommandScope::Engine,
        }
    }

    /// End-of-enumeration sentinel seen?
    pub fn is_end_of_records(&self) -> bool {
        self.next_record_no == Some(D4_END_OF_RECORDS) || self.record_no == D4_END_OF_RECORDS
    }

    /// A QUERY/UPDATE carrying the complete record image.
    pub fn is_full_record(&self) -> bool {
        matches!(self.action, D4Action::Query | D4Action::Update)
            && self.start == 0
            && self.data.len() == comp_data::ENGINE_RECORD_LEN
    }

    /// Parse the full record image, if present.
    pub fn record(&self) -> Option<EngineRecord> {
        if !self.is_full_record() {
            return None;
        }
        let scope =
            if self.command == PdiCommand::D4Train { CommandScope::Train } else { CommandScope::Engine };
        Some(EngineRecord::parse(&self.data, scope))
    }

    pub fn parse(payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() < 4 {
            return Err(ProtocolError::InvalidFrame);
        }
        let command = PdiCommand::from_u8(payload[0]).ok_or(ProtocolError::UnknownOpcode)?;
        let record_no = u16::from_le_bytes([payload[1], payload[2]]);
        let action = D4Action::from_u8(payload[3]).ok_or(ProtocolError::UnknownOpcode)?;
        let mut req = Self::base(command, record_no, action);
        let rest = &payload[4..];
        match action {
            D4Action::Query | D4Action::Update => {
                if rest.len() < 4 {
                    return Err(ProtocolError::InvalidFrame);
                }
                req.post_action = u16::from_le_bytes([rest[0], rest[1]]);
                req.start = rest[2];
                req.length = rest[3];
                if rest.len() >= 8 {
                    req.timestamp =
                        Some(u32::from_le_bytes([rest[4], rest[5], rest[6], rest[7]]));
                }
                if rest.len() > 8 {
                    req.data = rest[8..].to_vec();
                }
            }
            D4Action::Count => {
                if rest.len() >= 2 {
                    req.post_action = u16::from_le_bytes([rest[0], rest[1]]);
                }
                if rest.len() >= 4 {
                    req.count = Some(u16::from_le_bytes([rest[2], rest[3]]));
                }
            }
            D4Action::Map => {
                if rest.len() >= 2 {
                    req.post_action = u16::from_le_bytes([rest[0], rest[1]]);
                }
                if rest.len() >= 6 {
                    let digits =
                        std::str::from_utf8(&rest[2..6]).map_err(|_| ProtocolError::InvalidFrame)?;
                    req.map_tmcc_id = digits.parse().ok();
                }
            }
            D4Action::FirstRec => {}
            D4Action::NextRec => {
                if rest.len() >= 4 {
                    req.post_action = u16::from_le_bytes([rest[0], rest[1]]);
                    req.start = rest[2];
                    req.length = rest[3];
                }
                if rest.len() >= 6 {
                    req.next_record_no = Some(u16::from_le_bytes([rest[4], rest[5]]));
                }
            }
        }
        Ok(req)
    }

    pub fn payload(&self) -> Vec<u8> {
        let mut out = vec![self.command.as_u8()];
        out.extend_from_slice(&self.record_no.to_le_bytes());
        out.push(self.action.as_u8());
        match self.action {
            D4Action::Query | D4Action::Update => {
                out.extend_from_slice(&self.post_action.to_le_bytes());
                out.push(self.start);
                out.push(self.length);
                let timestamp = self.timestamp.unwrap_or_else(lionel_timestamp);
                out.extend_from_slice(&timestamp.to_le_bytes());
                out.extend_from_slice(&self.data);
            }
            D4Action::Count => {
                out.extend_from_slice(&self.post_action.to_le_bytes());
                if let Some(count) = self.count {
                    out.extend_from_slice(&count.to_le_bytes());
                }
            }
            D4Action::Map => {
                out.extend_from_slice(&self.post_action.to_le_bytes());
                if let Some(id) = self.map_tmcc_id {
                    out.extend_from_slice(format!("{id:04}").as_bytes());
                }
            }
            D4Action::FirstRec => out.push(0),
            D4Action::NextRec => {
                out.extend_from_slice(&self.post_action.to_le_bytes());
                out.push(self.start);
                out.push(self.length);
                if let Some(next) = self.next_record_no {
                    out.extend_from_slice(&next.to_le_bytes());
                }
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "d4_req_tests.rs"]
mod tests;
