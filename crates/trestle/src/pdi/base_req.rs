// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! BASE_MEMORY and BASE_* record reads: byte-level access to the Base 3's
//! component tables for short (1-99) addresses.

use crate::error::ProtocolError;
use crate::pdi::comp_data;
use crate::pdi::constants::PdiCommand;
use crate::protocol::constants::CommandScope;

/// A record read request or response against the Base 3's tables.
///
/// Layout: `[cmd, tmcc_id, scope, start:u16le, length:u16le, data...]` for
/// BASE_MEMORY; the scoped `BASE_*` commands omit the scope byte and imply
/// it from the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseReq {
    pub command: PdiCommand,
    pub tmcc_id: u8,
    pub scope: CommandScope,
    pub start: u16,
    pub length: u16,
    pub data: Vec<u8>,
}

impl BaseReq {
    /// Read the full record for `(scope, tmcc_id)`.
    pub fn memory_read(scope: CommandScope, tmcc_id: u8) -> Self {
        let length = comp_data::record_length(scope).unwrap_or(0) as u16;
        BaseReq { command: PdiCommand::BaseMemory, tmcc_id, scope, start: 0, length, data: Vec::new() }
    }

    /// Write `data` at `start` within the record for `(scope, tmcc_id)`.
    pub fn memory_write(scope: CommandScope, tmcc_id: u8, start: u16, data: Vec<u8>) -> Self {
        let length = data.len() as u16;
        BaseReq { command: PdiCommand::BaseMemory, tmcc_id, scope, start, length, data }
    }

    /// Query the command station itself.
    pub fn base_info() -> Self {
        BaseReq {
            command: PdiCommand::BaseBase,
            tmcc_id: 0,
            scope: CommandScope::Base,
            start: 0,
            length: 0,
            data: Vec::new(),
        }
    }

    fn implied_scope(command: PdiCommand) -> Option<CommandScope> {
        match command {
            PdiCommand::BaseEngine => Some(CommandScope::Engine),
            PdiCommand::BaseTrain => Some(CommandScope::Train),
            PdiCommand::BaseAcc => Some(CommandScope::Acc),
            PdiCommand::BaseBase => Some(CommandScope::Base),
            PdiCommand::BaseRoute => Some(CommandScope::Route),
            PdiCommand::BaseSwitch => Some(CommandScope::Switch),
            _ => None,
        }
    }

    pub fn parse(payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() < 2 {
            return Err(ProtocolError::InvalidFrame);
        }
        let command = PdiCommand::from_u8(payload[0]).ok_or(ProtocolError::UnknownOpcode)?;
        let tmcc_id = payload[1];
        if command == PdiCommand::BaseMemory {
            if payload.len() < 7 {
                return Err(ProtocolError::InvalidFrame);
            }
            let scope = CommandScope::from_u8(payload[2]).ok_or(ProtocolError::InvalidFrame)?;
            let start = u16::from_le_bytes([payload[3], payload[4]]);
            let length = u16::from_le_bytes([payload[5], payload[6]]);
            Ok(BaseReq { command, tmcc_id, scope, start, length, data: payload[7..].to_vec() })
        } else {
            let scope = Self::implied_scope(command).ok_or(ProtocolError::UnknownOpcode)?;
            Ok(BaseReq {
                command,
                tmcc_id,
                scope,
                start: 0,
                length: payload.len().saturating_sub(2) as u16,
                data: payload[2..].to_vec(),
            })
        }
    }

    pub fn payload(&self) -> Vec<u8> {
        let mut out = vec![self.command.as_u8(), self.tmcc_id];
        if self.command == PdiCommand::BaseMemory {
            out.push(self.scope.as_u8());
            out.extend_from_slice(&self.start.to_le_bytes());
            out.extend_from_slice(&self.length.to_le_bytes());
        }
        out.extend_from_slice(&self.data);
        out
    }

    /// A response carrying the complete record image for its scope.
    pub fn is_full_record(&self) -> bool {
        self.start == 0
            && comp_data::record_length(self.scope)
                .is_some_and(|len| self.data.len() == len && usize::from(self.length) == len)
    }

    /// The record length this request expects, used by the synchronizer to
    /// accept a response as complete.
    pub fn expected_length(&self) -> usize {
        usize::from(self.length)
    }
}

#[cfg(test)]
#[path = "base_req_tests.rs"]
mod tests;
