// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The unified PDI request: every packet class the Base 3 speaks, with one
//! parse/serialize surface over the framing layer.

use crate::error::ProtocolError;
use crate::pdi::base_req::BaseReq;
use crate::pdi::block_req::BlockReq;
use crate::pdi::constants::PdiCommand;
use crate::pdi::d4_req::D4Req;
use crate::pdi::frame;
use crate::pdi::lcs_req::LcsReq;
use crate::protocol::command_req::CommandReq;
use crate::protocol::constants::CommandScope;

/// Outstanding-response key used by the startup synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PdiKey {
    pub tmcc_id: u32,
    pub command: PdiCommand,
    pub action: Option<u8>,
    pub scope: CommandScope,
}

/// A TMCC command encapsulated in a PDI frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmccCarrier {
    pub command: PdiCommand,
    pub req: CommandReq,
}

impl TmccCarrier {
    /// Wrap an outbound TMCC request: the byte stream is split into 3-byte
    /// (or 7-byte four-digit) windows, each framed individually.
    pub fn packets(req: &CommandReq) -> Vec<Vec<u8>> {
        let bytes = req.as_bytes();
        let (command, window) = if req.is_four_digit() {
            (PdiCommand::Tmcc4Tx, 7)
        } else {
            (PdiCommand::TmccTx, 3)
        };
        bytes
            .chunks(window)
            .map(|chunk| {
                let mut payload = vec![command.as_u8()];
                payload.extend_from_slice(chunk);
                frame::encode(&payload)
            })
            .collect()
    }
}

/// Every PDI packet class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdiReq {
    Ping,
    All(PdiCommand),
    Base(BaseReq),
    D4(D4Req),
    Tmcc(TmccCarrier),
    Lcs(LcsReq),
    Block(BlockReq),
}

impl PdiReq {
    /// Parse a complete `SOP..EOP` frame.
    pub fn from_frame(data: &[u8]) -> Result<Self, ProtocolError> {
        let payload = frame::decode(data)?;
        Self::from_payload(&payload)
    }

    /// Parse a de-stuffed payload (first byte is the PDI command).
    pub fn from_payload(payload: &[u8]) -> Result<Self, ProtocolError> {
        let first = *payload.first().ok_or(ProtocolError::InvalidFrame)?;
        let command = PdiCommand::from_u8(first).ok_or(ProtocolError::UnknownOpcode)?;
        match command {
            PdiCommand::Ping => Ok(PdiReq::Ping),
            PdiCommand::AllGet | PdiCommand::AllSet => Ok(PdiReq::All(command)),
            PdiCommand::BaseEngine
            | PdiCommand::BaseTrain
            | PdiCommand::BaseAcc
            | PdiCommand::BaseBase
            | PdiCommand::BaseRoute
            | PdiCommand::BaseSwitch
            | PdiCommand::BaseMemory => BaseReq::parse(payload).map(PdiReq::Base),
            PdiCommand::D4Engine | PdiCommand::D4Train => D4Req::parse(payload).map(PdiReq::D4),
            PdiCommand::TmccRx | PdiCommand::TmccTx | PdiCommand::Tmcc4Rx | PdiCommand::Tmcc4Tx => {
                let tmcc = CommandReq::from_bytes_with(
                    &payload[1..],
                    command.is_tmcc_rx(),
                    matches!(command, PdiCommand::Tmcc4Rx | PdiCommand::Tmcc4Tx),
                )?;
                Ok(PdiReq::Tmcc(TmccCarrier { command, req: tmcc }))
            }
            PdiCommand::BlockGet | PdiCommand::BlockSet | PdiCommand::BlockRx => {
                BlockReq::parse(payload).map(PdiReq::Block)
            }
            _ => LcsReq::parse(payload).map(PdiReq::Lcs),
        }
    }

    /// Serialize into a complete PDI frame.
    pub fn as_frame(&self) -> Vec<u8> {
        frame::encode(&self.payload())
    }

    pub fn payload(&self) -> Vec<u8> {
        match self {
            PdiReq::Ping => vec![PdiCommand::Ping.as_u8()],
            PdiReq::All(command) => vec![command.as_u8()],
            PdiReq::Base(req) => req.payload(),
            PdiReq::D4(req) => req.payload(),
            PdiReq::Tmcc(carrier) => {
                let mut payload = vec![carrier.command.as_u8()];
                payload.extend_from_slice(&carrier.req.as_bytes());
                payload
            }
            PdiReq::Lcs(req) => req.payload(),
            PdiReq::Block(req) => req.payload(),
        }
    }

    pub fn command(&self) -> PdiCommand {
        match self {
            PdiReq::Ping => PdiCommand::Ping,
            PdiReq::All(command) => *command,
            PdiReq::Base(req) => req.command,
            PdiReq::D4(req) => req.command,
            PdiReq::Tmcc(carrier) => carrier.command,
            PdiReq::Lcs(req) => req.command,
            PdiReq::Block(req) => req.command,
        }
    }

    pub fn tmcc_id(&self) -> u32 {
        match self {
            PdiReq::Ping | PdiReq::All(_) => 0,
            PdiReq::Base(req) => u32::from(req.tmcc_id),
            // a full D4 record dispatches under its embedded four-digit id,
            // not the internal record slot
            PdiReq::D4(req) => req
                .record()
                .and_then(|r| r.tmcc_id4)
                .or(req.map_tmcc_id)
                .unwrap_or(u32::from(req.record_no)),
            PdiReq::Tmcc(carrier) => carrier.req.address(),
            PdiReq::Lcs(req) => u32::from(req.tmcc_id),
            PdiReq::Block(req) => u32::from(req.block_id),
        }
    }

    pub fn scope(&self) -> CommandScope {
        match self {
            PdiReq::Ping | PdiReq::All(_) => CommandScope::System,
            PdiReq::Base(req) => req.scope,
            PdiReq::D4(req) => req.scope(),
            PdiReq::Tmcc(_) => CommandScope::System,
            PdiReq::Lcs(req) => req.scope(),
            PdiReq::Block(_) => CommandScope::Block,
        }
    }

    pub fn is_ping(&self) -> bool {
        matches!(self, PdiReq::Ping)
    }

    /// Key identifying the response this request expects. D4 operations key
    /// on the record slot so requests and responses pair up.
    pub fn as_key(&self) -> PdiKey {
        let (tmcc_id, action) = match self {
            PdiReq::D4(req) => (u32::from(req.record_no), Some(req.action.as_u8())),
            PdiReq::Lcs(req) => (u32::from(req.tmcc_id), Some(req.action)),
            _ => (self.tmcc_id(), None),
        };
        PdiKey { tmcc_id, command: self.command(), action, scope: self.scope() }
    }
}

#[cfg(test)]
#[path = "req_tests.rs"]
mod tests;
