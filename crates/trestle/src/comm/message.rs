// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The unit of dispatch: every observed command, TMCC or PDI, normalized
//! behind one accessor surface for the dispatcher and state store.

use crate::pdi::req::PdiReq;
use crate::protocol::command_req::CommandReq;
use crate::protocol::constants::CommandScope;
use crate::protocol::tmcc1::Tmcc1Command;

/// One observed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Tmcc(CommandReq),
    Pdi(PdiReq),
}

impl Message {
    pub fn scope(&self) -> CommandScope {
        match self {
            Message::Tmcc(req) => req.scope(),
            // an encapsulated TMCC command dispatches under its own scope
            Message::Pdi(PdiReq::Tmcc(carrier)) => carrier.req.scope(),
            Message::Pdi(req) => req.scope(),
        }
    }

    pub fn address(&self) -> u32 {
        match self {
            Message::Tmcc(req) => req.address(),
            Message::Pdi(req) => req.tmcc_id(),
        }
    }

    pub fn tmcc(&self) -> Option<&CommandReq> {
        match self {
            Message::Tmcc(req) => Some(req),
            Message::Pdi(PdiReq::Tmcc(carrier)) => Some(&carrier.req),
            Message::Pdi(_) => None,
        }
    }

    /// The global TMCC1 halt: applies to every engine and train.
    pub fn is_halt(&self) -> bool {
        self.tmcc().is_some_and(CommandReq::is_halt)
    }

    /// The Legacy halt: engines and trains only.
    pub fn is_system_halt(&self) -> bool {
        self.tmcc().is_some_and(CommandReq::is_system_halt)
    }

    pub fn is_filtered(&self) -> bool {
        match self {
            Message::Tmcc(req) => req.is_filtered(),
            Message::Pdi(_) => false,
        }
    }

    /// A sync admin command (`0xF0Fx` family), if this message is one.
    pub fn sync_command(&self) -> Option<Tmcc1Command> {
        match self.tmcc().map(CommandReq::command) {
            Some(crate::protocol::command_req::CommandId::Tmcc1(cmd)) if cmd.is_sync() => Some(cmd),
            _ => None,
        }
    }

    /// Wire form used when forwarding to clients: raw TMCC bytes or a full
    /// PDI frame.
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            Message::Tmcc(req) => req.as_bytes(),
            Message::Pdi(req) => req.as_frame(),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
