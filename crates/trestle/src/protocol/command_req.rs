// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The normalized in-memory form of a single primitive command, with the
//! serialize/deserialize codec for every TMCC wire family.

use crate::error::ProtocolError;
use crate::protocol::command_def::{CommandDef, Syntax};
use crate::protocol::constants::CommandScope;
use crate::protocol::multibyte::{self, Multibyte, ParamCommand, R4lcCommand, VariableCommand};
use crate::protocol::tmcc1::{Tmcc1Command, TMCC1_PREFIX, TRAIN_MODIFIER, TRAIN_PURIFIER};
use crate::protocol::tmcc2::{self, Tmcc2Command};

/// A command identity across every catalog family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    Tmcc1(Tmcc1Command),
    Tmcc2(Tmcc2Command),
    Param(ParamCommand),
    R4lc(R4lcCommand),
    Variable(VariableCommand),
}

impl CommandId {
    pub fn def(self) -> Option<CommandDef> {
        match self {
            Self::Tmcc1(c) => Some(c.def()),
            Self::Tmcc2(c) => Some(c.def()),
            // multi-byte entries are keyed by index/code, not an opcode word
            Self::Param(_) | Self::R4lc(_) | Self::Variable(_) => None,
        }
    }

    pub fn native_scope(self) -> CommandScope {
        match self {
            Self::Tmcc1(c) => c.scope(),
            Self::Tmcc2(c) => c.scope(),
            Self::Param(_) | Self::R4lc(_) | Self::Variable(_) => CommandScope::Engine,
        }
    }

    pub fn is_filtered(self) -> bool {
        self.def().is_some_and(|d| d.filtered)
    }

    pub fn is_aux1_prefixed(self) -> bool {
        self.def().is_some_and(|d| d.aux1_prefixed)
    }

    pub fn interval_ms(self) -> Option<u32> {
        self.def().and_then(|d| d.interval_ms)
    }

    pub fn is_d4_broadcast(self) -> bool {
        self.def().is_some_and(|d| d.d4_broadcast)
    }
}

/// One primitive command bound to an address, data value, and scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReq {
    command: CommandId,
    address: u32,
    data: i32,
    scope: CommandScope,
    tmcc_rx: bool,
    data_bytes: Vec<u8>,
}

impl CommandReq {
    /// Build a request, validating address and data against the catalog.
    pub fn new(
        command: CommandId,
        address: u32,
        data: i32,
        scope: Option<CommandScope>,
    ) -> Result<Self, ProtocolError> {
        let native = command.native_scope();
        let scope = validate_scope(native, scope);
        let (address, data) = match command.def() {
            Some(def) => {
                let address = if def.addressable { address } else { 0 };
                if def.addressable {
                    let max = match def.syntax {
                        Syntax::Legacy if native == CommandScope::Engine => 9999,
                        _ if def.address_bits == 5 => 31,
                        _ => 99,
                    };
                    if address > max {
                        return Err(ProtocolError::OutOfRange);
                    }
                }
                let data = if def.data.is_some() {
                    if def.data.encode(data).is_none() {
                        return Err(ProtocolError::OutOfRange);
                    }
                    data
                } else {
                    0
                };
                (address, data)
            }
            None => {
                if address > 9999 {
                    return Err(ProtocolError::OutOfRange);
                }
                (address, data)
            }
        };
        Ok(Self { command, address, data, scope, tmcc_rx: false, data_bytes: Vec::new() })
    }

    pub fn tmcc1(command: Tmcc1Command, address: u32) -> Result<Self, ProtocolError> {
        Self::new(CommandId::Tmcc1(command), address, 0, None)
    }

    pub fn tmcc1_data(command: Tmcc1Command, address: u32, data: i32) -> Result<Self, ProtocolError> {
        Self::new(CommandId::Tmcc1(command), address, data, None)
    }

    pub fn tmcc2(command: Tmcc2Command, address: u32) -> Result<Self, ProtocolError> {
        Self::new(CommandId::Tmcc2(command), address, 0, None)
    }

    pub fn tmcc2_data(command: Tmcc2Command, address: u32, data: i32) -> Result<Self, ProtocolError> {
        Self::new(CommandId::Tmcc2(command), address, data, None)
    }

    pub fn param(command: ParamCommand, address: u32, scope: CommandScope) -> Result<Self, ProtocolError> {
        Self::new(CommandId::Param(command), address, 0, Some(scope))
    }

    pub fn variable(
        command: VariableCommand,
        address: u32,
        scope: CommandScope,
        data_bytes: Vec<u8>,
    ) -> Result<Self, ProtocolError> {
        let mut req = Self::new(CommandId::Variable(command), address, 0, Some(scope))?;
        if data_bytes.len() != command.num_data_bytes() {
            return Err(ProtocolError::OutOfRange);
        }
        req.data_bytes = data_bytes;
        Ok(req)
    }

    pub fn command(&self) -> CommandId {
        self.command
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn data(&self) -> i32 {
        self.data
    }

    pub fn data_bytes(&self) -> &[u8] {
        &self.data_bytes
    }

    pub fn scope(&self) -> CommandScope {
        self.scope
    }

    pub fn native_scope(&self) -> CommandScope {
        self.command.native_scope()
    }

    /// Commands observed via a Base 3 TMCC_RX/TMCC4_RX wrapper.
    pub fn is_tmcc_rx(&self) -> bool {
        self.tmcc_rx
    }

    pub fn set_tmcc_rx(&mut self, rx: bool) {
        self.tmcc_rx = rx;
    }

    pub fn is_four_digit(&self) -> bool {
        self.address > 99
    }

    /// The global TMCC1 halt.
    pub fn is_halt(&self) -> bool {
        self.command == CommandId::Tmcc1(Tmcc1Command::Halt)
    }

    /// The Legacy engine/train halt.
    pub fn is_system_halt(&self) -> bool {
        matches!(
            self.command,
            CommandId::Tmcc2(Tmcc2Command::SystemHalt) | CommandId::Tmcc2(Tmcc2Command::Halt)
        )
    }

    /// Filtered entries are dropped when both the Base 3 and serial
    /// listeners are live; the TMCC_RX copy is always applied.
    pub fn is_filtered(&self) -> bool {
        self.command.is_filtered() && !self.tmcc_rx
    }

    pub fn interval_ms(&self) -> Option<u32> {
        self.command.interval_ms()
    }

    /// Re-address the request (sequence expansion re-targets templates).
    pub fn set_address(&mut self, address: u32) {
        if self.command.def().map(|d| d.addressable).unwrap_or(true) {
            self.address = address;
        }
    }

    /// Replace the data value, clamping to the catalog range.
    pub fn set_data(&mut self, data: i32) {
        if let Some(def) = self.command.def() {
            if def.data.encode(data).is_some() {
                self.data = data;
            }
        }
    }

    /// Re-tag between ENGINE and TRAIN; other coercions are rejected.
    pub fn set_scope(&mut self, scope: CommandScope) -> Result<(), ProtocolError> {
        let engine_or_train =
            |s: CommandScope| matches!(s, CommandScope::Engine | CommandScope::Train);
        if engine_or_train(self.scope) && engine_or_train(scope) {
            self.scope = scope;
            Ok(())
        } else if scope == self.scope {
            Ok(())
        } else {
            Err(ProtocolError::OutOfRange)
        }
    }

    /// The semantic synonym for this request, if the catalog records one
    /// (`NUMERIC data=0` resolves to `RESET`).
    pub fn semantic(&self) -> CommandId {
        match self.command {
            CommandId::Tmcc1(c) => Tmcc1Command::alias_for(c, self.data)
                .map(CommandId::Tmcc1)
                .unwrap_or(self.command),
            CommandId::Tmcc2(c) => Tmcc2Command::alias_for(c, self.data)
                .map(CommandId::Tmcc2)
                .unwrap_or(self.command),
            _ => self.command,
        }
    }

    /// Follow-on primitive requests this command implies; the scheduler
    /// enqueues them after the first transmission.
    pub fn results_in(&self) -> Vec<CommandReq> {
        let mut effects = Vec::new();
        let mut push = |req: Result<CommandReq, ProtocolError>| {
            if let Ok(req) = req {
                effects.push(req);
            }
        };
        match self.semantic() {
            CommandId::Tmcc2(Tmcc2Command::Reset) => {
                push(self.derived(CommandId::Tmcc2(Tmcc2Command::AbsoluteSpeed), 0));
                push(self.derived(CommandId::Tmcc2(Tmcc2Command::DieselRpm), 0));
                push(self.derived(
                    CommandId::Tmcc2(Tmcc2Command::EngineLabor),
                    crate::protocol::constants::DEFAULT_ENGINE_LABOR as i32,
                ));
            }
            CommandId::Tmcc2(Tmcc2Command::StopImmediate)
            | CommandId::Tmcc2(Tmcc2Command::ShutdownDelayed)
            | CommandId::Tmcc2(Tmcc2Command::ShutdownImmediate) => {
                push(self.derived(CommandId::Tmcc2(Tmcc2Command::DieselRpm), 0));
            }
            CommandId::Tmcc1(Tmcc1Command::Reset) => {
                push(self.derived(CommandId::Tmcc1(Tmcc1Command::AbsoluteSpeed), 0));
            }
            _ => {}
        }
        effects
    }

    fn derived(&self, command: CommandId, data: i32) -> Result<CommandReq, ProtocolError> {
        CommandReq::new(command, self.address, data, Some(self.scope))
    }

    /// Serialized wire frame.
    pub fn as_bytes(&self) -> Vec<u8> {
        match self.command {
            CommandId::Tmcc1(cmd) => {
                let word = self.tmcc1_word(cmd);
                vec![TMCC1_PREFIX, (word >> 8) as u8, (word & 0xFF) as u8]
            }
            CommandId::Tmcc2(cmd) => {
                let word = self.tmcc2_word(cmd);
                let prefix =
                    tmcc2::prefix_for_scope(self.scope).unwrap_or(tmcc2::ENGINE_PREFIX);
                let mut bytes = vec![prefix, (word >> 8) as u8, (word & 0xFF) as u8];
                if self.address > 99 {
                    bytes.extend_from_slice(format!("{:04}", self.address).as_bytes());
                }
                bytes
            }
            CommandId::Param(cmd) => multibyte::encode_param(self.scope, self.address, cmd),
            CommandId::R4lc(cmd) => {
                multibyte::encode_r4lc(self.scope, self.address, cmd, self.data as u8)
            }
            CommandId::Variable(cmd) => {
                multibyte::encode_variable(self.scope, self.address, cmd, &self.data_bytes)
            }
        }
    }

    fn tmcc1_word(&self, cmd: Tmcc1Command) -> u16 {
        let def = cmd.def();
        let mut word = def.bits;
        if def.addressable {
            word &= def.address_mask();
            word |= ((self.address as u16) << 7) & !def.address_mask();
            if self.scope == CommandScope::Train && def.scope == CommandScope::Engine {
                word = (word & TRAIN_PURIFIER) | TRAIN_MODIFIER;
            }
        }
        if def.data.is_some() {
            if let Some(d) = def.data.encode(self.data) {
                word = (word & def.data_mask()) | d;
            }
        }
        word
    }

    fn tmcc2_word(&self, cmd: Tmcc2Command) -> u16 {
        let def = cmd.def();
        let mut word = def.bits;
        if def.addressable && (1..=99).contains(&self.address) {
            word |= (self.address as u16) << 9;
        }
        if def.data.is_some() {
            if let Some(d) = def.data.encode(self.data) {
                word = (word & def.data_mask()) | d;
            }
        }
        word
    }

    /// Parse one complete frame back into a request.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Self::from_bytes_with(bytes, false, false)
    }

    /// Parse with provenance: `from_tmcc_rx` marks frames unwrapped from a
    /// Base 3 TMCC_RX/TMCC4_RX carrier.
    pub fn from_bytes_with(
        bytes: &[u8],
        from_tmcc_rx: bool,
        is_tmcc4: bool,
    ) -> Result<Self, ProtocolError> {
        if bytes.len() < 3 {
            return Err(ProtocolError::InvalidFrame);
        }
        let mut req = match bytes[0] {
            TMCC1_PREFIX => Self::parse_tmcc1(bytes),
            tmcc2::ENGINE_PREFIX | tmcc2::TRAIN_PREFIX | tmcc2::EXTENDED_PREFIX => {
                Self::parse_tmcc2(bytes, is_tmcc4)
            }
            _ => Err(ProtocolError::UnknownOpcode),
        }?;
        req.tmcc_rx = from_tmcc_rx;
        Ok(req)
    }

    fn parse_tmcc1(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let word = u16::from(bytes[1]) << 8 | u16::from(bytes[2]);
        let (command, address, data, scope) =
            Tmcc1Command::decode(word).ok_or(ProtocolError::UnknownOpcode)?;
        CommandReq::new(CommandId::Tmcc1(command), address, data, Some(scope))
    }

    fn parse_tmcc2(bytes: &[u8], is_tmcc4: bool) -> Result<Self, ProtocolError> {
        let simple = bytes.len() == 3 || (bytes.len() == 7 && bytes[1] <= 0x01);
        if simple {
            let word = u16::from(bytes[1]) << 8 | u16::from(bytes[2]);
            let (command, word_address, data) =
                Tmcc2Command::decode(word).ok_or(ProtocolError::UnknownOpcode)?;
            let address = if bytes.len() == 7 {
                parse_ascii_address(&bytes[3..7])?
            } else {
                word_address
            };
            let scope = match bytes[0] {
                tmcc2::TRAIN_PREFIX => CommandScope::Train,
                _ => command.scope(),
            };
            CommandReq::new(CommandId::Tmcc2(command), address, data, Some(scope))
        } else {
            let _ = is_tmcc4;
            let (decoded, address, scope) = multibyte::decode(bytes)?;
            match decoded {
                Multibyte::Param(cmd) => {
                    CommandReq::new(CommandId::Param(cmd), address, 0, Some(scope))
                }
                Multibyte::R4lc(cmd, value) => {
                    CommandReq::new(CommandId::R4lc(cmd), address, value as i32, Some(scope))
                }
                Multibyte::Variable(cmd, data) => {
                    CommandReq::variable(cmd, address, scope, data)
                }
            }
        }
    }
}

fn parse_ascii_address(digits: &[u8]) -> Result<u32, ProtocolError> {
    let text = std::str::from_utf8(digits).map_err(|_| ProtocolError::InvalidFrame)?;
    text.parse().map_err(|_| ProtocolError::InvalidFrame)
}

fn validate_scope(native: CommandScope, requested: Option<CommandScope>) -> CommandScope {
    match requested {
        Some(scope)
            if matches!(scope, CommandScope::Engine | CommandScope::Train)
                && matches!(native, CommandScope::Engine | CommandScope::Train) =>
        {
            scope
        }
        _ => native,
    }
}

#[cfg(test)]
#[path = "command_req_tests.rs"]
mod tests;
