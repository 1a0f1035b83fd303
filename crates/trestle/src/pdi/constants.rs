// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PDI command bytes and per-device action codes.

use crate::protocol::constants::CommandScope;

/// First payload byte of every PDI packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PdiCommand {
    AllGet = 0x01,
    AllSet = 0x02,
    BaseEngine = 0x20,
    BaseTrain = 0x21,
    BaseAcc = 0x22,
    BaseBase = 0x23,
    BaseRoute = 0x24,
    BaseSwitch = 0x25,
    TmccRx = 0x26,
    TmccTx = 0x27,
    Ping = 0x28,
    BaseMemory = 0x29,
    Tmcc4Rx = 0x2A,
    Tmcc4Tx = 0x2B,
    IrdaGet = 0x30,
    IrdaSet = 0x31,
    IrdaRx = 0x32,
    Asc2Get = 0x34,
    Asc2Set = 0x35,
    Asc2Rx = 0x36,
    Bpc2Get = 0x38,
    Bpc2Set = 0x39,
    Bpc2Rx = 0x3A,
    Stm2Get = 0x3C,
    Stm2Set = 0x3D,
    Stm2Rx = 0x3E,
    Amc2Get = 0x40,
    Amc2Set = 0x41,
    Amc2Rx = 0x42,
    BlockGet = 0x44,
    BlockSet = 0x45,
    BlockRx = 0x46,
    D4Engine = 0xD6,
    D4Train = 0xD7,
}

impl PdiCommand {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        use PdiCommand::*;
        match value {
            0x01 => Some(AllGet),
            0x02 => Some(AllSet),
            0x20 => Some(BaseEngine),
            0x21 => Some(BaseTrain),
            0x22 => Some(BaseAcc),
            0x23 => Some(BaseBase),
            0x24 => Some(BaseRoute),
            0x25 => Some(BaseSwitch),
            0x26 => Some(TmccRx),
            0x27 => Some(TmccTx),
            0x28 => Some(Ping),
            0x29 => Some(BaseMemory),
            0x2A => Some(Tmcc4Rx),
            0x2B => Some(Tmcc4Tx),
            0x30 => Some(IrdaGet),
            0x31 => Some(IrdaSet),
            0x32 => Some(IrdaRx),
            0x34 => Some(Asc2Get),
            0x35 => Some(Asc2Set),
            0x36 => Some(Asc2Rx),
            0x38 => Some(Bpc2Get),
            0x39 => Some(Bpc2Set),
            0x3A => Some(Bpc2Rx),
            0x3C => Some(Stm2Get),
            0x3D => Some(Stm2Set),
            0x3E => Some(Stm2Rx),
            0x40 => Some(Amc2Get),
            0x41 => Some(Amc2Set),
            0x42 => Some(Amc2Rx),
            0x44 => Some(BlockGet),
            0x45 => Some(BlockSet),
            0x46 => Some(BlockRx),
            0xD6 => Some(D4Engine),
            0xD7 => Some(D4Train),
            _ => None,
        }
    }

    pub fn is_tmcc(self) -> bool {
        matches!(self, Self::TmccRx | Self::TmccTx | Self::Tmcc4Rx | Self::Tmcc4Tx)
    }

    pub fn is_tmcc_rx(self) -> bool {
        matches!(self, Self::TmccRx | Self::Tmcc4Rx)
    }

    pub fn is_lcs(self) -> bool {
        self.lcs_device().is_some()
    }

    /// The LCS device family a GET/SET/RX command addresses.
    pub fn lcs_device(self) -> Option<LcsDevice> {
        use PdiCommand::*;
        match self {
            IrdaGet | IrdaSet | IrdaRx => Some(LcsDevice::Irda),
            Asc2Get | Asc2Set | Asc2Rx => Some(LcsDevice::Asc2),
            Bpc2Get | Bpc2Set | Bpc2Rx => Some(LcsDevice::Bpc2),
            Stm2Get | Stm2Set | Stm2Rx => Some(LcsDevice::Stm2),
            Amc2Get | Amc2Set | Amc2Rx => Some(LcsDevice::Amc2),
            _ => None,
        }
    }
}

/// LCS accessory-device families tracked by the PDI device store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LcsDevice {
    Asc2,
    Bpc2,
    Stm2,
    Amc2,
    Irda,
}

impl LcsDevice {
    pub fn scope(self) -> CommandScope {
        match self {
            Self::Asc2 => CommandScope::Asc2,
            Self::Bpc2 => CommandScope::Bpc2,
            Self::Stm2 => CommandScope::Stm2,
            Self::Amc2 => CommandScope::Amc2,
            Self::Irda => CommandScope::Irda,
        }
    }

    pub fn get_command(self) -> PdiCommand {
        match self {
            Self::Asc2 => PdiCommand::Asc2Get,
            Self::Bpc2 => PdiCommand::Bpc2Get,
            Self::Stm2 => PdiCommand::Stm2Get,
            Self::Amc2 => PdiCommand::Amc2Get,
            Self::Irda => PdiCommand::IrdaGet,
        }
    }

    pub fn set_command(self) -> PdiCommand {
        match self {
            Self::Asc2 => PdiCommand::Asc2Set,
            Self::Bpc2 => PdiCommand::Bpc2Set,
            Self::Stm2 => PdiCommand::Stm2Set,
            Self::Amc2 => PdiCommand::Amc2Set,
            Self::Irda => PdiCommand::IrdaSet,
        }
    }
}

/// Actions common to every LCS device.
pub mod action {
    pub const FIRMWARE: u8 = 0x01;
    pub const STATUS: u8 = 0x02;
    pub const CONFIG: u8 = 0x03;
    pub const INFO: u8 = 0x04;
    pub const CLEAR_ERRORS: u8 = 0x05;
    pub const RESET: u8 = 0x06;
    pub const IDENTIFY: u8 = 0x07;

    // device control actions
    pub const CONTROL1: u8 = 0x10;
    pub const CONTROL2: u8 = 0x11;
    pub const CONTROL3: u8 = 0x12;
    pub const CONTROL4: u8 = 0x13;
    pub const CONTROL5: u8 = 0x14;

    // IRDA-specific
    pub const DATA: u8 = 0x10;
    pub const SEQUENCE: u8 = 0x11;
    pub const RECORD: u8 = 0x12;

    /// Received action bytes carry a device-reported error in the top bit.
    pub const ERROR_FLAG: u8 = 0x80;
}

/// D4 (four-digit record) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum D4Action {
    Query = 0x01,
    Update = 0x02,
    Count = 0x03,
    Map = 0x04,
    FirstRec = 0x05,
    NextRec = 0x06,
}

impl D4Action {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Query),
            0x02 => Some(Self::Update),
            0x03 => Some(Self::Count),
            0x04 => Some(Self::Map),
            0x05 => Some(Self::FirstRec),
            0x06 => Some(Self::NextRec),
            _ => None,
        }
    }
}

/// Record-number sentinel marking the end of a D4 enumeration.
pub const D4_END_OF_RECORDS: u16 = 0xFFFF;
