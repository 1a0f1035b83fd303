// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol-wide constants: device scopes, address spaces, official railroad
//! speed bands, and the link timing defaults every component shares.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default/broadcast device address. Address 99 on a scope applies to every
/// device of that scope.
pub const BROADCAST_ADDRESS: u32 = 99;

/// Default serial baud rate for the SER2 link.
pub const DEFAULT_BAUDRATE: u32 = 9600;

/// Baud rates the SER2 hardware accepts.
pub const VALID_BAUDRATES: &[u32] = &[9600, 19200, 38400, 57600, 115_200];

/// PDI port on the Base 3.
pub const DEFAULT_BASE_PORT: u16 = 50_001;

/// Server listener port for client connections (unassigned by IANA).
pub const DEFAULT_SERVER_PORT: u16 = 5110;

/// Idle interval after which a PING frame is emitted as proof of life.
pub const KEEP_ALIVE_PULSE: Duration = Duration::from_secs(5);

/// Bounded listener byte-queue capacity (2,048 entries).
pub const DEFAULT_QUEUE_SIZE: usize = 1 << 11;

/// Minimum spacing between writes on the serial link.
pub const SER2_THROTTLE: Duration = Duration::from_millis(50);

/// Minimum spacing between writes on the Base 3 TCP link.
pub const BASE_THROTTLE: Duration = Duration::from_millis(50);

/// Spacing of repeated sends when a command is held for a duration.
pub const DEFAULT_DURATION_INTERVAL: Duration = Duration::from_millis(50);

/// Smallest duration-repeat interval a caller may request.
pub const MINIMUM_DURATION_INTERVAL: Duration = Duration::from_millis(20);

/// Factory engine-labor setting; RESET restores it.
pub const DEFAULT_ENGINE_LABOR: u8 = 12;

/// Device class namespace in which addresses are unique.
///
/// The discriminants are wire values: PDI BLOCK frames carry the motive
/// power's scope as this byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CommandScope {
    Engine = 1,
    Train = 2,
    Switch = 3,
    Route = 4,
    Acc = 5,
    System = 6,
    Asc2 = 7,
    Amc2 = 8,
    Bpc2 = 9,
    Irda = 10,
    Stm2 = 11,
    Base = 12,
    Sync = 13,
    Block = 14,
}

impl CommandScope {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Engine),
            2 => Some(Self::Train),
            3 => Some(Self::Switch),
            4 => Some(Self::Route),
            5 => Some(Self::Acc),
            6 => Some(Self::System),
            7 => Some(Self::Asc2),
            8 => Some(Self::Amc2),
            9 => Some(Self::Bpc2),
            10 => Some(Self::Irda),
            11 => Some(Self::Stm2),
            12 => Some(Self::Base),
            13 => Some(Self::Sync),
            14 => Some(Self::Block),
            _ => None,
        }
    }

    /// Inclusive address range for devices of this scope.
    pub fn address_range(self) -> (u32, u32) {
        match self {
            Self::Engine | Self::Train => (1, 9999),
            Self::Base => (0, 0),
            Self::Sync => (BROADCAST_ADDRESS, BROADCAST_ADDRESS),
            _ => (1, 99),
        }
    }

    pub fn is_valid_address(self, address: u32) -> bool {
        let (lo, hi) = self.address_range();
        (lo..=hi).contains(&address)
    }
}

impl fmt::Display for CommandScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Engine => "engine",
            Self::Train => "train",
            Self::Switch => "switch",
            Self::Route => "route",
            Self::Acc => "accessory",
            Self::System => "system",
            Self::Asc2 => "asc2",
            Self::Amc2 => "amc2",
            Self::Bpc2 => "bpc2",
            Self::Irda => "irda",
            Self::Stm2 => "stm2",
            Self::Base => "base",
            Self::Sync => "sync",
            Self::Block => "block",
        };
        f.write_str(name)
    }
}

/// Travel direction reported by sensor tracks and block logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Direction {
    #[default]
    Unknown = 0,
    LeftToRight = 1,
    RightToLeft = 2,
}

impl Direction {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::LeftToRight,
            2 => Self::RightToLeft,
            _ => Self::Unknown,
        }
    }
}

/// How a locomotive is commanded, per its Base 3 record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ControlType {
    Cab1 = 0,
    Tmcc = 1,
    Legacy = 2,
    R100 = 3,
}

impl ControlType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Cab1),
            1 => Some(Self::Tmcc),
            2 => Some(Self::Legacy),
            3 => Some(Self::R100),
            _ => None,
        }
    }

    /// Legacy engines take 0-199 speed steps and the multi-byte commands.
    pub fn is_legacy(self) -> bool {
        self == Self::Legacy
    }
}

/// Engine types whose sound sets produce diesel RPM.
pub const RPM_ENGINE_TYPES: &[u8] = &[0, 10, 13];

/// Engine types with steam sound sets.
pub const STEAM_ENGINE_TYPES: &[u8] = &[1, 11, 14];

/// Official railroad speed names, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RRSpeed {
    StopHold,
    Roll,
    Restricted,
    Slow,
    Medium,
    Limited,
    Normal,
    Highball,
}

impl RRSpeed {
    pub const ALL: &'static [RRSpeed] = &[
        Self::StopHold,
        Self::Roll,
        Self::Restricted,
        Self::Slow,
        Self::Medium,
        Self::Limited,
        Self::Normal,
        Self::Highball,
    ];

    /// TMCC1 speed step (0-31) for this band.
    pub fn tmcc1_step(self) -> i32 {
        match self {
            Self::StopHold => 0,
            Self::Roll => 1,
            Self::Restricted => 5,
            Self::Slow => 10,
            Self::Medium => 15,
            Self::Limited => 20,
            Self::Normal => 25,
            Self::Highball => 27,
        }
    }

    /// TMCC2/Legacy speed step (0-199) for this band.
    pub fn tmcc2_step(self) -> i32 {
        match self {
            Self::StopHold => 0,
            Self::Roll => 1,
            Self::Restricted => 24,
            Self::Slow => 59,
            Self::Medium => 92,
            Self::Limited => 118,
            Self::Normal => 145,
            Self::Highball => 199,
        }
    }

    /// Which band a TMCC2 speed step falls in.
    pub fn from_tmcc2_step(speed: i32) -> Self {
        match speed {
            i32::MIN..=0 => Self::StopHold,
            1..=23 => Self::Roll,
            24..=58 => Self::Restricted,
            59..=91 => Self::Slow,
            92..=117 => Self::Medium,
            118..=144 => Self::Limited,
            145..=198 => Self::Normal,
            _ => Self::Highball,
        }
    }

    /// Which band a TMCC1 speed step falls in.
    pub fn from_tmcc1_step(speed: i32) -> Self {
        match speed {
            i32::MIN..=0 => Self::StopHold,
            1..=4 => Self::Roll,
            5..=9 => Self::Restricted,
            10..=14 => Self::Slow,
            15..=19 => Self::Medium,
            20..=24 => Self::Limited,
            25..=26 => Self::Normal,
            _ => Self::Highball,
        }
    }
}

#[cfg(test)]
#[path = "constants_tests.rs"]
mod tests;
