// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TMCC2 multi-byte parameter commands: three 3-byte words separated by
//! `0xFB` markers carrying a parameter index and an 8-bit payload, plus the
//! R4LC eeprom writes and the variable-length (DCDS) form.

use crate::error::ProtocolError;
use crate::protocol::constants::CommandScope;
use crate::protocol::tmcc2::{self, MULTIBYTE_PREFIX, TRAIN_PREFIX};

/// Word-1 index prefixes selecting the multi-byte family.
pub const R4LC_INDEX_PREFIX: u8 = 0x40;
pub const VARIABLE_INDEX_PREFIX: u8 = 0x60;
pub const PARAMETER_INDEX_PREFIX: u8 = 0x70;

/// The variable-length command index byte.
pub const VARIABLE_INDEX: u8 = 0x6F;

/// Parameter index (word 1, low nibble selects the parameter table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ParamIndex {
    DialogTriggers = 0x72,
    EffectsTriggers = 0x74,
    MaskingControls = 0x76,
    EffectsControls = 0x7C,
    LightingControls = 0x7D,
}

impl ParamIndex {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x72 => Some(Self::DialogTriggers),
            0x74 => Some(Self::EffectsTriggers),
            0x76 => Some(Self::MaskingControls),
            0x7C => Some(Self::EffectsControls),
            0x7D => Some(Self::LightingControls),
            _ => None,
        }
    }
}

macro_rules! param_table {
    ($name:ident, $($variant:ident = $code:expr),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($variant = $code),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn code(self) -> u8 {
                self as u8
            }

            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

// RailSounds dialog triggers (index 0x72).
param_table!(DialogCommand,
    ConventionalShutdown = 0x01,
    SceneTwo = 0x02,
    SceneSeven = 0x03,
    SceneFive = 0x04,
    ShortHorn = 0x05,
    TowerStartup = 0x06,
    EngineerDepartureDenied = 0x07,
    EngineerDepartureGranted = 0x08,
    EngineerDeparted = 0x09,
    EngineerAllClear = 0x0A,
    TowerSpeedStopHold = 0x0B,
    TowerSpeedRestricted = 0x0C,
    TowerSpeedSlow = 0x0D,
    TowerSpeedMedium = 0x0E,
    TowerSpeedLimited = 0x0F,
    TowerSpeedNormal = 0x10,
    TowerSpeedHighball = 0x11,
    EngineerArriving = 0x12,
    EngineerArrived = 0x13,
    EngineerShutdown = 0x14,
    EngineerId = 0x15,
    EngineerAck = 0x16,
    EngineerSpeedStopHold = 0x17,
    EngineerSpeedRestricted = 0x18,
    EngineerSpeedSlow = 0x19,
    EngineerSpeedMedium = 0x1A,
    EngineerSpeedLimited = 0x1B,
    EngineerSpeedNormal = 0x1C,
    EngineerSpeedHighball = 0x1D,
    EngineerContextDependent = 0x1E,
    EmergencyContextDependent = 0x1F,
    TowerContextDependent = 0x20,
    TowerDepartureDenied = 0x22,
    TowerDepartureGranted = 0x23,
    TowerDeparted = 0x24,
    TowerAllClear = 0x25,
    TowerArriving = 0x2D,
    TowerArrived = 0x2E,
    TowerShutdown = 0x2F,
    ConductorAllAboardA = 0x30,
    EngineerAckStandBy = 0x31,
    EngineerAckCleared = 0x32,
    EngineerAckClearAhead = 0x33,
    EngineerAckClearInbound = 0x34,
    EngineerAckWelcomeBack = 0x35,
    EngineerAckId = 0x36,
    EngineerFuelLevel = 0x3D,
    EngineerFuelRefilled = 0x3E,
    EngineerSpeed = 0x3F,
    EngineerWaterLevel = 0x40,
    EngineerWaterRefilled = 0x41,
    SequenceOff = 0x50,
    SequenceOn = 0x51,
    SequenceClear = 0x52,
    SequenceDeparted = 0x53,
    SequenceTransit = 0x54,
    SequenceMaxSpeed = 0x55,
    ConductorNextStop = 0x68,
    ConductorWatchYourStep = 0x69,
    ConductorAllAboard = 0x6A,
    ConductorTicketsPlease = 0x6B,
    ConductorPrematureStop = 0x6C,
    StewardWelcomeAboard = 0x6D,
    StewardFirstSeating = 0x6E,
    StewardSecondSeating = 0x6F,
    StewardLoungeCarOpen = 0x70,
    StationArriving = 0x71,
    StationArrived = 0x72,
    StationBoarding = 0x73,
    StationDeparting = 0x74,
    PassengerCarStartup = 0x75,
    PassengerCarShutdown = 0x76,
    SpecialGuestEnabled = 0x7D,
    SpecialGuestDisabled = 0x7E,
);

// RailSounds effects triggers (index 0x74).
param_table!(RsEffectsCommand,
    PrimeOff = 0x10,
    PrimeOn = 0x11,
    VolumeDownRs = 0x12,
    VolumeUpRs = 0x13,
    BlendDown = 0x14,
    BlendUp = 0x15,
    CylinderOn = 0x20,
    CylinderOff = 0x21,
    WheelSlip = 0x22,
    StandbyBell = 0x23,
    StandbyDisable = 0x24,
    StandbyEnable = 0x25,
    CouplerCompress = 0x26,
    CouplerStretch = 0x27,
    MainBreaker = 0x28,
    CabBreaker = 0x29,
    WorkBreaker = 0x2A,
    SequenceControlOff = 0x2C,
    SequenceControlOn = 0x2D,
    ResetOdometer = 0x30,
    AddFuel = 0x31,
);

// RailSounds masking controls (index 0x76).
param_table!(MaskingCommand,
    NcNc = 0x00,
    AlwaysNc = 0x01,
    NeverNc = 0x02,
    DefaultNc = 0x03,
    NcAlways = 0x04,
    AlwaysAlways = 0x05,
    NeverAlways = 0x06,
    DefaultAlways = 0x07,
    NcNever = 0x08,
    AlwaysNever = 0x09,
    NeverNever = 0x0A,
    DefaultNever = 0x0B,
    NcDefault = 0x0C,
    AlwaysDefault = 0x0D,
    NeverDefault = 0x0E,
    DefaultDefault = 0x0F,
    BrakeSquealDisable = 0x20,
    BrakeSquealEnable = 0x21,
);

// Effects controls (index 0x7C).
param_table!(EffectsCommand,
    SmokeOff = 0x00,
    SmokeLow = 0x01,
    SmokeMedium = 0x02,
    SmokeHigh = 0x03,
    PantoFrontDown = 0x18,
    PantoFrontUp = 0x19,
    PantoRearDown = 0x1A,
    PantoRearUp = 0x1B,
    PantoBothDown = 0x1E,
    PantoBothUp = 0x1F,
    SubwayLeftDoorClose = 0x28,
    SubwayLeftDoorOpen = 0x29,
    SubwayRightDoorClose = 0x2A,
    SubwayRightDoorOpen = 0x2B,
    SubwayBothDoorClose = 0x2E,
    SubwayBothDoorOpen = 0x2F,
    StockOptionOneOn = 0x30,
    StockOptionOneOff = 0x31,
    StockOptionTwoOn = 0x32,
    StockOptionTwoOff = 0x33,
    StockLoad = 0x34,
    StockUnload = 0x35,
    StockFredOn = 0x36,
    StockFredOff = 0x37,
    StockWheelOn = 0x38,
    StockWheelOff = 0x39,
    StockGameOn = 0x3A,
    StockGameOff = 0x3B,
    SceneZero = 0x3C,
    SceneOne = 0x3D,
    SceneTwo = 0x3E,
    SceneThree = 0x3F,
    CoalEmpty = 0x50,
    CoalFull = 0x51,
    CoalEmptying = 0x52,
    CoalFilling = 0x53,
);

// Lighting controls (index 0x7D).
param_table!(LightingCommand,
    DoghouseOff = 0xA0,
    DoghouseOn = 0xA1,
    HazardOff = 0xB0,
    HazardOn = 0xB1,
    HazardAuto = 0xB2,
    DitchOff = 0xC0,
    DitchOffPulseOnWithHorn = 0xC1,
    DitchOnPulseOffWithHorn = 0xC2,
    DitchOn = 0xC3,
    LocoMarkerOff = 0xC8,
    LocoMarkerOn = 0xC9,
    LocoMarkerAuto = 0xCA,
    TenderMarkerOff = 0xCC,
    TenderMarkerOn = 0xCD,
    GroundOff = 0xD0,
    GroundOn = 0xD1,
    GroundAuto = 0xD2,
    WorkOff = 0xD8,
    WorkOn = 0xD9,
    WorkAuto = 0xDA,
    StrobeOff = 0xE0,
    StrobeOnSingle = 0xE1,
    StrobeOnDouble = 0xE2,
    MarsOff = 0xE8,
    MarsOn = 0xE9,
    CabOff = 0xF0,
    CabOn = 0xF1,
    CabAuto = 0xF2,
    CabToggle = 0xF3,
    Rule17Off = 0xF4,
    Rule17On = 0xF5,
    Rule17Auto = 0xF6,
    CarOff = 0xF8,
    CarOn = 0xF9,
    CarAuto = 0xFA,
);

// R4LC eeprom registers (index 0x40-0x4F); the data word carries the value.
param_table!(R4lcCommand,
    EngineAddress = 0x40,
    EngineStall = 0x41,
    TrainAddress = 0x42,
    TrainUnit = 0x43,
    MaxSpeed = 0x44,
    Direction = 0x45,
    Flags = 0x46,
    Control = 0x47,
    EngineType = 0x48,
    SpeedResolution = 0x49,
    VariableResolution = 0x4A,
    Indirect = 0x4F,
);

/// One multi-byte parameter command across all five tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamCommand {
    Dialog(DialogCommand),
    RsEffects(RsEffectsCommand),
    Masking(MaskingCommand),
    Effects(EffectsCommand),
    Lighting(LightingCommand),
}

impl ParamCommand {
    pub fn index(self) -> ParamIndex {
        match self {
            Self::Dialog(_) => ParamIndex::DialogTriggers,
            Self::RsEffects(_) => ParamIndex::EffectsTriggers,
            Self::Masking(_) => ParamIndex::MaskingControls,
            Self::Effects(_) => ParamIndex::EffectsControls,
            Self::Lighting(_) => ParamIndex::LightingControls,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Dialog(c) => c.code(),
            Self::RsEffects(c) => c.code(),
            Self::Masking(c) => c.code(),
            Self::Effects(c) => c.code(),
            Self::Lighting(c) => c.code(),
        }
    }

    pub fn from_index_code(index: ParamIndex, code: u8) -> Option<Self> {
        match index {
            ParamIndex::DialogTriggers => DialogCommand::from_code(code).map(Self::Dialog),
            ParamIndex::EffectsTriggers => RsEffectsCommand::from_code(code).map(Self::RsEffects),
            ParamIndex::MaskingControls => MaskingCommand::from_code(code).map(Self::Masking),
            ParamIndex::EffectsControls => EffectsCommand::from_code(code).map(Self::Effects),
            ParamIndex::LightingControls => LightingCommand::from_code(code).map(Self::Lighting),
        }
    }
}

/// Variable-length (DCDS) commands carried under index 0x6F.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableCommand {
    MasterVolume,
    BlendVolume,
    VolumeDirect,
    FactoryDefault,
    Store,
}

impl VariableCommand {
    pub const ALL: &'static [VariableCommand] = &[
        Self::MasterVolume,
        Self::BlendVolume,
        Self::VolumeDirect,
        Self::FactoryDefault,
        Self::Store,
    ];

    /// 16-bit destination the command writes to, split LSB/MSB on the wire.
    pub fn bits(self) -> u16 {
        match self {
            Self::MasterVolume => 0xB000,
            Self::BlendVolume => 0xB001,
            Self::VolumeDirect => 0xB004,
            Self::FactoryDefault => 0xF000,
            Self::Store => 0xF001,
        }
    }

    pub fn num_data_bytes(self) -> usize {
        match self {
            Self::MasterVolume | Self::BlendVolume | Self::Store => 1,
            Self::VolumeDirect | Self::FactoryDefault => 2,
        }
    }

    pub fn from_bits(bits: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.bits() == bits)
    }
}

/// A decoded multi-byte frame, before it is lifted into a `CommandReq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Multibyte {
    Param(ParamCommand),
    R4lc(R4lcCommand, u8),
    Variable(VariableCommand, Vec<u8>),
}

/// 1's complement mod 256 of all bytes, excluding the prefix markers.
pub fn word_checksum(bytes: &[u8]) -> u8 {
    let sum: u32 = bytes
        .iter()
        .filter(|&&b| !matches!(b, 0xF8 | 0xF9 | 0xFB))
        .map(|&b| b as u32)
        .sum();
    !(sum % 256) as u8
}

fn address_byte(address: u32, train: bool) -> u8 {
    let short = if (1..=99).contains(&address) { address as u8 } else { 0 };
    (short << 1) | u8::from(train)
}

fn word_one_byte(address: u32) -> u8 {
    let short = if (1..=99).contains(&address) { address as u8 } else { 0 };
    (short << 1) | 1
}

fn append_four_digit(bytes: Vec<u8>, address: u32) -> Vec<u8> {
    if address <= 99 {
        return bytes;
    }
    let digits = format!("{address:04}");
    let mut out = Vec::with_capacity(bytes.len() / 3 * 7);
    for word in bytes.chunks(3) {
        out.extend_from_slice(word);
        out.extend_from_slice(digits.as_bytes());
    }
    out
}

/// Serialize a 9-byte (or 21-byte four-digit) indexed multi-byte command.
fn encode_indexed(scope: CommandScope, address: u32, index: u8, data: u8) -> Vec<u8> {
    let train = scope == CommandScope::Train;
    let prefix = if train { TRAIN_PREFIX } else { tmcc2::ENGINE_PREFIX };
    let ab = address_byte(address, train);
    let mut bytes = vec![prefix, word_one_byte(address), index];
    bytes.extend_from_slice(&[MULTIBYTE_PREFIX, ab, data]);
    bytes.extend_from_slice(&[MULTIBYTE_PREFIX, ab]);
    let checksum = word_checksum(&bytes);
    bytes.push(checksum);
    append_four_digit(bytes, address)
}

pub fn encode_param(scope: CommandScope, address: u32, command: ParamCommand) -> Vec<u8> {
    encode_indexed(scope, address, command.index() as u8, command.code())
}

pub fn encode_r4lc(scope: CommandScope, address: u32, command: R4lcCommand, data: u8) -> Vec<u8> {
    encode_indexed(scope, address, command.code(), data)
}

pub fn encode_variable(
    scope: CommandScope,
    address: u32,
    command: VariableCommand,
    data: &[u8],
) -> Vec<u8> {
    let train = scope == CommandScope::Train;
    let prefix = if train { TRAIN_PREFIX } else { tmcc2::ENGINE_PREFIX };
    let ab = address_byte(address, train);
    let mut bytes = vec![prefix, word_one_byte(address), VARIABLE_INDEX];
    bytes.extend_from_slice(&[MULTIBYTE_PREFIX, ab, data.len() as u8]);
    bytes.extend_from_slice(&[MULTIBYTE_PREFIX, ab, (command.bits() & 0x00FF) as u8]);
    bytes.extend_from_slice(&[MULTIBYTE_PREFIX, ab, (command.bits() >> 8) as u8]);
    for &d in data {
        bytes.extend_from_slice(&[MULTIBYTE_PREFIX, ab, d]);
    }
    bytes.extend_from_slice(&[MULTIBYTE_PREFIX, ab]);
    let checksum = word_checksum(&bytes);
    bytes.push(checksum);
    append_four_digit(bytes, address)
}

/// Strip the repeated 4-ASCII-digit suffix from a four-digit multi-byte
/// frame, returning the packed 3-byte words and the decoded address.
fn strip_four_digit(frame: &[u8]) -> Result<(Vec<u8>, u32), ProtocolError> {
    if frame.len() % 7 != 0 {
        return Err(ProtocolError::InvalidFrame);
    }
    let mut packed = Vec::with_capacity(frame.len() / 7 * 3);
    let mut address: Option<u32> = None;
    for word in frame.chunks(7) {
        packed.extend_from_slice(&word[..3]);
        let digits = std::str::from_utf8(&word[3..]).map_err(|_| ProtocolError::InvalidFrame)?;
        let addr: u32 = digits.parse().map_err(|_| ProtocolError::InvalidFrame)?;
        if address.is_some_and(|a| a != addr) {
            return Err(ProtocolError::InvalidFrame);
        }
        address = Some(addr);
    }
    Ok((packed, address.unwrap_or(0)))
}

/// Decode a multi-byte frame (9 bytes, 21 bytes four-digit, or the variable
/// forms) into the command, address, and effective scope.
pub fn decode(frame: &[u8]) -> Result<(Multibyte, u32, CommandScope), ProtocolError> {
    if frame.len() < 9 {
        return Err(ProtocolError::InvalidFrame);
    }
    // every 3-byte word of a short-address frame starts with 0xFB after the
    // first; four-digit frames interleave ASCII digits there instead
    let four_digit = frame[3] != MULTIBYTE_PREFIX;
    let (packed, d4_address) = if four_digit {
        strip_four_digit(frame)?
    } else {
        (frame.to_vec(), 0)
    };
    if packed.len() < 9 || packed.len() % 3 != 0 {
        return Err(ProtocolError::InvalidFrame);
    }
    for word in packed.chunks(3).skip(1) {
        if word[0] != MULTIBYTE_PREFIX {
            return Err(ProtocolError::InvalidFrame);
        }
    }
    let scope = if packed[0] == TRAIN_PREFIX {
        CommandScope::Train
    } else {
        CommandScope::Engine
    };
    let address = if four_digit { d4_address } else { (packed[1] >> 1) as u32 };
    let index = packed[2];

    // trailing word carries the checksum over everything before it
    let expected = word_checksum(&packed[..packed.len() - 1]);
    if packed[packed.len() - 1] != expected {
        return Err(ProtocolError::InvalidFrame);
    }

    let command = match index & 0xF0 {
        PARAMETER_INDEX_PREFIX if index != VARIABLE_INDEX => {
            if packed.len() != 9 {
                return Err(ProtocolError::InvalidFrame);
            }
            let param_index = ParamIndex::from_u8(index).ok_or(ProtocolError::UnknownOpcode)?;
            let code = packed[5];
            Multibyte::Param(
                ParamCommand::from_index_code(param_index, code)
                    .ok_or(ProtocolError::UnknownOpcode)?,
            )
        }
        R4LC_INDEX_PREFIX => {
            if packed.len() != 9 {
                return Err(ProtocolError::InvalidFrame);
            }
            let register = R4lcCommand::from_code(index).ok_or(ProtocolError::UnknownOpcode)?;
            Multibyte::R4lc(register, packed[5])
        }
        VARIABLE_INDEX_PREFIX => {
            if index != VARIABLE_INDEX {
                return Err(ProtocolError::UnknownOpcode);
            }
            let count = packed[5] as usize;
            if packed.len() != (5 + count) * 3 {
                return Err(ProtocolError::InvalidFrame);
            }
            let lsb = packed[8];
            let msb = packed[11];
            let bits = u16::from(msb) << 8 | u16::from(lsb);
            let command = VariableCommand::from_bits(bits).ok_or(ProtocolError::UnknownOpcode)?;
            let data: Vec<u8> = (0..count).map(|i| packed[14 + i * 3]).collect();
            Multibyte::Variable(command, data)
        }
        _ => return Err(ProtocolError::UnknownOpcode),
    };
    Ok((command, address, scope))
}

#[cfg(test)]
#[path = "multibyte_tests.rs"]
mod tests;
