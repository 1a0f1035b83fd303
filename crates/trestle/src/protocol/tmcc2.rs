// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TMCC2/Legacy command catalog: engine (`0xF8`), train (`0xF9`), and
//! extended-block/route (`0xFA`) frames with 0-199 speed steps.

use crate::protocol::command_def::CommandDef;
use crate::protocol::constants::CommandScope;

pub const ENGINE_PREFIX: u8 = 0xF8;
pub const TRAIN_PREFIX: u8 = 0xF9;
pub const EXTENDED_PREFIX: u8 = 0xFA;
pub const MULTIBYTE_PREFIX: u8 = 0xFB;

/// Scope → first byte for Legacy frames.
pub fn prefix_for_scope(scope: CommandScope) -> Option<u8> {
    match scope {
        CommandScope::Engine => Some(ENGINE_PREFIX),
        CommandScope::Train => Some(TRAIN_PREFIX),
        CommandScope::Route => Some(EXTENDED_PREFIX),
        _ => None,
    }
}

pub fn scope_for_prefix(prefix: u8) -> Option<CommandScope> {
    match prefix {
        ENGINE_PREFIX => Some(CommandScope::Engine),
        TRAIN_PREFIX => Some(CommandScope::Train),
        EXTENDED_PREFIX => Some(CommandScope::Route),
        _ => None,
    }
}

/// Map a Legacy speed step onto the 8 diesel-RPM buckets.
pub fn speed_to_rpm(speed: i32) -> u8 {
    match speed {
        i32::MIN..=3 => 0,
        4..=28 => 1,
        29..=56 => 2,
        57..=85 => 3,
        86..=113 => 4,
        114..=142 => 5,
        143..=170 => 6,
        _ => 7,
    }
}

/// Every named TMCC2 command. Declaration order is decode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tmcc2Command {
    AbsoluteSpeed,
    Auger,
    Aux1Off,
    Aux1On,
    Aux1OptionOne,
    Aux1OptionTwo,
    Aux2Off,
    Aux2On,
    Aux2OptionOne,
    Aux2OptionTwo,
    Aux3OptionOne,
    BellOff,
    BellOn,
    BellOneShotDing,
    BellSliderPosition,
    BlowHornOne,
    BlowHornTwo,
    BoostLevel,
    BoostSpeed,
    BrakeAirRelease,
    BrakeLevel,
    BrakeSpeed,
    BrakeSqueal,
    CylinderHiss,
    DieselRpm,
    EngineLabor,
    EngineLaborDefault,
    ForwardDirection,
    FrontCoupler,
    LetOff,
    LetOffLong,
    Momentum,
    MomentumHigh,
    MomentumLow,
    MomentumMedium,
    MotionStart,
    MotionStop,
    Numeric,
    PopOff,
    QuillingHorn,
    RearCoupler,
    Refuelling,
    RelativeSpeed,
    ReverseDirection,
    RingBell,
    RpmDown,
    RpmUp,
    SetAddress,
    ShutdownDelayed,
    Reset,
    ShutdownDelayedNop,
    ShutdownImmediate,
    SoundOff,
    SoundOn,
    Stall,
    StartUpDelayed,
    StartUpImmediate,
    StopImmediate,
    SystemHalt,
    ToggleDirection,
    TowerChatter,
    TrainBrake,
    WaterInjector,
    VolumeUp,
    VolumeDown,
    SingleForward,
    SingleReverse,
    HeadForward,
    HeadReverse,
    MiddleForward,
    MiddleReverse,
    RearForward,
    RearReverse,
    ClearConsist,
    Halt,
    RouteFire,
    SpeedHighball,
    SpeedLimited,
    SpeedMedium,
    SpeedNormal,
    SpeedRestricted,
    SpeedRoll,
    SpeedSlow,
    SpeedStopHold,
}

use Tmcc2Command::*;

impl Tmcc2Command {
    pub const ALL: &'static [Tmcc2Command] = &[
        AbsoluteSpeed,
        Auger,
        Aux1Off,
        Aux1On,
        Aux1OptionOne,
        Aux1OptionTwo,
        Aux2Off,
        Aux2On,
        Aux2OptionOne,
        Aux2OptionTwo,
        Aux3OptionOne,
        BellOff,
        BellOn,
        BellOneShotDing,
        BellSliderPosition,
        BlowHornOne,
        BlowHornTwo,
        BoostLevel,
        BoostSpeed,
        BrakeAirRelease,
        BrakeLevel,
        BrakeSpeed,
        BrakeSqueal,
        CylinderHiss,
        DieselRpm,
        EngineLabor,
        EngineLaborDefault,
        ForwardDirection,
        FrontCoupler,
        LetOff,
        LetOffLong,
        Momentum,
        MomentumHigh,
        MomentumLow,
        MomentumMedium,
        MotionStart,
        MotionStop,
        Numeric,
        PopOff,
        QuillingHorn,
        RearCoupler,
        Refuelling,
        RelativeSpeed,
        ReverseDirection,
        RingBell,
        RpmDown,
        RpmUp,
        SetAddress,
        ShutdownDelayed,
        Reset,
        ShutdownDelayedNop,
        ShutdownImmediate,
        SoundOff,
        SoundOn,
        Stall,
        StartUpDelayed,
        StartUpImmediate,
        StopImmediate,
        SystemHalt,
        ToggleDirection,
        TowerChatter,
        TrainBrake,
        WaterInjector,
        VolumeUp,
        VolumeDown,
        SingleForward,
        SingleReverse,
        HeadForward,
        HeadReverse,
        MiddleForward,
        MiddleReverse,
        RearForward,
        RearReverse,
        ClearConsist,
        Halt,
        RouteFire,
        SpeedHighball,
        SpeedLimited,
        SpeedMedium,
        SpeedNormal,
        SpeedRestricted,
        SpeedRoll,
        SpeedSlow,
        SpeedStopHold,
    ];

    pub const fn def(self) -> CommandDef {
        const ENG: CommandScope = CommandScope::Engine;
        match self {
            AbsoluteSpeed => CommandDef::tmcc2(0x0000, ENG)
                .data(0, 199)
                .filtered()
                .d4_broadcast(),
            Auger => CommandDef::tmcc2(0x01F7, ENG),
            Aux1Off => CommandDef::tmcc2(0x0108, ENG),
            Aux1On => CommandDef::tmcc2(0x010B, ENG),
            Aux1OptionOne => CommandDef::tmcc2(0x0109, ENG),
            Aux1OptionTwo => CommandDef::tmcc2(0x010A, ENG),
            Aux2Off => CommandDef::tmcc2(0x010C, ENG),
            Aux2On => CommandDef::tmcc2(0x010F, ENG),
            Aux2OptionOne => CommandDef::tmcc2(0x010D, ENG),
            Aux2OptionTwo => CommandDef::tmcc2(0x010E, ENG),
            Aux3OptionOne => CommandDef::tmcc2(0x013B, ENG),
            BellOff => CommandDef::tmcc2(0x01F4, ENG),
            BellOn => CommandDef::tmcc2(0x01F5, ENG),
            BellOneShotDing => CommandDef::tmcc2(0x01F0, ENG).data(0, 3).interval(1000),
            BellSliderPosition => CommandDef::tmcc2(0x01B0, ENG).data(2, 5),
            BlowHornOne => CommandDef::tmcc2(0x011C, ENG).interval(100),
            BlowHornTwo => CommandDef::tmcc2(0x011F, ENG).interval(100),
            BoostLevel => CommandDef::tmcc2(0x00E8, ENG).data(0, 7),
            BoostSpeed => CommandDef::tmcc2(0x0104, ENG).interval(200),
            BrakeAirRelease => CommandDef::tmcc2(0x01F8, ENG),
            BrakeLevel => CommandDef::tmcc2(0x00E0, ENG).data(0, 7),
            BrakeSpeed => CommandDef::tmcc2(0x0107, ENG).interval(200),
            BrakeSqueal => CommandDef::tmcc2(0x01F6, ENG),
            CylinderHiss => CommandDef::tmcc2(0x0152, ENG),
            DieselRpm => CommandDef::tmcc2(0x01A0, ENG).data(0, 7).filtered(),
            EngineLabor => CommandDef::tmcc2(0x01C0, ENG)
                .data(0, 31)
                .filtered()
                .d4_broadcast(),
            EngineLaborDefault => CommandDef::tmcc2(0x01CC, ENG).alias().filtered(),
            ForwardDirection => CommandDef::tmcc2(0x0100, ENG).filtered().d4_broadcast(),
            FrontCoupler => CommandDef::tmcc2(0x0105, ENG),
            LetOff => CommandDef::tmcc2(0x01F9, ENG),
            LetOffLong => CommandDef::tmcc2(0x01FA, ENG),
            Momentum => CommandDef::tmcc2(0x00C8, ENG).data(0, 7),
            MomentumHigh => CommandDef::tmcc2(0x012A, ENG),
            MomentumLow => CommandDef::tmcc2(0x0128, ENG),
            MomentumMedium => CommandDef::tmcc2(0x0129, ENG),
            MotionStart => CommandDef::tmcc2(0x00FA, ENG),
            MotionStop => CommandDef::tmcc2(0x00FE, ENG),
            Numeric => CommandDef::tmcc2(0x0110, ENG).data(0, 9),
            PopOff => CommandDef::tmcc2(0x0153, ENG),
            QuillingHorn => CommandDef::tmcc2(0x01E0, ENG).data(0, 15).interval(100),
            RearCoupler => CommandDef::tmcc2(0x0106, ENG),
            Refuelling => CommandDef::tmcc2(0x012D, ENG),
            RelativeSpeed => CommandDef::tmcc2(0x0140, ENG).relative(),
            ReverseDirection => CommandDef::tmcc2(0x0103, ENG).filtered().d4_broadcast(),
            RingBell => CommandDef::tmcc2(0x011D, ENG),
            RpmDown => CommandDef::tmcc2(0x0116, ENG).alias(),
            RpmUp => CommandDef::tmcc2(0x0113, ENG).alias(),
            SetAddress => CommandDef::tmcc2(0x012B, ENG),
            ShutdownDelayed => CommandDef::tmcc2(0x0115, ENG).alias(),
            Reset => CommandDef::tmcc2(0x0110, ENG).alias(),
            ShutdownDelayedNop => CommandDef::tmcc2(0x01FD, ENG),
            ShutdownImmediate => CommandDef::tmcc2(0x01FE, ENG),
            SoundOff => CommandDef::tmcc2(0x0150, ENG),
            SoundOn => CommandDef::tmcc2(0x0151, ENG),
            Stall => CommandDef::tmcc2(0x00F8, ENG),
            StartUpDelayed => CommandDef::tmcc2(0x01FB, ENG),
            StartUpImmediate => CommandDef::tmcc2(0x01FC, ENG),
            StopImmediate => CommandDef::tmcc2(0x00FB, ENG).filtered().d4_broadcast(),
            SystemHalt => CommandDef::tmcc2(0x01AB, ENG),
            ToggleDirection => CommandDef::tmcc2(0x0101, ENG).filtered().d4_broadcast(),
            TowerChatter => CommandDef::tmcc2(0x0117, ENG).alias(),
            TrainBrake => CommandDef::tmcc2(0x00F0, ENG)
                .data(0, 7)
                .filtered()
                .d4_broadcast(),
            WaterInjector => CommandDef::tmcc2(0x01A8, ENG),
            VolumeUp => CommandDef::tmcc2(0x0111, ENG).alias(),
            VolumeDown => CommandDef::tmcc2(0x0114, ENG).alias(),
            SingleForward => CommandDef::tmcc2(0x0120, ENG),
            SingleReverse => CommandDef::tmcc2(0x0121, ENG),
            HeadForward => CommandDef::tmcc2(0x0122, ENG),
            HeadReverse => CommandDef::tmcc2(0x0123, ENG),
            MiddleForward => CommandDef::tmcc2(0x0124, ENG),
            MiddleReverse => CommandDef::tmcc2(0x0125, ENG),
            RearForward => CommandDef::tmcc2(0x0126, ENG),
            RearReverse => CommandDef::tmcc2(0x0127, ENG),
            ClearConsist => CommandDef::tmcc2(0x012C, ENG),
            Halt => CommandDef::tmcc2(0x01AB, ENG).alias(),
            RouteFire => CommandDef::tmcc2(0x00FD, CommandScope::Route),
            SpeedHighball => speed_alias(199),
            SpeedLimited => speed_alias(118),
            SpeedMedium => speed_alias(92),
            SpeedNormal => speed_alias(145),
            SpeedRestricted => speed_alias(24),
            SpeedRoll => speed_alias(1),
            SpeedSlow => speed_alias(59),
            SpeedStopHold => speed_alias(0),
        }
    }

    pub fn scope(self) -> CommandScope {
        self.def().scope
    }

    /// Forward alias dereference.
    pub fn alias(self) -> Option<(Tmcc2Command, i32)> {
        match self {
            EngineLaborDefault => Some((EngineLabor, 12)),
            RpmDown => Some((Numeric, 6)),
            RpmUp => Some((Numeric, 3)),
            ShutdownDelayed => Some((Numeric, 5)),
            Reset => Some((Numeric, 0)),
            TowerChatter => Some((Numeric, 7)),
            VolumeUp => Some((Numeric, 1)),
            VolumeDown => Some((Numeric, 4)),
            Halt => Some((SystemHalt, 0)),
            SpeedHighball => Some((AbsoluteSpeed, 199)),
            SpeedLimited => Some((AbsoluteSpeed, 118)),
            SpeedMedium => Some((AbsoluteSpeed, 92)),
            SpeedNormal => Some((AbsoluteSpeed, 145)),
            SpeedRestricted => Some((AbsoluteSpeed, 24)),
            SpeedRoll => Some((AbsoluteSpeed, 1)),
            SpeedSlow => Some((AbsoluteSpeed, 59)),
            SpeedStopHold => Some((AbsoluteSpeed, 0)),
            _ => None,
        }
    }

    /// Reverse alias lookup; the last declaration wins on shared targets.
    pub fn alias_for(command: Tmcc2Command, data: i32) -> Option<Tmcc2Command> {
        let mut found = None;
        for &candidate in Self::ALL {
            if let Some((target, pinned)) = candidate.alias() {
                if target == command && pinned == data {
                    found = Some(candidate);
                }
            }
        }
        found
    }

    /// Decode a Legacy opcode word into `(command, address, data)`.
    ///
    /// The effective scope comes from the frame's prefix byte, not the word.
    pub fn decode(word: u16) -> Option<(Tmcc2Command, u32, i32)> {
        for &cmd in Self::ALL {
            let def = cmd.def();
            if def.matches_word(word) {
                let address = def.address_from_word(word);
                let data = def.data_from_word(word).unwrap_or(0);
                return Some((cmd, address, data));
            }
        }
        None
    }
}

const fn speed_alias(step: i32) -> CommandDef {
    CommandDef::tmcc2(step as u16, CommandScope::Engine).alias()
}

#[cfg(test)]
#[path = "tmcc2_tests.rs"]
mod tests;
