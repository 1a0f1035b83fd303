// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TMCC1 command catalog: 3-byte frames with prefix `0xFE`, covering halts,
//! routes, switches, accessories, engines/trains, and the internal sync
//! admin family (`0xF0Fx`).

use crate::protocol::command_def::CommandDef;
use crate::protocol::constants::CommandScope;

pub const TMCC1_PREFIX: u8 = 0xFE;

/// OR with an engine opcode word to address a train instead.
pub const TRAIN_MODIFIER: u16 = 0xC800;

/// AND with a train opcode word to recover the engine form.
pub const TRAIN_PURIFIER: u16 = 0x07FF;

/// Every named TMCC1 command. Declaration order is decode order: exact
/// matches (halt, sync) first, then the addressable families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tmcc1Command {
    Halt,

    // sync admin family, 0xF0Fx
    Register,
    Disconnect,
    SyncRequest,
    SyncBegin,
    Synchronizing,
    SyncComplete,
    SendingState,
    Quit,
    Reboot,
    Update,
    Upgrade,
    Shutdown,
    Restart,
    KeepAlive,
    Resync,
    Synchronized,

    // switches
    SwitchThru,
    SwitchOut,
    SwitchSetAddress,

    // accessories
    AccSetAddress,
    AccNumeric,
    AccAux1Off,
    AccAux1On,
    AccAux1OptOne,
    AccAux1OptTwo,
    AccAux2Off,
    AccAux2On,
    AccAux2OptOne,
    AccAux2OptTwo,
    AccFrontCoupler,
    AccRearCoupler,
    AccBoost,
    AccBrake,
    AccForwardSpeed,
    AccRelativeSpeed,

    // routes
    RouteFire,

    // engines / trains
    AbsoluteSpeed,
    AssignTrain,
    Aux1Off,
    Aux1On,
    Aux1OptionOne,
    Aux1OptionTwo,
    Aux2Off,
    Aux2On,
    Aux2OptionOne,
    Aux2OptionTwo,
    Aux3OptionOne,
    BlowHornOne,
    BlowHornTwo,
    BoostSpeed,
    BrakeSpeed,
    ClearConsist,
    ForwardDirection,
    FrontCoupler,
    FuncMinus,
    FuncPlus,
    HeadForward,
    HeadReverse,
    LetOff,
    MiddleForward,
    MiddleReverse,
    MomentumHigh,
    MomentumLow,
    MomentumMedium,
    Numeric,
    RearCoupler,
    RearForward,
    RearReverse,
    RelativeSpeed,
    Reset,
    ReverseDirection,
    RingBell,
    RpmDown,
    RpmUp,
    SetAddress,
    ShutdownImmediate,
    SingleForward,
    SingleReverse,
    SmokeOff,
    SmokeOn,
    SoundOne,
    TowerChatter,
    StartUpImmediate,
    StopImmediate,
    ToggleDirection,
    VolumeDown,
    VolumeUp,
    SpeedHighball,
    SpeedLimited,
    SpeedMedium,
    SpeedNormal,
    SpeedRestricted,
    SpeedRoll,
    SpeedSlow,
    SpeedStopHold,
}

use Tmcc1Command::*;

impl Tmcc1Command {
    pub const ALL: &'static [Tmcc1Command] = &[
        Halt,
        Register,
        Disconnect,
        SyncRequest,
        SyncBegin,
        Synchronizing,
        SyncComplete,
        SendingState,
        Quit,
        Reboot,
        Update,
        Upgrade,
        Shutdown,
        Restart,
        KeepAlive,
        Resync,
        Synchronized,
        SwitchThru,
        SwitchOut,
        SwitchSetAddress,
        AccSetAddress,
        AccNumeric,
        AccAux1Off,
        AccAux1On,
        AccAux1OptOne,
        AccAux1OptTwo,
        AccAux2Off,
        AccAux2On,
        AccAux2OptOne,
        AccAux2OptTwo,
        AccFrontCoupler,
        AccRearCoupler,
        AccBoost,
        AccBrake,
        AccForwardSpeed,
        AccRelativeSpeed,
        RouteFire,
        AbsoluteSpeed,
        AssignTrain,
        Aux1Off,
        Aux1On,
        Aux1OptionOne,
        Aux1OptionTwo,
        Aux2Off,
        Aux2On,
        Aux2OptionOne,
        Aux2OptionTwo,
        Aux3OptionOne,
        BlowHornOne,
        BlowHornTwo,
        BoostSpeed,
        BrakeSpeed,
        ClearConsist,
        ForwardDirection,
        FrontCoupler,
        FuncMinus,
        FuncPlus,
        HeadForward,
        HeadReverse,
        LetOff,
        MiddleForward,
        MiddleReverse,
        MomentumHigh,
        MomentumLow,
        MomentumMedium,
        Numeric,
        RearCoupler,
        RearForward,
        RearReverse,
        RelativeSpeed,
        Reset,
        ReverseDirection,
        RingBell,
        RpmDown,
        RpmUp,
        SetAddress,
        ShutdownImmediate,
        SingleForward,
        SingleReverse,
        SmokeOff,
        SmokeOn,
        SoundOne,
        TowerChatter,
        StartUpImmediate,
        StopImmediate,
        ToggleDirection,
        VolumeDown,
        VolumeUp,
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
        const SW: CommandScope = CommandScope::Switch;
        const ACC: CommandScope = CommandScope::Acc;
        match self {
            Halt => CommandDef::tmcc1(0xFFFF, CommandScope::System)
                .not_addressable()
                .filtered(),

            Register => sync(0xF0F0),
            Disconnect => sync(0xF0F1),
            SyncRequest => sync(0xF0F2),
            SyncBegin => sync(0xF0F3),
            Synchronizing => sync(0xF0F4),
            SyncComplete => sync(0xF0F5),
            SendingState => sync(0xF0F6),
            Quit => sync(0xF0F7),
            Reboot => sync(0xF0F8),
            Update => sync(0xF0F9),
            Upgrade => sync(0xF0FA),
            Shutdown => sync(0xF0FB),
            Restart => sync(0xF0FC),
            KeepAlive => sync(0xF0FD),
            Resync => sync(0xF0FE),
            Synchronized => sync(0xF0FF),

            SwitchThru => CommandDef::tmcc1(0x4000, SW),
            SwitchOut => CommandDef::tmcc1(0x401F, SW),
            SwitchSetAddress => CommandDef::tmcc1(0x402B, SW),

            AccSetAddress => CommandDef::tmcc1(0x802B, ACC),
            AccNumeric => CommandDef::tmcc1(0x8010, ACC).data(0, 9),
            AccAux1Off => CommandDef::tmcc1(0x8008, ACC),
            AccAux1On => CommandDef::tmcc1(0x800B, ACC),
            AccAux1OptOne => CommandDef::tmcc1(0x8009, ACC),
            AccAux1OptTwo => CommandDef::tmcc1(0x800A, ACC),
            AccAux2Off => CommandDef::tmcc1(0x800C, ACC),
            AccAux2On => CommandDef::tmcc1(0x800F, ACC),
            AccAux2OptOne => CommandDef::tmcc1(0x800D, ACC),
            AccAux2OptTwo => CommandDef::tmcc1(0x800E, ACC),
            AccFrontCoupler => CommandDef::tmcc1(0x8005, ACC),
            AccRearCoupler => CommandDef::tmcc1(0x8006, ACC),
            AccBoost => CommandDef::tmcc1(0x8004, ACC),
            AccBrake => CommandDef::tmcc1(0x8007, ACC),
            AccForwardSpeed => CommandDef::tmcc1(0x8000, ACC).data(0, 3),
            AccRelativeSpeed => CommandDef::tmcc1(0x8040, ACC).relative(),

            RouteFire => CommandDef::tmcc1(0xD01F, CommandScope::Route).address_bits(5),

            AbsoluteSpeed => CommandDef::tmcc1(0x0060, ENG).data(0, 31).filtered(),
            AssignTrain => CommandDef::tmcc1(0x0030, ENG).data(0, 10),
            Aux1Off => CommandDef::tmcc1(0x0008, ENG),
            Aux1On => CommandDef::tmcc1(0x000B, ENG),
            Aux1OptionOne => CommandDef::tmcc1(0x0009, ENG),
            Aux1OptionTwo => CommandDef::tmcc1(0x000A, ENG),
            Aux2Off => CommandDef::tmcc1(0x000C, ENG),
            Aux2On => CommandDef::tmcc1(0x000F, ENG),
            Aux2OptionOne => CommandDef::tmcc1(0x000D, ENG),
            Aux2OptionTwo => CommandDef::tmcc1(0x000E, ENG),
            Aux3OptionOne => CommandDef::tmcc1(0x003B, ENG),
            BlowHornOne => CommandDef::tmcc1(0x001C, ENG).interval(100),
            BlowHornTwo => CommandDef::tmcc1(0x001F, ENG).interval(100),
            BoostSpeed => CommandDef::tmcc1(0x0004, ENG).interval(200),
            BrakeSpeed => CommandDef::tmcc1(0x0007, ENG).interval(200),
            ClearConsist => CommandDef::tmcc1(0x002C, ENG),
            ForwardDirection => CommandDef::tmcc1(0x0000, ENG),
            FrontCoupler => CommandDef::tmcc1(0x0005, ENG),
            FuncMinus => CommandDef::tmcc1(0x0018, ENG).alias(),
            FuncPlus => CommandDef::tmcc1(0x0019, ENG).alias(),
            HeadForward => CommandDef::tmcc1(0x0021, ENG),
            HeadReverse => CommandDef::tmcc1(0x0025, ENG),
            LetOff => CommandDef::tmcc1(0x001E, ENG),
            MiddleForward => CommandDef::tmcc1(0x0022, ENG),
            MiddleReverse => CommandDef::tmcc1(0x0026, ENG),
            MomentumHigh => CommandDef::tmcc1(0x002A, ENG),
            MomentumLow => CommandDef::tmcc1(0x0028, ENG),
            MomentumMedium => CommandDef::tmcc1(0x0029, ENG),
            Numeric => CommandDef::tmcc1(0x0010, ENG).data(0, 9),
            RearCoupler => CommandDef::tmcc1(0x0006, ENG),
            RearForward => CommandDef::tmcc1(0x0023, ENG),
            RearReverse => CommandDef::tmcc1(0x0027, ENG),
            RelativeSpeed => CommandDef::tmcc1(0x0040, ENG).relative(),
            Reset => CommandDef::tmcc1(0x0010, ENG).alias(),
            ReverseDirection => CommandDef::tmcc1(0x0003, ENG),
            RingBell => CommandDef::tmcc1(0x001D, ENG),
            RpmDown => CommandDef::tmcc1(0x0016, ENG).alias(),
            RpmUp => CommandDef::tmcc1(0x0013, ENG).alias(),
            SetAddress => CommandDef::tmcc1(0x002B, ENG),
            ShutdownImmediate => CommandDef::tmcc1(0x0015, ENG).alias().aux1(),
            SingleForward => CommandDef::tmcc1(0x0020, ENG),
            SingleReverse => CommandDef::tmcc1(0x0024, ENG),
            SmokeOff => CommandDef::tmcc1(0x0018, ENG).alias(),
            SmokeOn => CommandDef::tmcc1(0x0019, ENG).alias(),
            SoundOne => CommandDef::tmcc1(0x0012, ENG).alias(),
            TowerChatter => CommandDef::tmcc1(0x0017, ENG).alias(),
            StartUpImmediate => CommandDef::tmcc1(0x0013, ENG).alias().aux1(),
            StopImmediate => CommandDef::tmcc1(0x0060, ENG).alias().filtered(),
            ToggleDirection => CommandDef::tmcc1(0x0001, ENG).filtered(),
            VolumeDown => CommandDef::tmcc1(0x0014, ENG).alias(),
            VolumeUp => CommandDef::tmcc1(0x0011, ENG).alias(),
            SpeedHighball => speed_alias(27),
            SpeedLimited => speed_alias(20),
            SpeedMedium => speed_alias(15),
            SpeedNormal => speed_alias(25),
            SpeedRestricted => speed_alias(5),
            SpeedRoll => speed_alias(1),
            SpeedSlow => speed_alias(10),
            SpeedStopHold => speed_alias(0),
        }
    }

    pub fn scope(self) -> CommandScope {
        self.def().scope
    }

    /// Forward alias dereference: the entry this command serializes through,
    /// with the data value it pins.
    pub fn alias(self) -> Option<(Tmcc1Command, i32)> {
        match self {
            FuncMinus => Some((Numeric, 8)),
            FuncPlus => Some((Numeric, 9)),
            Reset => Some((Numeric, 0)),
            RpmDown => Some((Numeric, 6)),
            RpmUp => Some((Numeric, 3)),
            ShutdownImmediate => Some((Numeric, 5)),
            SmokeOff => Some((Numeric, 8)),
            SmokeOn => Some((Numeric, 9)),
            SoundOne => Some((Numeric, 2)),
            TowerChatter => Some((Numeric, 7)),
            StartUpImmediate => Some((Numeric, 3)),
            VolumeDown => Some((Numeric, 4)),
            VolumeUp => Some((Numeric, 1)),
            StopImmediate => Some((AbsoluteSpeed, 0)),
            SpeedHighball => Some((AbsoluteSpeed, 27)),
            SpeedLimited => Some((AbsoluteSpeed, 20)),
            SpeedMedium => Some((AbsoluteSpeed, 15)),
            SpeedNormal => Some((AbsoluteSpeed, 25)),
            SpeedRestricted => Some((AbsoluteSpeed, 5)),
            SpeedRoll => Some((AbsoluteSpeed, 1)),
            SpeedSlow => Some((AbsoluteSpeed, 10)),
            SpeedStopHold => Some((AbsoluteSpeed, 0)),
            _ => None,
        }
    }

    /// Reverse alias lookup: the semantic synonym for a received
    /// `(command, data)` pair, if one exists. The last declaration wins when
    /// two aliases share a target.
    pub fn alias_for(command: Tmcc1Command, data: i32) -> Option<Tmcc1Command> {
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

    pub fn is_sync(self) -> bool {
        self.def().bits & 0xFFF0 == 0xF0F0
    }

    /// Decode a TMCC1 opcode word into `(command, address, data, scope)`.
    ///
    /// Engine opcodes carrying the train modifier bits are purified and
    /// re-tagged TRAIN with a 4-bit address field.
    pub fn decode(word: u16) -> Option<(Tmcc1Command, u32, i32, CommandScope)> {
        for &cmd in Self::ALL {
            let def = cmd.def();
            if def.matches_word(word) {
                let address = def.address_from_word(word);
                let data = def.data_from_word(word).unwrap_or(0);
                return Some((cmd, address, data, def.scope));
            }
        }
        // train form of an engine command
        if word & TRAIN_MODIFIER == TRAIN_MODIFIER {
            let purified = word & TRAIN_PURIFIER;
            for &cmd in Self::ALL {
                let def = cmd.def();
                if def.scope == CommandScope::Engine && def.matches_word(purified) {
                    let address = ((word & 0x0780) >> 7) as u32;
                    let data = def.data_from_word(purified).unwrap_or(0);
                    return Some((cmd, address, data, CommandScope::Train));
                }
            }
        }
        None
    }
}

const fn sync(bits: u16) -> CommandDef {
    CommandDef::tmcc1(bits, CommandScope::Sync).not_addressable()
}

const fn speed_alias(step: u16) -> CommandDef {
    CommandDef::tmcc1(0x0060 | step, CommandScope::Engine).alias().filtered()
}

#[cfg(test)]
#[path = "tmcc1_tests.rs"]
mod tests;
