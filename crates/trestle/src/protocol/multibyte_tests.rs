// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::protocol::constants::CommandScope;

#[test]
fn param_command_round_trips() {
    let bytes = encode_param(
        CommandScope::Engine,
        22,
        ParamCommand::Effects(EffectsCommand::SmokeHigh),
    );
    assert_eq!(bytes.len(), 9);
    assert_eq!(bytes[0], 0xF8);
    assert_eq!(bytes[1], (22 << 1) | 1);
    assert_eq!(bytes[2], ParamIndex::EffectsControls as u8);
    assert_eq!(bytes[3], 0xFB);
    assert_eq!(bytes[5], EffectsCommand::SmokeHigh.code());

    let (decoded, address, scope) = decode(&bytes).unwrap();
    assert_eq!(decoded, Multibyte::Param(ParamCommand::Effects(EffectsCommand::SmokeHigh)));
    assert_eq!(address, 22);
    assert_eq!(scope, CommandScope::Engine);
}

#[test]
fn train_scope_sets_the_prefix_and_flag_bit() {
    let bytes = encode_param(
        CommandScope::Train,
        8,
        ParamCommand::Dialog(DialogCommand::TowerSpeedMedium),
    );
    assert_eq!(bytes[0], 0xF9);
    assert_eq!(bytes[4], (8 << 1) | 1);

    let (_, address, scope) = decode(&bytes).unwrap();
    assert_eq!(address, 8);
    assert_eq!(scope, CommandScope::Train);
}

#[test]
fn checksum_tamper_is_rejected() {
    let mut bytes = encode_param(
        CommandScope::Engine,
        5,
        ParamCommand::Lighting(LightingCommand::DitchOn),
    );
    bytes[5] ^= 0x01;
    assert_eq!(decode(&bytes), Err(crate::error::ProtocolError::InvalidFrame));
}

#[test]
fn unknown_parameter_code_is_rejected() {
    let mut bytes =
        encode_param(CommandScope::Engine, 5, ParamCommand::Masking(MaskingCommand::NcNc));
    // splice in an unassigned code and re-checksum
    bytes[5] = 0x7F;
    let checksum = word_checksum(&bytes[..8]);
    bytes[8] = checksum;
    assert_eq!(decode(&bytes), Err(crate::error::ProtocolError::UnknownOpcode));
}

#[test]
fn r4lc_round_trips_with_data() {
    let bytes = encode_r4lc(CommandScope::Engine, 3, R4lcCommand::MaxSpeed, 120);
    let (decoded, address, _) = decode(&bytes).unwrap();
    assert_eq!(decoded, Multibyte::R4lc(R4lcCommand::MaxSpeed, 120));
    assert_eq!(address, 3);
}

#[test]
fn variable_command_round_trips() {
    let bytes = encode_variable(CommandScope::Engine, 14, VariableCommand::VolumeDirect, &[0x04, 0x55]);
    // 5 + 2 data words, 3 bytes each
    assert_eq!(bytes.len(), 21);
    let (decoded, address, _) = decode(&bytes).unwrap();
    assert_eq!(decoded, Multibyte::Variable(VariableCommand::VolumeDirect, vec![0x04, 0x55]));
    assert_eq!(address, 14);
}

#[test]
fn four_digit_addresses_interleave_after_every_word() {
    let bytes = encode_param(
        CommandScope::Engine,
        1234,
        ParamCommand::Effects(EffectsCommand::SmokeLow),
    );
    assert_eq!(bytes.len(), 21);
    assert_eq!(&bytes[3..7], b"1234");
    assert_eq!(&bytes[10..14], b"1234");
    assert_eq!(bytes[7], 0xFB);

    let (decoded, address, _) = decode(&bytes).unwrap();
    assert_eq!(decoded, Multibyte::Param(ParamCommand::Effects(EffectsCommand::SmokeLow)));
    assert_eq!(address, 1234);
}

#[test]
fn four_digit_variable_round_trips() {
    let bytes =
        encode_variable(CommandScope::Engine, 4071, VariableCommand::MasterVolume, &[0x07]);
    assert_eq!(bytes.len(), 42);
    let (decoded, address, _) = decode(&bytes).unwrap();
    assert_eq!(decoded, Multibyte::Variable(VariableCommand::MasterVolume, vec![0x07]));
    assert_eq!(address, 4071);
}

#[test]
fn word_checksum_skips_prefix_markers() {
    // prefixes contribute nothing, so these two spans agree
    let with_markers = [0xF8, 0x2D, 0x7C, 0xFB, 0x2C, 0x03];
    let without = [0x2D, 0x7C, 0x2C, 0x03];
    assert_eq!(word_checksum(&with_markers), word_checksum(&without));
}

#[test]
fn truncated_frames_need_more_bytes() {
    assert_eq!(
        decode(&[0xF8, 0x2D, 0x7C]),
        Err(crate::error::ProtocolError::InvalidFrame)
    );
}
