// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed views of the fixed-size component records the Base 3 stores for
//! engines, trains, switches, routes, and accessories.
//!
//! Each record is a byte image with fields at fixed offsets; unwritten bytes
//! are `0xFF`. The structs here parse a full image into typed fields and
//! serialize back, so state objects never touch raw offsets.

use crate::protocol::constants::CommandScope;

/// Engine/train and accessory records are 192 bytes.
pub const ENGINE_RECORD_LEN: usize = 0xC0;
pub const SWITCH_RECORD_LEN: usize = 0x40;
pub const ROUTE_RECORD_LEN: usize = 0x80;

/// Record length for a scope, if the Base 3 keeps records for it.
pub fn record_length(scope: CommandScope) -> Option<usize> {
    match scope {
        CommandScope::Engine | CommandScope::Train | CommandScope::Acc => Some(ENGINE_RECORD_LEN),
        CommandScope::Switch => Some(SWITCH_RECORD_LEN),
        CommandScope::Route => Some(ROUTE_RECORD_LEN),
        _ => None,
    }
}

// -- Field offsets (engine/train records) -------------------------------------

pub const OFFSET_SPEED: usize = 0x07;
pub const OFFSET_TARGET_SPEED: usize = 0x08;
pub const OFFSET_TRAIN_BRAKE: usize = 0x09;
pub const OFFSET_RPM_LABOR: usize = 0x0C;
pub const OFFSET_FUEL_LEVEL: usize = 0x0D;
pub const OFFSET_WATER_LEVEL: usize = 0x0E;
pub const OFFSET_MOMENTUM: usize = 0x18;
pub const OFFSET_ROAD_NAME: usize = 0x1F;
pub const OFFSET_ROAD_NUMBER: usize = 0x3F;
pub const OFFSET_ENGINE_TYPE: usize = 0x43;
pub const OFFSET_CONTROL_TYPE: usize = 0x44;
pub const OFFSET_SOUND_TYPE: usize = 0x45;
pub const OFFSET_ENGINE_CLASS: usize = 0x46;
pub const OFFSET_SMOKE: usize = 0x69;
pub const OFFSET_SPEED_LIMIT: usize = 0x6A;
pub const OFFSET_MAX_SPEED: usize = 0x6B;
pub const OFFSET_CONSIST_FLAGS: usize = 0x6F;
pub const OFFSET_CONSIST_COMPS: usize = 0x70;
pub const OFFSET_D4_TMCC_ID: usize = 0xB8;
pub const OFFSET_D4_TIMESTAMP: usize = 0xBC;

pub const ROAD_NAME_LEN: usize = 31;
pub const ROAD_NUMBER_LEN: usize = 4;
pub const CONSIST_AREA_LEN: usize = 32;

// -- Text codec ----------------------------------------------------------------

/// Decode fixed-length ASCII: stop at NUL, skip fill bytes; an all-`0xFF`
/// field is unwritten.
pub fn decode_text(data: &[u8]) -> Option<String> {
    let mut text = String::new();
    let mut fills = 0usize;
    for &b in data {
        if b == 0x00 {
            break;
        } else if b == 0xFF {
            fills += 1;
        } else {
            text.push(char::from(b));
        }
    }
    if fills == data.len() && !data.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Encode ASCII into a fixed-length NUL-padded field.
pub fn encode_text(text: Option<&str>, field_len: usize) -> Vec<u8> {
    let mut out = vec![0u8; field_len];
    if let Some(text) = text {
        for (slot, b) in out.iter_mut().zip(text.bytes()) {
            *slot = b;
        }
    }
    out
}

// -- RPM / labor packing -------------------------------------------------------

/// Split the shared rpm/labor byte: RPM in the low 3 bits, labor as an
/// offset-12 wheel in the high 5.
pub fn unpack_rpm_labor(value: u8) -> (u8, u8) {
    let rpm = value & 0b111;
    let wheel = value >> 3;
    let labor = if wheel <= 19 { wheel + 12 } else { wheel - 20 };
    (rpm, labor)
}

/// Recombine rpm (0-7) and labor (0-31) into the shared byte.
pub fn pack_rpm_labor(rpm: u8, labor: u8) -> u8 {
    let wheel = if labor >= 12 { labor - 12 } else { labor + 20 };
    (wheel << 3) | (rpm & 0b111)
}

// -- Base <-> TMCC value conversions ------------------------------------------

/// Base momentum 0-127 to the TMCC 0-7 steps.
pub fn momentum_to_tmcc(base: u8) -> u8 {
    ((f64::from(base) * 0.05512).round() as u8).min(7)
}

/// TMCC momentum 0-7 to the base 0-127 range.
pub fn momentum_to_base(tmcc: u8) -> u8 {
    ((f64::from(tmcc) * 18.14).round() as u8).min(127)
}

/// Base train brake 0-15 to the TMCC 0-7 steps.
pub fn train_brake_to_tmcc(base: u8) -> u8 {
    ((f64::from(base) * 0.4667).round() as u8).min(7)
}

/// TMCC train brake 0-7 to the base 0-15 range.
pub fn train_brake_to_base(tmcc: u8) -> u8 {
    ((f64::from(tmcc) * 2.143).round() as u8).min(15)
}

// -- Consist and route components ---------------------------------------------

/// One engine of a consist, with its placement and masking flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsistComponent {
    pub tmcc_id: u8,
    pub flags: u8,
}

impl ConsistComponent {
    pub fn is_single(&self) -> bool {
        self.flags & 0b11 == 0b00
    }

    pub fn is_head(&self) -> bool {
        self.flags & 0b11 == 0b01
    }

    pub fn is_middle(&self) -> bool {
        self.flags & 0b11 == 0b10
    }

    pub fn is_tail(&self) -> bool {
        self.flags & 0b11 == 0b11
    }

    pub fn is_forward(&self) -> bool {
        self.flags & 0b100 == 0
    }

    pub fn is_reverse(&self) -> bool {
        !self.is_forward()
    }

    pub fn is_train_linked(&self) -> bool {
        self.flags & 0b1000 != 0
    }

    pub fn is_horn_masked(&self) -> bool {
        self.flags & 0b1_0000 != 0
    }

    pub fn is_dialog_masked(&self) -> bool {
        self.flags & 0b10_0000 != 0
    }

    pub fn is_tmcc2(&self) -> bool {
        self.flags & 0b100_0000 != 0
    }

    pub fn is_accessory(&self) -> bool {
        self.flags & 0b1000_0000 != 0
    }

    /// Parse the 32-byte consist area; pairs are stored tail-first, the
    /// returned list is head-to-tail.
    pub fn list_from_area(area: &[u8]) -> Vec<ConsistComponent> {
        let mut comps = Vec::new();
        for pair in area.chunks(2).take(CONSIST_AREA_LEN / 2) {
            if pair.len() < 2 {
                break;
            }
            if pair[0] != 0xFF && pair[1] != 0xFF {
                comps.insert(0, ConsistComponent { flags: pair[0], tmcc_id: pair[1] });
            }
        }
        comps
    }

    /// Serialize head-to-tail components back into the 32-byte area.
    pub fn list_to_area(comps: &[ConsistComponent]) -> Vec<u8> {
        let mut area = Vec::with_capacity(CONSIST_AREA_LEN);
        for comp in comps.iter().rev() {
            area.push(comp.flags);
            area.push(comp.tmcc_id);
        }
        area.resize(CONSIST_AREA_LEN, 0xFF);
        area
    }
}

/// One switch of a route, with its demanded position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteComponent {
    pub tmcc_id: u8,
    pub flags: u8,
}

impl RouteComponent {
    pub fn is_thru(&self) -> bool {
        self.flags & 0x03 == 0
    }

    pub fn is_out(&self) -> bool {
        !self.is_thru()
    }

    /// Parse the 32-byte route area, sorted by switch id.
    pub fn list_from_area(area: &[u8]) -> Vec<RouteComponent> {
        let mut comps = Vec::new();
        for pair in area.chunks(2).take(CONSIST_AREA_LEN / 2) {
            if pair.len() < 2 {
                break;
            }
            if pair[0] != 0xFF && pair[1] != 0xFF {
                comps.push(RouteComponent { flags: pair[0], tmcc_id: pair[1] });
            }
        }
        comps.sort_by_key(|c| c.tmcc_id);
        comps
    }

    pub fn list_to_area(comps: &[RouteComponent]) -> Vec<u8> {
        let mut area = Vec::with_capacity(CONSIST_AREA_LEN);
        for comp in comps {
            area.push(comp.flags);
            area.push(comp.tmcc_id);
        }
        area.resize(CONSIST_AREA_LEN, 0xFF);
        area
    }
}

// -- Records -------------------------------------------------------------------

fn byte_at(data: &[u8], offset: usize) -> Option<u8> {
    data.get(offset).copied().filter(|&b| b != 0xFF)
}

fn put(data: &mut [u8], offset: usize, value: Option<u8>) {
    if let (Some(slot), Some(value)) = (data.get_mut(offset), value) {
        *slot = value;
    }
}

/// Parsed engine (or train) record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineRecord {
    pub speed: Option<u8>,
    pub target_speed: Option<u8>,
    pub train_brake: Option<u8>,
    pub rpm_labor: Option<u8>,
    pub fuel_level: Option<u8>,
    pub water_level: Option<u8>,
    pub momentum: Option<u8>,
    pub road_name: Option<String>,
    pub road_number: Option<String>,
    pub engine_type: Option<u8>,
    pub control_type: Option<u8>,
    pub sound_type: Option<u8>,
    pub engine_class: Option<u8>,
    pub smoke: Option<u8>,
    pub speed_limit: Option<u8>,
    pub max_speed: Option<u8>,
    /// Train records only.
    pub consist_flags: Option<u8>,
    pub consist: Vec<ConsistComponent>,
    /// Four-digit records only.
    pub tmcc_id4: Option<u32>,
    pub timestamp: Option<u32>,
}

impl EngineRecord {
    pub fn parse(data: &[u8], scope: CommandScope) -> Self {
        let mut rec = EngineRecord {
            speed: byte_at(data, OFFSET_SPEED),
            target_speed: byte_at(data, OFFSET_TARGET_SPEED),
            train_brake: byte_at(data, OFFSET_TRAIN_BRAKE),
            rpm_labor: byte_at(data, OFFSET_RPM_LABOR),
            fuel_level: byte_at(data, OFFSET_FUEL_LEVEL),
            water_level: byte_at(data, OFFSET_WATER_LEVEL),
            momentum: byte_at(data, OFFSET_MOMENTUM),
            road_name: field_text(data, OFFSET_ROAD_NAME, ROAD_NAME_LEN),
            road_number: field_text(data, OFFSET_ROAD_NUMBER, ROAD_NUMBER_LEN),
            engine_type: byte_at(data, OFFSET_ENGINE_TYPE),
            control_type: byte_at(data, OFFSET_CONTROL_TYPE),
            sound_type: byte_at(data, OFFSET_SOUND_TYPE),
            engine_class: byte_at(data, OFFSET_ENGINE_CLASS),
            smoke: byte_at(data, OFFSET_SMOKE),
            speed_limit: byte_at(data, OFFSET_SPEED_LIMIT),
            max_speed: byte_at(data, OFFSET_MAX_SPEED),
            ..EngineRecord::default()
        };
        if scope == CommandScope::Train {
            rec.consist_flags = byte_at(data, OFFSET_CONSIST_FLAGS);
            if data.len() >= OFFSET_CONSIST_COMPS + CONSIST_AREA_LEN {
                rec.consist = ConsistComponent::list_from_area(
                    &data[OFFSET_CONSIST_COMPS..OFFSET_CONSIST_COMPS + CONSIST_AREA_LEN],
                );
            }
        }
        if data.len() >= OFFSET_D4_TMCC_ID + 4 {
            rec.tmcc_id4 = decode_text(&data[OFFSET_D4_TMCC_ID..OFFSET_D4_TMCC_ID + 4])
                .and_then(|t| t.parse().ok());
        }
        if data.len() >= OFFSET_D4_TIMESTAMP + 4 {
            let ts = &data[OFFSET_D4_TIMESTAMP..OFFSET_D4_TIMESTAMP + 4];
            if ts != [0xFF; 4] {
                rec.timestamp = Some(u32::from_le_bytes([ts[0], ts[1], ts[2], ts[3]]));
            }
        }
        rec
    }

    /// Serialize back into a record image. Four-digit fields are written
    /// only when `four_digit` is set.
    pub fn to_record(&self, scope: CommandScope, four_digit: bool) -> Vec<u8> {
        let mut data = vec![0xFFu8; ENGINE_RECORD_LEN];
        put(&mut data, OFFSET_SPEED, self.speed);
        put(&mut data, OFFSET_TARGET_SPEED, self.target_speed);
        put(&mut data, OFFSET_TRAIN_BRAKE, self.train_brake);
        put(&mut data, OFFSET_RPM_LABOR, self.rpm_labor);
        put(&mut data, OFFSET_FUEL_LEVEL, self.fuel_level);
        put(&mut data, OFFSET_WATER_LEVEL, self.water_level);
        put(&mut data, OFFSET_MOMENTUM, self.momentum);
        write_text(&mut data, OFFSET_ROAD_NAME, ROAD_NAME_LEN, self.road_name.as_deref());
        write_text(&mut data, OFFSET_ROAD_NUMBER, ROAD_NUMBER_LEN, self.road_number.as_deref());
        put(&mut data, OFFSET_ENGINE_TYPE, self.engine_type);
        put(&mut data, OFFSET_CONTROL_TYPE, self.control_type);
        put(&mut data, OFFSET_SOUND_TYPE, self.sound_type);
        put(&mut data, OFFSET_ENGINE_CLASS, self.engine_class);
        put(&mut data, OFFSET_SMOKE, self.smoke);
        put(&mut data, OFFSET_SPEED_LIMIT, self.speed_limit);
        put(&mut data, OFFSET_MAX_SPEED, self.max_speed);
        if scope == CommandScope::Train {
            put(&mut data, OFFSET_CONSIST_FLAGS, self.consist_flags);
            let area = ConsistComponent::list_to_area(&self.consist);
            data[OFFSET_CONSIST_COMPS..OFFSET_CONSIST_COMPS + CONSIST_AREA_LEN]
                .copy_from_slice(&area);
        }
        if four_digit {
            if let Some(id) = self.tmcc_id4 {
                let digits = format!("{id:04}");
                data[OFFSET_D4_TMCC_ID..OFFSET_D4_TMCC_ID + 4]
                    .copy_from_slice(&digits.as_bytes()[..4]);
            }
            if let Some(ts) = self.timestamp {
                data[OFFSET_D4_TIMESTAMP..OFFSET_D4_TIMESTAMP + 4]
                    .copy_from_slice(&ts.to_le_bytes());
            }
        }
        data
    }
}

/// Parsed switch record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwitchRecord {
    pub road_name: Option<String>,
    pub road_number: Option<String>,
}

pub const OFFSET_SWITCH_NAME: usize = 0x05;
pub const OFFSET_SWITCH_NUMBER: usize = 0x25;

impl SwitchRecord {
    pub fn parse(data: &[u8]) -> Self {
        SwitchRecord {
            road_name: field_text(data, OFFSET_SWITCH_NAME, ROAD_NAME_LEN),
            road_number: field_text(data, OFFSET_SWITCH_NUMBER, ROAD_NUMBER_LEN),
        }
    }

    pub fn to_record(&self) -> Vec<u8> {
        let mut data = vec![0xFFu8; SWITCH_RECORD_LEN];
        write_text(&mut data, OFFSET_SWITCH_NAME, ROAD_NAME_LEN, self.road_name.as_deref());
        write_text(&mut data, OFFSET_SWITCH_NUMBER, ROAD_NUMBER_LEN, self.road_number.as_deref());
        data
    }
}

/// Parsed route record: switch-record naming plus the component area.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteRecord {
    pub road_name: Option<String>,
    pub road_number: Option<String>,
    pub components: Vec<RouteComponent>,
}

pub const OFFSET_ROUTE_COMPS: usize = 0x60;

impl RouteRecord {
    pub fn parse(data: &[u8]) -> Self {
        let components = if data.len() >= OFFSET_ROUTE_COMPS + CONSIST_AREA_LEN {
            RouteComponent::list_from_area(&data[OFFSET_ROUTE_COMPS..OFFSET_ROUTE_COMPS + CONSIST_AREA_LEN])
        } else {
            Vec::new()
        };
        RouteRecord {
            road_name: field_text(data, OFFSET_SWITCH_NAME, ROAD_NAME_LEN),
            road_number: field_text(data, OFFSET_SWITCH_NUMBER, ROAD_NUMBER_LEN),
            components,
        }
    }

    pub fn to_record(&self) -> Vec<u8> {
        let mut data = vec![0xFFu8; ROUTE_RECORD_LEN];
        write_text(&mut data, OFFSET_SWITCH_NAME, ROAD_NAME_LEN, self.road_name.as_deref());
        write_text(&mut data, OFFSET_SWITCH_NUMBER, ROAD_NUMBER_LEN, self.road_number.as_deref());
        let area = RouteComponent::list_to_area(&self.components);
        data[OFFSET_ROUTE_COMPS..OFFSET_ROUTE_COMPS + CONSIST_AREA_LEN].copy_from_slice(&area);
        data
    }
}

/// Parsed accessory record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessoryRecord {
    pub device_code: Option<u8>,
    pub road_name: Option<String>,
    pub road_number: Option<String>,
}

pub const OFFSET_ACC_DEVICE_CODE: usize = 0x1E;

impl AccessoryRecord {
    pub fn parse(data: &[u8]) -> Self {
        AccessoryRecord {
            device_code: byte_at(data, OFFSET_ACC_DEVICE_CODE),
            road_name: field_text(data, OFFSET_ROAD_NAME, ROAD_NAME_LEN),
            road_number: field_text(data, OFFSET_ROAD_NUMBER, ROAD_NUMBER_LEN),
        }
    }

    pub fn to_record(&self) -> Vec<u8> {
        let mut data = vec![0xFFu8; ENGINE_RECORD_LEN];
        put(&mut data, OFFSET_ACC_DEVICE_CODE, self.device_code);
        write_text(&mut data, OFFSET_ROAD_NAME, ROAD_NAME_LEN, self.road_name.as_deref());
        write_text(&mut data, OFFSET_ROAD_NUMBER, ROAD_NUMBER_LEN, self.road_number.as_deref());
        data
    }
}

fn field_text(data: &[u8], offset: usize, len: usize) -> Option<String> {
    if data.len() < offset + len {
        return None;
    }
    decode_text(&data[offset..offset + len]).filter(|t| !t.is_empty())
}

fn write_text(data: &mut [u8], offset: usize, len: usize, text: Option<&str>) {
    if text.is_some() && data.len() >= offset + len {
        data[offset..offset + len].copy_from_slice(&encode_text(text, len));
    }
}

#[cfg(test)]
#[path = "comp_data_tests.rs"]
mod tests;
