// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client/server control-plane packets: sync admin frames (`FE F0 Fx`) with
//! a binary addendum identifying the peer.
//!
//! REGISTER carries `port:u16be + uuid:16 + version:3`; DISCONNECT drops the
//! version; KEEP_ALIVE and friends carry the port alone, or an ASCII
//! `"<ip>:<port>"` form.

use uuid::Uuid;

use crate::protocol::command_req::CommandReq;
use crate::protocol::tmcc1::Tmcc1Command;

/// `(major, minor, patch)` spoken during registration.
pub type Version = (u8, u8, u8);

/// This build's control-plane version.
pub fn own_version() -> Version {
    let mut parts = env!("CARGO_PKG_VERSION").split('.').map(|p| p.parse().unwrap_or(0));
    (
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
    )
}

/// Decoded addendum following a sync admin frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Addendum {
    pub ip: Option<String>,
    pub port: Option<u16>,
    pub uuid: Option<Uuid>,
    pub version: Option<Version>,
}

fn frame(command: Tmcc1Command) -> Vec<u8> {
    // sync commands are not addressable; construction cannot fail
    CommandReq::tmcc1(command, 0).map(|req| req.as_bytes()).unwrap_or_default()
}

pub fn register_request(port: u16, uuid: Uuid, version: Version) -> Vec<u8> {
    let mut bytes = frame(Tmcc1Command::Register);
    bytes.extend_from_slice(&port.to_be_bytes());
    bytes.extend_from_slice(uuid.as_bytes());
    bytes.extend_from_slice(&[version.0, version.1, version.2]);
    bytes
}

pub fn disconnect_request(port: u16, uuid: Uuid) -> Vec<u8> {
    let mut bytes = frame(Tmcc1Command::Disconnect);
    bytes.extend_from_slice(&port.to_be_bytes());
    bytes.extend_from_slice(uuid.as_bytes());
    bytes
}

pub fn keep_alive_request(port: u16, uuid: Uuid) -> Vec<u8> {
    let mut bytes = frame(Tmcc1Command::KeepAlive);
    bytes.extend_from_slice(&port.to_be_bytes());
    bytes.extend_from_slice(uuid.as_bytes());
    bytes
}

pub fn sync_state_request(port: u16) -> Vec<u8> {
    let mut bytes = frame(Tmcc1Command::SyncRequest);
    bytes.extend_from_slice(&port.to_be_bytes());
    bytes
}

/// Identify a control frame at the head of a received chunk: the sync
/// command plus its decoded addendum.
pub fn parse_control(bytes: &[u8]) -> Option<(Tmcc1Command, Addendum)> {
    if bytes.len() < 3 || bytes[0] != crate::protocol::tmcc1::TMCC1_PREFIX || bytes[1] != 0xF0 {
        return None;
    }
    let word = u16::from(bytes[1]) << 8 | u16::from(bytes[2]);
    let (command, _, _, _) = Tmcc1Command::decode(word)?;
    if !command.is_sync() {
        return None;
    }
    Some((command, extract_addendum(&bytes[3..])))
}

/// Decode the addendum bytes after the 3-byte frame.
pub fn extract_addendum(payload: &[u8]) -> Addendum {
    let mut addendum = Addendum::default();
    if payload.is_empty() {
        return addendum;
    }
    // ASCII "<ip>:<port>" form
    if let Ok(text) = std::str::from_utf8(payload) {
        if let Some((ip, port)) = text.split_once(':') {
            if !ip.is_empty() && ip.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
                if let Ok(port) = port.parse() {
                    addendum.ip = Some(ip.to_owned());
                    addendum.port = Some(port);
                    return addendum;
                }
            }
        }
    }
    if payload.len() >= 2 {
        addendum.port = Some(u16::from_be_bytes([payload[0], payload[1]]));
    }
    if payload.len() >= 18 {
        addendum.uuid = Uuid::from_slice(&payload[2..18]).ok();
    }
    if payload.len() >= 21 {
        addendum.version = Some((payload[18], payload[19], payload[20]));
    }
    addendum
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
