// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mirror of the Base 3's LCS device table. Each discovered device records
//! its mode and address, and the store derives the follow-up state queries
//! needed to pull every tmcc id the device controls.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::pdi::constants::{action, LcsDevice};
use crate::pdi::lcs_req::LcsReq;
use crate::pdi::req::PdiReq;

/// Configuration of one discovered LCS device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    pub device: LcsDevice,
    pub tmcc_id: u8,
    pub mode: u8,
}

impl DeviceConfig {
    /// The state queries this device requires, per its mode.
    pub fn state_requests(&self) -> Vec<PdiReq> {
        let get = |tmcc_id: u8, act: u8| PdiReq::Lcs(LcsReq::get(self.device, tmcc_id, act));
        let fan = |count: u8, act: u8| -> Vec<PdiReq> {
            (0..count).map(|i| get(self.tmcc_id.wrapping_add(i), act)).collect()
        };
        match (self.device, self.mode) {
            // accessory mode, 8 tmcc ids
            (LcsDevice::Asc2, 0) => fan(8, action::CONTROL1),
            // accessory mode, 1 tmcc id, latching
            (LcsDevice::Asc2, 1) => vec![get(self.tmcc_id, action::CONTROL2)],
            // switch mode, pulsed, 4 tmcc ids
            (LcsDevice::Asc2, 2) => fan(4, action::CONTROL4),
            // switch mode, latched, 4 tmcc ids
            (LcsDevice::Asc2, 3) => fan(4, action::CONTROL5),
            // power-district modes
            (LcsDevice::Bpc2, 0) => fan(8, action::CONTROL1),
            (LcsDevice::Bpc2, 1) => vec![get(self.tmcc_id, action::CONTROL2)],
            (LcsDevice::Bpc2, 2) => fan(8, action::CONTROL3),
            (LcsDevice::Bpc2, 3) => vec![get(self.tmcc_id, action::CONTROL4)],
            // 16 inputs / 8 input pairs
            (LcsDevice::Stm2, 0) => fan(16, action::CONTROL1),
            (LcsDevice::Stm2, 2) => fan(8, action::CONTROL1),
            (LcsDevice::Irda, _) => vec![
                PdiReq::Lcs(LcsReq::info(LcsDevice::Irda, self.tmcc_id)),
                PdiReq::Lcs(LcsReq::config(LcsDevice::Irda, self.tmcc_id)),
            ],
            (LcsDevice::Amc2, _) => Vec::new(),
            // undocumented mode: skip rather than guess at an address fan
            (device, mode) => {
                debug!(?device, mode, "unknown LCS device mode, skipping state requests");
                Vec::new()
            }
        }
    }
}

/// Tracks every discovered LCS device by family and address.
#[derive(Debug, Default)]
pub struct PdiDeviceStore {
    devices: Mutex<HashMap<LcsDevice, HashMap<u8, DeviceConfig>>>,
}

impl PdiDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device from its CONFIG response; returns the follow-up
    /// state queries to enqueue, or `None` when the packet is not a CONFIG.
    pub fn register_device(&self, req: &LcsReq) -> Option<Vec<PdiReq>> {
        let mode = req.mode()?;
        let config = DeviceConfig { device: req.device, tmcc_id: req.tmcc_id, mode };
        self.devices
            .lock()
            .entry(req.device)
            .or_default()
            .insert(req.tmcc_id, config);
        Some(config.state_requests())
    }

    pub fn get(&self, device: LcsDevice, tmcc_id: u8) -> Option<DeviceConfig> {
        self.devices.lock().get(&device).and_then(|m| m.get(&tmcc_id)).copied()
    }

    /// All devices of a family, ordered by address.
    pub fn all(&self, device: LcsDevice) -> Vec<DeviceConfig> {
        let devices = self.devices.lock();
        let mut configs: Vec<DeviceConfig> =
            devices.get(&device).map(|m| m.values().copied().collect()).unwrap_or_default();
        configs.sort_by_key(|c| c.tmcc_id);
        configs
    }
}

#[cfg(test)]
#[path = "device_store_tests.rs"]
mod tests;
