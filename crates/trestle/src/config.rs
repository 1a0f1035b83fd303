// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;

use crate::protocol::constants::{
    DEFAULT_BAUDRATE, DEFAULT_BASE_PORT, DEFAULT_SERVER_PORT, VALID_BAUDRATES,
};

/// Layout control daemon for Lionel Legacy/TMCC command stations.
#[derive(Debug, Parser)]
#[command(name = "trestle", version, about)]
pub struct Config {
    /// Base 3 host (PDI over TCP). Enables the Base 3 link.
    #[arg(long, env = "TRESTLE_BASE")]
    pub base: Option<String>,

    /// Base 3 PDI port.
    #[arg(long, env = "TRESTLE_BASE_PORT", default_value_t = DEFAULT_BASE_PORT)]
    pub base_port: u16,

    /// SER2 serial device path. Enables the serial link.
    #[arg(long, env = "TRESTLE_SERIAL")]
    pub serial: Option<String>,

    /// Serial baud rate.
    #[arg(long, env = "TRESTLE_BAUDRATE", default_value_t = DEFAULT_BAUDRATE)]
    pub baudrate: u32,

    /// Run as a server: own the physical links and serve clients.
    #[arg(long, env = "TRESTLE_SERVER")]
    pub server: bool,

    /// Server listener port (server mode) or advertised client port.
    #[arg(long, env = "TRESTLE_PORT", default_value_t = DEFAULT_SERVER_PORT)]
    pub port: u16,

    /// Connect to a trestle server as a client (host or host:port).
    #[arg(long, env = "TRESTLE_CLIENT")]
    pub client: Option<String>,

    /// Log format (json or text).
    #[arg(long, env = "TRESTLE_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "TRESTLE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !VALID_BAUDRATES.contains(&self.baudrate) {
            anyhow::bail!("invalid baudrate: {}", self.baudrate);
        }
        if self.client.is_some() {
            if self.server {
                anyhow::bail!("cannot run as both --server and --client");
            }
            if self.base.is_some() || self.serial.is_some() {
                anyhow::bail!("--client relays through a server; drop --base/--serial");
            }
        } else if self.base.is_none() && self.serial.is_none() {
            anyhow::bail!("either --base, --serial, or --client must be specified");
        }
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        Ok(())
    }

    /// Resolved Base 3 address, when the link is configured.
    pub fn base_addr(&self) -> Option<String> {
        self.base.as_ref().map(|host| {
            if host.contains(':') {
                host.clone()
            } else {
                format!("{host}:{}", self.base_port)
            }
        })
    }

    /// Resolved server address for client mode.
    pub fn server_addr(&self) -> Option<String> {
        self.client.as_ref().map(|host| {
            if host.contains(':') {
                host.clone()
            } else {
                format!("{host}:{DEFAULT_SERVER_PORT}")
            }
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
