// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SER2 serial link: a blocking reader thread feeding the listener and a
//! writer thread draining the comm buffer's serial sink.

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{ErrorCounters, ProtocolError};
use crate::protocol::constants::SER2_THROTTLE;

use crate::comm::listener::CommandListener;

/// Bytes pulled per read syscall.
const READ_CHUNK: usize = 256;

/// Poll interval between reads.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Delay before reopening an unplugged device.
const REOPEN_DELAY: Duration = Duration::from_secs(1);

/// Spawn the reader and writer threads for one serial port.
///
/// The link reopens the device on failure; state is never cleared on a
/// broken link (the Base 3 re-announces).
pub fn spawn(
    port: String,
    baudrate: u32,
    listener: CommandListener,
    mut outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    counters: Arc<ErrorCounters>,
    cancel: CancellationToken,
) {
    let write_port = port.clone();
    let write_counters = counters.clone();
    let write_cancel = cancel.clone();

    std::thread::spawn(move || {
        while !cancel.is_cancelled() {
            let opened = serialport::new(&port, baudrate)
                .data_bits(serialport::DataBits::Eight)
                .parity(serialport::Parity::None)
                .stop_bits(serialport::StopBits::One)
                .timeout(POLL_INTERVAL)
                .open();
            let mut device = match opened {
                Ok(device) => {
                    info!(port, baudrate, "serial reader attached");
                    device
                }
                Err(e) => {
                    counters.record(ProtocolError::BrokenLink);
                    warn!(port, err = %e, "serial open failed, retrying");
                    std::thread::sleep(REOPEN_DELAY);
                    continue;
                }
            };
            let mut chunk = [0u8; READ_CHUNK];
            loop {
                if cancel.is_cancelled() {
                    return;
                }
                match device.read(&mut chunk) {
                    Ok(0) => {}
                    Ok(n) => listener.offer(&chunk[..n]),
                    Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                    Err(e) => {
                        counters.record(ProtocolError::BrokenLink);
                        warn!(port, err = %e, "serial read failed, reopening");
                        break;
                    }
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    });

    std::thread::spawn(move || {
        let mut device: Option<Box<dyn serialport::SerialPort>> = None;
        while !write_cancel.is_cancelled() {
            let Some(bytes) = outbound.blocking_recv() else {
                return;
            };
            if device.is_none() {
                device = serialport::new(&write_port, baudrate)
                    .timeout(Duration::from_secs(1))
                    .open()
                    .map_err(|e| {
                        write_counters.record(ProtocolError::BrokenLink);
                        warn!(port = write_port, err = %e, "serial writer open failed");
                    })
                    .ok();
            }
            if let Some(port) = device.as_mut() {
                if let Err(e) = port.write_all(&bytes) {
                    write_counters.record(ProtocolError::BrokenLink);
                    warn!(err = %e, "serial write failed, dropping device");
                    device = None;
                }
            }
            // hardware timing between commands
            std::thread::sleep(SER2_THROTTLE);
        }
    });
}

