// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client side of the control plane: one TCP connection to the server,
//! self-registration with keep-alive heartbeats, and re-registration after
//! reconnects.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::comm::control;
use crate::comm::listener::CommandListener;
use crate::error::{ErrorCounters, ProtocolError};
use crate::protocol::constants::KEEP_ALIVE_PULSE;

const BACKOFF_START: Duration = Duration::from_millis(500);
const BACKOFF_CAP: Duration = Duration::from_secs(30);

/// Identity this process presents to the server.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub uuid: Uuid,
    pub port: u16,
    pub version: control::Version,
}

impl ClientIdentity {
    pub fn new(port: u16) -> Self {
        ClientIdentity { uuid: Uuid::new_v4(), port, version: control::own_version() }
    }
}

/// Run the client link until cancelled.
///
/// - Registers on connect (and after every reconnect).
/// - Heartbeats with KEEP_ALIVE every pulse.
/// - Forwards everything the server sends into the listener.
/// - Drains the comm buffer's server sink onto the socket.
/// - Sends DISCONNECT on shutdown.
pub async fn run(
    server_addr: String,
    identity: ClientIdentity,
    listener: CommandListener,
    mut outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    counters: Arc<ErrorCounters>,
    cancel: CancellationToken,
) {
    let mut backoff = BACKOFF_START;
    loop {
        if cancel.is_cancelled() {
            return;
        }
        let stream = tokio::select! {
            conn = TcpStream::connect(&server_addr) => conn,
            _ = cancel.cancelled() => return,
        };
        let mut stream = match stream {
            Ok(stream) => {
                info!(server = %server_addr, client = %identity.uuid, "connected to server");
                backoff = BACKOFF_START;
                stream
            }
            Err(e) => {
                counters.record(ProtocolError::BrokenLink);
                debug!(server = %server_addr, err = %e, "server connection failed, retrying in {backoff:?}");
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = cancel.cancelled() => return,
                }
                backoff = (backoff * 2).min(BACKOFF_CAP);
                continue;
            }
        };

        let register = control::register_request(identity.port, identity.uuid, identity.version);
        if stream.write_all(&register).await.is_err() {
            counters.record(ProtocolError::BrokenLink);
            continue;
        }
        // ask for a state replay after (re)registration
        let sync = control::sync_state_request(identity.port);
        if stream.write_all(&sync).await.is_err() {
            counters.record(ProtocolError::BrokenLink);
            continue;
        }

        let mut chunk = [0u8; 2048];
        let mut heartbeat = tokio::time::interval(KEEP_ALIVE_PULSE);
        heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let disconnect = loop {
            tokio::select! {
                read = stream.read(&mut chunk) => match read {
                    Ok(0) => {
                        counters.record(ProtocolError::BrokenLink);
                        warn!(server = %server_addr, "server closed the connection");
                        break false;
                    }
                    Ok(n) => listener.offer(&chunk[..n]),
                    Err(e) => {
                        counters.record(ProtocolError::BrokenLink);
                        warn!(server = %server_addr, err = %e, "server read failed");
                        break false;
                    }
                },
                bytes = outbound.recv() => match bytes {
                    Some(bytes) => {
                        if stream.write_all(&bytes).await.is_err() {
                            counters.record(ProtocolError::BrokenLink);
                            break false;
                        }
                    }
                    None => break true,
                },
                _ = heartbeat.tick() => {
                    let ka = control::keep_alive_request(identity.port, identity.uuid);
                    if stream.write_all(&ka).await.is_err() {
                        counters.record(ProtocolError::BrokenLink);
                        break false;
                    }
                }
                _ = cancel.cancelled() => break true,
            }
        };

        if disconnect {
            let bye = control::disconnect_request(identity.port, identity.uuid);
            let _ = stream.write_all(&bye).await;
            let _ = stream.shutdown().await;
            info!(server = %server_addr, "deregistered from server");
            return;
        }
    }
}

