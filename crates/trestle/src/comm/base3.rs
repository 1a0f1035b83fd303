// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Base 3 TCP link: PDI frames over the command station's PDI port, with
//! exponential-backoff reconnects.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{ErrorCounters, ProtocolError};
use crate::protocol::constants::BASE_THROTTLE;

use crate::comm::listener::CommandListener;

const BACKOFF_START: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(30);

/// Run the Base 3 connection until cancelled: reader feeds the listener,
/// writer drains the comm buffer's Base 3 sink with link throttling.
pub async fn run(
    addr: String,
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
            conn = TcpStream::connect(&addr) => conn,
            _ = cancel.cancelled() => return,
        };
        let stream = match stream {
            Ok(stream) => {
                info!(%addr, "connected to base");
                backoff = BACKOFF_START;
                stream
            }
            Err(e) => {
                counters.record(ProtocolError::BrokenLink);
                warn!(%addr, err = %e, "base connection failed, retrying in {backoff:?}");
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = cancel.cancelled() => return,
                }
                backoff = (backoff * 2).min(BACKOFF_CAP);
                continue;
            }
        };

        let (mut reader, mut writer) = stream.into_split();
        let mut chunk = [0u8; 1024];
        loop {
            tokio::select! {
                read = reader.read(&mut chunk) => match read {
                    Ok(0) => {
                        counters.record(ProtocolError::BrokenLink);
                        warn!(%addr, "base closed the connection");
                        break;
                    }
                    Ok(n) => listener.offer(&chunk[..n]),
                    Err(e) => {
                        counters.record(ProtocolError::BrokenLink);
                        warn!(%addr, err = %e, "base read failed");
                        break;
                    }
                },
                bytes = outbound.recv() => match bytes {
                    Some(bytes) => {
                        if let Err(e) = writer.write_all(&bytes).await {
                            counters.record(ProtocolError::BrokenLink);
                            warn!(%addr, err = %e, "base write failed");
                            break;
                        }
                        tokio::time::sleep(BASE_THROTTLE).await;
                    }
                    None => return,
                },
                _ = cancel.cancelled() => {
                    let _ = writer.shutdown().await;
                    return;
                }
            }
        }
    }
}

