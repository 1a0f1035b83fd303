// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server side of the control plane: the client session registry, command
//! relay into the shared outbound queue, and state fan-out.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::comm::buffer::CommBuffer;
use crate::comm::control::{self, Version};
use crate::comm::listener::{CommandDispatcher, CommandListener};
use crate::error::{ErrorCounters, ProtocolError};
use crate::pdi::base_req::BaseReq;
use crate::pdi::req::PdiReq;
use crate::protocol::command_req::CommandReq;
use crate::protocol::constants::CommandScope;
use crate::protocol::tmcc1::Tmcc1Command;
use crate::state::store::ComponentStateStore;

/// One registered client.
#[derive(Debug)]
pub struct ClientSession {
    pub uuid: Uuid,
    pub version: Option<Version>,
    pub last_seen: std::time::Instant,
    tx: mpsc::UnboundedSender<Bytes>,
}

/// Registry of client sessions keyed by `(ip, advertised port)`.
///
/// A REGISTER with a new uuid on a known key evicts the prior session.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    sessions: Mutex<IndexMap<(IpAddr, u16), ClientSession>>,
    counters: Arc<ErrorCounters>,
}

impl ClientRegistry {
    pub fn new(counters: Arc<ErrorCounters>) -> Self {
        ClientRegistry { sessions: Mutex::new(IndexMap::new()), counters }
    }

    pub fn register(
        &self,
        ip: IpAddr,
        port: u16,
        uuid: Uuid,
        version: Option<Version>,
        tx: mpsc::UnboundedSender<Bytes>,
    ) {
        let mut sessions = self.sessions.lock();
        if let Some(existing) = sessions.get(&(ip, port)) {
            if existing.uuid != uuid {
                self.counters.record(ProtocolError::ClientEvicted);
                info!(%ip, port, old = %existing.uuid, new = %uuid, "evicting stale client session");
            }
        }
        sessions.insert(
            (ip, port),
            ClientSession { uuid, version, last_seen: std::time::Instant::now(), tx },
        );
    }

    pub fn refresh(&self, ip: IpAddr, port: u16, uuid: Uuid) {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.get_mut(&(ip, port)) {
            if session.uuid == uuid {
                session.last_seen = std::time::Instant::now();
            }
        }
    }

    pub fn disconnect(&self, ip: IpAddr, port: u16, uuid: Uuid) {
        let mut sessions = self.sessions.lock();
        if sessions.get(&(ip, port)).is_some_and(|s| s.uuid == uuid) {
            sessions.shift_remove(&(ip, port));
            info!(%ip, port, %uuid, "client disconnected");
        }
    }

    pub fn is_client(&self, ip: IpAddr, port: u16, uuid: Uuid) -> bool {
        self.sessions.lock().get(&(ip, port)).is_some_and(|s| s.uuid == uuid)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Send bytes to every session, optionally skipping the originator.
    /// Dead sessions are pruned.
    pub fn broadcast(&self, bytes: &[u8], skip: Option<(IpAddr, u16)>) {
        let payload = Bytes::copy_from_slice(bytes);
        let mut sessions = self.sessions.lock();
        sessions.retain(|key, session| {
            if Some(*key) == skip {
                return true;
            }
            session.tx.send(payload.clone()).is_ok()
        });
    }
}

/// Everything the server loop needs.
pub struct Server {
    pub registry: Arc<ClientRegistry>,
    pub buffer: CommBuffer,
    pub listener: CommandListener,
    pub dispatcher: CommandDispatcher,
    pub store: Arc<ComponentStateStore>,
}

impl Server {
    /// Accept and serve clients until cancelled. Every observed command is
    /// fanned out to clients via a dispatcher subscription the caller wires
    /// with [`Server::forwarding_subscription`].
    pub async fn serve(self: Arc<Self>, bind: SocketAddr, cancel: CancellationToken) -> anyhow::Result<()> {
        let tcp = TcpListener::bind(bind).await?;
        info!(%bind, "server listening for clients");
        self.serve_on(tcp, cancel).await
    }

    /// Serve from an already-bound listener.
    pub async fn serve_on(
        self: Arc<Self>,
        tcp: TcpListener,
        cancel: CancellationToken,
    ) -> anyhow::Result<()> {
        loop {
            tokio::select! {
                accepted = tcp.accept() => {
                    let (stream, peer) = accepted?;
                    let server = self.clone();
                    let conn_cancel = cancel.clone();
                    tokio::spawn(async move {
                        server.serve_client(stream, peer, conn_cancel).await;
                    });
                }
                _ = cancel.cancelled() => return Ok(()),
            }
        }
    }

    /// Subscription that forwards every dispatched message to all clients.
    pub fn forwarding_subscription(&self) -> crate::comm::listener::Subscription {
        let registry = self.registry.clone();
        self.dispatcher.subscribe_any(move |msg| {
            registry.broadcast(&msg.as_bytes(), None);
        })
    }

    async fn serve_client(
        &self,
        stream: tokio::net::TcpStream,
        peer: SocketAddr,
        cancel: CancellationToken,
    ) {
        let (mut reader, mut writer) = stream.into_split();
        let (tx, mut outbound) = mpsc::unbounded_channel::<Bytes>();
        // session key defaults to the socket peer until REGISTER advertises
        // the client's listener port
        let mut session_key: (IpAddr, u16) = (peer.ip(), peer.port());
        let mut chunk = [0u8; 2048];

        let write_task = tokio::spawn(async move {
            while let Some(bytes) = outbound.recv().await {
                if writer.write_all(&bytes).await.is_err() {
                    break;
                }
            }
            let _ = writer.shutdown().await;
        });

        loop {
            let read = tokio::select! {
                read = reader.read(&mut chunk) => read,
                _ = cancel.cancelled() => break,
            };
            let n = match read {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            let bytes = &chunk[..n];
            match control::parse_control(bytes) {
                Some((command, addendum)) => {
                    session_key = (peer.ip(), addendum.port.unwrap_or(peer.port()));
                    self.handle_control(command, &addendum, session_key, &tx);
                }
                None => {
                    // relay into the shared queue and echo to the other
                    // clients so their mirrors advance
                    self.buffer.enqueue_bytes(bytes.to_vec(), Duration::ZERO);
                    self.listener.offer(bytes);
                    self.registry.broadcast(bytes, Some(session_key));
                }
            }
        }
        write_task.abort();
        debug!(%peer, "client connection closed");
    }

    fn handle_control(
        &self,
        command: Tmcc1Command,
        addendum: &control::Addendum,
        session_key: (IpAddr, u16),
        tx: &mpsc::UnboundedSender<Bytes>,
    ) {
        let (ip, port) = session_key;
        match command {
            Tmcc1Command::Register => {
                if let Some(uuid) = addendum.uuid {
                    self.registry.register(ip, port, uuid, addendum.version, tx.clone());
                }
            }
            Tmcc1Command::Disconnect => {
                if let Some(uuid) = addendum.uuid {
                    self.registry.disconnect(ip, port, uuid);
                }
            }
            Tmcc1Command::KeepAlive => {
                if let Some(uuid) = addendum.uuid {
                    self.registry.refresh(ip, port, uuid);
                }
            }
            Tmcc1Command::SyncRequest | Tmcc1Command::Resync => {
                self.send_state_dump(tx);
            }
            other => {
                // surface admin commands through the dispatcher
                if let Ok(req) = CommandReq::tmcc1(other, 0) {
                    self.dispatcher.offer(crate::comm::message::Message::Tmcc(req));
                }
            }
        }
    }

    /// Replay current state to one client: SENDING_STATE, each component's
    /// record as a BASE_MEMORY frame, then SYNC_COMPLETE.
    fn send_state_dump(&self, tx: &mpsc::UnboundedSender<Bytes>) {
        let send_sync = |cmd: Tmcc1Command| {
            if let Ok(req) = CommandReq::tmcc1(cmd, 0) {
                let _ = tx.send(Bytes::from(req.as_bytes()));
            }
        };
        send_sync(Tmcc1Command::SendingState);
        for scope in [
            CommandScope::Engine,
            CommandScope::Train,
            CommandScope::Switch,
            CommandScope::Route,
            CommandScope::Acc,
        ] {
            for address in self.store.addresses(scope) {
                let Some(cell) = self.store.get(scope, address) else { continue };
                let image = cell.read(|state| state.record_image());
                if let Some(data) = image {
                    let length = data.len() as u16;
                    let req = PdiReq::Base(BaseReq {
                        command: crate::pdi::constants::PdiCommand::BaseMemory,
                        tmcc_id: address.min(255) as u8,
                        scope,
                        start: 0,
                        length,
                        data,
                    });
                    let _ = tx.send(Bytes::from(req.as_frame()));
                }
            }
        }
        send_sync(Tmcc1Command::SyncComplete);
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
