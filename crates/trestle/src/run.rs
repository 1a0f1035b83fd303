// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process assembly: wire the listener, dispatcher, store, links, and
//! control plane for server or client operation, then run until shutdown.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::comm::buffer::{CommBuffer, SinkKind};
use crate::comm::client::ClientIdentity;
use crate::comm::listener::{AdminEvent, CommandDispatcher, CommandListener, Subscription};
use crate::comm::server::{ClientRegistry, Server};
use crate::config::Config;
use crate::error::ErrorCounters;
use crate::pdi::device_store::PdiDeviceStore;
use crate::state::startup::StartupState;
use crate::state::store::ComponentStateStore;

/// The assembled core services, shared by both roles.
pub struct Runtime {
    pub config: Config,
    pub counters: Arc<ErrorCounters>,
    pub dispatcher: CommandDispatcher,
    pub listener: CommandListener,
    pub buffer: CommBuffer,
    pub store: Arc<ComponentStateStore>,
    pub devices: Arc<PdiDeviceStore>,
    pub cancel: CancellationToken,
    _store_subscription: Subscription,
}

impl Runtime {
    /// Construct the core: dispatcher, listener, buffer, and the store wired
    /// as a dispatcher subscriber. All mutation flows through dispatch.
    pub fn new(config: Config, cancel: CancellationToken) -> Self {
        let counters = Arc::new(ErrorCounters::default());
        let dispatcher = CommandDispatcher::spawn(counters.clone(), cancel.clone());
        let listener = CommandListener::spawn(dispatcher.clone(), cancel.clone());
        let buffer = CommBuffer::spawn(cancel.clone());
        let store = Arc::new(ComponentStateStore::new());
        let devices = Arc::new(PdiDeviceStore::new());

        let store_for_dispatch = store.clone();
        let store_subscription = dispatcher.subscribe_any(move |msg| {
            store_for_dispatch.handle(msg);
        });

        Runtime {
            config,
            counters,
            dispatcher,
            listener,
            buffer,
            store,
            devices,
            cancel,
            _store_subscription: store_subscription,
        }
    }

    /// Attach the configured physical links (server role).
    pub fn attach_links(&self) {
        let serial = self.config.serial.clone();
        let base = self.config.base_addr();
        if let Some(port) = serial {
            let outbound = self.buffer.add_sink(SinkKind::Serial);
            crate::comm::serial::spawn(
                port,
                self.config.baudrate,
                self.listener.clone(),
                outbound,
                self.counters.clone(),
                self.cancel.clone(),
            );
        }
        if let Some(addr) = base {
            let outbound = self.buffer.add_sink(SinkKind::Base3);
            let listener = self.listener.clone();
            let counters = self.counters.clone();
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                crate::comm::base3::run(addr, listener, outbound, counters, cancel).await;
            });
        }
        // with both links live, filtered serial echoes are suppressed
        self.dispatcher
            .set_dual_source(self.config.serial.is_some() && self.config.base.is_some());
    }

    /// Log admin intents; the host-level hooks consume the same channel.
    pub fn spawn_admin_logger(&self) {
        let mut events = self.dispatcher.admin_events();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = events.recv() => match event {
                        Ok(AdminEvent::Quit | AdminEvent::Shutdown) => {
                            info!("shutdown requested over the control plane");
                            cancel.cancel();
                        }
                        Ok(event) => info!(?event, "admin command observed"),
                        Err(_) => break,
                    },
                    _ = cancel.cancelled() => break,
                }
            }
        });
    }
}

/// Run as a server: own the links, hydrate the store, serve clients.
pub async fn run_server(config: Config, cancel: CancellationToken) -> anyhow::Result<()> {
    let port = config.port;
    let runtime = Runtime::new(config, cancel.clone());
    runtime.attach_links();
    runtime.spawn_admin_logger();

    // hydrate the mirror when a Base 3 is attached
    let _startup = runtime.config.base.is_some().then(|| {
        StartupState::spawn(
            runtime.buffer.clone(),
            runtime.dispatcher.clone(),
            runtime.devices.clone(),
            runtime.counters.clone(),
            runtime.cancel.clone(),
        )
    });

    let registry = Arc::new(ClientRegistry::new(runtime.counters.clone()));
    let server = Arc::new(Server {
        registry,
        buffer: runtime.buffer.clone(),
        listener: runtime.listener.clone(),
        dispatcher: runtime.dispatcher.clone(),
        store: runtime.store.clone(),
    });
    let _forwarding = server.forwarding_subscription();

    let bind = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    server.serve(bind, cancel).await
}

/// Run as a client: relay intents to a server and mirror its state.
pub async fn run_client(config: Config, cancel: CancellationToken) -> anyhow::Result<()> {
    let Some(server_addr) = config.server_addr() else {
        anyhow::bail!("client mode requires --client");
    };
    let identity = ClientIdentity::new(config.port);
    let runtime = Runtime::new(config, cancel.clone());
    runtime.spawn_admin_logger();

    let outbound = runtime.buffer.add_sink(SinkKind::Server);
    crate::comm::client::run(
        server_addr,
        identity,
        runtime.listener.clone(),
        outbound,
        runtime.counters.clone(),
        cancel,
    )
    .await;
    Ok(())
}

