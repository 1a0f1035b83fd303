// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Byte-stream demuxer and the topic-addressed dispatcher.
//!
//! Readers drop raw bytes into the listener's bounded queue; a framer task
//! carves complete TMCC and PDI frames out of it, decodes them, and hands
//! the resulting messages to the dispatcher, which invokes subscribers
//! synchronously in registration order.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{ErrorCounters, ProtocolError};
use crate::pdi::frame::{self, PDI_SOP};
use crate::pdi::req::PdiReq;
use crate::protocol::command_req::CommandReq;
use crate::protocol::constants::{CommandScope, DEFAULT_QUEUE_SIZE};
use crate::protocol::tmcc1::{Tmcc1Command, TMCC1_PREFIX};
use crate::protocol::tmcc2::{ENGINE_PREFIX, EXTENDED_PREFIX, MULTIBYTE_PREFIX, TRAIN_PREFIX};

use crate::comm::message::Message;

// -- Frame extraction ----------------------------------------------------------

/// One complete frame carved from the byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Tmcc(Vec<u8>),
    Pdi(Vec<u8>),
}

/// Longest PDI frame we will wait for before forcing a resync.
const MAX_PDI_FRAME: usize = 512;

fn is_index_prefix(byte: u8) -> bool {
    matches!(byte & 0xF0, 0x40 | 0x60 | 0x70)
}

fn take(buf: &mut VecDeque<u8>, n: usize) -> Vec<u8> {
    buf.drain(..n).collect()
}

/// Try to carve the next frame off the front of `buf`.
///
/// `Ok(None)` means more bytes are needed; errors consume one byte so the
/// parser re-syncs on the next recognizable prefix.
pub fn extract_frame(buf: &mut VecDeque<u8>) -> Result<Option<Extracted>, ProtocolError> {
    let Some(&first) = buf.front() else {
        return Ok(None);
    };
    match first {
        TMCC1_PREFIX => {
            if buf.len() < 3 {
                return Ok(None);
            }
            Ok(Some(Extracted::Tmcc(take(buf, 3))))
        }
        ENGINE_PREFIX | TRAIN_PREFIX | EXTENDED_PREFIX => extract_legacy(buf),
        PDI_SOP => {
            let end = frame::frame_end(buf.iter().copied());
            match end {
                Some(end) => Ok(Some(Extracted::Pdi(take(buf, end + 1)))),
                None if buf.len() > MAX_PDI_FRAME => {
                    buf.pop_front();
                    Err(ProtocolError::InvalidFrame)
                }
                None => Ok(None),
            }
        }
        _ => {
            buf.pop_front();
            Err(ProtocolError::UnknownOpcode)
        }
    }
}

fn extract_legacy(buf: &mut VecDeque<u8>) -> Result<Option<Extracted>, ProtocolError> {
    if buf.len() < 3 {
        return Ok(None);
    }
    let b1 = buf[1];
    let b2 = buf[2];

    // short-address multi-byte: odd address byte plus an index prefix. A
    // relative-speed word is byte-identical to an R4LC word 1, so the 0xFB
    // marker starting word 2 is the discriminator.
    if b1 & 1 == 1 && b1 > 1 && is_index_prefix(b2) {
        if buf.len() < 4 {
            return Ok(None);
        }
        if buf[3] != MULTIBYTE_PREFIX {
            return Ok(Some(Extracted::Tmcc(take(buf, 3))));
        }
        let needed = if b2 == crate::protocol::multibyte::VARIABLE_INDEX {
            if buf.len() < 6 {
                return Ok(None);
            }
            (5 + buf[5] as usize) * 3
        } else {
            9
        };
        if buf.len() < needed {
            return Ok(None);
        }
        return Ok(Some(Extracted::Tmcc(take(buf, needed))));
    }

    // four-digit form: address bits zero, 4 ASCII digits after each word
    if b1 <= 1 {
        if buf.len() < 7 {
            return Ok(None);
        }
        if b1 == 1 && is_index_prefix(b2) {
            // need one byte of lookahead to tell a plain four-digit command
            // from a four-digit multi-byte
            if buf.len() < 8 {
                return Ok(None);
            }
            if buf[7] == MULTIBYTE_PREFIX {
                let needed = if b2 == crate::protocol::multibyte::VARIABLE_INDEX {
                    if buf.len() < 10 {
                        return Ok(None);
                    }
                    (5 + buf[9] as usize) * 7
                } else {
                    21
                };
                if buf.len() < needed {
                    return Ok(None);
                }
                return Ok(Some(Extracted::Tmcc(take(buf, needed))));
            }
        }
        return Ok(Some(Extracted::Tmcc(take(buf, 7))));
    }

    Ok(Some(Extracted::Tmcc(take(buf, 3))))
}

// -- Dispatcher ----------------------------------------------------------------

/// Subscription topic: one device, one scope, or everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Any,
    Scope(CommandScope),
    Device(CommandScope, u32),
}

type Callback = Box<dyn Fn(&Message) + Send + Sync>;

/// Host-level admin intents surfaced from the sync command family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminEvent {
    Shutdown,
    Reboot,
    Restart,
    Update,
    Upgrade,
    Quit,
}

#[derive(Default)]
struct SubMap {
    subs: HashMap<Topic, Vec<(u64, Callback)>>,
}

struct DispatcherInner {
    tx: mpsc::UnboundedSender<Message>,
    subs: Mutex<SubMap>,
    next_id: AtomicU64,
    /// Both Base 3 and serial listeners live: drop filtered echoes.
    dual_source: AtomicBool,
    admin_tx: broadcast::Sender<AdminEvent>,
    counters: Arc<ErrorCounters>,
}

/// Topic-addressed publish/subscribe over observed commands.
///
/// Dispatch is single-task: callbacks run synchronously on the dispatcher
/// task, in per-topic registration order. Subscribers that block must
/// offload to their own tasks.
#[derive(Clone)]
pub struct CommandDispatcher {
    inner: Arc<DispatcherInner>,
}

/// Handle owned by a subscriber; dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    topic: Topic,
    inner: Weak<DispatcherInner>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut map = inner.subs.lock();
            if let Some(list) = map.subs.get_mut(&self.topic) {
                list.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

impl CommandDispatcher {
    /// Spawn the dispatcher task.
    pub fn spawn(counters: Arc<ErrorCounters>, cancel: CancellationToken) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        let (admin_tx, _) = broadcast::channel(16);
        let inner = Arc::new(DispatcherInner {
            tx,
            subs: Mutex::new(SubMap::default()),
            next_id: AtomicU64::new(1),
            dual_source: AtomicBool::new(false),
            admin_tx,
            counters,
        });
        let dispatcher = CommandDispatcher { inner: inner.clone() };
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    msg = rx.recv() => {
                        let Some(msg) = msg else { break };
                        Self::deliver(&inner, &msg);
                    }
                    _ = cancel.cancelled() => break,
                }
            }
        });
        dispatcher
    }

    /// Queue a message for dispatch.
    pub fn offer(&self, msg: Message) {
        let _ = self.inner.tx.send(msg);
    }

    /// Mark whether both the Base 3 and serial listeners are attached.
    pub fn set_dual_source(&self, dual: bool) {
        self.inner.dual_source.store(dual, Ordering::Relaxed);
    }

    pub fn subscribe(
        &self,
        topic: Topic,
        callback: impl Fn(&Message) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subs
            .lock()
            .subs
            .entry(topic)
            .or_default()
            .push((id, Box::new(callback)));
        Subscription { id, topic, inner: Arc::downgrade(&self.inner) }
    }

    pub fn subscribe_any(
        &self,
        callback: impl Fn(&Message) + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribe(Topic::Any, callback)
    }

    /// Admin intents (SHUTDOWN/REBOOT/...) for the host to act on.
    pub fn admin_events(&self) -> broadcast::Receiver<AdminEvent> {
        self.inner.admin_tx.subscribe()
    }

    fn deliver(inner: &DispatcherInner, msg: &Message) {
        if inner.dual_source.load(Ordering::Relaxed) && msg.is_filtered() {
            // the Base 3 echoes this command over TMCC_RX; that copy applies
            debug!("dropping filtered command echo");
            return;
        }
        if let Some(event) = admin_event(msg) {
            let _ = inner.admin_tx.send(event);
        }
        let scope = msg.scope();
        let address = msg.address();
        let map = inner.subs.lock();
        for topic in [Topic::Device(scope, address), Topic::Scope(scope), Topic::Any] {
            if let Some(list) = map.subs.get(&topic) {
                for (_, callback) in list {
                    callback(msg);
                }
            }
        }
    }

    pub fn counters(&self) -> Arc<ErrorCounters> {
        self.inner.counters.clone()
    }
}

fn admin_event(msg: &Message) -> Option<AdminEvent> {
    match msg.sync_command()? {
        Tmcc1Command::Shutdown => Some(AdminEvent::Shutdown),
        Tmcc1Command::Reboot => Some(AdminEvent::Reboot),
        Tmcc1Command::Restart => Some(AdminEvent::Restart),
        Tmcc1Command::Update => Some(AdminEvent::Update),
        Tmcc1Command::Upgrade => Some(AdminEvent::Upgrade),
        Tmcc1Command::Quit => Some(AdminEvent::Quit),
        _ => None,
    }
}

// -- Listener ------------------------------------------------------------------

struct ListenerInner {
    buf: Mutex<VecDeque<u8>>,
    notify: Notify,
    dispatcher: CommandDispatcher,
    counters: Arc<ErrorCounters>,
}

/// Drains the shared byte queue, frames packets, and dispatches them.
#[derive(Clone)]
pub struct CommandListener {
    inner: Arc<ListenerInner>,
}

impl CommandListener {
    pub fn spawn(dispatcher: CommandDispatcher, cancel: CancellationToken) -> Self {
        let counters = dispatcher.counters();
        let inner = Arc::new(ListenerInner {
            buf: Mutex::new(VecDeque::with_capacity(DEFAULT_QUEUE_SIZE)),
            notify: Notify::new(),
            dispatcher,
            counters,
        });
        let listener = CommandListener { inner: inner.clone() };
        tokio::spawn(async move {
            loop {
                Self::drain(&inner);
                tokio::select! {
                    _ = inner.notify.notified() => {}
                    _ = cancel.cancelled() => break,
                }
            }
        });
        listener
    }

    /// Append raw bytes from a reader. Overflow beyond the bounded queue is
    /// dropped oldest-first.
    pub fn offer(&self, bytes: &[u8]) {
        {
            let mut buf = self.inner.buf.lock();
            for &b in bytes {
                if buf.len() >= DEFAULT_QUEUE_SIZE {
                    buf.pop_front();
                }
                buf.push_back(b);
            }
        }
        self.inner.notify.notify_one();
    }

    pub fn queued(&self) -> usize {
        self.inner.buf.lock().len()
    }

    fn drain(inner: &ListenerInner) {
        loop {
            let extracted = {
                let mut buf = inner.buf.lock();
                extract_frame(&mut buf)
            };
            match extracted {
                Ok(Some(Extracted::Tmcc(bytes))) => match CommandReq::from_bytes(&bytes) {
                    Ok(req) => inner.dispatcher.offer(Message::Tmcc(req)),
                    Err(e) => {
                        inner.counters.record(e);
                        debug!(err = %e, frame = ?bytes, "discarding TMCC frame");
                    }
                },
                Ok(Some(Extracted::Pdi(bytes))) => match PdiReq::from_frame(&bytes) {
                    Ok(req) => inner.dispatcher.offer(Message::Pdi(req)),
                    Err(e) => {
                        inner.counters.record(e);
                        debug!(err = %e, frame = ?bytes, "discarding PDI frame");
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    inner.counters.record(e);
                    warn!(err = %e, "re-syncing byte stream");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
