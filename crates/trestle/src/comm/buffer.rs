// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single outbound queue: delay/repeat/duration scheduling, per-link
//! fan-out, keep-alive pings, and sequence cancellation.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::pdi::frame::PDI_SOP;
use crate::pdi::req::PdiReq;
use crate::protocol::command_req::CommandReq;
use crate::protocol::constants::{
    CommandScope, DEFAULT_DURATION_INTERVAL, KEEP_ALIVE_PULSE, MINIMUM_DURATION_INTERVAL,
};
use crate::protocol::tmcc1::Tmcc1Command;

/// What a sink can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// SER2 serial link: raw TMCC bytes only.
    Serial,
    /// Base 3 TCP link: PDI frames; TMCC is wrapped in TMCC_TX carriers.
    Base3,
    /// Upstream server link (client mode): raw bytes of either protocol.
    Server,
}

/// One outbound link fed by the queue drainer.
#[derive(Debug, Clone)]
pub struct Sink {
    pub kind: SinkKind,
    pub tx: mpsc::UnboundedSender<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    at: Instant,
    seq: u64,
    bytes: Vec<u8>,
    sequence_id: Option<u64>,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.at, self.seq).cmp(&(other.at, other.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug)]
struct BufferInner {
    tx: mpsc::UnboundedSender<Entry>,
    sinks: Mutex<Vec<Sink>>,
    cancelled: Mutex<HashSet<u64>>,
    next_seq: AtomicU64,
    next_sequence_id: AtomicU64,
}

/// Handle to a scheduled composite command; cancelling removes its not-yet
/// transmitted entries from the queue.
#[derive(Debug, Clone)]
pub struct SequenceHandle {
    id: u64,
    inner: Arc<BufferInner>,
}

impl SequenceHandle {
    pub fn cancel(&self) {
        self.inner.cancelled.lock().insert(self.id);
    }
}

/// The process-wide outbound command buffer.
#[derive(Clone)]
pub struct CommBuffer {
    inner: Arc<BufferInner>,
}

impl CommBuffer {
    /// Spawn the queue drainer.
    pub fn spawn(cancel: CancellationToken) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Entry>();
        let inner = Arc::new(BufferInner {
            tx,
            sinks: Mutex::new(Vec::new()),
            cancelled: Mutex::new(HashSet::new()),
            next_seq: AtomicU64::new(1),
            next_sequence_id: AtomicU64::new(1),
        });
        let buffer = CommBuffer { inner: inner.clone() };
        tokio::spawn(async move {
            let mut heap: BinaryHeap<Reverse<Entry>> = BinaryHeap::new();
            let mut last_send = Instant::now();
            loop {
                let next_due = heap.peek().map(|Reverse(e)| e.at);
                let keep_alive_at = last_send + KEEP_ALIVE_PULSE;
                let deadline = next_due.unwrap_or(keep_alive_at).min(keep_alive_at);
                tokio::select! {
                    entry = rx.recv() => {
                        match entry {
                            Some(entry) => heap.push(Reverse(entry)),
                            None => break,
                        }
                    }
                    _ = tokio::time::sleep_until(deadline) => {
                        let now = Instant::now();
                        let due = heap.peek().is_some_and(|Reverse(e)| e.at <= now);
                        if due {
                            if let Some(Reverse(entry)) = heap.pop() {
                                let skip = entry
                                    .sequence_id
                                    .is_some_and(|id| inner.cancelled.lock().contains(&id));
                                if !skip {
                                    Self::transmit(&inner, &entry.bytes);
                                    last_send = now;
                                }
                            }
                        } else if now >= keep_alive_at {
                            // idle: proof-of-life ping toward the Base 3
                            Self::transmit(&inner, &PdiReq::Ping.as_frame());
                            last_send = now;
                        }
                    }
                    _ = cancel.cancelled() => break,
                }
            }
        });
        buffer
    }

    /// Attach an outbound link.
    pub fn add_sink(&self, kind: SinkKind) -> mpsc::UnboundedReceiver<Vec<u8>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.sinks.lock().push(Sink { kind, tx });
        rx
    }

    pub fn has_sink(&self, kind: SinkKind) -> bool {
        self.inner.sinks.lock().iter().any(|s| s.kind == kind)
    }

    /// Append raw command bytes, honoring an optional delay.
    pub fn enqueue_bytes(&self, bytes: Vec<u8>, delay: Duration) {
        self.enqueue_entry(bytes, delay, None);
    }

    fn enqueue_entry(&self, bytes: Vec<u8>, delay: Duration, sequence_id: Option<u64>) {
        let entry = Entry {
            at: Instant::now() + delay,
            seq: self.inner.next_seq.fetch_add(1, Ordering::Relaxed),
            bytes,
            sequence_id,
        };
        let _ = self.inner.tx.send(entry);
    }

    /// Schedule a request with repeat/duration semantics: the aux1 prefix
    /// when the catalog demands one, derived follow-on effects after the
    /// first repetition, and interval-spaced repeats across a duration.
    pub fn enqueue_command(&self, req: &CommandReq, delay: Duration, repeat: u32, duration: Duration) {
        let bytes = req.as_bytes();
        let prefix = if req.command().is_aux1_prefixed() {
            CommandReq::tmcc1(Tmcc1Command::Aux1OptionOne, req.address())
                .ok()
                .and_then(|mut p| p.set_scope(req.scope()).ok().map(|_| p.as_bytes()))
        } else {
            None
        };
        for rep in 0..repeat.max(1) {
            if let Some(prefix) = &prefix {
                self.enqueue_bytes(prefix.clone(), delay);
            }
            self.enqueue_bytes(bytes.clone(), delay);
            if rep == 0 {
                for effect in req.results_in() {
                    self.enqueue_bytes(effect.as_bytes(), delay);
                }
            }
        }
        if duration > Duration::ZERO {
            let interval = req
                .interval_ms()
                .map(|ms| Duration::from_millis(u64::from(ms)))
                .unwrap_or(DEFAULT_DURATION_INTERVAL)
                .max(MINIMUM_DURATION_INTERVAL);
            let mut offset = interval;
            while offset < duration {
                self.enqueue_bytes(bytes.clone(), delay + offset);
                offset += interval;
            }
        }
    }

    pub fn enqueue_pdi(&self, req: &PdiReq, delay: Duration) {
        self.enqueue_bytes(req.as_frame(), delay);
    }

    /// Schedule the entries of a composite command under one cancellable id.
    pub fn enqueue_sequence(&self, entries: Vec<(Vec<u8>, Duration)>) -> SequenceHandle {
        let id = self.inner.next_sequence_id.fetch_add(1, Ordering::Relaxed);
        for (bytes, delay) in entries {
            self.enqueue_entry(bytes, delay, Some(id));
        }
        SequenceHandle { id, inner: self.inner.clone() }
    }

    fn transmit(inner: &BufferInner, bytes: &[u8]) {
        let is_pdi = bytes.first() == Some(&PDI_SOP);
        let mut sinks = inner.sinks.lock();
        sinks.retain(|sink| {
            let sent = match (sink.kind, is_pdi) {
                (SinkKind::Serial, false) => sink.tx.send(bytes.to_vec()).is_ok(),
                // PDI frames cannot ride the SER2 link
                (SinkKind::Serial, true) => true,
                (SinkKind::Base3, true) | (SinkKind::Server, _) => {
                    sink.tx.send(bytes.to_vec()).is_ok()
                }
                (SinkKind::Base3, false) => {
                    // wrap raw TMCC in TMCC_TX carriers
                    wrap_tmcc_bytes(bytes)
                        .into_iter()
                        .all(|frame| sink.tx.send(frame).is_ok())
                }
            };
            if !sent {
                debug!(kind = ?sink.kind, "dropping closed sink");
            }
            sent
        });
    }
}

/// Split raw TMCC bytes into per-window TMCC_TX / TMCC4_TX PDI frames.
pub fn wrap_tmcc_bytes(bytes: &[u8]) -> Vec<Vec<u8>> {
    let four_digit =
        bytes.len() % 7 == 0 && bytes.len() > 3 && bytes[3].is_ascii_digit();
    let (command, window) = if four_digit {
        (crate::pdi::constants::PdiCommand::Tmcc4Tx, 7)
    } else {
        (crate::pdi::constants::PdiCommand::TmccTx, 3)
    };
    bytes
        .chunks(window)
        .map(|chunk| {
            let mut payload = vec![command.as_u8()];
            payload.extend_from_slice(chunk);
            crate::pdi::frame::encode(&payload)
        })
        .collect()
}

/// Build a request and schedule it in one step.
pub fn send_request(
    buffer: &CommBuffer,
    command: crate::protocol::command_req::CommandId,
    address: u32,
    data: i32,
    scope: Option<CommandScope>,
) -> Result<CommandReq, crate::error::ProtocolError> {
    let req = CommandReq::new(command, address, data, scope)?;
    buffer.enqueue_command(&req, Duration::ZERO, 1, Duration::ZERO);
    Ok(req)
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
