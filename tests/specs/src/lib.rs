// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for the cross-module specs: an assembled core (listener,
//! dispatcher, store, comm buffer) with no physical links attached.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use trestle::comm::buffer::{CommBuffer, SinkKind};
use trestle::comm::listener::{CommandDispatcher, CommandListener, Subscription};
use trestle::comm::message::Message;
use trestle::error::ErrorCounters;
use trestle::state::store::ComponentStateStore;

/// Fully wired core with taps on dispatch and outbound traffic.
pub struct Core {
    pub dispatcher: CommandDispatcher,
    pub listener: CommandListener,
    pub buffer: CommBuffer,
    pub store: Arc<ComponentStateStore>,
    pub counters: Arc<ErrorCounters>,
    pub seen: Arc<Mutex<Vec<Message>>>,
    pub cancel: CancellationToken,
    _subs: Vec<Subscription>,
}

impl Core {
    pub fn assemble() -> Core {
        let cancel = CancellationToken::new();
        let counters = Arc::new(ErrorCounters::default());
        let dispatcher = CommandDispatcher::spawn(counters.clone(), cancel.clone());
        let listener = CommandListener::spawn(dispatcher.clone(), cancel.clone());
        let buffer = CommBuffer::spawn(cancel.clone());
        let store = Arc::new(ComponentStateStore::new());

        let store_tap = store.clone();
        let store_sub = dispatcher.subscribe_any(move |msg| store_tap.handle(msg));

        let seen: Arc<Mutex<Vec<Message>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_tap = seen.clone();
        let seen_sub = dispatcher.subscribe_any(move |msg| seen_tap.lock().push(msg.clone()));

        Core {
            dispatcher,
            listener,
            buffer,
            store,
            counters,
            seen,
            cancel,
            _subs: vec![store_sub, seen_sub],
        }
    }

    /// Tap the outbound queue as a server-style raw sink.
    pub fn tap_outbound(&self) -> tokio::sync::mpsc::UnboundedReceiver<Vec<u8>> {
        self.buffer.add_sink(SinkKind::Server)
    }

    /// Wait until at least `count` messages have been dispatched.
    pub async fn settled(&self, count: usize) -> bool {
        for _ in 0..200 {
            if self.seen.lock().len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
