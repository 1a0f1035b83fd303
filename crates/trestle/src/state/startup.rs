// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup synchronizer: walks the Base 3's record tables across every
//! scope, enumerates four-digit records, registers LCS devices, and
//! broadcasts SYNC_COMPLETE when the store is hydrated.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::comm::buffer::CommBuffer;
use crate::comm::listener::{CommandDispatcher, Subscription};
use crate::comm::message::Message;
use crate::error::{ErrorCounters, ProtocolError};
use crate::pdi::base_req::BaseReq;
use crate::pdi::constants::{D4Action, PdiCommand};
use crate::pdi::d4_req::D4Req;
use crate::pdi::device_store::PdiDeviceStore;
use crate::pdi::req::{PdiKey, PdiReq};
use crate::protocol::command_req::CommandReq;
use crate::protocol::constants::CommandScope;
use crate::protocol::tmcc1::Tmcc1Command;

/// Last short address the record walk visits.
const LAST_WALK_ID: u8 = 98;

/// Scopes walked via BASE_MEMORY, in completion order; TRAIN is last.
const WALK_SCOPES: &[CommandScope] = &[
    CommandScope::Engine,
    CommandScope::Switch,
    CommandScope::Route,
    CommandScope::Acc,
    CommandScope::Train,
];

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(3);
const MAX_RETRIES: u32 = 3;
const SWEEP_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
struct Pending {
    req: PdiReq,
    sent_at: Instant,
    retries: u32,
}

struct StartupInner {
    buffer: CommBuffer,
    dispatcher: CommandDispatcher,
    devices: Arc<PdiDeviceStore>,
    counters: Arc<ErrorCounters>,
    waiting: Mutex<HashMap<PdiKey, Pending>>,
}

/// Drives initial hydration; idle after SYNC_COMPLETE.
pub struct StartupState {
    inner: Arc<StartupInner>,
    _subscription: Subscription,
}

impl StartupState {
    /// Kick off the startup fan-out and the retry sweeper.
    pub fn spawn(
        buffer: CommBuffer,
        dispatcher: CommandDispatcher,
        devices: Arc<PdiDeviceStore>,
        counters: Arc<ErrorCounters>,
        cancel: CancellationToken,
    ) -> Self {
        let inner = Arc::new(StartupInner {
            buffer,
            dispatcher: dispatcher.clone(),
            devices,
            counters,
            waiting: Mutex::new(HashMap::new()),
        });

        let handler = inner.clone();
        let subscription = dispatcher.subscribe_any(move |msg| {
            if let Message::Pdi(req) = msg {
                handler.handle_response(req);
            }
        });

        inner.announce(Tmcc1Command::Synchronizing);
        inner.track(PdiReq::Base(BaseReq::base_info()));
        for &scope in WALK_SCOPES {
            inner.track(PdiReq::Base(BaseReq::memory_read(scope, 1)));
        }
        for command in [PdiCommand::D4Engine, PdiCommand::D4Train] {
            inner.track(PdiReq::D4(D4Req::count(command)));
        }

        let sweeper = inner.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(SWEEP_INTERVAL) => sweeper.sweep(),
                    _ = cancel.cancelled() => break,
                }
            }
        });

        StartupState { inner, _subscription: subscription }
    }

    /// Outstanding expected responses.
    pub fn outstanding(&self) -> usize {
        self.inner.waiting.lock().len()
    }
}

impl StartupInner {
    fn announce(&self, command: Tmcc1Command) {
        if let Ok(req) = CommandReq::tmcc1(command, 0) {
            self.dispatcher.offer(Message::Tmcc(req));
        }
    }

    /// Enqueue a request and remember the response it expects.
    fn track(&self, req: PdiReq) {
        self.waiting
            .lock()
            .insert(req.as_key(), Pending { req: req.clone(), sent_at: Instant::now(), retries: 0 });
        self.buffer.enqueue_pdi(&req, Duration::ZERO);
    }

    fn handle_response(&self, req: &PdiReq) {
        self.waiting.lock().remove(&req.as_key());
        match req {
            PdiReq::Base(base)
                if base.command == PdiCommand::BaseMemory && base.is_full_record() =>
            {
                self.advance_walk(base.scope, base.tmcc_id);
            }
            PdiReq::D4(d4) => self.handle_d4(d4),
            PdiReq::Lcs(lcs) if lcs.is_config() => {
                if let Some(follow_ups) = self.devices.register_device(lcs) {
                    for follow_up in follow_ups {
                        self.track(follow_up);
                    }
                }
            }
            _ => {}
        }
        self.check_complete();
    }

    fn advance_walk(&self, scope: CommandScope, tmcc_id: u8) {
        if tmcc_id < LAST_WALK_ID {
            self.track(PdiReq::Base(BaseReq::memory_read(scope, tmcc_id + 1)));
        } else if scope == CommandScope::Train {
            // last record of the last scope: the mirror is hydrated
            info!("record walk complete, broadcasting sync complete");
            self.announce(Tmcc1Command::SyncComplete);
        }
    }

    fn handle_d4(&self, d4: &D4Req) {
        match d4.action {
            D4Action::Count => {
                if d4.count.unwrap_or(0) > 0 {
                    self.track(PdiReq::D4(D4Req::first_rec(d4.command)));
                }
            }
            D4Action::FirstRec | D4Action::NextRec => {
                let next = d4.next_record_no.unwrap_or(d4.record_no);
                if next != crate::pdi::constants::D4_END_OF_RECORDS {
                    self.track(PdiReq::D4(D4Req::query(
                        d4.command,
                        next,
                        0,
                        crate::pdi::comp_data::ENGINE_RECORD_LEN as u8,
                    )));
                    self.track(PdiReq::D4(D4Req::next_rec(d4.command, next)));
                } else {
                    debug!(command = ?d4.command, "d4 enumeration exhausted");
                }
            }
            _ => {}
        }
    }

    fn check_complete(&self) {
        if self.waiting.lock().is_empty() {
            debug!("no outstanding startup responses");
        }
    }

    /// Re-send overdue requests; drop after the retry budget. The record
    /// walk continues past a dropped slot so one dead record cannot stall
    /// hydration.
    fn sweep(&self) {
        let mut resend = Vec::new();
        let mut dropped = Vec::new();
        {
            let mut waiting = self.waiting.lock();
            let now = Instant::now();
            waiting.retain(|key, pending| {
                if now.duration_since(pending.sent_at) < RESPONSE_TIMEOUT {
                    return true;
                }
                if pending.retries < MAX_RETRIES {
                    pending.retries += 1;
                    pending.sent_at = now;
                    resend.push(pending.req.clone());
                    true
                } else {
                    dropped.push((*key, pending.req.clone()));
                    false
                }
            });
        }
        for req in resend {
            self.buffer.enqueue_pdi(&req, Duration::ZERO);
        }
        for (key, req) in dropped {
            self.counters.record(ProtocolError::Timeout);
            warn!(?key, "startup record request unanswered, moving on");
            if let PdiReq::Base(base) = &req {
                if base.command == PdiCommand::BaseMemory {
                    self.advance_walk(base.scope, base.tmcc_id);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
