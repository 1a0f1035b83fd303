// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composite commands: ordered series of primitive requests with relative
//! delays, expanded against current state and scheduled through the comm
//! buffer. In-flight sequences can be cancelled, and identical intents are
//! de-bounced while one is pending.

pub mod grade_crossing;
pub mod labor_effect;
pub mod ramped_speed;
pub mod speed;
pub mod tone;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::comm::buffer::{CommBuffer, SequenceHandle};
use crate::protocol::command_req::CommandReq;
use crate::protocol::constants::CommandScope;

/// The composite intents the engine can expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    AbsoluteSpeedRpm,
    SpeedWithDialog,
    RampedSpeed,
    RampedSpeedDialog,
    GradeCrossing,
    LaborEffectUp,
    LaborEffectDown,
    SetHornTone,
    SetBellTone,
    CycleHornTone,
    CycleBellTone,
    StewardChatter,
}

/// One scheduled primitive within a sequence.
#[derive(Debug, Clone)]
pub struct SequencedReq {
    pub req: CommandReq,
    /// Delay from the start of the sequence.
    pub delay: Duration,
    pub repeat: u32,
}

/// An expanded composite command, ready to schedule.
#[derive(Debug, Clone)]
pub struct SequenceReq {
    kind: SequenceKind,
    address: u32,
    scope: CommandScope,
    data: i32,
    entries: Vec<SequencedReq>,
}

impl SequenceReq {
    pub fn new(kind: SequenceKind, address: u32, scope: CommandScope, data: i32) -> Self {
        SequenceReq { kind, address, scope, data, entries: Vec::new() }
    }

    pub fn kind(&self) -> SequenceKind {
        self.kind
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn scope(&self) -> CommandScope {
        self.scope
    }

    pub fn entries(&self) -> &[SequencedReq] {
        &self.entries
    }

    pub fn add(&mut self, req: CommandReq) {
        self.add_with(req, Duration::ZERO, 1);
    }

    pub fn add_delayed(&mut self, req: CommandReq, delay: Duration) {
        self.add_with(req, delay, 1);
    }

    pub fn add_with(&mut self, req: CommandReq, delay: Duration, repeat: u32) {
        self.entries.push(SequencedReq { req, delay, repeat });
    }

    /// Identity used for de-bouncing repeated intents.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint { kind: self.kind, address: self.address, scope: self.scope, data: self.data }
    }

    /// Delay of the last scheduled entry.
    pub fn span(&self) -> Duration {
        self.entries.iter().map(|e| e.delay).max().unwrap_or(Duration::ZERO)
    }

    /// Schedule every entry through the buffer under one cancellable id.
    pub fn send(&self, buffer: &CommBuffer) -> SequenceHandle {
        let mut scheduled = Vec::new();
        for entry in &self.entries {
            let bytes = entry.req.as_bytes();
            for _ in 0..entry.repeat.max(1) {
                scheduled.push((bytes.clone(), entry.delay));
            }
        }
        buffer.enqueue_sequence(scheduled)
    }
}

/// De-bounce identity: the composite intent, not its expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub kind: SequenceKind,
    pub address: u32,
    pub scope: CommandScope,
    pub data: i32,
}

/// Launches sequences, holding off duplicates of a still-pending intent.
pub struct SequenceLauncher {
    buffer: CommBuffer,
    pending: Mutex<HashMap<Fingerprint, Instant>>,
}

impl SequenceLauncher {
    pub fn new(buffer: CommBuffer) -> Self {
        SequenceLauncher { buffer, pending: Mutex::new(HashMap::new()) }
    }

    /// Schedule `seq` unless an identical intent is still in flight.
    pub fn launch(&self, seq: &SequenceReq) -> Option<SequenceHandle> {
        let fingerprint = seq.fingerprint();
        let until = Instant::now() + seq.span();
        {
            let mut pending = self.pending.lock();
            let now = Instant::now();
            pending.retain(|_, expires| *expires > now);
            if pending.contains_key(&fingerprint) {
                return None;
            }
            pending.insert(fingerprint, until);
        }
        Some(seq.send(&self.buffer))
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
