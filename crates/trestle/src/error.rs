// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Error taxonomy shared by the codecs, links, and control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// SOP/EOP mismatch, bad checksum, or truncated packet.
    InvalidFrame,
    /// First byte (or opcode word) not recognized.
    UnknownOpcode,
    /// Address or data outside the declared bounds on an outbound request.
    OutOfRange,
    /// Serial device unplugged or TCP peer closed.
    BrokenLink,
    /// A startup record request went unanswered after retries.
    Timeout,
    /// A client re-registered from a new uuid on a known (ip, port).
    ClientEvicted,
}

impl ProtocolError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidFrame => "INVALID_FRAME",
            Self::UnknownOpcode => "UNKNOWN_OPCODE",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::BrokenLink => "BROKEN_LINK",
            Self::Timeout => "TIMEOUT",
            Self::ClientEvicted => "CLIENT_EVICTED",
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for ProtocolError {}

/// Per-kind counters for discarded packets and link faults. Nothing is
/// swallowed silently: every drop increments its counter.
#[derive(Debug, Default)]
pub struct ErrorCounters {
    invalid_frame: AtomicU64,
    unknown_opcode: AtomicU64,
    out_of_range: AtomicU64,
    broken_link: AtomicU64,
    timeout: AtomicU64,
    client_evicted: AtomicU64,
}

impl ErrorCounters {
    pub fn record(&self, kind: ProtocolError) {
        self.counter(kind).fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, kind: ProtocolError) -> u64 {
        self.counter(kind).load(Ordering::Relaxed)
    }

    fn counter(&self, kind: ProtocolError) -> &AtomicU64 {
        match kind {
            ProtocolError::InvalidFrame => &self.invalid_frame,
            ProtocolError::UnknownOpcode => &self.unknown_opcode,
            ProtocolError::OutOfRange => &self.out_of_range,
            ProtocolError::BrokenLink => &self.broken_link,
            ProtocolError::Timeout => &self.timeout,
            ProtocolError::ClientEvicted => &self.client_evicted,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
