// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Links and plumbing: the outbound buffer, byte-stream listener, topic
//! dispatcher, and the serial/Base 3/client-server transports.

pub mod base3;
pub mod buffer;
pub mod client;
pub mod control;
pub mod listener;
pub mod message;
pub mod serial;
pub mod server;
