// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::comm::message::Message;
use crate::protocol::command_req::CommandReq;
use crate::protocol::constants::CommandScope;
use crate::protocol::tmcc1::Tmcc1Command;
use crate::state::store::ComponentStateStore;

async fn wait_for(calls: &Arc<AtomicUsize>, at_least: usize) -> bool {
    for _ in 0..100 {
        if calls.load(Ordering::SeqCst) >= at_least {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn watcher_fires_on_update() {
    let store = ComponentStateStore::new();
    let cell = store.get_or_create(CommandScope::Acc, 42).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    let watcher = StateWatcher::spawn(cell.clone(), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    cell.update(&Message::Tmcc(CommandReq::tmcc1(Tmcc1Command::AccAux1On, 42).unwrap()))
        .unwrap();
    assert!(wait_for(&calls, 1).await, "watcher action did not trigger");

    watcher.shutdown();
}

#[tokio::test]
async fn burst_updates_coalesce_but_still_fire() {
    let store = ComponentStateStore::new();
    let cell = store.get_or_create(CommandScope::Acc, 21).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    let watcher = StateWatcher::spawn(cell.clone(), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    for _ in 0..5 {
        cell.update(&Message::Tmcc(CommandReq::tmcc1(Tmcc1Command::AccAux2Off, 21).unwrap()))
            .unwrap();
    }
    assert!(wait_for(&calls, 1).await, "watcher missed the burst");

    watcher.shutdown();
}

#[tokio::test]
async fn shutdown_stops_further_callbacks() {
    let store = ComponentStateStore::new();
    let cell = store.get_or_create(CommandScope::Acc, 7).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    let watcher = StateWatcher::spawn(cell.clone(), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    cell.update(&Message::Tmcc(CommandReq::tmcc1(Tmcc1Command::AccAux1OptOne, 7).unwrap()))
        .unwrap();
    assert!(wait_for(&calls, 1).await);

    watcher.shutdown();
    // double shutdown is harmless
    watcher.shutdown();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let before = calls.load(Ordering::SeqCst);
    cell.update(&Message::Tmcc(CommandReq::tmcc1(Tmcc1Command::AccNumeric, 7).unwrap()))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), before, "callback after shutdown");
}
