// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State watchers: a task per watched component that invokes a callback on
//! every version change. Dropping the watcher (or cancelling) stops it.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::state::store::StateCell;

/// Watches one component state and runs an action on change.
///
/// Actions must be idempotent: versions may advance several times between
/// observations and wakeups may be spurious.
#[derive(Debug)]
pub struct StateWatcher {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl StateWatcher {
    pub fn spawn(cell: Arc<StateCell>, mut action: impl FnMut() + Send + 'static) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut version = cell.version();
            loop {
                tokio::select! {
                    next = cell.changed(version) => {
                        version = next;
                        action();
                    }
                    _ = token.cancelled() => break,
                }
            }
        });
        StateWatcher { cancel, handle }
    }

    /// Stop watching; pending wakeups are discarded.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for StateWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
