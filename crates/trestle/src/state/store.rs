// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The component-state store: scope → address → state, with lazy creation,
//! halt fan-out, broadcast addressing, and watchable cells.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::comm::message::Message;
use crate::error::ProtocolError;
use crate::protocol::constants::{CommandScope, BROADCAST_ADDRESS};
use crate::state::component::{ComponentState, SyncStatus};

/// A shareable, watchable component state.
///
/// Watchers await version changes; every mutation wakes all current
/// waiters, so callbacks must tolerate spurious wakeups and version jumps.
#[derive(Debug)]
pub struct StateCell {
    state: Mutex<ComponentState>,
    notify: Notify,
}

impl StateCell {
    fn new(state: ComponentState) -> Self {
        StateCell { state: Mutex::new(state), notify: Notify::new() }
    }

    /// Read under the cell's lock.
    pub fn read<R>(&self, f: impl FnOnce(&ComponentState) -> R) -> R {
        f(&self.state.lock())
    }

    /// Clone the current state.
    pub fn snapshot(&self) -> ComponentState {
        self.state.lock().clone()
    }

    pub fn version(&self) -> u64 {
        self.state.lock().version()
    }

    pub fn scope(&self) -> CommandScope {
        self.state.lock().scope()
    }

    pub fn address(&self) -> u32 {
        self.state.lock().address()
    }

    /// Apply a message and wake watchers.
    pub fn update(&self, msg: &Message) -> anyhow::Result<()> {
        {
            let mut state = self.state.lock();
            state.update(msg)?;
        }
        self.notify.notify_waiters();
        Ok(())
    }

    fn apply_halt(&self) {
        self.state.lock().apply_halt();
        self.notify.notify_waiters();
    }

    /// Wait until the version moves past `last`, returning the new version.
    pub async fn changed(&self, last: u64) -> u64 {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            let version = self.version();
            if version != last {
                return version;
            }
            notified.await;
        }
    }
}

/// Per-scope dictionaries of component state.
#[derive(Debug, Default)]
pub struct ComponentStateStore {
    scopes: RwLock<HashMap<CommandScope, HashMap<u32, Arc<StateCell>>>>,
}

impl ComponentStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch an existing state.
    pub fn get(&self, scope: CommandScope, address: u32) -> Option<Arc<StateCell>> {
        self.scopes.read().get(&scope).and_then(|m| m.get(&address)).cloned()
    }

    /// Fetch or lazily create the state for `(scope, address)`.
    pub fn get_or_create(
        &self,
        scope: CommandScope,
        address: u32,
    ) -> Result<Arc<StateCell>, ProtocolError> {
        if !scope.is_valid_address(address) {
            return Err(ProtocolError::OutOfRange);
        }
        if let Some(cell) = self.get(scope, address) {
            return Ok(cell);
        }
        let state = ComponentState::for_scope(scope, address).ok_or(ProtocolError::OutOfRange)?;
        let cell = Arc::new(StateCell::new(state));
        self.scopes
            .write()
            .entry(scope)
            .or_default()
            .entry(address)
            .or_insert_with(|| cell.clone());
        // re-read in case another writer won the race
        self.get(scope, address).ok_or(ProtocolError::OutOfRange)
    }

    /// Every populated address of a scope, ascending.
    pub fn addresses(&self, scope: CommandScope) -> Vec<u32> {
        let mut addrs: Vec<u32> = self
            .scopes
            .read()
            .get(&scope)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default();
        addrs.sort_unstable();
        addrs
    }

    /// The pseudo-device reflecting system readiness.
    pub fn sync_cell(&self) -> Arc<StateCell> {
        // the SYNC address range admits exactly the broadcast address
        match self.get_or_create(CommandScope::Sync, BROADCAST_ADDRESS) {
            Ok(cell) => cell,
            Err(_) => unreachable!("sync scope admits the broadcast address"),
        }
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync_cell()
            .read(|s| s.sync().map(|s| s.status))
            .unwrap_or(SyncStatus::Unknown)
    }

    /// Drop every record (SYNC_BEGIN re-hydration). The sync pseudo-device
    /// survives so waiters keep their cell.
    pub fn clear(&self) {
        let mut scopes = self.scopes.write();
        let sync = scopes.get(&CommandScope::Sync).cloned();
        scopes.clear();
        if let Some(sync) = sync {
            scopes.insert(CommandScope::Sync, sync);
        }
    }

    /// Route one dispatched message into the store.
    pub fn handle(&self, msg: &Message) {
        if msg.is_halt() || msg.is_system_halt() {
            self.halt_engines();
            return;
        }
        if let Some(sync) = msg.sync_command() {
            if sync == crate::protocol::tmcc1::Tmcc1Command::SyncBegin {
                // re-hydration starts from an empty mirror
                self.clear();
            }
            if let Err(e) = self.sync_cell().update(msg) {
                debug!(err = %e, "sync state update rejected");
            }
            return;
        }
        let (scope, address) = match routing_target(msg) {
            Some(target) => target,
            None => return,
        };
        if address == BROADCAST_ADDRESS && scope != CommandScope::Sync {
            for addr in self.addresses(scope) {
                if let Some(cell) = self.get(scope, addr) {
                    if let Err(e) = cell.update(msg) {
                        debug!(%scope, addr, err = %e, "broadcast update rejected");
                    }
                }
            }
            return;
        }
        match self.get_or_create(scope, address) {
            Ok(cell) => {
                if let Err(e) = cell.update(msg) {
                    debug!(%scope, address, err = %e, "state update rejected");
                }
            }
            Err(e) => {
                warn!(%scope, address, err = %e, "no state record for message");
            }
        }
    }

    /// Zero speed and RPM on every engine and train in the store.
    fn halt_engines(&self) {
        for scope in [CommandScope::Engine, CommandScope::Train] {
            for addr in self.addresses(scope) {
                if let Some(cell) = self.get(scope, addr) {
                    cell.apply_halt();
                }
            }
        }
    }
}

/// Which state record a message lands on, or `None` when it carries no
/// component state (pings, TX echoes, LCS config traffic).
fn routing_target(msg: &Message) -> Option<(CommandScope, u32)> {
    use crate::pdi::constants::{action, LcsDevice};
    use crate::pdi::req::PdiReq;

    if let Message::Pdi(PdiReq::Lcs(lcs)) = msg {
        // control reports map onto the component the device drives
        let scope = match (lcs.device, lcs.action) {
            (LcsDevice::Irda, _) => CommandScope::Irda,
            (LcsDevice::Asc2, action::CONTROL4 | action::CONTROL5) => CommandScope::Switch,
            (LcsDevice::Asc2 | LcsDevice::Bpc2 | LcsDevice::Stm2, a)
                if (action::CONTROL1..=action::CONTROL5).contains(&a) =>
            {
                CommandScope::Acc
            }
            _ => return None,
        };
        return Some((scope, u32::from(lcs.tmcc_id)));
    }
    let scope = msg.scope();
    match scope {
        CommandScope::System
        | CommandScope::Asc2
        | CommandScope::Amc2
        | CommandScope::Bpc2
        | CommandScope::Stm2 => None,
        _ => Some((scope, msg.address())),
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
