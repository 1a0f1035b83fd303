// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-device component state: one record per (scope, address), updated by
//! the dispatcher and watchable through a version counter.

use std::time::Instant;

use anyhow::bail;
use serde_json::json;

use crate::comm::message::Message;
use crate::pdi::base_req::BaseReq;
use crate::pdi::block_req::BlockReq;
use crate::pdi::comp_data::{
    AccessoryRecord, EngineRecord, RouteComponent, RouteRecord, SwitchRecord,
};
use crate::pdi::constants::{action, LcsDevice, PdiCommand};
use crate::pdi::lcs_req::LcsReq;
use crate::pdi::req::PdiReq;
use crate::protocol::command_req::{CommandId, CommandReq};
use crate::protocol::constants::{CommandScope, Direction};
use crate::protocol::tmcc1::Tmcc1Command;
use crate::state::engine::EngineState;

/// A switch points one of two ways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwitchPosition {
    #[default]
    Unknown,
    Thru,
    Out,
}

#[derive(Debug, Clone, Default)]
pub struct SwitchState {
    pub position: SwitchPosition,
    pub road_name: Option<String>,
    pub road_number: Option<String>,
}

impl SwitchState {
    pub fn is_thru(&self) -> bool {
        self.position == SwitchPosition::Thru
    }

    pub fn is_out(&self) -> bool {
        self.position == SwitchPosition::Out
    }
}

/// Latched aux sub-state of an accessory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuxState {
    On,
    Off,
}

#[derive(Debug, Clone, Default)]
pub struct AccessoryState {
    /// Composite on/off driven by the AUX1/AUX2 option-one buttons.
    pub aux_on: Option<bool>,
    pub aux1: Option<AuxState>,
    pub aux2: Option<AuxState>,
    /// Last numeric keypad value.
    pub value: Option<i32>,
    pub device_code: Option<u8>,
    pub road_name: Option<String>,
    pub road_number: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RouteState {
    pub fired_at: Option<Instant>,
    pub components: Vec<RouteComponent>,
    pub road_name: Option<String>,
    pub road_number: Option<String>,
}

impl RouteState {
    /// Route activation is an edge; it reads active until the switch replay
    /// window passes.
    pub fn is_active(&self) -> bool {
        self.fired_at
            .is_some_and(|at| at.elapsed() < std::time::Duration::from_secs(10))
    }
}

#[derive(Debug, Clone, Default)]
pub struct IrdaState {
    pub direction: Direction,
    pub last_engine_id: Option<u32>,
    pub last_train_id: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct BlockState {
    pub occupied: bool,
    pub entered: bool,
    pub slowed: bool,
    pub stopped: bool,
    pub direction: Direction,
    pub prev_block_id: Option<u8>,
    pub next_block_id: Option<u8>,
    pub sensor_track_id: Option<u8>,
    pub switch_id: Option<u8>,
    pub motive: Option<(CommandScope, u32)>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BaseState {
    pub info: Option<String>,
}

/// System readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    Unknown,
    Synchronizing,
    Synchronized,
}

#[derive(Debug, Clone, Default)]
pub struct SyncState {
    pub status: SyncStatus,
}

impl SyncState {
    pub fn is_synchronized(&self) -> bool {
        self.status == SyncStatus::Synchronized
    }
}

/// Scope-specific fields of one component.
#[derive(Debug, Clone)]
pub enum StateKind {
    Engine(EngineState),
    Train(EngineState),
    Switch(SwitchState),
    Acc(AccessoryState),
    Route(RouteState),
    Irda(IrdaState),
    Base(BaseState),
    Sync(SyncState),
    Block(BlockState),
}

/// One component record: identity, bookkeeping, and scoped fields.
#[derive(Debug, Clone)]
pub struct ComponentState {
    scope: CommandScope,
    address: u32,
    last_updated: Option<Instant>,
    version: u64,
    pub kind: StateKind,
}

impl ComponentState {
    /// Build the appropriate state type for a scope, or `None` for scopes
    /// that carry no component records.
    pub fn for_scope(scope: CommandScope, address: u32) -> Option<Self> {
        let kind = match scope {
            CommandScope::Engine => StateKind::Engine(EngineState::default()),
            CommandScope::Train => StateKind::Train(EngineState::default()),
            CommandScope::Switch => StateKind::Switch(SwitchState::default()),
            CommandScope::Acc => StateKind::Acc(AccessoryState::default()),
            CommandScope::Route => StateKind::Route(RouteState::default()),
            CommandScope::Irda => StateKind::Irda(IrdaState::default()),
            CommandScope::Base => StateKind::Base(BaseState::default()),
            CommandScope::Sync => StateKind::Sync(SyncState::default()),
            CommandScope::Block => StateKind::Block(BlockState::default()),
            _ => return None,
        };
        Some(ComponentState { scope, address, last_updated: None, version: 0, kind })
    }

    pub fn scope(&self) -> CommandScope {
        self.scope
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn last_updated(&self) -> Option<Instant> {
        self.last_updated
    }

    /// Monotonic mutation counter; bumps on every update.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_known(&self) -> bool {
        self.last_updated.is_some()
    }

    pub fn engine(&self) -> Option<&EngineState> {
        match &self.kind {
            StateKind::Engine(e) | StateKind::Train(e) => Some(e),
            _ => None,
        }
    }

    pub fn switch(&self) -> Option<&SwitchState> {
        match &self.kind {
            StateKind::Switch(s) => Some(s),
            _ => None,
        }
    }

    pub fn accessory(&self) -> Option<&AccessoryState> {
        match &self.kind {
            StateKind::Acc(a) => Some(a),
            _ => None,
        }
    }

    pub fn route(&self) -> Option<&RouteState> {
        match &self.kind {
            StateKind::Route(r) => Some(r),
            _ => None,
        }
    }

    pub fn irda(&self) -> Option<&IrdaState> {
        match &self.kind {
            StateKind::Irda(i) => Some(i),
            _ => None,
        }
    }

    pub fn block(&self) -> Option<&BlockState> {
        match &self.kind {
            StateKind::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn sync(&self) -> Option<&SyncState> {
        match &self.kind {
            StateKind::Sync(s) => Some(s),
            _ => None,
        }
    }

    fn touch(&mut self) {
        self.last_updated = Some(Instant::now());
        self.version += 1;
    }

    /// Zero motion state on engines and trains; other scopes ignore halts.
    pub fn apply_halt(&mut self) {
        if let StateKind::Engine(e) | StateKind::Train(e) = &mut self.kind {
            e.halt();
            self.touch();
        }
    }

    /// Apply one dispatched message. Messages for another address or an
    /// incompatible scope are rejected.
    pub fn update(&mut self, msg: &Message) -> anyhow::Result<()> {
        if msg.is_halt() {
            self.apply_halt();
            return Ok(());
        }
        let addressable = msg.address() != 0;
        if addressable && msg.address() != self.address && self.scope != CommandScope::Sync {
            bail!(
                "{} #{} received update for #{}, ignoring",
                self.scope,
                self.address,
                msg.address()
            );
        }
        match msg {
            Message::Tmcc(req) => self.update_tmcc(req)?,
            Message::Pdi(req) => self.update_pdi(req)?,
        }
        self.touch();
        Ok(())
    }

    fn update_tmcc(&mut self, req: &CommandReq) -> anyhow::Result<()> {
        match &mut self.kind {
            StateKind::Engine(e) | StateKind::Train(e) => e.apply_command(req),
            StateKind::Switch(s) => match req.command() {
                CommandId::Tmcc1(Tmcc1Command::SwitchThru) => s.position = SwitchPosition::Thru,
                CommandId::Tmcc1(Tmcc1Command::SwitchOut) => s.position = SwitchPosition::Out,
                CommandId::Tmcc1(Tmcc1Command::SwitchSetAddress) => {}
                _ => bail!("{} {} received update for {}, ignoring", self.scope, self.address, req.scope()),
            },
            StateKind::Acc(a) => match req.command() {
                CommandId::Tmcc1(Tmcc1Command::AccAux1OptOne) => {
                    a.aux_on = Some(true);
                    a.aux1 = Some(AuxState::On);
                }
                CommandId::Tmcc1(Tmcc1Command::AccAux2OptOne) => {
                    a.aux_on = Some(false);
                    a.aux2 = Some(AuxState::On);
                }
                CommandId::Tmcc1(Tmcc1Command::AccAux1On) => a.aux1 = Some(AuxState::On),
                CommandId::Tmcc1(Tmcc1Command::AccAux1Off) => a.aux1 = Some(AuxState::Off),
                CommandId::Tmcc1(Tmcc1Command::AccAux2On) => a.aux2 = Some(AuxState::On),
                CommandId::Tmcc1(Tmcc1Command::AccAux2Off) => a.aux2 = Some(AuxState::Off),
                CommandId::Tmcc1(Tmcc1Command::AccNumeric) => a.value = Some(req.data()),
                CommandId::Tmcc1(Tmcc1Command::AccSetAddress) => {}
                CommandId::Tmcc1(Tmcc1Command::AccAux1OptTwo)
                | CommandId::Tmcc1(Tmcc1Command::AccAux2OptTwo)
                | CommandId::Tmcc1(Tmcc1Command::AccBoost)
                | CommandId::Tmcc1(Tmcc1Command::AccBrake)
                | CommandId::Tmcc1(Tmcc1Command::AccFrontCoupler)
                | CommandId::Tmcc1(Tmcc1Command::AccRearCoupler)
                | CommandId::Tmcc1(Tmcc1Command::AccForwardSpeed)
                | CommandId::Tmcc1(Tmcc1Command::AccRelativeSpeed) => {}
                _ => bail!("{} {} received update for {}, ignoring", self.scope, self.address, req.scope()),
            },
            StateKind::Route(r) => match req.command() {
                CommandId::Tmcc1(Tmcc1Command::RouteFire)
                | CommandId::Tmcc2(crate::protocol::tmcc2::Tmcc2Command::RouteFire) => {
                    r.fired_at = Some(Instant::now());
                }
                _ => bail!("{} {} received update for {}, ignoring", self.scope, self.address, req.scope()),
            },
            StateKind::Sync(s) => match req.command() {
                CommandId::Tmcc1(Tmcc1Command::SyncBegin)
                | CommandId::Tmcc1(Tmcc1Command::Synchronizing)
                | CommandId::Tmcc1(Tmcc1Command::Resync) => s.status = SyncStatus::Synchronizing,
                CommandId::Tmcc1(Tmcc1Command::SyncComplete)
                | CommandId::Tmcc1(Tmcc1Command::Synchronized) => {
                    s.status = SyncStatus::Synchronized;
                }
                _ => {}
            },
            _ => {}
        }
        Ok(())
    }

    fn update_pdi(&mut self, req: &PdiReq) -> anyhow::Result<()> {
        match req {
            PdiReq::Base(base) => self.apply_base(base),
            PdiReq::D4(d4) => {
                if let Some(record) = d4.record() {
                    self.apply_engine_record(&record);
                }
            }
            PdiReq::Lcs(lcs) => self.apply_lcs(lcs),
            PdiReq::Block(block) => self.apply_block(block),
            PdiReq::Tmcc(carrier) => self.update_tmcc(&carrier.req)?,
            PdiReq::Ping | PdiReq::All(_) => {}
        }
        Ok(())
    }

    fn apply_base(&mut self, base: &BaseReq) {
        if !base.is_full_record() && base.command != PdiCommand::BaseBase {
            return;
        }
        match &mut self.kind {
            StateKind::Engine(e) | StateKind::Train(e) => {
                let record = EngineRecord::parse(&base.data, base.scope);
                e.apply_record(&record);
            }
            StateKind::Switch(s) => {
                let record = SwitchRecord::parse(&base.data);
                s.road_name = record.road_name;
                s.road_number = record.road_number;
            }
            StateKind::Route(r) => {
                let record = RouteRecord::parse(&base.data);
                r.road_name = record.road_name;
                r.road_number = record.road_number;
                r.components = record.components;
            }
            StateKind::Acc(a) => {
                let record = AccessoryRecord::parse(&base.data);
                a.device_code = record.device_code;
                a.road_name = record.road_name;
                a.road_number = record.road_number;
            }
            StateKind::Base(b) => {
                b.info = crate::pdi::comp_data::decode_text(&base.data);
            }
            _ => {}
        }
    }

    fn apply_engine_record(&mut self, record: &EngineRecord) {
        if let StateKind::Engine(e) | StateKind::Train(e) = &mut self.kind {
            e.apply_record(record);
        }
    }

    fn apply_lcs(&mut self, lcs: &LcsReq) {
        match &mut self.kind {
            StateKind::Irda(i) => {
                if let Some((direction, scope, id)) = lcs.irda_report() {
                    i.direction = direction;
                    match scope {
                        CommandScope::Train => i.last_train_id = Some(id),
                        _ => i.last_engine_id = Some(id),
                    }
                }
            }
            StateKind::Acc(a) => {
                if lcs.device == LcsDevice::Asc2 || lcs.device == LcsDevice::Bpc2 {
                    if let Some(value) = lcs.state_value() {
                        a.aux_on = Some(value != 0);
                        a.aux1 = Some(if value != 0 { AuxState::On } else { AuxState::Off });
                    }
                }
            }
            StateKind::Switch(s) => {
                // ASC2 in switch mode reports thru/out as the control value
                if lcs.device == LcsDevice::Asc2
                    && (lcs.action == action::CONTROL4 || lcs.action == action::CONTROL5)
                {
                    if let Some(value) = lcs.state_value() {
                        s.position =
                            if value == 0 { SwitchPosition::Thru } else { SwitchPosition::Out };
                    }
                }
            }
            _ => {}
        }
    }

    fn apply_block(&mut self, block: &BlockReq) {
        if let StateKind::Block(b) = &mut self.kind {
            b.occupied = block.is_occupied();
            b.entered = block.is_entered();
            b.slowed = block.is_slowed();
            b.stopped = block.is_stopped();
            b.direction = block.direction();
            b.prev_block_id = block.prev_block_id;
            b.next_block_id = block.next_block_id;
            b.sensor_track_id = block.sensor_track_id;
            b.switch_id = block.switch_id;
            b.motive = match (block.motive_scope, block.motive_id) {
                (Some(scope), Some(id)) => Some((scope, u32::from(id))),
                _ => None,
            };
            if block.name.is_some() {
                b.name.clone_from(&block.name);
            }
        }
    }

    /// Rebuild this component's Base 3 record image, used when handing
    /// current state to a freshly registered client.
    pub fn record_image(&self) -> Option<Vec<u8>> {
        match &self.kind {
            StateKind::Engine(e) | StateKind::Train(e) => {
                let four_digit = self.address > 99;
                let id4 = four_digit.then_some(self.address);
                Some(e.to_record(id4).to_record(self.scope, four_digit))
            }
            StateKind::Switch(s) => Some(
                SwitchRecord { road_name: s.road_name.clone(), road_number: s.road_number.clone() }
                    .to_record(),
            ),
            StateKind::Route(r) => Some(
                RouteRecord {
                    road_name: r.road_name.clone(),
                    road_number: r.road_number.clone(),
                    components: r.components.clone(),
                }
                .to_record(),
            ),
            StateKind::Acc(a) => Some(
                AccessoryRecord {
                    device_code: a.device_code,
                    road_name: a.road_name.clone(),
                    road_number: a.road_number.clone(),
                }
                .to_record(),
            ),
            _ => None,
        }
    }

    /// JSON snapshot for external observers.
    pub fn to_json(&self) -> serde_json::Value {
        let fields = match &self.kind {
            StateKind::Engine(e) | StateKind::Train(e) => e.to_json(),
            StateKind::Switch(s) => json!({
                "position": match s.position {
                    SwitchPosition::Unknown => "unknown",
                    SwitchPosition::Thru => "thru",
                    SwitchPosition::Out => "out",
                },
                "road_name": s.road_name,
                "road_number": s.road_number,
            }),
            StateKind::Acc(a) => json!({
                "aux_on": a.aux_on,
                "aux1": a.aux1.map(|s| s == AuxState::On),
                "aux2": a.aux2.map(|s| s == AuxState::On),
                "value": a.value,
                "device_code": a.device_code,
                "road_name": a.road_name,
            }),
            StateKind::Route(r) => json!({
                "active": r.is_active(),
                "switches": r.components.iter().map(|c| json!({
                    "tmcc_id": c.tmcc_id,
                    "thru": c.is_thru(),
                })).collect::<Vec<_>>(),
                "road_name": r.road_name,
            }),
            StateKind::Irda(i) => json!({
                "direction": format!("{:?}", i.direction),
                "last_engine_id": i.last_engine_id,
                "last_train_id": i.last_train_id,
            }),
            StateKind::Base(b) => json!({ "info": b.info }),
            StateKind::Sync(s) => json!({
                "state": match s.status {
                    SyncStatus::Unknown => None,
                    SyncStatus::Synchronizing => Some("synchronizing"),
                    SyncStatus::Synchronized => Some("synchronized"),
                },
            }),
            StateKind::Block(b) => json!({
                "occupied": b.occupied,
                "entered": b.entered,
                "slowed": b.slowed,
                "stopped": b.stopped,
                "prev": b.prev_block_id,
                "next": b.next_block_id,
                "name": b.name,
            }),
        };
        json!({
            "scope": self.scope.to_string(),
            "address": self.address,
            "version": self.version,
            "fields": fields,
        })
    }
}

#[cfg(test)]
#[path = "component_tests.rs"]
mod tests;
