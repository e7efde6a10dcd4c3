//! Per-link queue.
//!
//! # Accounting
//!
//! | Quantity        | Charged                      | Released            |
//! |-----------------|------------------------------|---------------------|
//! | regular storage | on admission (non-seeping)   | on departure        |
//! | seepage pool    | on admission (seeping)       | on departure        |
//! | flow accumulator| on departure (not stuck)     | refilled per tick   |
//!
//! The accumulator gains `capacity × Δt / 3600` each interval and is capped
//! at `max(budget, largest PCU)`, so a link whose per-interval budget is
//! smaller than a truck still lets a truck through every few intervals.
//!
//! # Order
//!
//! A FIFO link keeps admission order.  A passing link keeps
//! `(exit_tick, seq)` order, so a faster vehicle admitted later sits ahead of
//! a slower one it will overtake.

use std::collections::VecDeque;

use qs_core::{AgentId, LinkId, ModeTable, Tick};
use qs_network::Link;

use crate::{PCU_EPS, QueueError, QueueResult, TrafficDynamics, Vehicle};

// ── Room ──────────────────────────────────────────────────────────────────────

/// Free space on a link, in PCU.  Node decisions work on a copy taken
/// before the interval's commits.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Room {
    pub regular: f64,
    pub seepage: f64,
}

impl Room {
    /// Reserve `pcu`; returns whether the vehicle goes into the seepage pool,
    /// or `None` if it fits nowhere.
    pub fn try_take(&mut self, pcu: f64, may_seep: bool) -> Option<bool> {
        if pcu <= self.regular + PCU_EPS {
            self.regular -= pcu;
            Some(false)
        } else if may_seep && pcu <= self.seepage + PCU_EPS {
            self.seepage -= pcu;
            Some(true)
        } else {
            None
        }
    }
}

// ── LinkQueue ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct LinkQueue {
    link:           LinkId,
    length_m:       f64,
    free_speed_mps: f64,
    tick_secs:      u32,

    storage:       f64,
    seep_storage:  f64,
    occupied:      f64,
    seep_occupied: f64,

    flow_budget:  f64,
    flow_ceiling: f64,
    accumulator:  f64,
    discharged:   f64,

    /// First vehicle turned away by a full downstream link and the tick it
    /// was first turned away.  Cleared when that vehicle leaves.
    head_blocked: Option<(AgentId, Tick)>,

    passing:  bool,
    next_seq: u64,
    vehicles: VecDeque<Vehicle>,
}

impl LinkQueue {
    pub fn new(link: &Link, dynamics: &TrafficDynamics, modes: &ModeTable, tick_secs: u32) -> Self {
        let max_pcu = modes.max_pcu();
        let storage = link.storage_pcu(dynamics.effective_cell_size_m).max(max_pcu);
        let seep_storage = dynamics
            .seepage
            .as_ref()
            .map_or(0.0, |s| storage * s.capacity_fraction);

        let mut q = Self {
            link: link.id,
            length_m: link.length_m,
            free_speed_mps: link.free_speed_mps,
            tick_secs,
            storage,
            seep_storage,
            occupied: 0.0,
            seep_occupied: 0.0,
            flow_budget: 0.0,
            flow_ceiling: 0.0,
            accumulator: 0.0,
            discharged: 0.0,
            head_blocked: None,
            passing: dynamics.passing && link.allows_passing,
            next_seq: 0,
            vehicles: VecDeque::new(),
        };
        q.set_flow(link.flow_capacity_per_hour, max_pcu);
        q.accumulator = q.flow_ceiling;
        q
    }

    fn set_flow(&mut self, capacity_per_hour: f64, max_pcu: f64) {
        self.flow_budget = capacity_per_hour * self.tick_secs as f64 / 3_600.0;
        self.flow_ceiling = self.flow_budget.max(max_pcu);
        self.accumulator = self.accumulator.min(self.flow_ceiling);
    }

    /// Pick up a changed free speed or flow capacity.  Vehicles already on
    /// the link keep their exit ticks.
    pub fn refresh(&mut self, link: &Link, modes: &ModeTable) {
        self.free_speed_mps = link.free_speed_mps;
        self.set_flow(link.flow_capacity_per_hour, modes.max_pcu());
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn link(&self) -> LinkId { self.link }
    pub fn len(&self) -> usize { self.vehicles.len() }
    pub fn is_empty(&self) -> bool { self.vehicles.is_empty() }
    pub fn is_passing(&self) -> bool { self.passing }

    /// PCU in regular storage.
    pub fn occupied(&self) -> f64 { self.occupied }
    pub fn storage_capacity(&self) -> f64 { self.storage }
    pub fn seep_occupied(&self) -> f64 { self.seep_occupied }
    pub fn seepage_capacity(&self) -> f64 { self.seep_storage }

    /// Per-interval flow budget in PCU.
    pub fn flow_budget(&self) -> f64 { self.flow_budget }
    pub fn accumulator(&self) -> f64 { self.accumulator }

    /// PCU discharged since the last [`refill`](Self::refill).
    pub fn discharged(&self) -> f64 { self.discharged }

    pub fn room(&self) -> Room {
        Room {
            regular: self.storage - self.occupied,
            seepage: self.seep_storage - self.seep_occupied,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.iter()
    }

    pub fn head(&self) -> Option<&Vehicle> {
        self.vehicles.front()
    }

    /// Free-flow ticks for a vehicle capped at `max_speed_mps`: at least one.
    pub fn travel_ticks(&self, max_speed_mps: f64) -> u64 {
        let secs = self.length_m / self.free_speed_mps.min(max_speed_mps);
        // km/h → m/s conversions leave noise just above whole ticks.
        ((secs / self.tick_secs as f64 - 1e-9).ceil() as u64).max(1)
    }

    /// Tick at which `agent` was first turned away while at the front of
    /// the blocked part of the queue; `None` if it has not been.
    pub fn blocked_since(&self, agent: AgentId) -> Option<Tick> {
        self.head_blocked.filter(|&(a, _)| a == agent).map(|(_, t)| t)
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Record that `agent` was turned away at `now`.  Keeps the earlier tick
    /// while the same vehicle stays blocked; other vehicles leaving the link
    /// do not reset it.
    pub fn mark_blocked(&mut self, agent: AgentId, now: Tick) {
        match self.head_blocked {
            Some((a, _)) if a == agent => {}
            _ => self.head_blocked = Some((agent, now)),
        }
    }

    /// Start a new interval: refill the flow accumulator.
    pub fn refill(&mut self) {
        self.accumulator = (self.accumulator + self.flow_budget).min(self.flow_ceiling);
        self.discharged = 0.0;
    }

    /// Admit `vehicle` at tick `at` and return its earliest exit tick.
    ///
    /// # Errors
    ///
    /// [`QueueError::CapacityExceeded`] when neither regular storage nor (for
    /// a seep mode) the seepage pool has room.  The vehicle is dropped; the
    /// caller recreates it on retry.
    pub fn admit(&mut self, mut vehicle: Vehicle, at: Tick, may_seep: bool) -> QueueResult<Tick> {
        let mut room = self.room();
        let seeping = room.try_take(vehicle.pcu, may_seep).ok_or(QueueError::CapacityExceeded {
            link:      self.link,
            required:  vehicle.pcu,
            available: room.regular,
        })?;

        if seeping {
            self.seep_occupied += vehicle.pcu;
        } else {
            self.occupied += vehicle.pcu;
        }

        let exit = at + self.travel_ticks(vehicle.max_speed_mps);
        vehicle.entered = at;
        vehicle.exit_tick = exit;
        vehicle.seeping = seeping;
        vehicle.seq = self.next_seq;
        self.next_seq += 1;

        if self.passing {
            let key = vehicle.order_key();
            let pos = self.vehicles.partition_point(|v| v.order_key() <= key);
            self.vehicles.insert(pos, vehicle);
        } else {
            self.vehicles.push_back(vehicle);
        }
        Ok(exit)
    }

    /// Remove `agent`'s vehicle.  A normal departure draws on the flow
    /// accumulator; a stuck removal does not.
    pub fn take(&mut self, agent: AgentId, consume_flow: bool) -> QueueResult<Vehicle> {
        let pos = self
            .vehicles
            .iter()
            .position(|v| v.agent == agent)
            .ok_or(QueueError::VehicleMissing { link: self.link, agent })?;
        let vehicle = self
            .vehicles
            .remove(pos)
            .ok_or(QueueError::VehicleMissing { link: self.link, agent })?;

        if vehicle.seeping {
            self.seep_occupied = (self.seep_occupied - vehicle.pcu).max(0.0);
        } else {
            self.occupied = (self.occupied - vehicle.pcu).max(0.0);
        }
        if consume_flow {
            self.accumulator -= vehicle.pcu;
            self.discharged += vehicle.pcu;
        }
        if self.blocked_since(agent).is_some() {
            self.head_blocked = None;
        }
        Ok(vehicle)
    }

    /// Agents that could leave at `at` if downstream room were unlimited,
    /// in leaving order, limited by the flow accumulator.
    pub fn poll_ready(&self, at: Tick) -> Vec<AgentId> {
        let mut acc = self.accumulator;
        self.vehicles
            .iter()
            .take_while(|v| v.exit_tick <= at)
            .take_while(|v| {
                let fits = acc + PCU_EPS >= v.pcu;
                if fits {
                    acc -= v.pcu;
                }
                fits
            })
            .map(|v| v.agent)
            .collect()
    }
}
