//! `DepartureQueue`: agents keyed by the tick they leave their activity.
//!
//! Same shape as a wake queue: a `BTreeMap<Tick, Vec<AgentId>>` so each
//! interval drains only the agents due now, in insertion order.

use std::collections::BTreeMap;

use qs_core::{AgentId, SimClock, Tick};

use crate::Population;

#[derive(Default, Debug)]
pub struct DepartureQueue {
    inner: BTreeMap<Tick, Vec<AgentId>>,
    total: usize,
}

impl DepartureQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule every agent at the first tick at or after its departure
    /// second.  Agents within a tick keep ascending `AgentId` order.
    pub fn from_population(population: &Population, clock: &SimClock) -> Self {
        let mut queue = Self::new();
        for a in population.iter() {
            queue.push(clock.tick_at_or_after(a.departure_secs), a.id);
        }
        queue
    }

    pub fn push(&mut self, tick: Tick, agent: AgentId) {
        self.inner.entry(tick).or_default().push(agent);
        self.total += 1;
    }

    /// Put `agents` at the front of `tick`'s list, ahead of agents already
    /// scheduled there.  Used for retries after a rejected insertion so
    /// earlier departures keep their priority.
    pub fn requeue_front(&mut self, tick: Tick, mut agents: Vec<AgentId>) {
        if agents.is_empty() {
            return;
        }
        self.total += agents.len();
        let slot = self.inner.entry(tick).or_default();
        agents.append(slot);
        *slot = agents;
    }

    /// Remove and return every agent scheduled at or before `tick`.
    pub fn drain_until(&mut self, tick: Tick) -> Vec<AgentId> {
        let later = self.inner.split_off(&(tick + 1));
        let due = std::mem::replace(&mut self.inner, later);
        let agents: Vec<AgentId> = due.into_values().flatten().collect();
        self.total -= agents.len();
        agents
    }

    pub fn next_tick(&self) -> Option<Tick> {
        self.inner.keys().next().copied()
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
