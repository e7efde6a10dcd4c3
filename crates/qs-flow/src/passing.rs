//! Overtake counting.

use std::collections::VecDeque;

use qs_core::{AgentId, LinkId, ModeId};
use qs_events::{Event, EventKind, EventSubscriber};
use qs_network::Network;

/// Counts overtakes: a vehicle leaving a link ahead of a vehicle of another
/// mode that entered the link earlier.  Same-mode reordering is not counted.
#[derive(Clone, Debug)]
pub struct PassingCounter {
    agent_modes:     Vec<ModeId>,
    mode_count:      usize,
    link_lengths_km: Vec<f64>,
    measured_km:     f64,

    /// Vehicles on each link in entry order.
    on_link: Vec<VecDeque<(AgentId, ModeId)>>,

    per_link:   Vec<u64>,
    /// `overtaker * mode_count + overtaken`.
    pairs:      Vec<u64>,
    total:      u64,
    traversals: u64,
    /// Σ over completed traversals of overtakes per km of that link.
    rate_sum:   f64,
}

impl PassingCounter {
    /// `measured_length_m` defaults to the total network length.
    pub fn new(network: &Network, mode_count: usize, agent_modes: Vec<ModeId>, measured_length_m: Option<f64>) -> Self {
        let links = network.link_count();
        Self {
            agent_modes,
            mode_count,
            link_lengths_km: network.links.iter().map(|l| l.length_m / 1_000.0).collect(),
            measured_km: measured_length_m.unwrap_or_else(|| network.total_length_m()) / 1_000.0,
            on_link: vec![VecDeque::new(); links],
            per_link: vec![0; links],
            pairs: vec![0; mode_count * mode_count],
            total: 0,
            traversals: 0,
            rate_sum: 0.0,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn on_link(&self, link: LinkId) -> u64 {
        self.per_link.get(link.index()).copied().unwrap_or(0)
    }

    /// Times a vehicle of `overtaker` passed one of `overtaken`.
    pub fn pair(&self, overtaker: ModeId, overtaken: ModeId) -> u64 {
        if overtaker.index() >= self.mode_count || overtaken.index() >= self.mode_count {
            return 0;
        }
        self.pairs[overtaker.index() * self.mode_count + overtaken.index()]
    }

    /// Completed link traversals seen so far.
    pub fn traversals(&self) -> u64 {
        self.traversals
    }

    pub fn overtakes_per_km(&self) -> f64 {
        self.total as f64 / self.measured_km
    }

    pub fn pair_per_km(&self, overtaker: ModeId, overtaken: ModeId) -> f64 {
        self.pair(overtaker, overtaken) as f64 / self.measured_km
    }

    /// Mean overtakes per km over all completed traversals.
    pub fn avg_overtake_rate(&self) -> f64 {
        if self.traversals == 0 { 0.0 } else { self.rate_sum / self.traversals as f64 }
    }

    pub fn record(&mut self, event: &Event) {
        let Some(&mode) = self.agent_modes.get(event.agent.index()) else {
            return;
        };
        let Some(queue) = self.on_link.get_mut(event.link.index()) else {
            return;
        };

        match event.kind {
            EventKind::LinkEntered => queue.push_back((event.agent, mode)),
            EventKind::LinkLeft => {
                let Some(pos) = queue.iter().position(|&(a, _)| a == event.agent) else {
                    return;
                };
                let mut passed = 0;
                for &(_, other) in queue.range(..pos) {
                    if other != mode {
                        self.pairs[mode.index() * self.mode_count + other.index()] += 1;
                        passed += 1;
                    }
                }
                queue.remove(pos);

                self.per_link[event.link.index()] += passed;
                self.total += passed;
                self.traversals += 1;
                self.rate_sum += passed as f64 / self.link_lengths_km[event.link.index()];
            }
            EventKind::Stuck => {
                queue.retain(|&(a, _)| a != event.agent);
            }
            EventKind::Departed | EventKind::Arrived => {}
        }
    }
}

impl EventSubscriber for PassingCounter {
    fn handle(&mut self, event: &Event) {
        self.record(event);
    }
}
