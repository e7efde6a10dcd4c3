//! The flow dynamics tracker.
//!
//! # Bin protocol
//!
//! ```text
//! handle(event)            every event, in emission order
//! close_interval(tick)     once per interval; closes a bin every
//!                          `bin_ticks` intervals and returns it
//! ```
//!
//! When a bin closes, each tracked mode (and the all-modes aggregate) gets
//! a new [`FlowSample`].  Each of density, flow and speed is compared with
//! the previous bin; consecutive stable bins are counted per quantity.
//! Bins count only once the trailing window is full and the mode has a
//! vehicle on the network, so an empty network is never "stable".
//!
//! Global permanence latches the first time every tracked mode has all
//! three streaks at `min_stable_bins`.  The samples of that bin are frozen
//! and returned by the `permanent_*` accessors from then on.

use std::collections::VecDeque;

use tracing::{debug, info};

use qs_core::{AgentId, CoreError, CoreResult, ModeId, ModeTable, Tick};
use qs_events::{Event, EventKind, EventSubscriber};
use qs_network::Network;

use crate::{FlowBin, FlowSample, Map, TrackerConfig};

// ── Per-track state ───────────────────────────────────────────────────────────

/// Totals collected during one bin.
#[derive(Copy, Clone, Debug, Default)]
struct BinTotals {
    /// PCU entering the reference link.
    entered_pcu: f64,
    /// Length of completed link traversals, metres.
    distance_m:  f64,
    /// Duration of completed link traversals, seconds.
    time_s:      f64,
}

#[derive(Copy, Clone, Debug, Default)]
struct Streaks {
    density: u32,
    flow:    u32,
    speed:   u32,
}

/// Statistics of one mode, or of all modes together.
#[derive(Clone, Debug, Default)]
struct Track {
    on_network:     u32,
    on_network_pcu: f64,
    current:        BinTotals,
    window:         VecDeque<BinTotals>,
    sample:         FlowSample,
    streaks:        Streaks,
    flow_stable:    bool,
    speed_stable:   bool,
    frozen:         Option<FlowSample>,
}

impl Track {
    fn enter(&mut self, pcu: f64) {
        self.on_network += 1;
        self.on_network_pcu += pcu;
    }

    fn leave(&mut self, pcu: f64) {
        self.on_network = self.on_network.saturating_sub(1);
        self.on_network_pcu = (self.on_network_pcu - pcu).max(0.0);
    }

    /// Push the current totals into the window and recompute the sample.
    fn close_bin(&mut self, cfg: &TrackerConfig, bin_secs: f64, measured_km: f64) {
        self.window.push_back(std::mem::take(&mut self.current));
        if self.window.len() > cfg.window_bins {
            self.window.pop_front();
        }

        let entered: f64 = self.window.iter().map(|b| b.entered_pcu).sum();
        let distance: f64 = self.window.iter().map(|b| b.distance_m).sum();
        let time: f64 = self.window.iter().map(|b| b.time_s).sum();

        let prev = self.sample;
        let next = FlowSample {
            number_of_agents: self.on_network,
            density:          self.on_network_pcu / measured_km,
            flow:             entered / (self.window.len() as f64 * bin_secs) * 3_600.0,
            mean_speed:       if time > 0.0 { distance / time } else { prev.mean_speed },
        };
        self.sample = next;

        if self.window.len() < cfg.window_bins || self.on_network == 0 {
            self.streaks = Streaks::default();
            return;
        }
        let tol = cfg.tolerance;
        bump(&mut self.streaks.density, within(prev.density, next.density, tol));
        bump(&mut self.streaks.flow, within(prev.flow, next.flow, tol));
        bump(&mut self.streaks.speed, within(prev.mean_speed, next.mean_speed, tol));
    }

    fn is_permanent(&self, min: u32) -> bool {
        self.streaks.density >= min && self.streaks.flow >= min && self.streaks.speed >= min
    }
}

fn bump(streak: &mut u32, stable: bool) {
    *streak = if stable { *streak + 1 } else { 0 };
}

/// Relative change within `tol`; absolute when `prev` is zero.
fn within(prev: f64, next: f64, tol: f64) -> bool {
    let delta = (next - prev).abs();
    if prev == 0.0 { delta <= tol } else { delta <= tol * prev.abs() }
}

// ── FlowDynamicsTracker ───────────────────────────────────────────────────────

/// Per-mode and global density, flow and speed with permanence detection.
///
/// Owned by one run; nothing survives between runs.
#[derive(Clone, Debug)]
pub struct FlowDynamicsTracker {
    config:      TrackerConfig,
    tick_secs:   f64,
    bin_secs:    f64,
    measured_km: f64,

    mode_names:   Vec<String>,
    pcu:          Vec<f64>,
    agent_modes:  Vec<ModeId>,
    link_lengths: Vec<f64>,

    /// Tick at which each on-network vehicle entered its current link.
    on_link: Map<AgentId, Tick>,

    tracked: Vec<ModeId>,
    /// `ModeId` index → position in `tracks`.
    slot:    Vec<Option<usize>>,
    tracks:  Vec<Track>,
    global:  Track,

    bins:      u64,
    permanent: bool,
}

impl FlowDynamicsTracker {
    /// `agent_modes[i]` is the mode of `AgentId(i)`.  Every mode with at
    /// least one agent is tracked.
    ///
    /// # Errors
    ///
    /// [`CoreError::InconsistentConfiguration`] if `config` is invalid for
    /// `network` or `tick_secs` is zero; [`CoreError::UnknownMode`] for an
    /// agent mode missing from `modes`.
    pub fn new(
        network:     &Network,
        modes:       &ModeTable,
        agent_modes: Vec<ModeId>,
        config:      TrackerConfig,
        tick_secs:   u32,
    ) -> CoreResult<Self> {
        config.validate(network)?;
        if tick_secs == 0 {
            return Err(CoreError::InconsistentConfiguration("tick duration must be > 0".into()));
        }
        if let Some(m) = agent_modes.iter().find(|m| !modes.contains(**m)) {
            return Err(CoreError::UnknownMode(m.to_string()));
        }

        let mut slot = vec![None; modes.len()];
        let mut tracked = Vec::new();
        for &m in &agent_modes {
            if slot[m.index()].is_none() {
                slot[m.index()] = Some(0);
                tracked.push(m);
            }
        }
        tracked.sort();
        for (i, m) in tracked.iter().enumerate() {
            slot[m.index()] = Some(i);
        }

        let measured_m = config.measured_length_m.unwrap_or_else(|| network.total_length_m());
        debug!(modes = tracked.len(), agents = agent_modes.len(), measured_m, "flow tracker ready");

        Ok(Self {
            tick_secs: tick_secs as f64,
            bin_secs: (config.bin_ticks * tick_secs as u64) as f64,
            measured_km: measured_m / 1_000.0,
            config,
            mode_names: modes.iter().map(|(_, t)| t.name.clone()).collect(),
            pcu: modes.iter().map(|(_, t)| t.pcu).collect(),
            agent_modes,
            link_lengths: network.links.iter().map(|l| l.length_m).collect(),
            on_link: Map::default(),
            tracks: vec![Track::default(); tracked.len()],
            tracked,
            slot,
            global: Track::default(),
            bins: 0,
            permanent: false,
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Modes with at least one agent, ascending.
    pub fn tracked_modes(&self) -> &[ModeId] {
        &self.tracked
    }

    pub fn measured_length_km(&self) -> f64 {
        self.measured_km
    }

    /// Bins closed so far.
    pub fn bins(&self) -> u64 {
        self.bins
    }

    fn track(&self, mode: ModeId) -> Option<&Track> {
        let i = (*self.slot.get(mode.index())?)?;
        self.tracks.get(i)
    }

    /// Latest sample of `mode`; `None` if the mode is not tracked.
    pub fn sample(&self, mode: ModeId) -> Option<FlowSample> {
        self.track(mode).map(|t| t.sample)
    }

    pub fn global_sample(&self) -> FlowSample {
        self.global.sample
    }

    /// `mode`'s sample frozen when global permanence was reached.
    pub fn permanent_sample(&self, mode: ModeId) -> Option<FlowSample> {
        self.track(mode).and_then(|t| t.frozen)
    }

    pub fn permanent_global_sample(&self) -> Option<FlowSample> {
        self.global.frozen
    }

    /// Latched once `mode`'s flow has been stable for `min_stable_bins`.
    pub fn is_flow_stable(&self, mode: ModeId) -> bool {
        self.track(mode).is_some_and(|t| t.flow_stable)
    }

    /// Latched once `mode`'s speed has been stable for `min_stable_bins`.
    pub fn is_speed_stable(&self, mode: ModeId) -> bool {
        self.track(mode).is_some_and(|t| t.speed_stable)
    }

    /// Whether `mode` is permanent as of the last closed bin.
    pub fn is_permanent(&self, mode: ModeId) -> bool {
        self.track(mode).is_some_and(|t| t.is_permanent(self.config.min_stable_bins))
    }

    /// Latched the first time every tracked mode was permanent at once.
    pub fn is_globally_permanent(&self) -> bool {
        self.permanent
    }

    // ── Event intake ──────────────────────────────────────────────────────

    pub fn record(&mut self, event: &Event) {
        let Some(&mode) = self.agent_modes.get(event.agent.index()) else {
            return;
        };
        let pcu = self.pcu[mode.index()];
        let slot = self.slot[mode.index()];

        match event.kind {
            EventKind::LinkEntered => {
                self.on_link.insert(event.agent, event.time);
                let reference = event.link == self.config.reference_link;
                for t in self.tracks_for(slot) {
                    t.enter(pcu);
                    if reference {
                        t.current.entered_pcu += pcu;
                    }
                }
            }
            EventKind::LinkLeft => {
                let Some(entered) = self.on_link.remove(&event.agent) else {
                    return;
                };
                let length = self.link_lengths.get(event.link.index()).copied().unwrap_or(0.0);
                let secs = event.time.since(entered) as f64 * self.tick_secs;
                for t in self.tracks_for(slot) {
                    t.leave(pcu);
                    if secs > 0.0 {
                        t.current.distance_m += length;
                        t.current.time_s += secs;
                    }
                }
            }
            EventKind::Stuck => {
                if self.on_link.remove(&event.agent).is_some() {
                    for t in self.tracks_for(slot) {
                        t.leave(pcu);
                    }
                }
            }
            EventKind::Departed | EventKind::Arrived => {}
        }
    }

    /// The mode's track (if tracked) followed by the global one.
    fn tracks_for(&mut self, slot: Option<usize>) -> impl Iterator<Item = &mut Track> {
        let mode = match slot {
            Some(i) => self.tracks.get_mut(i),
            None => None,
        };
        mode.into_iter().chain(std::iter::once(&mut self.global))
    }

    // ── Binning ───────────────────────────────────────────────────────────

    /// Called after the last event of interval `tick`.  Returns the bin
    /// when `tick` closes one.
    pub fn close_interval(&mut self, tick: Tick) -> Option<FlowBin> {
        if (tick.0 + 1) % self.config.bin_ticks != 0 {
            return None;
        }
        self.bins += 1;
        let min = self.config.min_stable_bins;

        for (i, t) in self.tracks.iter_mut().enumerate() {
            t.close_bin(&self.config, self.bin_secs, self.measured_km);
            let name = &self.mode_names[self.tracked[i].index()];
            if !t.flow_stable && t.streaks.flow >= min {
                t.flow_stable = true;
                info!(mode = %name, tick = tick.0, flow = t.sample.flow, "flow stable");
            }
            if !t.speed_stable && t.streaks.speed >= min {
                t.speed_stable = true;
                info!(mode = %name, tick = tick.0, speed = t.sample.mean_speed, "speed stable");
            }
        }
        self.global.close_bin(&self.config, self.bin_secs, self.measured_km);

        if !self.permanent && !self.tracks.is_empty() && self.tracks.iter().all(|t| t.is_permanent(min)) {
            self.permanent = true;
            for t in &mut self.tracks {
                t.frozen = Some(t.sample);
            }
            self.global.frozen = Some(self.global.sample);
            info!(
                tick    = tick.0,
                density = self.global.sample.density,
                flow    = self.global.sample.flow,
                speed   = self.global.sample.mean_speed,
                "global flow permanence reached"
            );
        }

        Some(FlowBin {
            tick,
            global: self.global.sample,
            modes: self.tracked.iter().zip(&self.tracks).map(|(&m, t)| (m, t.sample)).collect(),
            globally_permanent: self.permanent,
        })
    }
}

impl EventSubscriber for FlowDynamicsTracker {
    fn handle(&mut self, event: &Event) {
        self.record(event);
    }

    fn on_interval_end(&mut self, tick: Tick) {
        self.close_interval(tick);
    }
}
