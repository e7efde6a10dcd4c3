//! Point runs and the sweep over them.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use qs_agent::{Driver, PopulationBuilder};
use qs_core::{CoreError, ModeId, ModeTable};
use qs_flow::{FlowSample, PassingCounter};
use qs_output::{FdRow, FdTableWriter};
use qs_sim::{NetworkEmpty, NoopObserver, RunSummary, SimBuilder};

use crate::points::{distribution_points, modal_split_points, modal_split_steps};
use crate::{Assessment, FdConfig, FdResult, PointSource, TriangleTrack, assess};

/// Slack above the jam density, PCU per km, before a point is rejected.
const DENSITY_SLACK_PER_KM: f64 = 10.0;

// ── FdPoint ───────────────────────────────────────────────────────────────────

/// Result of one point run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FdPoint {
    /// Agents per mode.
    pub agents:                Vec<u32>,
    pub summary:               RunSummary,
    pub assessment:            Assessment,
    /// Permanent all-modes sample, if permanence was reached.
    pub global:                Option<FlowSample>,
    /// Permanent sample per mode, in mode-table order.
    pub modes:                 Vec<Option<FlowSample>>,
    pub overtakes_per_km:      f64,
    /// Overtakes of the second mode by the first.
    pub pair_overtakes_per_km: Option<f64>,
    pub avg_overtake_rate:     f64,
}

impl FdPoint {
    pub fn is_valid(&self) -> bool {
        self.assessment.is_valid() && self.global.is_some() && self.modes.iter().all(Option::is_some)
    }

    /// Table row of a valid point; `None` otherwise.
    pub fn to_row(&self) -> Option<FdRow> {
        if !self.is_valid() {
            return None;
        }
        let global = self.global?;
        let modes: Vec<FlowSample> = self.modes.iter().copied().collect::<Option<_>>()?;
        Some(FdRow {
            agents:                self.agents.iter().sum(),
            mode_agents:           self.agents.clone(),
            density:               global.density,
            mode_density:          modes.iter().map(|s| s.density).collect(),
            flow:                  global.flow,
            mode_flow:             modes.iter().map(|s| s.flow).collect(),
            speed_kmh:             global.mean_speed_kmh(),
            mode_speed_kmh:        modes.iter().map(FlowSample::mean_speed_kmh).collect(),
            overtakes_per_km:      self.overtakes_per_km,
            pair_overtakes_per_km: self.pair_overtakes_per_km,
            avg_overtake_rate:     self.avg_overtake_rate,
        })
    }
}

// ── FdSweep ───────────────────────────────────────────────────────────────────

/// Runs one simulation per point on a [`TriangleTrack`] and keeps the
/// per-mode counts of unstable points.
///
/// ```rust,ignore
/// let mut sweep = FdSweep::new(FdConfig::default())?;
/// let mut table = sweep.create_table(Path::new("data.txt"))?;
/// let points = sweep.run(Some(&mut table))?;
/// ```
pub struct FdSweep {
    config:         FdConfig,
    modes:          ModeTable,
    track:          TriangleTrack,
    flow_unstable:  Vec<u32>,
    speed_unstable: Vec<u32>,
}

impl FdSweep {
    /// # Errors
    ///
    /// `FdError::Core` for an invalid config, an unknown mode name or bad
    /// traffic dynamics; `FdError::Network` if the track cannot be built.
    pub fn new(config: FdConfig) -> FdResult<Self> {
        config.validate()?;
        let modes = config.mode_table()?;
        config.dynamics.validate(&modes)?;
        let track = TriangleTrack::build(config.track.clone())?;
        Ok(Self {
            flow_unstable: vec![0; modes.len()],
            speed_unstable: vec![0; modes.len()],
            config,
            modes,
            track,
        })
    }

    pub fn config(&self) -> &FdConfig {
        &self.config
    }

    pub fn modes(&self) -> &ModeTable {
        &self.modes
    }

    pub fn track(&self) -> &TriangleTrack {
        &self.track
    }

    /// PCU the ring holds at jam.
    pub fn network_pcu_capacity(&self) -> f64 {
        self.config.track.network_pcu_capacity(self.config.dynamics.effective_cell_size_m)
    }

    /// Points counted unstable in flow, per mode.
    pub fn flow_unstable_counts(&self) -> &[u32] {
        &self.flow_unstable
    }

    pub fn speed_unstable_counts(&self) -> &[u32] {
        &self.speed_unstable
    }

    /// The (overtaker, overtaken) pair with its own table column: the first
    /// two modes.
    fn pair(&self) -> Option<(ModeId, ModeId)> {
        (self.modes.len() >= 2).then_some((ModeId(0), ModeId(1)))
    }

    /// Table with one column group per configured mode.
    pub fn create_table(&self, path: &Path) -> FdResult<FdTableWriter> {
        let names: Vec<&str> = self.config.modes.iter().map(String::as_str).collect();
        let pair = self.pair().map(|(a, b)| (names[a.index()], names[b.index()]));
        Ok(FdTableWriter::create(path, &names, pair)?)
    }

    /// Agent counts of every point, in run order.
    pub fn points(&self) -> Vec<Vec<u32>> {
        let pcu: Vec<f64> = self.modes.iter().map(|(_, t)| t.pcu).collect();
        let capacity = self.network_pcu_capacity();
        match self.config.points {
            PointSource::ModalSplit => {
                let steps = modal_split_steps(&pcu, &self.config.modal_split_pcu, self.config.reduce_factor);
                modal_split_points(&steps, &pcu, capacity)
            }
            PointSource::Distribution => distribution_points(&pcu, capacity, self.config.reduce_factor),
        }
    }

    /// Run every point, appending valid ones to `table`.
    ///
    /// # Errors
    ///
    /// The first failing point run or table write aborts the sweep.
    pub fn run(&mut self, mut table: Option<&mut FdTableWriter>) -> FdResult<Vec<FdPoint>> {
        let points = self.points();
        info!(points = points.len(), modes = ?self.config.modes, "fd sweep started");

        let mut results = Vec::with_capacity(points.len());
        for agents in &points {
            let point = self.run_point(agents)?;
            if let (Some(t), Some(row)) = (table.as_deref_mut(), point.to_row()) {
                t.write_row(&row)?;
            }
            results.push(point);
        }
        if let Some(t) = table {
            t.finish()?;
        }

        let valid = results.iter().filter(|p| p.is_valid()).count();
        info!(
            points = results.len(),
            valid,
            flow_unstable  = ?self.flow_unstable,
            speed_unstable = ?self.speed_unstable,
            "fd sweep finished"
        );
        Ok(results)
    }

    /// Simulate `agents[m]` round-and-round drivers of each mode until the
    /// track is empty again or the end time is reached, then assess the run.
    ///
    /// # Errors
    ///
    /// [`CoreError::InconsistentConfiguration`] if `agents` does not have
    /// one count per mode; anything the run itself fails with.
    pub fn run_point(&mut self, agents: &[u32]) -> FdResult<FdPoint> {
        if agents.len() != self.modes.len() {
            return Err(CoreError::InconsistentConfiguration(format!(
                "point has {} agent counts for {} modes",
                agents.len(),
                self.modes.len()
            ))
            .into());
        }
        let total: u32 = agents.iter().sum();
        info!(?agents, total, "fd point started");

        let sim_config = self.config.sim.clone();
        let driver = Driver::RoundAndRound(Arc::clone(&self.track.ring));
        let mut pop = PopulationBuilder::with_capacity(sim_config.seed, total as usize);
        for (m, &n) in agents.iter().enumerate() {
            for _ in 0..n {
                pop.add_jittered(ModeId(m as u16), sim_config.start_secs, self.config.departure_window_secs, driver.clone());
            }
        }
        let population = pop.build(&self.modes)?;

        let measured_m = self.config.track.ring_length_m();
        let passing = Arc::new(Mutex::new(PassingCounter::new(
            &self.track.network,
            self.modes.len(),
            population.modes(),
            Some(measured_m),
        )));
        let mut tracker = self.config.tracker.clone();
        tracker.reference_link = self.track.reference_link();
        tracker.measured_length_m.get_or_insert(measured_m);

        let mut sim = SimBuilder::new(sim_config, self.track.network.clone(), self.modes.clone(), population)
            .dynamics(self.config.dynamics.clone())
            .tracker(tracker)
            .subscribe(Arc::clone(&passing))
            .termination(NetworkEmpty)
            .build()?;
        let summary = sim.run(&mut NoopObserver)?;

        let flow = sim
            .tracker
            .as_ref()
            .ok_or_else(|| CoreError::InconsistentConfiguration("point run has no flow tracker".into()))?;
        let cell = self.config.dynamics.effective_cell_size_m;
        let max_density = self.config.track.jam_density_per_km(cell) + DENSITY_SLACK_PER_KM;
        let assessment = assess(flow, max_density);
        let global = flow.permanent_global_sample();
        let modes = (0..self.modes.len()).map(|m| flow.permanent_sample(ModeId(m as u16))).collect();

        let counter = passing.lock().unwrap_or_else(PoisonError::into_inner);
        let point = FdPoint {
            agents: agents.to_vec(),
            summary,
            global,
            modes,
            overtakes_per_km: counter.overtakes_per_km(),
            pair_overtakes_per_km: self.pair().map(|(a, b)| counter.pair_per_km(a, b)),
            avg_overtake_rate: counter.avg_overtake_rate(),
            assessment,
        };
        drop(counter);

        self.report(&point);
        Ok(point)
    }

    fn report(&mut self, point: &FdPoint) {
        let a = &point.assessment;
        for &m in &a.flow_unstable {
            self.flow_unstable[m.index()] += 1;
            warn!(
                mode   = %self.modes.get(m).name,
                agents = ?point.agents,
                count  = self.flow_unstable[m.index()],
                "flow not stable"
            );
        }
        for &m in &a.speed_unstable {
            self.speed_unstable[m.index()] += 1;
            warn!(
                mode   = %self.modes.get(m).name,
                agents = ?point.agents,
                count  = self.speed_unstable[m.index()],
                "speed not stable"
            );
        }
        if !a.permanent {
            warn!(agents = ?point.agents, "no permanent state reached");
        }
        if a.too_dense {
            warn!(agents = ?point.agents, density = ?a.permanent_density, "permanent density above jam density");
        }

        match &point.global {
            Some(g) if point.is_valid() => info!(
                agents  = ?point.agents,
                density = g.density,
                flow    = g.flow,
                speed   = g.mean_speed_kmh(),
                "fd point finished"
            ),
            _ => info!(agents = ?point.agents, final_tick = point.summary.final_tick.0, "fd point rejected"),
        }
    }
}
