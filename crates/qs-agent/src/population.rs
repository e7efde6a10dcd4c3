//! The run's agents, indexed by `AgentId`.

use qs_core::{AgentId, AgentRng, ModeId, ModeTable};

use crate::{Agent, AgentError, AgentResult, Driver};

/// All agents of a run.  `agents[i].id == AgentId(i)`.
#[derive(Clone, Debug, Default)]
pub struct Population {
    agents: Vec<Agent>,
}

impl Population {
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    #[inline]
    pub fn get(&self, agent: AgentId) -> &Agent {
        &self.agents[agent.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, agent: AgentId) -> &mut Agent {
        &mut self.agents[agent.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Agent → mode table, indexed by `AgentId`.
    pub fn modes(&self) -> Vec<ModeId> {
        self.agents.iter().map(|a| a.mode).collect()
    }

    /// Number of agents per mode, indexed by `ModeId`.
    pub fn count_by_mode(&self, mode_count: usize) -> Vec<usize> {
        let mut counts = vec![0; mode_count];
        for a in &self.agents {
            if let Some(c) = counts.get_mut(a.mode.index()) {
                *c += 1;
            }
        }
        counts
    }

    /// Agents whose trip has ended (arrived or stuck).
    pub fn finished(&self) -> usize {
        self.agents.iter().filter(|a| a.is_finished()).count()
    }
}

/// Collects agents, then validates them against the mode table.
///
/// # Example
///
/// ```
/// use qs_agent::{Driver, PopulationBuilder};
/// use qs_core::{LinkId, ModeTable};
///
/// let modes = ModeTable::from_presets(&["car", "bike"]).unwrap();
/// let car = modes.by_name("car").unwrap();
///
/// let mut b = PopulationBuilder::new(42);
/// b.add(car, 0, Driver::fixed(vec![LinkId(0), LinkId(1)]));
/// b.add_jittered(car, 0, 900, Driver::fixed(vec![LinkId(0)]));
/// let pop = b.build(&modes).unwrap();
/// assert_eq!(pop.len(), 2);
/// assert!(pop.get(qs_core::AgentId(1)).departure_secs < 900);
/// ```
pub struct PopulationBuilder {
    seed:   u64,
    agents: Vec<Agent>,
}

impl PopulationBuilder {
    /// `seed` drives the departure jitter of [`add_jittered`](Self::add_jittered).
    pub fn new(seed: u64) -> Self {
        Self { seed, agents: Vec::new() }
    }

    pub fn with_capacity(seed: u64, count: usize) -> Self {
        Self { seed, agents: Vec::with_capacity(count) }
    }

    /// Add an agent departing at second-of-day `departure_secs`.
    pub fn add(&mut self, mode: ModeId, departure_secs: u32, driver: Driver) -> AgentId {
        let id = AgentId(self.agents.len() as u32);
        self.agents.push(Agent::new(id, mode, departure_secs, driver));
        id
    }

    /// Add an agent departing at a whole second drawn uniformly from
    /// `[window_start_secs, window_start_secs + window_secs)` with the
    /// agent's own seeded RNG.
    pub fn add_jittered(
        &mut self,
        mode:              ModeId,
        window_start_secs: u32,
        window_secs:       u32,
        driver:            Driver,
    ) -> AgentId {
        let id = AgentId(self.agents.len() as u32);
        let offset = AgentRng::new(self.seed, id).secs_within(window_secs);
        self.agents.push(Agent::new(id, mode, window_start_secs + offset, driver));
        id
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// # Errors
    ///
    /// - [`AgentError::UnknownMode`] if an agent's mode is not in `modes`.
    /// - [`AgentError::EmptyRoute`] for a fixed route without links.
    pub fn build(self, modes: &ModeTable) -> AgentResult<Population> {
        for a in &self.agents {
            if !modes.contains(a.mode) {
                return Err(AgentError::UnknownMode { agent: a.id, mode: a.mode });
            }
            if let Driver::FixedRoute(route) = &a.driver {
                if route.is_empty() {
                    return Err(AgentError::EmptyRoute(a.id));
                }
            }
        }
        Ok(Population { agents: self.agents })
    }
}
