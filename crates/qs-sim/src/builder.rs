//! Fluent builder for constructing a [`Sim`].

use tracing::debug;

use qs_agent::{DepartureQueue, Population};
use qs_core::{ModeTable, SimConfig};
use qs_events::{EventBus, EventLog, EventSubscriber, SubscriberId};
use qs_flow::{FlowDynamicsTracker, TrackerConfig};
use qs_network::{Network, NetworkChange};
use qs_queue::{QueueNetwork, TrafficDynamics};

use crate::{CancelHandle, RunSummary, Sim, SimResult, TerminationPredicate};

/// Fluent builder for [`Sim`].
///
/// # Required inputs
///
/// - [`SimConfig`]: time window, interval length, seed
/// - [`Network`] from [`qs_network::NetworkBuilder`]
/// - [`ModeTable`]
/// - [`Population`] from [`qs_agent::PopulationBuilder`]
///
/// # Optional inputs (have defaults)
///
/// | Method              | Default                                  |
/// |---------------------|------------------------------------------|
/// | `.dynamics(d)`      | `TrafficDynamics::default()`             |
/// | `.tracker(c)`       | no flow tracking                         |
/// | `.changes(v)`       | static network                           |
/// | `.subscribe(s)`     | no subscribers                           |
/// | `.termination(p)`   | run to `end_secs`                        |
/// | `.keep_events(b)`   | `false`                                  |
/// | `.cancel_handle(h)` | a fresh handle, see `Sim::cancel_handle` |
///
/// # Example
///
/// ```rust,ignore
/// let population = PopulationBuilder::new(config.seed)
///     .add(ModeId(0), 0, Driver::fixed(vec![LinkId(0)]))
///     .build(&modes)?;
/// let mut sim = SimBuilder::new(config, network, modes, population)
///     .tracker(TrackerConfig::default())
///     .termination(FlowPermanent)
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder {
    config:      SimConfig,
    network:     Network,
    modes:       ModeTable,
    population:  Population,
    dynamics:    TrafficDynamics,
    tracker:     Option<TrackerConfig>,
    changes:     Vec<NetworkChange>,
    bus:         EventBus,
    termination: Option<Box<dyn TerminationPredicate>>,
    keep_events: bool,
    cancel:      CancelHandle,
}

impl SimBuilder {
    pub fn new(config: SimConfig, network: Network, modes: ModeTable, population: Population) -> Self {
        Self {
            config,
            network,
            modes,
            population,
            dynamics:    TrafficDynamics::default(),
            tracker:     None,
            changes:     Vec::new(),
            bus:         EventBus::new(),
            termination: None,
            keep_events: false,
            cancel:      CancelHandle::new(),
        }
    }

    pub fn dynamics(mut self, dynamics: TrafficDynamics) -> Self {
        self.dynamics = dynamics;
        self
    }

    /// Track fundamental-diagram samples on the network.  The sim then
    /// tells drivers when global permanence has been reached.
    pub fn tracker(mut self, config: TrackerConfig) -> Self {
        self.tracker = Some(config);
        self
    }

    /// Time-variant link attributes.  Applied at the first interval
    /// starting at or after each change's time, in time order.
    pub fn changes(mut self, changes: Vec<NetworkChange>) -> Self {
        self.changes = changes;
        self
    }

    /// Register an event subscriber.  Subscribers receive events in
    /// registration order.
    pub fn subscribe<S: EventSubscriber + Send + 'static>(mut self, subscriber: S) -> Self {
        self.subscribe_with_id(subscriber);
        self
    }

    /// Like [`subscribe`](Self::subscribe), returning the subscriber's id.
    pub fn subscribe_with_id<S: EventSubscriber + Send + 'static>(&mut self, subscriber: S) -> SubscriberId {
        self.bus.subscribe(subscriber)
    }

    pub fn termination<P: TerminationPredicate + 'static>(mut self, predicate: P) -> Self {
        self.termination = Some(Box::new(predicate));
        self
    }

    /// Keep every event of the run in [`Sim::log`].
    pub fn keep_events(mut self, keep: bool) -> Self {
        self.keep_events = keep;
        self
    }

    /// Use an existing handle, e.g. one already shared with a UI thread.
    pub fn cancel_handle(mut self, handle: CancelHandle) -> Self {
        self.cancel = handle;
        self
    }

    /// Validate inputs, build link queues, the departure queue and the
    /// tracker, and return a ready-to-run [`Sim`].
    ///
    /// # Errors
    ///
    /// `SimError::Core` for an inconsistent config, traffic dynamics or
    /// tracker config; `SimError::Network` for a change naming an unknown
    /// link or carrying a bad value.
    pub fn build(self) -> SimResult<Sim> {
        self.config.validate()?;

        let mut changes = self.changes;
        for c in &changes {
            c.validate(&self.network)?;
        }
        // Stable: same-time changes apply in the order given.
        changes.sort_by_key(|c| c.at_secs);

        let queues = QueueNetwork::new(&self.network, &self.dynamics, &self.modes, self.config.tick_duration_secs)?;

        let tracker = match self.tracker {
            Some(tc) => Some(FlowDynamicsTracker::new(
                &self.network,
                &self.modes,
                self.population.modes(),
                tc,
                self.config.tick_duration_secs,
            )?),
            None => None,
        };

        let clock = self.config.make_clock();
        let departures = DepartureQueue::from_population(&self.population, &clock);
        debug!(
            agents   = self.population.len(),
            changes  = changes.len(),
            tracking = tracker.is_some(),
            "sim built"
        );

        #[cfg(feature = "parallel")]
        let pool = match self.config.num_threads {
            Some(n) => Some(rayon::ThreadPoolBuilder::new().num_threads(n).build()?),
            None => None,
        };

        Ok(Sim {
            clock,
            network:        self.network,
            modes:          self.modes,
            population:     self.population,
            queues,
            departures,
            bus:            self.bus,
            tracker,
            log:            self.keep_events.then(EventLog::new),
            changes,
            next_change:    0,
            termination:    self.termination,
            cancel:         self.cancel,
            flow_permanent: false,
            totals:         RunSummary::default(),
            #[cfg(feature = "parallel")]
            pool,
            config:         self.config,
        })
    }
}
