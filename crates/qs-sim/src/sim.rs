//! The `Sim` struct and its interval loop.

use tracing::{debug, info, warn};

use qs_agent::{AgentError, AgentState, DepartureQueue, Population, RouteContext};
use qs_core::{ModeTable, NodeId, SimClock, SimConfig, Tick};
use qs_events::{Event, EventBus, EventLog};
use qs_flow::FlowDynamicsTracker;
use qs_network::{Network, NetworkChange};
use qs_queue::{NodeDecision, QueueNetwork, QueueResult};

use crate::{
    CancelHandle, IntervalSummary, RunSummary, SimObserver, SimResult, TerminationContext,
    TerminationPredicate,
};

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// Each interval runs these phases against the state committed by the
/// previous one:
///
/// 1. **Network changes** due at or before this interval.
/// 2. **Refill** every link's flow accumulator.
/// 3. **Departures**: due agents are inserted on their first link in
///    scheduling order; a full first link leaves the agent waiting for the
///    next interval (or removes it as stuck once it has waited too long).
/// 4. **Decide** (optionally parallel with the `parallel` feature): every
///    node computes its moves from committed state.
/// 5. **Commit** decisions in ascending `NodeId` order, producing events.
/// 6. **Dispatch** events to the tracker, the bus subscribers, the
///    observer and the optional log; close the tracker bin.
/// 7. **Terminate?** ask the termination predicate.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    /// Time window, interval length, seed, output cadence.
    pub config: SimConfig,

    /// Tracks the current tick and maps it to seconds of day.
    pub clock: SimClock,

    /// Network attributes as of the current interval (changes applied).
    pub network: Network,

    pub modes: ModeTable,

    pub population: Population,

    /// Link queues and node priorities.
    pub queues: QueueNetwork,

    /// Sparse tick → agents map of pending departures.
    pub departures: DepartureQueue,

    /// Ordered event subscribers.
    pub bus: EventBus,

    pub tracker: Option<FlowDynamicsTracker>,

    /// Every event of the run, when requested on the builder.
    pub log: Option<EventLog>,

    pub(crate) changes:     Vec<NetworkChange>,
    pub(crate) next_change: usize,
    pub(crate) termination: Option<Box<dyn TerminationPredicate>>,
    pub(crate) cancel:      CancelHandle,

    /// Tracker permanence as committed at the end of the last interval.
    pub(crate) flow_permanent: bool,
    pub(crate) totals:         RunSummary,

    #[cfg(feature = "parallel")]
    pub(crate) pool: Option<rayon::ThreadPool>,
}

impl Sim {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current tick until `config.end_tick()`, the termination
    /// predicate, or cancellation, whichever comes first.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<RunSummary> {
        let end = self.config.end_tick();
        info!(
            agents = self.population.len(),
            links  = self.network.link_count(),
            nodes  = self.network.node_count(),
            start  = %self.clock,
            end    = end.0,
            "run started"
        );

        loop {
            let now = self.clock.current_tick;
            if now >= end {
                break;
            }
            if self.cancel.is_cancelled() {
                info!(tick = now.0, "run cancelled");
                self.totals.cancelled = true;
                break;
            }
            if self.step(observer)? {
                info!(tick = now.0, "termination predicate satisfied");
                self.totals.terminated_early = true;
                break;
            }
        }

        let summary = self.summary();
        observer.on_sim_end(&summary);
        info!(
            final_tick = summary.final_tick.0,
            departed   = summary.departed,
            arrived    = summary.arrived,
            stuck      = summary.stuck,
            rejections = summary.rejections,
            "run finished"
        );
        Ok(summary)
    }

    /// Run exactly `n` intervals from the current position (ignores the end
    /// time, the termination predicate and cancellation).
    ///
    /// Useful for tests and incremental stepping.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer)?;
        }
        Ok(())
    }

    /// Counters so far; `final_tick` is the next interval to simulate.
    pub fn summary(&self) -> RunSummary {
        RunSummary { final_tick: self.clock.current_tick, ..self.totals }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Global flow permanence as seen by drivers in the next interval.
    pub fn is_flow_permanent(&self) -> bool {
        self.flow_permanent
    }

    // ── Interval processing ───────────────────────────────────────────────

    /// Simulate the current interval and advance the clock.  Returns whether
    /// the termination predicate asked to stop.
    fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<bool> {
        let now = self.clock.current_tick;
        observer.on_tick_start(now);

        let summary = self.process_tick(now, observer)?;
        self.totals.add(&summary);
        observer.on_interval_end(&summary, &self.queues);
        let every = self.config.output_interval_ticks;
        if every > 0 && now.0 % every == 0 {
            observer.on_snapshot(now, &self.queues, &self.population);
        }

        let stop = match self.termination.as_mut() {
            Some(predicate) => predicate.should_stop(&TerminationContext {
                tick:               now,
                summary:            &summary,
                population:         &self.population,
                queues:             &self.queues,
                tracker:            self.tracker.as_ref(),
                pending_departures: self.departures.len(),
            }),
            None => false,
        };

        self.clock.advance();
        Ok(stop)
    }

    fn process_tick<O: SimObserver>(&mut self, now: Tick, observer: &mut O) -> SimResult<IntervalSummary> {
        let mut summary = IntervalSummary { tick: now, ..IntervalSummary::default() };
        let mut events: Vec<Event> = Vec::new();
        let ctx = RouteContext { now, flow_permanent: self.flow_permanent };

        // ── Phase 1: scheduled network changes ────────────────────────────
        self.apply_changes(now)?;

        // ── Phase 2: refill flow accumulators ─────────────────────────────
        self.queues.begin_tick();

        // ── Phase 3: departures ───────────────────────────────────────────
        self.insert_departures(now, &ctx, &mut summary, &mut events)?;

        // ── Phase 4: decide every node from committed state ───────────────
        let decisions = self.decide_all(now, &ctx)?;

        // ── Phase 5: commit in node order ─────────────────────────────────
        for decision in &decisions {
            let stats = self.queues.commit(decision, now, &mut self.population, &mut events)?;
            summary.arrived += stats.arrived;
            summary.stuck += stats.stuck;
            summary.rejections += decision.rejections;
        }
        summary.vehicles_on_network = self.queues.vehicles_on_network();

        // ── Phase 6: dispatch ─────────────────────────────────────────────
        for e in &events {
            if let Some(t) = self.tracker.as_mut() {
                t.record(e);
            }
            self.bus.emit(e);
            observer.on_event(e);
        }
        self.bus.end_interval(now);
        if let Some(t) = self.tracker.as_mut() {
            if let Some(bin) = t.close_interval(now) {
                observer.on_flow_bin(&bin);
            }
            self.flow_permanent = t.is_globally_permanent();
        }
        if let Some(log) = self.log.as_mut() {
            for e in events {
                log.push(e);
            }
        }

        Ok(summary)
    }

    fn apply_changes(&mut self, now: Tick) -> SimResult<()> {
        while let Some(change) = self.changes.get(self.next_change) {
            if self.clock.tick_at_or_after(change.at_secs) > now {
                break;
            }
            self.network.apply_change(change)?;
            self.queues.refresh_link(change.link, &self.network, &self.modes);
            self.next_change += 1;
        }
        Ok(())
    }

    fn insert_departures(
        &mut self,
        now:     Tick,
        ctx:     &RouteContext,
        summary: &mut IntervalSummary,
        events:  &mut Vec<Event>,
    ) -> SimResult<()> {
        let due = self.departures.drain_until(now);
        if due.is_empty() {
            return Ok(());
        }
        let stuck_ticks = self.queues.stuck_ticks();
        let mut retry = Vec::new();

        for id in due {
            let agent = self.population.get_mut(id);
            if !agent.driver.departs(ctx) {
                agent.skip()?;
                debug!(agent = %id, tick = now.0, "departure skipped");
                continue;
            }
            agent.begin_waiting(now)?;
            let link = agent.driver.first_link(id, ctx).ok_or(AgentError::EmptyRoute(id))?;

            match self.queues.insert(id, agent.mode, link, now, &self.modes) {
                Ok(exit) => {
                    agent.depart(link)?;
                    events.push(Event::departed(now, id, link));
                    events.push(Event::entered(now, id, link));
                    summary.departed += 1;
                    debug!(agent = %id, %link, exit = exit.0, "departed");
                }
                Err(e) if e.is_capacity() => {
                    summary.rejections += 1;
                    let since = match agent.state() {
                        AgentState::Waiting { since } => since,
                        _ => now,
                    };
                    if stuck_ticks.is_some_and(|limit| now.since(since) >= limit) {
                        agent.abort()?;
                        events.push(Event::stuck(now, id, link));
                        summary.stuck += 1;
                        warn!(agent = %id, %link, tick = now.0, "departure stuck, removed");
                    } else {
                        retry.push(id);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        self.departures.requeue_front(now + 1, retry);
        Ok(())
    }

    fn decide_all(&self, now: Tick, ctx: &RouteContext) -> SimResult<Vec<NodeDecision>> {
        let nodes = self.network.node_count() as u32;
        let queues = &self.queues;
        let network = &self.network;
        let population = &self.population;

        #[cfg(not(feature = "parallel"))]
        {
            let decisions: QueueResult<Vec<NodeDecision>> = (0..nodes)
                .map(|n| queues.decide(NodeId(n), now, network, population, ctx))
                .collect();
            Ok(decisions?)
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            let run = || -> QueueResult<Vec<NodeDecision>> {
                (0..nodes)
                    .into_par_iter()
                    .map(|n| queues.decide(NodeId(n), now, network, population, ctx))
                    .collect()
            };
            let decisions = match &self.pool {
                Some(pool) => pool.install(run),
                None => run(),
            };
            Ok(decisions?)
        }
    }
}
