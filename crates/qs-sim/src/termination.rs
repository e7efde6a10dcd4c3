//! Early-stop predicates and cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use qs_agent::Population;
use qs_core::Tick;
use qs_flow::FlowDynamicsTracker;
use qs_queue::QueueNetwork;

use crate::IntervalSummary;

/// Committed state handed to a [`TerminationPredicate`] after each interval.
pub struct TerminationContext<'a> {
    pub tick:               Tick,
    pub summary:            &'a IntervalSummary,
    pub population:         &'a Population,
    pub queues:             &'a QueueNetwork,
    pub tracker:            Option<&'a FlowDynamicsTracker>,
    /// Agents still scheduled to depart (including retries).
    pub pending_departures: usize,
}

/// Decides, between intervals, whether the run should stop before its end
/// time.  Closures `FnMut(&TerminationContext) -> bool` implement it.
pub trait TerminationPredicate: Send {
    fn should_stop(&mut self, ctx: &TerminationContext<'_>) -> bool;
}

impl<F> TerminationPredicate for F
where
    F: FnMut(&TerminationContext<'_>) -> bool + Send,
{
    fn should_stop(&mut self, ctx: &TerminationContext<'_>) -> bool {
        self(ctx)
    }
}

/// Stop once the flow tracker has latched global permanence.
#[derive(Copy, Clone, Debug, Default)]
pub struct FlowPermanent;

impl TerminationPredicate for FlowPermanent {
    fn should_stop(&mut self, ctx: &TerminationContext<'_>) -> bool {
        ctx.tracker.is_some_and(FlowDynamicsTracker::is_globally_permanent)
    }
}

/// Stop once every agent has finished its trip.
#[derive(Copy, Clone, Debug, Default)]
pub struct NetworkEmpty;

impl TerminationPredicate for NetworkEmpty {
    fn should_stop(&mut self, ctx: &TerminationContext<'_>) -> bool {
        ctx.pending_departures == 0
            && ctx.queues.vehicles_on_network() == 0
            && ctx.population.finished() == ctx.population.len()
    }
}

// ── CancelHandle ──────────────────────────────────────────────────────────────

/// Stops a run between intervals.  Clone it into another thread and call
/// [`cancel`](Self::cancel); the run finishes its current interval, reports
/// `on_sim_end`, and returns normally with `cancelled` set.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
