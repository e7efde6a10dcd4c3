//! Simulation observer trait for progress reporting and data collection.

use qs_agent::Population;
use qs_core::Tick;
use qs_events::Event;
use qs_flow::FlowBin;
use qs_queue::QueueNetwork;

use crate::{IntervalSummary, RunSummary};

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// interval loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: stuck reporter
///
/// ```rust,ignore
/// struct StuckReporter;
///
/// impl SimObserver for StuckReporter {
///     fn on_event(&mut self, event: &Event) {
///         if event.kind == EventKind::Stuck {
///             println!("{event}");
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each interval, before network changes
    /// and departures.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called once per event, in emission order, after the bus subscribers.
    fn on_event(&mut self, _event: &Event) {}

    /// Called whenever the flow tracker closes a bin.
    fn on_flow_bin(&mut self, _bin: &FlowBin) {}

    /// Called at the end of every interval with the committed link state.
    fn on_interval_end(&mut self, _summary: &IntervalSummary, _queues: &QueueNetwork) {}

    /// Called every `config.output_interval_ticks` intervals.
    fn on_snapshot(&mut self, _tick: Tick, _queues: &QueueNetwork, _population: &Population) {}

    /// Called once after the last interval, also after cancellation or an
    /// early stop.
    fn on_sim_end(&mut self, _summary: &RunSummary) {}
}

/// A [`SimObserver`] that does nothing.  Use when you need to call `run` but
/// don't want progress callbacks.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
