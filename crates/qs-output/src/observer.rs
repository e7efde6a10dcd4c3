//! `SimOutputObserver<W>` bridges `SimObserver` to an `OutputWriter`.

use qs_agent::Population;
use qs_core::{SimConfig, Tick};
use qs_events::Event;
use qs_flow::{FlowBin, FlowSample};
use qs_queue::QueueNetwork;
use qs_sim::{IntervalSummary, RunSummary, SimObserver};

use crate::row::{EventRow, FlowSampleRow, GLOBAL_MODE, IntervalRow, LinkStateRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes events, interval counters, link snapshots
/// and tracker samples to any [`OutputWriter`] backend.
///
/// Events are buffered per interval and written in one batch when the
/// interval ends.  Errors from the writer are stored internally because
/// `SimObserver` methods have no return value.  After `sim.run()` returns,
/// check for errors with [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:             W,
    start_secs:         u64,
    tick_duration_secs: u64,
    pending:            Vec<EventRow>,
    last_error:         Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    /// Create an observer backed by `writer`, using `config` for
    /// seconds-of-day conversion.
    pub fn new(writer: W, config: &SimConfig) -> Self {
        Self {
            writer,
            start_secs:         config.start_secs as u64,
            tick_duration_secs: config.tick_duration_secs as u64,
            pending:            Vec::new(),
            last_error:         None,
        }
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn secs(&self, tick: Tick) -> u64 {
        self.start_secs + tick.0 * self.tick_duration_secs
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

fn flow_row(tick: Tick, mode_id: u16, s: &FlowSample, permanent: bool) -> FlowSampleRow {
    FlowSampleRow {
        tick: tick.0,
        mode_id,
        number_of_agents: s.number_of_agents,
        density: s.density,
        flow: s.flow,
        speed_kmh: s.mean_speed_kmh(),
        permanent,
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_event(&mut self, event: &Event) {
        self.pending.push(EventRow {
            tick:      event.time.0,
            time_secs: self.secs(event.time),
            kind:      event.kind.as_str(),
            agent_id:  event.agent.0,
            link_id:   event.link.0,
        });
    }

    fn on_flow_bin(&mut self, bin: &FlowBin) {
        let mut rows = Vec::with_capacity(bin.modes.len() + 1);
        rows.push(flow_row(bin.tick, GLOBAL_MODE, &bin.global, bin.globally_permanent));
        rows.extend(
            bin.modes
                .iter()
                .map(|(mode, s)| flow_row(bin.tick, mode.0, s, bin.globally_permanent)),
        );
        let result = self.writer.write_flow_samples(&rows);
        self.store_err(result);
    }

    fn on_interval_end(&mut self, summary: &IntervalSummary, _queues: &QueueNetwork) {
        if !self.pending.is_empty() {
            let events = std::mem::take(&mut self.pending);
            let result = self.writer.write_events(&events);
            self.store_err(result);
        }
        let row = IntervalRow {
            tick:                summary.tick.0,
            time_secs:           self.secs(summary.tick),
            vehicles_on_network: summary.vehicles_on_network as u64,
            departed:            summary.departed,
            arrived:             summary.arrived,
            stuck:               summary.stuck,
            rejections:          summary.rejections,
        };
        let result = self.writer.write_interval(&row);
        self.store_err(result);
    }

    fn on_snapshot(&mut self, tick: Tick, queues: &QueueNetwork, _population: &Population) {
        let rows: Vec<LinkStateRow> = queues
            .links()
            .iter()
            .map(|q| LinkStateRow {
                tick:         tick.0,
                link_id:      q.link().0,
                vehicles:     q.len() as u32,
                occupied_pcu: q.occupied() + q.seep_occupied(),
                storage_pcu:  q.storage_capacity(),
                discharged:   q.discharged(),
                flow_budget:  q.flow_budget(),
            })
            .collect();

        if !rows.is_empty() {
            let result = self.writer.write_link_states(&rows);
            self.store_err(result);
        }
    }

    fn on_sim_end(&mut self, _summary: &RunSummary) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
