//! CSV output backend.
//!
//! Creates four files in the configured output directory:
//! - `events.csv`
//! - `intervals.csv`
//! - `link_states.csv`
//! - `flow_samples.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{EventRow, FlowSampleRow, IntervalRow, LinkStateRow, OutputResult};

/// Writes simulation output to four CSV files.
pub struct CsvWriter {
    events:      Writer<File>,
    intervals:   Writer<File>,
    link_states: Writer<File>,
    flow:        Writer<File>,
    finished:    bool,
}

impl CsvWriter {
    /// Open (or create) the CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut events = Writer::from_path(dir.join("events.csv"))?;
        events.write_record(["tick", "time_secs", "kind", "agent_id", "link_id"])?;

        let mut intervals = Writer::from_path(dir.join("intervals.csv"))?;
        intervals.write_record([
            "tick",
            "time_secs",
            "vehicles_on_network",
            "departed",
            "arrived",
            "stuck",
            "rejections",
        ])?;

        let mut link_states = Writer::from_path(dir.join("link_states.csv"))?;
        link_states.write_record([
            "tick",
            "link_id",
            "vehicles",
            "occupied_pcu",
            "storage_pcu",
            "discharged",
            "flow_budget",
        ])?;

        let mut flow = Writer::from_path(dir.join("flow_samples.csv"))?;
        flow.write_record(["tick", "mode_id", "number_of_agents", "density", "flow", "speed_kmh", "permanent"])?;

        Ok(Self {
            events,
            intervals,
            link_states,
            flow,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        for row in rows {
            self.events.write_record(&[
                row.tick.to_string(),
                row.time_secs.to_string(),
                row.kind.to_owned(),
                row.agent_id.to_string(),
                row.link_id.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_interval(&mut self, row: &IntervalRow) -> OutputResult<()> {
        self.intervals.write_record(&[
            row.tick.to_string(),
            row.time_secs.to_string(),
            row.vehicles_on_network.to_string(),
            row.departed.to_string(),
            row.arrived.to_string(),
            row.stuck.to_string(),
            row.rejections.to_string(),
        ])?;
        Ok(())
    }

    fn write_link_states(&mut self, rows: &[LinkStateRow]) -> OutputResult<()> {
        for row in rows {
            self.link_states.write_record(&[
                row.tick.to_string(),
                row.link_id.to_string(),
                row.vehicles.to_string(),
                row.occupied_pcu.to_string(),
                row.storage_pcu.to_string(),
                row.discharged.to_string(),
                row.flow_budget.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_flow_samples(&mut self, rows: &[FlowSampleRow]) -> OutputResult<()> {
        for row in rows {
            self.flow.write_record(&[
                row.tick.to_string(),
                row.mode_id.to_string(),
                row.number_of_agents.to_string(),
                row.density.to_string(),
                row.flow.to_string(),
                row.speed_kmh.to_string(),
                (row.permanent as u8).to_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.events.flush()?;
        self.intervals.flush()?;
        self.link_states.flush()?;
        self.flow.flush()?;
        Ok(())
    }
}
