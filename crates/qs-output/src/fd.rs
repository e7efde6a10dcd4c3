//! Tab-separated fundamental-diagram table.
//!
//! Column layout for modes `car`, `bike` with the pair `(car, bike)`:
//!
//! ```text
//! n  n_car  n_bike  k  k_car  k_bike  q  q_car  q_bike  v  v_car  v_bike
//!    overtakes_per_km  car_overtakes_bike_per_km  avg_overtake_rate
//! ```
//!
//! `k` is PCU per km, `q` PCU per hour and `v` km/h, all with two decimals.

use std::fs::File;
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::{FdRow, OutputError, OutputResult};

pub struct FdTableWriter {
    out:      Writer<File>,
    modes:    usize,
    pair:     bool,
    rows:     u64,
    finished: bool,
}

impl FdTableWriter {
    /// Create `path` and write the header for `modes` in column order.
    /// `pair` names an (overtaker, overtaken) mode pair whose rate gets its
    /// own column.
    pub fn create(path: &Path, modes: &[&str], pair: Option<(&str, &str)>) -> OutputResult<Self> {
        let mut out = WriterBuilder::new().delimiter(b'\t').from_path(path)?;

        let mut header: Vec<String> = Vec::with_capacity(4 * (modes.len() + 1) + 3);
        for quantity in ["n", "k", "q", "v"] {
            header.push(quantity.to_owned());
            header.extend(modes.iter().map(|m| format!("{quantity}_{m}")));
        }
        header.push("overtakes_per_km".to_owned());
        if let Some((over, under)) = pair {
            header.push(format!("{over}_overtakes_{under}_per_km"));
        }
        header.push("avg_overtake_rate".to_owned());
        out.write_record(&header)?;

        Ok(Self { out, modes: modes.len(), pair: pair.is_some(), rows: 0, finished: false })
    }

    /// Rows written so far, header excluded.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Append one point and flush, so a long sweep leaves a usable file
    /// behind if it is interrupted.
    pub fn write_row(&mut self, row: &FdRow) -> OutputResult<()> {
        for got in [row.mode_agents.len(), row.mode_density.len(), row.mode_flow.len(), row.mode_speed_kmh.len()] {
            if got != self.modes {
                return Err(OutputError::ModeCount { expected: self.modes, got });
            }
        }

        let mut record: Vec<String> = Vec::with_capacity(4 * (self.modes + 1) + 3);
        record.push(row.agents.to_string());
        record.extend(row.mode_agents.iter().map(u32::to_string));
        for (total, per_mode) in [
            (row.density, &row.mode_density),
            (row.flow, &row.mode_flow),
            (row.speed_kmh, &row.mode_speed_kmh),
        ] {
            record.push(fixed(total));
            record.extend(per_mode.iter().map(|&v| fixed(v)));
        }
        record.push(fixed(row.overtakes_per_km));
        if self.pair {
            record.push(fixed(row.pair_overtakes_per_km.unwrap_or(0.0)));
        }
        record.push(fixed(row.avg_overtake_rate));

        self.out.write_record(&record)?;
        self.out.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.out.flush()?;
        Ok(())
    }
}

fn fixed(v: f64) -> String {
    format!("{v:.2}")
}
