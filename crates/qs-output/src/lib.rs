//! `qs-output`: simulation output writers for the rust_qsim engine.
//!
//! Two run backends are provided behind Cargo features:
//!
//! | Feature   | Backend     | Files created                                                       |
//! |-----------|-------------|---------------------------------------------------------------------|
//! | *(none)*  | CSV         | `events.csv`, `intervals.csv`, `link_states.csv`, `flow_samples.csv` |
//! | `sqlite`  | SQLite      | `output.db`                                                         |
//!
//! Both implement [`OutputWriter`] and are driven by [`SimOutputObserver`],
//! which implements `qs_sim::SimObserver`.
//!
//! Fundamental-diagram sweeps write one tab-separated table through
//! [`FdTableWriter`], one row per valid point.
//!
//! # Usage
//!
//! ```rust,ignore
//! use qs_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output")).unwrap();
//! let mut obs = SimOutputObserver::new(writer, &config);
//! sim.run(&mut obs).unwrap();
//! obs.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod fd;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use fd::FdTableWriter;
pub use observer::SimOutputObserver;
pub use row::{EventRow, FdRow, FlowSampleRow, GLOBAL_MODE, IntervalRow, LinkStateRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
