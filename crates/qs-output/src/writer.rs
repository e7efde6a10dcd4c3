//! The `OutputWriter` trait implemented by all backend writers.

use crate::{EventRow, FlowSampleRow, IntervalRow, LinkStateRow, OutputResult};

/// Trait implemented by the CSV and SQLite writers.
///
/// All methods are infallible from the observer's perspective: errors are
/// stored internally and retrieved with
/// [`SimOutputObserver::take_error`](crate::SimOutputObserver::take_error).
pub trait OutputWriter {
    /// Write one interval's events, in emission order.
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()>;

    fn write_interval(&mut self, row: &IntervalRow) -> OutputResult<()>;

    /// Write a batch of per-link snapshot rows.
    fn write_link_states(&mut self, rows: &[LinkStateRow]) -> OutputResult<()>;

    /// Write the global and per-mode samples of one tracker bin.
    fn write_flow_samples(&mut self, rows: &[FlowSampleRow]) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
