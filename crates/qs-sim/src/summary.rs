//! Run and interval counters.

use qs_core::Tick;

/// What happened in one interval.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntervalSummary {
    pub tick:                Tick,
    /// Vehicles on any link after the interval's commits.
    pub vehicles_on_network: usize,
    pub departed:            u32,
    pub arrived:             u32,
    pub stuck:               u32,
    /// Departures turned away by a full first link plus ready vehicles
    /// held by a full downstream link.
    pub rejections:          u32,
}

/// Totals of a whole run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunSummary {
    /// First interval not simulated.
    pub final_tick:       Tick,
    pub departed:         u64,
    pub arrived:          u64,
    pub stuck:            u64,
    pub rejections:       u64,
    /// Stopped by the termination predicate before the end time.
    pub terminated_early: bool,
    /// Stopped through a [`CancelHandle`](crate::CancelHandle).
    pub cancelled:        bool,
}

impl RunSummary {
    pub(crate) fn add(&mut self, interval: &IntervalSummary) {
        self.departed += interval.departed as u64;
        self.arrived += interval.arrived as u64;
        self.stuck += interval.stuck as u64;
        self.rejections += interval.rejections as u64;
    }
}
