//! Plain data row types written by output backends.

/// One engine event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRow {
    pub tick:      u64,
    /// Second of day at which the interval starts.
    pub time_secs: u64,
    /// `departed`, `linkEntered`, `linkLeft`, `arrived` or `stuck`.
    pub kind:      &'static str,
    pub agent_id:  u32,
    pub link_id:   u32,
}

/// Counters of one interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalRow {
    pub tick:                u64,
    pub time_secs:           u64,
    pub vehicles_on_network: u64,
    pub departed:            u32,
    pub arrived:             u32,
    pub stuck:               u32,
    pub rejections:          u32,
}

/// One link's queue at a snapshot tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkStateRow {
    pub tick:         u64,
    pub link_id:      u32,
    pub vehicles:     u32,
    pub occupied_pcu: f64,
    pub storage_pcu:  f64,
    /// PCU that left during the snapshot interval.
    pub discharged:   f64,
    pub flow_budget:  f64,
}

/// Mode id written for the all-modes aggregate.
pub const GLOBAL_MODE: u16 = u16::MAX;

/// One tracker sample, per mode or global.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowSampleRow {
    pub tick:             u64,
    /// [`GLOBAL_MODE`] for the aggregate.
    pub mode_id:          u16,
    pub number_of_agents: u32,
    /// PCU per km.
    pub density:          f64,
    /// PCU per hour.
    pub flow:             f64,
    pub speed_kmh:        f64,
    /// Global permanence has been reached.
    pub permanent:        bool,
}

/// One valid fundamental-diagram point.  Per-mode vectors follow the
/// column order the [`FdTableWriter`](crate::FdTableWriter) was created
/// with.
#[derive(Debug, Clone, PartialEq)]
pub struct FdRow {
    pub agents:                u32,
    pub mode_agents:           Vec<u32>,
    pub density:               f64,
    pub mode_density:          Vec<f64>,
    pub flow:                  f64,
    pub mode_flow:             Vec<f64>,
    pub speed_kmh:             f64,
    pub mode_speed_kmh:        Vec<f64>,
    pub overtakes_per_km:      f64,
    /// Overtakes within the table's mode pair, when it has one.
    pub pair_overtakes_per_km: Option<f64>,
    pub avg_overtake_rate:     f64,
}
