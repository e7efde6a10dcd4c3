//! Point validity.

use qs_core::ModeId;
use qs_flow::FlowDynamicsTracker;

/// Why a finished point run can or cannot enter the diagram.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assessment {
    /// Tracked modes whose flow never stabilised.
    pub flow_unstable:     Vec<ModeId>,
    pub speed_unstable:    Vec<ModeId>,
    pub permanent:         bool,
    /// Global density of the permanent state, PCU per km.
    pub permanent_density: Option<f64>,
    /// The permanent density exceeded the jam density plus slack.
    pub too_dense:         bool,
}

impl Assessment {
    pub fn is_valid(&self) -> bool {
        self.flow_unstable.is_empty() && self.speed_unstable.is_empty() && self.permanent && !self.too_dense
    }
}

/// Judge a finished run.  Densities above `max_density_per_km` come from
/// vehicles queued off the measured road and are rejected.
pub fn assess(tracker: &FlowDynamicsTracker, max_density_per_km: f64) -> Assessment {
    let modes = tracker.tracked_modes();
    let permanent_density = tracker.permanent_global_sample().map(|s| s.density);
    Assessment {
        flow_unstable:     modes.iter().copied().filter(|&m| !tracker.is_flow_stable(m)).collect(),
        speed_unstable:    modes.iter().copied().filter(|&m| !tracker.is_speed_stable(m)).collect(),
        permanent:         tracker.is_globally_permanent(),
        permanent_density,
        too_dense:         permanent_density.is_some_and(|k| k > max_density_per_km),
    }
}
