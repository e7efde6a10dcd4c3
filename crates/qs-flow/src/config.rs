//! Tracker configuration.

use qs_core::{CoreError, CoreResult, LinkId};
use qs_network::Network;

/// Binning and stability thresholds of a [`FlowDynamicsTracker`].
///
/// | Field               | Default   |
/// |---------------------|-----------|
/// | `reference_link`    | `LinkId(0)` |
/// | `bin_ticks`         | `60`      |
/// | `window_bins`       | `15`      |
/// | `tolerance`         | `0.05`    |
/// | `min_stable_bins`   | `4`       |
/// | `measured_length_m` | `None` (whole network) |
///
/// None of the thresholds is derived from anything; they are tuning knobs.
///
/// [`FlowDynamicsTracker`]: crate::FlowDynamicsTracker
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrackerConfig {
    /// Cross-section at which flow is counted (PCU entering this link).
    pub reference_link: LinkId,

    /// Intervals per statistics bin.
    pub bin_ticks: u64,

    /// Bins in the trailing window for flow and speed.
    pub window_bins: usize,

    /// Largest relative bin-to-bin change still counted as stable.
    pub tolerance: f64,

    /// Consecutive stable bins before a quantity counts as stable.
    pub min_stable_bins: u32,

    /// Road length densities are measured over; `None` uses the total
    /// length of the network.
    pub measured_length_m: Option<f64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            reference_link:    LinkId(0),
            bin_ticks:         60,
            window_bins:       15,
            tolerance:         0.05,
            min_stable_bins:   4,
            measured_length_m: None,
        }
    }
}

impl TrackerConfig {
    /// # Errors
    ///
    /// [`CoreError::InconsistentConfiguration`] for zero bin or window
    /// sizes, a negative or non-finite tolerance, a reference link missing
    /// from `network`, or a non-positive measured length.
    pub fn validate(&self, network: &Network) -> CoreResult<()> {
        let bad = |msg: String| Err(CoreError::InconsistentConfiguration(msg));
        if self.bin_ticks == 0 {
            return bad("tracker bin_ticks must be > 0".into());
        }
        if self.window_bins == 0 {
            return bad("tracker window_bins must be > 0".into());
        }
        if self.min_stable_bins == 0 {
            return bad("tracker min_stable_bins must be > 0".into());
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return bad(format!("tracker tolerance {} must be finite and >= 0", self.tolerance));
        }
        if network.try_link(self.reference_link).is_err() {
            return bad(format!("tracker reference link {} is not in the network", self.reference_link));
        }
        let length = self.measured_length_m.unwrap_or_else(|| network.total_length_m());
        if !(length.is_finite() && length > 0.0) {
            return bad(format!("tracker measured length {length} m must be > 0"));
        }
        Ok(())
    }
}
