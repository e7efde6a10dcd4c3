//! Timed overrides of link attributes.

use qs_core::LinkId;

use crate::{Network, NetworkError, NetworkResult};

/// Overrides a link's free speed and/or flow capacity from `at_secs` on.
///
/// Applied by the stepper at the start of the first interval at or after
/// `at_secs`, before departures are inserted.  A new free speed only affects
/// vehicles admitted afterwards.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkChange {
    pub at_secs:                u32,
    pub link:                   LinkId,
    pub free_speed_mps:         Option<f64>,
    pub flow_capacity_per_hour: Option<f64>,
}

impl NetworkChange {
    /// Check the change against `network` without applying it.
    pub fn validate(&self, network: &Network) -> NetworkResult<()> {
        let link = network.try_link(self.link)?;
        let checks = [
            ("free speed", self.free_speed_mps),
            ("flow capacity", self.flow_capacity_per_hour),
        ];
        for (what, value) in checks {
            if let Some(v) = value {
                if !(v.is_finite() && v > 0.0) {
                    return Err(NetworkError::NonPositive { link: link.name.clone(), what, value: v });
                }
            }
        }
        Ok(())
    }
}
