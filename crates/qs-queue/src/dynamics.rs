//! Traffic-dynamics switches for the queue model.

use qs_core::{CoreError, CoreResult, ModeId, ModeTable};

/// Tie-break between inbound links of a node competing for the same
/// downstream room.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InboundOrder {
    /// Ascending `LinkId`.
    #[default]
    LinkId,
    /// Higher flow capacity first, ties by ascending `LinkId`.
    CapacityDesc,
}

/// Lets the listed modes filter through stopped traffic.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeepageConfig {
    /// Mode names allowed to seep (`"bike"`, …).
    pub modes: Vec<String>,
    /// Size of the seepage pool as a fraction of regular storage.
    pub capacity_fraction: f64,
}

impl Default for SeepageConfig {
    fn default() -> Self {
        Self { modes: vec!["bike".into()], capacity_fraction: 0.2 }
    }
}

/// Queue-model behavior for a run.
///
/// | Field                   | Default   |
/// |-------------------------|-----------|
/// | `passing`               | `false`   |
/// | `seepage`               | `None`    |
/// | `stuck_time_secs`       | `Some(10)`|
/// | `inbound_order`         | `LinkId`  |
/// | `effective_cell_size_m` | `7.5`     |
///
/// The stuck time is a tuning parameter, not a derived quantity; `None`
/// disables forced removal entirely.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrafficDynamics {
    /// Order each passing-enabled link by earliest exit instead of entry.
    pub passing: bool,
    pub seepage: Option<SeepageConfig>,
    /// A vehicle blocked at a link end (or a departure blocked at its first
    /// link) for this long is removed with a `Stuck` event.
    pub stuck_time_secs: Option<u32>,
    pub inbound_order: InboundOrder,
    /// Road length one PCU occupies in a jam, metres.
    pub effective_cell_size_m: f64,
}

impl Default for TrafficDynamics {
    fn default() -> Self {
        Self {
            passing:               false,
            seepage:               None,
            stuck_time_secs:       Some(10),
            inbound_order:         InboundOrder::LinkId,
            effective_cell_size_m: 7.5,
        }
    }
}

impl TrafficDynamics {
    /// # Errors
    ///
    /// [`CoreError::InconsistentConfiguration`] for a non-positive cell size,
    /// a seepage fraction outside `(0, 1]`, or a zero stuck time;
    /// [`CoreError::UnknownMode`] for a seepage mode missing from `modes`.
    pub fn validate(&self, modes: &ModeTable) -> CoreResult<()> {
        if !(self.effective_cell_size_m.is_finite() && self.effective_cell_size_m > 0.0) {
            return Err(CoreError::InconsistentConfiguration(format!(
                "effective_cell_size_m must be positive, got {}",
                self.effective_cell_size_m
            )));
        }
        if self.stuck_time_secs == Some(0) {
            return Err(CoreError::InconsistentConfiguration(
                "stuck_time_secs must be positive when set".into(),
            ));
        }
        if let Some(seep) = &self.seepage {
            if !(seep.capacity_fraction > 0.0 && seep.capacity_fraction <= 1.0) {
                return Err(CoreError::InconsistentConfiguration(format!(
                    "seepage capacity_fraction must be in (0, 1], got {}",
                    seep.capacity_fraction
                )));
            }
            for m in &seep.modes {
                if modes.by_name(m).is_none() {
                    return Err(CoreError::UnknownMode(m.clone()));
                }
            }
        }
        Ok(())
    }

    /// Seepage flag per `ModeId` of `modes`.
    pub fn seep_modes(&self, modes: &ModeTable) -> Vec<bool> {
        let mut flags = vec![false; modes.len()];
        if let Some(seep) = &self.seepage {
            for name in &seep.modes {
                if let Some(ModeId(i)) = modes.by_name(name) {
                    flags[i as usize] = true;
                }
            }
        }
        flags
    }

    /// Stuck threshold in whole ticks (rounded up).
    pub fn stuck_ticks(&self, tick_duration_secs: u32) -> Option<u64> {
        self.stuck_time_secs
            .map(|s| (s as u64).div_ceil(tick_duration_secs.max(1) as u64))
    }
}
