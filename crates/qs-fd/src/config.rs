//! Sweep configuration.

use qs_core::{CoreError, CoreResult, ModeTable, SimConfig};
use qs_flow::TrackerConfig;
use qs_queue::TrafficDynamics;

use crate::TrackConfig;

/// How the agent counts of the points are chosen.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PointSource {
    /// Multiples of the smallest integer mix matching `modal_split_pcu`.
    #[default]
    ModalSplit,
    /// Every combination on a grid, `reduce_factor` apart per mode.
    Distribution,
}

/// One fundamental-diagram sweep.
///
/// | Field                   | Default                          |
/// |-------------------------|----------------------------------|
/// | `modes`                 | `["car", "bike"]`                |
/// | `modal_split_pcu`       | `[1.0, 1.0]`                     |
/// | `reduce_factor`         | `1`                              |
/// | `points`                | `ModalSplit`                     |
/// | `departure_window_secs` | `900`                            |
/// | `track`                 | `TrackConfig::default()`         |
/// | `dynamics`              | passing on, otherwise default    |
/// | `tracker`               | `TrackerConfig::default()`       |
/// | `sim`                   | 4 h from midnight, default seed  |
///
/// Modes are vehicle-type preset names; their order fixes the `ModeId`s
/// and the column order of the output table.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FdConfig {
    pub modes:                 Vec<String>,
    /// Share of each mode in PCU, same order as `modes`.
    pub modal_split_pcu:       Vec<f64>,
    /// Thins the sweep: steps are multiplied by this factor.
    pub reduce_factor:         u32,
    pub points:                PointSource,
    /// Departures are spread over `[start, start + window)`.
    pub departure_window_secs: u32,
    pub track:                 TrackConfig,
    pub dynamics:              TrafficDynamics,
    /// `reference_link` is always the first base link;
    /// `measured_length_m: None` measures over the ring only.
    pub tracker:               TrackerConfig,
    pub sim:                   SimConfig,
}

impl Default for FdConfig {
    fn default() -> Self {
        Self {
            modes:                 vec!["car".into(), "bike".into()],
            modal_split_pcu:       vec![1.0, 1.0],
            reduce_factor:         1,
            points:                PointSource::ModalSplit,
            departure_window_secs: 900,
            track:                 TrackConfig::default(),
            dynamics:              TrafficDynamics { passing: true, ..TrafficDynamics::default() },
            tracker:               TrackerConfig::default(),
            sim:                   SimConfig { end_secs: 4 * 3_600, ..SimConfig::default() },
        }
    }
}

impl FdConfig {
    /// # Errors
    ///
    /// [`CoreError::InconsistentConfiguration`] for no modes, a repeated
    /// mode, a modal split whose length differs from `modes`, a split share
    /// below one hundredth, a zero reduce factor or departure window, or an
    /// invalid track.
    pub fn validate(&self) -> CoreResult<()> {
        if self.modes.is_empty() {
            return Err(CoreError::InconsistentConfiguration("a sweep needs at least one mode".into()));
        }
        for (i, m) in self.modes.iter().enumerate() {
            if self.modes[..i].contains(m) {
                return Err(CoreError::InconsistentConfiguration(format!("mode `{m}` listed twice")));
            }
        }
        if self.modal_split_pcu.len() != self.modes.len() {
            return Err(CoreError::InconsistentConfiguration(format!(
                "modal split has {} shares for {} modes",
                self.modal_split_pcu.len(),
                self.modes.len()
            )));
        }
        if let Some(s) = self.modal_split_pcu.iter().find(|s| !(s.is_finite() && **s >= 0.01)) {
            return Err(CoreError::InconsistentConfiguration(format!(
                "modal split shares must be >= 0.01, got {s}"
            )));
        }
        if self.reduce_factor == 0 {
            return Err(CoreError::InconsistentConfiguration("reduce_factor must be >= 1".into()));
        }
        if self.departure_window_secs == 0 {
            return Err(CoreError::InconsistentConfiguration("departure_window_secs must be > 0".into()));
        }
        self.track.validate()
    }

    /// Mode table in `modes` order.
    ///
    /// # Errors
    ///
    /// [`CoreError::UnknownMode`] for a name without a preset.
    pub fn mode_table(&self) -> CoreResult<ModeTable> {
        let names: Vec<&str> = self.modes.iter().map(String::as_str).collect();
        ModeTable::from_presets(&names)
    }
}
