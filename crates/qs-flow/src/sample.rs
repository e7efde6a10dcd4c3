//! Per-bin aggregates.

use qs_core::{ModeId, Tick};

/// One bin's estimate for a mode or for all modes together.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlowSample {
    /// Vehicles on the network at the end of the bin.
    pub number_of_agents: u32,
    /// PCU per km of measured length.
    pub density: f64,
    /// PCU per hour entering the reference link, over the trailing window.
    pub flow: f64,
    /// Space-mean speed of traversals completed in the trailing window, m/s.
    pub mean_speed: f64,
}

impl FlowSample {
    /// Mean speed in km/h.
    pub fn mean_speed_kmh(&self) -> f64 {
        self.mean_speed * 3.6
    }
}

/// Everything the tracker produced when a bin closed.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlowBin {
    /// Last interval of the bin.
    pub tick:               Tick,
    pub global:             FlowSample,
    /// Tracked modes in ascending `ModeId` order.
    pub modes:              Vec<(ModeId, FlowSample)>,
    pub globally_permanent: bool,
}
