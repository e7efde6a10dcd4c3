//! Vehicle types and the per-run mode table.
//!
//! A mode is identified by its position in the [`ModeTable`] (`ModeId`).
//! Each vehicle type carries its passenger-car-equivalent weight (PCU),
//! which is what links charge against storage and flow capacity, and its
//! maximum speed, which caps the link free-flow speed for that vehicle.

use crate::{CoreError, CoreResult, ModeId};

/// Physical parameters of one travel mode.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleType {
    /// Mode name, unique within a table (`"car"`, `"bike"`, …).
    pub name: String,
    /// Passenger-car equivalents consumed on a link.
    pub pcu: f64,
    /// Maximum speed in m/s.
    pub max_speed_mps: f64,
}

impl VehicleType {
    pub fn new(name: impl Into<String>, pcu: f64, max_speed_mps: f64) -> Self {
        Self { name: name.into(), pcu, max_speed_mps }
    }

    /// Mixed-traffic presets used by fundamental-diagram studies.
    ///
    /// | mode        | PCU  | max speed |
    /// |-------------|------|-----------|
    /// | `car`       | 1.0  | 60 km/h   |
    /// | `motorbike` | 0.25 | 60 km/h   |
    /// | `bike`      | 0.25 | 15 km/h   |
    /// | `walk`      | 0.10 | 5 km/h    |
    /// | `truck`     | 3.0  | 30 km/h   |
    pub fn preset(name: &str) -> Option<Self> {
        let (pcu, kmh) = match name {
            "car"       => (1.0, 60.0),
            "motorbike" => (0.25, 60.0),
            "bike"      => (0.25, 15.0),
            "walk"      => (0.10, 5.0),
            "truck"     => (3.0, 30.0),
            _ => return None,
        };
        Some(Self::new(name, pcu, kmh / 3.6))
    }
}

/// The vehicle types participating in one run, indexed by [`ModeId`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeTable {
    types: Vec<VehicleType>,
}

impl ModeTable {
    /// Validate and wrap `types`.
    ///
    /// # Errors
    ///
    /// [`CoreError::InconsistentConfiguration`] for an empty table, duplicate
    /// names, or a non-positive / non-finite PCU or speed.
    pub fn new(types: Vec<VehicleType>) -> CoreResult<Self> {
        if types.is_empty() {
            return Err(CoreError::InconsistentConfiguration("mode table is empty".into()));
        }
        if types.len() > u16::MAX as usize {
            return Err(CoreError::InconsistentConfiguration("too many modes".into()));
        }
        for (i, t) in types.iter().enumerate() {
            if !(t.pcu.is_finite() && t.pcu > 0.0) {
                return Err(CoreError::InconsistentConfiguration(format!(
                    "mode `{}` has non-positive PCU {}", t.name, t.pcu
                )));
            }
            if !(t.max_speed_mps.is_finite() && t.max_speed_mps > 0.0) {
                return Err(CoreError::InconsistentConfiguration(format!(
                    "mode `{}` has non-positive max speed {}", t.name, t.max_speed_mps
                )));
            }
            if types[..i].iter().any(|o| o.name == t.name) {
                return Err(CoreError::InconsistentConfiguration(format!(
                    "mode `{}` listed twice", t.name
                )));
            }
        }
        Ok(Self { types })
    }

    /// Build a table from preset names (see [`VehicleType::preset`]).
    pub fn from_presets(names: &[&str]) -> CoreResult<Self> {
        let types = names
            .iter()
            .map(|n| VehicleType::preset(n).ok_or_else(|| CoreError::UnknownMode((*n).to_owned())))
            .collect::<CoreResult<Vec<_>>>()?;
        Self::new(types)
    }

    #[inline]
    pub fn get(&self, mode: ModeId) -> &VehicleType {
        &self.types[mode.index()]
    }

    #[inline]
    pub fn pcu(&self, mode: ModeId) -> f64 {
        self.types[mode.index()].pcu
    }

    pub fn by_name(&self, name: &str) -> Option<ModeId> {
        self.types.iter().position(|t| t.name == name).map(|i| ModeId(i as u16))
    }

    /// `true` if `mode` is a valid index into this table.
    #[inline]
    pub fn contains(&self, mode: ModeId) -> bool {
        mode.index() < self.types.len()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModeId, &VehicleType)> {
        self.types.iter().enumerate().map(|(i, t)| (ModeId(i as u16), t))
    }

    /// Largest PCU of any mode; the lower bound for link storage and the
    /// flow-accumulator ceiling.
    pub fn max_pcu(&self) -> f64 {
        self.types.iter().map(|t| t.pcu).fold(0.0, f64::max)
    }
}
