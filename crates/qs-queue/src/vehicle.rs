//! Vehicles on link queues.

use qs_core::{AgentId, ModeId, ModeTable, Tick, VehicleId};

/// A vehicle, owned by the link queue it is on.  Created at insertion,
/// moved (not copied) between queues, dropped on arrival.
#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    pub id:            VehicleId,
    pub agent:         AgentId,
    pub mode:          ModeId,
    pub pcu:           f64,
    pub max_speed_mps: f64,
    /// Tick the vehicle entered its current link.
    pub entered:       Tick,
    /// Earliest tick it may leave its current link.
    pub exit_tick:     Tick,
    /// Admitted into the link's seepage pool rather than regular storage.
    pub seeping:       bool,
    /// Admission sequence on the current link; FIFO key and passing tie-break.
    pub(crate) seq:    u64,
}

impl Vehicle {
    pub fn new(agent: AgentId, mode: ModeId, modes: &ModeTable) -> Self {
        let t = modes.get(mode);
        Self {
            id:            VehicleId::from(agent),
            agent,
            mode,
            pcu:           t.pcu,
            max_speed_mps: t.max_speed_mps,
            entered:       Tick::ZERO,
            exit_tick:     Tick::ZERO,
            seeping:       false,
            seq:           0,
        }
    }

    #[inline]
    pub(crate) fn order_key(&self) -> (Tick, u64) {
        (self.exit_tick, self.seq)
    }
}
