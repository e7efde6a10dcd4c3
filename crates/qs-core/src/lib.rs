//! `qs-core`: foundational types for the `rust_qsim` queue simulation.
//!
//! Every other `qs-*` crate depends on this one.  It has no `qs-*`
//! dependencies and only `rand` and `thiserror` externally (plus optional
//! `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`ids`]     | `AgentId`, `VehicleId`, `LinkId`, `NodeId`, `ModeId`      |
//! | [`time`]    | `Tick`, `SimClock`, `SimConfig`                           |
//! | [`vehicle`] | `VehicleType`, `ModeTable` (PCU / max speed per mode)     |
//! | [`rng`]     | `AgentRng` (per-agent, deterministic)                     |
//! | [`math`]    | `gcd`, `lcm`, `gcd_of` for modal-split step sizing        |
//! | [`error`]   | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod ids;
pub mod math;
pub mod rng;
pub mod time;
pub mod vehicle;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{AgentId, LinkId, ModeId, NodeId, VehicleId};
pub use rng::AgentRng;
pub use time::{SimClock, SimConfig, Tick};
pub use vehicle::{ModeTable, VehicleType};
