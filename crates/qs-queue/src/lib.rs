//! `qs-queue`: the mesoscopic queue model.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                     |
//! |--------------|--------------------------------------------------------------|
//! | [`dynamics`] | `TrafficDynamics`, `SeepageConfig`, `InboundOrder`           |
//! | [`vehicle`]  | `Vehicle` (owned by exactly one link queue at a time)        |
//! | [`link`]     | `LinkQueue`: storage, flow accumulator, FIFO / passing order |
//! | [`node`]     | `QueueNetwork`, `NodeDecision`, `Move`: node transitions    |
//! | [`error`]    | `QueueError`, `QueueResult<T>`                               |
//!
//! # Token-bucket admission
//!
//! Every interval each link refills its flow accumulator by
//! `capacity × Δt / 3600` PCU.  A ready vehicle leaves only if the
//! accumulator covers its PCU *and* the downstream link has room for it.
//! Storage is charged in PCU on admission and released on departure.
//!
//! # Barrier discipline
//!
//! [`QueueNetwork::decide`] only reads; [`QueueNetwork::commit`] only
//! writes.  Deciding every node of an interval before committing any of them
//! means no node sees another node's writes from the same interval, so the
//! decide half can run in parallel.

pub mod dynamics;
pub mod error;
pub mod link;
pub mod node;
pub mod vehicle;


pub use dynamics::{InboundOrder, SeepageConfig, TrafficDynamics};
pub use error::{QueueError, QueueResult};
pub use link::{LinkQueue, Room};
pub use node::{CommitStats, Move, NodeDecision, QueueNetwork};
pub use vehicle::Vehicle;

/// Tolerance for PCU comparisons; fractional PCUs accumulate rounding error.
pub(crate) const PCU_EPS: f64 = 1e-9;
