//! `qs-network`: the directed link/node graph the queue engine runs on.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`network`] | `Network` (CSR adjacency), `Link`, `Node`, `NetworkBuilder` |
//! | [`change`]  | `NetworkChange`: timed speed / capacity override           |
//! | [`error`]   | `NetworkError`, `NetworkResult<T>`                          |
//!
//! The network is immutable for a run except through [`NetworkChange`]s,
//! which the stepper applies at their scheduled interval.

pub mod change;
pub mod error;
pub mod network;


pub use change::NetworkChange;
pub use error::{NetworkError, NetworkResult};
pub use network::{Link, LinkAttrs, Network, NetworkBuilder, Node};
