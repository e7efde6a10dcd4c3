//! `qs-flow`: run instrumentation fed by the event stream.
//!
//! | Module      | Contents                                                     |
//! |-------------|--------------------------------------------------------------|
//! | [`config`]  | `TrackerConfig`                                              |
//! | [`sample`]  | `FlowSample`, `FlowBin`                                      |
//! | [`tracker`] | `FlowDynamicsTracker`: density / flow / speed, permanence   |
//! | [`passing`] | `PassingCounter`: overtakes per link and per mode pair      |
//!
//! Both consumers are [`EventSubscriber`](qs_events::EventSubscriber)s and
//! only read events; they never touch engine state.
//!
//! # Cargo features
//!
//! | Feature   | Effect                                                    |
//! |-----------|-----------------------------------------------------------|
//! | `fx-hash` | FxHash instead of SipHash for per-vehicle maps.           |
//! | `serde`   | `Serialize`/`Deserialize` on config and samples.          |

pub mod config;
pub mod passing;
pub mod sample;
pub mod tracker;


pub use config::TrackerConfig;
pub use passing::PassingCounter;
pub use sample::{FlowBin, FlowSample};
pub use tracker::FlowDynamicsTracker;

#[cfg(feature = "fx-hash")]
pub(crate) type Map<K, V> = rustc_hash::FxHashMap<K, V>;

#[cfg(not(feature = "fx-hash"))]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V>;
