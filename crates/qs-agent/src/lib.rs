//! `qs-agent`: agents, their trip state machine, and the next-link contract.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`driver`]     | `Driver` (tagged next-link capability), `LinkChooser`, `Ring`, `RouteContext` |
//! | [`state`]      | `Agent`, `AgentState`, `TripOutcome`                      |
//! | [`population`] | `Population`, `PopulationBuilder`                         |
//! | [`departure`]  | `DepartureQueue` (sparse tick → agents map)               |
//! | [`error`]      | `AgentError`, `AgentResult<T>`                            |
//!
//! The engine never routes.  It asks an agent's [`Driver`] for the first link
//! at departure and for the next link each time the vehicle reaches a link
//! end; `None` means the trip is over.

pub mod departure;
pub mod driver;
pub mod error;
pub mod population;
pub mod state;

#[cfg(test)]
mod tests;

pub use departure::DepartureQueue;
pub use driver::{Driver, LinkChooser, Ring, RouteContext};
pub use error::{AgentError, AgentResult};
pub use population::{Population, PopulationBuilder};
pub use state::{Agent, AgentState, TripOutcome};
