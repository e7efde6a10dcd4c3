//! `qs-sim`: interval loop orchestrator for the rust_qsim engine.
//!
//! # Interval loop
//!
//! ```text
//! for tick in 0..config.end_tick():
//!   ① Changes    : apply NetworkChanges due by this interval.
//!   ② Refill     : every link's flow accumulator gains one budget.
//!   ③ Departures : insert due agents on their first link; a full link
//!                  keeps the agent waiting (or removes it as stuck).
//!   ④ Decide     : each node computes its moves from committed state
//!                  (parallel with the `parallel` feature).
//!   ⑤ Commit     : apply decisions in ascending NodeId order.
//!   ⑥ Dispatch   : tracker, bus subscribers, observer, event log.
//!   ⑦ Terminate? : consult the termination predicate.
//! ```
//!
//! # Modules
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`builder`]     | `SimBuilder`                                          |
//! | [`sim`]         | `Sim`, the loop itself                                |
//! | [`observer`]    | `SimObserver`, `NoopObserver`                         |
//! | [`termination`] | `TerminationPredicate`, `FlowPermanent`, `NetworkEmpty`, `CancelHandle` |
//! | [`summary`]     | `IntervalSummary`, `RunSummary`                       |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the decide phase on Rayon's thread pool.          |
//! | `serde`    | Derives `Serialize`/`Deserialize` on the summaries.    |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use qs_sim::{NoopObserver, SimBuilder};
//!
//! let mut sim = SimBuilder::new(config, network, modes, population).build()?;
//! let summary = sim.run(&mut NoopObserver)?;
//! println!("{} arrived, {} stuck", summary.arrived, summary.stuck);
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;
pub mod summary;
pub mod termination;


pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::Sim;
pub use summary::{IntervalSummary, RunSummary};
pub use termination::{CancelHandle, FlowPermanent, NetworkEmpty, TerminationContext, TerminationPredicate};
