//! `qs-fd`: fundamental-diagram harness for the rust_qsim engine.
//!
//! A sweep runs one simulation per point on a closed triangular track.
//! Drivers circle the ring until flow, speed and density have been stable
//! long enough, then leave; the frozen permanent samples of the valid
//! points form the fundamental diagram.
//!
//! # Modules
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | [`track`]  | `TrackConfig`, `TriangleTrack`                             |
//! | [`config`] | `FdConfig`, `PointSource`                                  |
//! | [`points`] | modal-split and distribution point generation              |
//! | [`assess`] | `Assessment`, the validity rules of a finished run         |
//! | [`sweep`]  | `FdSweep`, `FdPoint`                                       |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                     |
//! |------------|------------------------------------------------------------|
//! | `parallel` | Forwards to `qs-sim/parallel`.                             |
//! | `serde`    | Derives `Serialize`/`Deserialize` on configs and results.  |

pub mod assess;
pub mod config;
pub mod error;
pub mod points;
pub mod sweep;
pub mod track;

#[cfg(test)]
mod tests;

pub use assess::{Assessment, assess};
pub use config::{FdConfig, PointSource};
pub use error::{FdError, FdResult};
pub use sweep::{FdPoint, FdSweep};
pub use track::{TrackConfig, TriangleTrack};
