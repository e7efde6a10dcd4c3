//! `qs-events`: the event emission channel.
//!
//! Every physical transition in the engine produces exactly one immutable
//! [`Event`].  Events of one interval are dispatched, in the order they were
//! produced, to an explicit ordered list of [`EventSubscriber`]s held by the
//! [`EventBus`].  Nothing is dispatched behind the caller's back.
//!
//! | Module         | Contents                                   |
//! |----------------|--------------------------------------------|
//! | [`event`]      | `Event`, `EventKind`                       |
//! | [`subscriber`] | `EventSubscriber` trait                    |
//! | [`bus`]        | `EventBus`, `SubscriberId`                 |
//! | [`log`]        | `EventLog` (append-only, itself a subscriber) |

pub mod bus;
pub mod event;
pub mod log;
pub mod subscriber;

#[cfg(test)]
mod tests;

pub use bus::{EventBus, SubscriberId};
pub use event::{Event, EventKind};
pub use log::EventLog;
pub use subscriber::EventSubscriber;
