//! The subscriber trait.

use std::sync::{Arc, Mutex, PoisonError};

use qs_core::Tick;

use crate::Event;

/// A read-only consumer of the event stream.
///
/// `handle` is called synchronously, once per event, in emission order.
/// `on_interval_end` is called once after the last event of each interval.
pub trait EventSubscriber {
    fn handle(&mut self, event: &Event);

    fn on_interval_end(&mut self, _tick: Tick) {}
}

/// Lets a caller keep a handle on a subscriber that the bus owns, and read
/// its state after the run.  A poisoned lock is recovered so no event is
/// skipped.
impl<S: EventSubscriber> EventSubscriber for Arc<Mutex<S>> {
    fn handle(&mut self, event: &Event) {
        self.lock().unwrap_or_else(PoisonError::into_inner).handle(event);
    }

    fn on_interval_end(&mut self, tick: Tick) {
        self.lock().unwrap_or_else(PoisonError::into_inner).on_interval_end(tick);
    }
}
