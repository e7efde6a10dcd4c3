//! Ordered, synchronous subscriber list.

use qs_core::Tick;

use crate::{Event, EventSubscriber};

/// Position of a subscriber in its bus; dispatch order is ascending.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubscriberId(pub usize);

/// Dispatches each event to every subscriber in registration order.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Box<dyn EventSubscriber + Send>>,
    emitted:     u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<S: EventSubscriber + Send + 'static>(&mut self, subscriber: S) -> SubscriberId {
        self.subscribers.push(Box::new(subscriber));
        SubscriberId(self.subscribers.len() - 1)
    }

    #[inline]
    pub fn emit(&mut self, event: &Event) {
        self.emitted += 1;
        for s in &mut self.subscribers {
            s.handle(event);
        }
    }

    /// Emit a whole interval's batch in order.
    pub fn emit_all(&mut self, events: &[Event]) {
        for e in events {
            self.emit(e);
        }
    }

    pub fn end_interval(&mut self, tick: Tick) {
        for s in &mut self.subscribers {
            s.on_interval_end(tick);
        }
    }

    /// Total events dispatched so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
