//! Append-only in-memory event log.

use qs_core::{AgentId, LinkId};

use crate::{Event, EventKind, EventSubscriber};

/// Every event, in emission order.  Events can only be appended.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    pub fn for_agent(&self, agent: AgentId) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.agent == agent)
    }

    pub fn on_link(&self, link: LinkId) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.link == link)
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl EventSubscriber for EventLog {
    fn handle(&mut self, event: &Event) {
        self.push(*event);
    }
}
