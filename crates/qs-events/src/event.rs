//! The event record.

use std::fmt;

use qs_core::{AgentId, LinkId, Tick};

/// What happened.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// The agent left its activity; always followed by `LinkEntered` on the
    /// first link in the same interval.
    Departed,
    LinkEntered,
    LinkLeft,
    /// The trip ended at the end of `link`; follows the final `LinkLeft`.
    Arrived,
    /// The vehicle was force-removed from `link` (or never got onto it).
    Stuck,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Departed    => "departed",
            EventKind::LinkEntered => "linkEntered",
            EventKind::LinkLeft    => "linkLeft",
            EventKind::Arrived     => "arrived",
            EventKind::Stuck       => "stuck",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    pub time:  Tick,
    pub kind:  EventKind,
    pub agent: AgentId,
    pub link:  LinkId,
}

impl Event {
    #[inline]
    pub fn new(time: Tick, kind: EventKind, agent: AgentId, link: LinkId) -> Self {
        Self { time, kind, agent, link }
    }

    pub fn departed(time: Tick, agent: AgentId, link: LinkId) -> Self {
        Self::new(time, EventKind::Departed, agent, link)
    }

    pub fn entered(time: Tick, agent: AgentId, link: LinkId) -> Self {
        Self::new(time, EventKind::LinkEntered, agent, link)
    }

    pub fn left(time: Tick, agent: AgentId, link: LinkId) -> Self {
        Self::new(time, EventKind::LinkLeft, agent, link)
    }

    pub fn arrived(time: Tick, agent: AgentId, link: LinkId) -> Self {
        Self::new(time, EventKind::Arrived, agent, link)
    }

    pub fn stuck(time: Tick, agent: AgentId, link: LinkId) -> Self {
        Self::new(time, EventKind::Stuck, agent, link)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.time, self.kind, self.agent, self.link)
    }
}
