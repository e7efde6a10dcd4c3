//! The next-link capability.
//!
//! An agent owns exactly one [`Driver`], chosen when the agent is created.
//! The engine only ever asks two questions of it:
//!
//! - at departure: *which link do you start on?*
//! - at each link end: *which link next?* (`None` = arrive here)
//!
//! Both queries are pure with respect to engine state.  The only run state a
//! driver may look at is the read-only [`RouteContext`].

use std::fmt;
use std::sync::Arc;

use qs_core::{AgentId, LinkId, Tick};

// ── RouteContext ──────────────────────────────────────────────────────────────

/// Read-only run state handed to every next-link query.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteContext {
    /// The interval being simulated.
    pub now: Tick,
    /// Global flow permanence as committed at the end of the previous
    /// interval.
    pub flow_permanent: bool,
}

// ── LinkChooser ───────────────────────────────────────────────────────────────

/// Externally routed agents.  Implemented by collaborators that own route
/// or plan data outside the engine.
///
/// Implementations must be `Send + Sync`: the node phase may query many
/// agents in parallel.
pub trait LinkChooser: Send + Sync {
    fn first_link(&self, agent: AgentId, ctx: &RouteContext) -> LinkId;

    fn next_link(&self, agent: AgentId, current: LinkId, ctx: &RouteContext) -> Option<LinkId>;
}

// ── Ring ──────────────────────────────────────────────────────────────────────

/// A closed loop with an entry and an exit, driven round and round until
/// flow becomes permanent.
///
/// ```text
/// home → ring[0] → ring[1] → … → ring[n-1] → ring[0] → …
///                        └─ at `exit_after`, once permanent → exit → arrive
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Ring {
    pub home:       LinkId,
    pub ring:       Vec<LinkId>,
    pub exit_after: LinkId,
    pub exit:       LinkId,
}

impl Ring {
    fn next(&self, current: LinkId, ctx: &RouteContext) -> Option<LinkId> {
        if current == self.exit {
            return None;
        }
        if current == self.home {
            return self.ring.first().copied();
        }
        if current == self.exit_after && ctx.flow_permanent {
            return Some(self.exit);
        }
        let i = self.ring.iter().position(|&l| l == current)?;
        Some(self.ring[(i + 1) % self.ring.len()])
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

/// Tagged next-link capability.
#[derive(Clone)]
pub enum Driver {
    /// Follow a fixed link sequence, arriving at the end of the last link.
    FixedRoute(Arc<[LinkId]>),

    /// Circle a [`Ring`] until flow is permanent, then leave.
    RoundAndRound(Arc<Ring>),

    /// Ask an external chooser.
    External(Arc<dyn LinkChooser>),
}

impl Driver {
    pub fn fixed(route: impl Into<Arc<[LinkId]>>) -> Self {
        Driver::FixedRoute(route.into())
    }

    /// Whether a due departure still starts.  A ring driver stays home once
    /// flow is permanent.
    pub fn departs(&self, ctx: &RouteContext) -> bool {
        match self {
            Driver::RoundAndRound(_) => !ctx.flow_permanent,
            Driver::FixedRoute(_) | Driver::External(_) => true,
        }
    }

    /// The link a departing vehicle is inserted on.  `None` only for an
    /// empty fixed route, which population building rejects.
    pub fn first_link(&self, agent: AgentId, ctx: &RouteContext) -> Option<LinkId> {
        match self {
            Driver::FixedRoute(route) => route.first().copied(),
            Driver::RoundAndRound(ring) => Some(ring.home),
            Driver::External(chooser) => Some(chooser.first_link(agent, ctx)),
        }
    }

    /// The link after `current`, or `None` to arrive at the end of `current`.
    ///
    /// `step` is the index of `current` in the agent's trip (0 for the first
    /// link); fixed routes use it so that a route may revisit a link.
    pub fn next_link(
        &self,
        agent:   AgentId,
        current: LinkId,
        step:    u32,
        ctx:     &RouteContext,
    ) -> Option<LinkId> {
        match self {
            Driver::FixedRoute(route) => route.get(step as usize + 1).copied(),
            Driver::RoundAndRound(ring) => ring.next(current, ctx),
            Driver::External(chooser) => chooser.next_link(agent, current, ctx),
        }
    }
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Driver::FixedRoute(route) => f.debug_tuple("FixedRoute").field(&route.len()).finish(),
            Driver::RoundAndRound(ring) => f.debug_tuple("RoundAndRound").field(&ring.ring.len()).finish(),
            Driver::External(_) => f.write_str("External"),
        }
    }
}
