//! Per-agent trip state machine.
//!
//! ```text
//! Inactive ──depart time──▶ Waiting ──inserted──▶ Moving ──next = None──▶ Arriving ──▶ Inactive
//!                              │                     │ (link to link)
//!                              └───── stuck ─────────┴──────────────────────────────▶ Inactive
//! ```
//!
//! An agent whose driver declines to start is skipped straight from
//! `Inactive` or `Waiting`.
//!
//! The terminal `Inactive` state is distinguished from the initial one by
//! [`Agent::outcome`].

use qs_core::{AgentId, LinkId, ModeId, Tick};

use crate::{AgentError, AgentResult, Driver};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgentState {
    /// At an activity: before departure, or after the trip ended.
    Inactive,
    /// Departure time reached, not yet admitted onto the first link.
    Waiting { since: Tick },
    /// On `link`, which is the `step`-th link of the trip.
    Moving { link: LinkId, step: u32 },
    /// Leaving the network at the end of `link`.
    Arriving { link: LinkId },
}

/// How a finished trip ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TripOutcome {
    Arrived,
    Stuck,
    /// Never entered the network.
    Skipped,
}

/// One member of the population.
#[derive(Clone, Debug)]
pub struct Agent {
    pub id:             AgentId,
    pub mode:           ModeId,
    pub departure_secs: u32,
    pub driver:         Driver,
    state:              AgentState,
    outcome:            Option<TripOutcome>,
}

impl Agent {
    pub fn new(id: AgentId, mode: ModeId, departure_secs: u32, driver: Driver) -> Self {
        Self {
            id,
            mode,
            departure_secs,
            driver,
            state: AgentState::Inactive,
            outcome: None,
        }
    }

    #[inline]
    pub fn state(&self) -> AgentState {
        self.state
    }

    #[inline]
    pub fn outcome(&self) -> Option<TripOutcome> {
        self.outcome
    }

    /// Current link while moving, else `None`.
    pub fn current_link(&self) -> Option<LinkId> {
        match self.state {
            AgentState::Moving { link, .. } => Some(link),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    fn invalid(&self, to: &'static str) -> AgentError {
        AgentError::InvalidTransition { agent: self.id, from: self.state, to }
    }

    /// `Inactive → Waiting`.  Idempotent while already waiting.
    pub fn begin_waiting(&mut self, now: Tick) -> AgentResult<()> {
        match self.state {
            AgentState::Inactive if self.outcome.is_none() => {
                self.state = AgentState::Waiting { since: now };
                Ok(())
            }
            AgentState::Waiting { .. } => Ok(()),
            _ => Err(self.invalid("Waiting")),
        }
    }

    /// `Waiting → Moving` onto the first link.
    pub fn depart(&mut self, link: LinkId) -> AgentResult<()> {
        match self.state {
            AgentState::Waiting { .. } => {
                self.state = AgentState::Moving { link, step: 0 };
                Ok(())
            }
            _ => Err(self.invalid("Moving")),
        }
    }

    /// `Moving → Moving` onto `next`.
    pub fn advance(&mut self, next: LinkId) -> AgentResult<()> {
        match self.state {
            AgentState::Moving { step, .. } => {
                self.state = AgentState::Moving { link: next, step: step + 1 };
                Ok(())
            }
            _ => Err(self.invalid("Moving")),
        }
    }

    /// `Moving → Arriving`.
    pub fn arrive(&mut self) -> AgentResult<()> {
        match self.state {
            AgentState::Moving { link, .. } => {
                self.state = AgentState::Arriving { link };
                Ok(())
            }
            _ => Err(self.invalid("Arriving")),
        }
    }

    /// `Arriving → Inactive`, ending the trip.
    pub fn complete(&mut self) -> AgentResult<()> {
        match self.state {
            AgentState::Arriving { .. } => {
                self.state = AgentState::Inactive;
                self.outcome = Some(TripOutcome::Arrived);
                Ok(())
            }
            _ => Err(self.invalid("Inactive")),
        }
    }

    /// Give up the trip before entering the network.
    pub fn skip(&mut self) -> AgentResult<()> {
        match self.state {
            AgentState::Inactive if self.outcome.is_none() => {
                self.outcome = Some(TripOutcome::Skipped);
                Ok(())
            }
            AgentState::Waiting { .. } => {
                self.state = AgentState::Inactive;
                self.outcome = Some(TripOutcome::Skipped);
                Ok(())
            }
            _ => Err(self.invalid("Inactive")),
        }
    }

    /// Forced removal from `Waiting` or `Moving`.
    pub fn abort(&mut self) -> AgentResult<()> {
        match self.state {
            AgentState::Waiting { .. } | AgentState::Moving { .. } => {
                self.state = AgentState::Inactive;
                self.outcome = Some(TripOutcome::Stuck);
                Ok(())
            }
            _ => Err(self.invalid("Inactive")),
        }
    }
}
