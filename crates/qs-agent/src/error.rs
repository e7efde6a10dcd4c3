use thiserror::Error;

use qs_core::{AgentId, CoreError, ModeId};

use crate::AgentState;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent {agent} cannot go from {from:?} to {to}")]
    InvalidTransition {
        agent: AgentId,
        from:  AgentState,
        to:    &'static str,
    },

    #[error("agent {0} has an empty route")]
    EmptyRoute(AgentId),

    #[error("inconsistent configuration: agent {agent} uses unknown mode {mode}")]
    UnknownMode { agent: AgentId, mode: ModeId },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type AgentResult<T> = Result<T, AgentError>;
