use thiserror::Error;

use qs_agent::AgentError;
use qs_core::{AgentId, CoreError, LinkId, NodeId};

#[derive(Debug, Error)]
pub enum QueueError {
    /// Recoverable: turned into spillback or a departure retry by callers.
    #[error("capacity exceeded on {link}: need {required} PCU, {available} free")]
    CapacityExceeded {
        link:      LinkId,
        required:  f64,
        available: f64,
    },

    #[error("agent {agent} chose {next}, which does not leave {node}")]
    NotOutgoing {
        agent: AgentId,
        next:  LinkId,
        node:  NodeId,
    },

    #[error("agent {agent} chose unknown link {link}")]
    UnknownLink { agent: AgentId, link: LinkId },

    #[error("agent {agent} is not queued on {link}")]
    VehicleMissing { link: LinkId, agent: AgentId },

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl QueueError {
    pub fn is_capacity(&self) -> bool {
        matches!(self, QueueError::CapacityExceeded { .. })
    }
}

pub type QueueResult<T> = Result<T, QueueError>;
