use thiserror::Error;

use qs_agent::AgentError;
use qs_core::CoreError;
use qs_network::NetworkError;
use qs_output::OutputError;
use qs_sim::SimError;

/// Errors that abort a sweep.  An invalid point is not an error; it is
/// reported through [`FdPoint::assessment`](crate::FdPoint::assessment).
#[derive(Debug, Error)]
pub enum FdError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("invalid track: {0}")]
    Network(#[from] NetworkError),

    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("point run failed: {0}")]
    Sim(#[from] SimError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

pub type FdResult<T> = Result<T, FdError>;
