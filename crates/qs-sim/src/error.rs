use qs_agent::AgentError;
use qs_core::CoreError;
use qs_network::NetworkError;
use qs_queue::QueueError;
use thiserror::Error;

/// Fatal errors of a run.  Setup errors come out of
/// [`SimBuilder::build`](crate::SimBuilder::build) before any interval runs.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("invalid topology: {0}")]
    Network(#[from] NetworkError),

    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[cfg(feature = "parallel")]
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type SimResult<T> = Result<T, SimError>;
