//! Topology errors.  All of them are fatal at setup.

use thiserror::Error;

use qs_core::{LinkId, NodeId};

/// Errors produced while building or changing a [`Network`](crate::Network).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("invalid topology: link `{link}` references unknown node {node}")]
    DanglingNode { link: String, node: NodeId },

    #[error("invalid topology: link `{link}` has non-positive {what} ({value})")]
    NonPositive {
        link:  String,
        what:  &'static str,
        value: f64,
    },

    #[error("invalid topology: link name `{0}` used twice")]
    DuplicateLink(String),

    #[error("invalid topology: node name `{0}` used twice")]
    DuplicateNode(String),

    #[error("invalid topology: link {0} does not exist")]
    UnknownLink(LinkId),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
