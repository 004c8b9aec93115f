use crate::id::NodeId;
use thiserror::Error;

/// Errors raised by graph operations.
///
/// None of these are fatal: the editor declines the gesture that caused
/// them, and a `Decode` failure on load is replaced by an empty graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("node {0} not found")]
    NotFound(NodeId),

    #[error("failed to decode graph: {0}")]
    Decode(String),
}

impl GraphError {
    pub fn self_link(id: NodeId) -> Self {
        Self::InvalidOperation(format!("cannot link node {id} to itself"))
    }
}
