//! Error types for topology edits and evaluation.

use thiserror::Error;

use crate::graph::NodeId;
use crate::socket::{Direction, PortId};
use crate::value::ValueType;

/// Errors returned by graph and instance mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The node ID does not exist in the graph.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The node's definition has no socket at this port.
    #[error("node {node} has no socket {port}")]
    PortNotFound {
        /// Node that was addressed.
        node: NodeId,
        /// Port that does not exist.
        port: PortId,
    },

    /// A socket was used in the wrong role, e.g. an input as a connection source.
    #[error("socket '{socket}' of node {node} is not an {expected}")]
    WrongDirection {
        /// Node owning the socket.
        node: NodeId,
        /// Socket name.
        socket: String,
        /// Direction the operation requires.
        expected: Direction,
    },

    /// A value or connection does not match the socket's value type.
    #[error("socket '{socket}' carries {expected}, got {found}")]
    TypeMismatch {
        /// Socket name.
        socket: String,
        /// Type the socket declares.
        expected: ValueType,
        /// Type that was supplied.
        found: ValueType,
    },

    /// Every node ID below the sentinel has already been assigned.
    #[error("graph has no node IDs left")]
    CapacityExceeded,

    /// The input declares no default and has no override.
    #[error("input '{socket}' has no default value")]
    MissingDefault {
        /// Socket name.
        socket: String,
    },
}

/// Errors raised while evaluating a node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The node ID does not exist in the graph.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The node's definition has no socket at this port.
    #[error("node {node} has no socket {port}")]
    PortNotFound {
        /// Node that was addressed.
        node: NodeId,
        /// Port that does not exist.
        port: PortId,
    },

    /// An input was written or an output was read from inside `process`.
    #[error("socket '{socket}' of node {node} is not an {expected}")]
    WrongDirection {
        /// Node owning the socket.
        node: NodeId,
        /// Socket name.
        socket: String,
        /// Direction the operation requires.
        expected: Direction,
    },

    /// A value does not have the type its socket declares.
    #[error("socket '{socket}' of node {node} carries {expected}, got {found}")]
    TypeMismatch {
        /// Node owning the socket.
        node: NodeId,
        /// Socket name.
        socket: String,
        /// Type the socket declares.
        expected: ValueType,
        /// Type that was supplied or requested.
        found: ValueType,
    },

    /// The node finished processing without writing this output.
    #[error("node {node} produced no value for output '{socket}'")]
    MissingOutput {
        /// Node that was expected to write the output.
        node: NodeId,
        /// Output socket name.
        socket: String,
    },

    /// The node was pulled again while it was still computing.
    #[error("cycle detected at node {node}")]
    CycleDetected {
        /// Node that was re-entered.
        node: NodeId,
    },

    /// Upstream resolution nested deeper than the configured limit.
    #[error("evaluation depth limit {limit} exceeded at node {node}")]
    DepthExceeded {
        /// Node whose resolution would have exceeded the limit.
        node: NodeId,
        /// Configured limit.
        limit: usize,
    },

    /// The node's own processing logic reported a failure.
    #[error("node {node} failed: {message}")]
    NodeFailed {
        /// Failing node.
        node: NodeId,
        /// Message supplied by the node.
        message: String,
    },

    /// Persistent state stored for the node is not of the definition's state type.
    #[error("state of node {node} does not match its definition")]
    StateMismatch {
        /// Node whose state was rejected.
        node: NodeId,
    },
}

impl EvalError {
    /// Node the error is attributed to, if any.
    pub fn node(&self) -> NodeId {
        match self {
            EvalError::NodeNotFound(node)
            | EvalError::PortNotFound { node, .. }
            | EvalError::WrongDirection { node, .. }
            | EvalError::TypeMismatch { node, .. }
            | EvalError::MissingOutput { node, .. }
            | EvalError::CycleDetected { node }
            | EvalError::DepthExceeded { node, .. }
            | EvalError::NodeFailed { node, .. }
            | EvalError::StateMismatch { node } => *node,
        }
    }
}
