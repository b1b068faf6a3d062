//! Error types for graph editing.

use thiserror::Error;

use crate::{GraphId, NodeId, PinId};

// ============================================================================
// Graph Errors
// ============================================================================

/// Errors raised by structural graph edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("graph {0:?} not found")]
    GraphNotFound(GraphId),

    #[error("node {0:?} not found")]
    NodeNotFound(NodeId),

    #[error("pin {0:?} not found")]
    PinNotFound(PinId),

    #[error("node {node:?} has no pin named '{name}'")]
    PinNameNotFound { node: NodeId, name: String },

    /// Both pins face the same way.
    #[error("cannot link pins {a:?} and {b:?}: same direction")]
    SameDirection { a: PinId, b: PinId },

    /// Linking a pin to another pin of the same node.
    #[error("cannot link pins {a:?} and {b:?}: same node")]
    SameNode { a: PinId, b: PinId },

    /// The node kind has no editable output list, or removing would leave it empty.
    #[error("node {0:?} does not support this pin edit")]
    UnsupportedPinEdit(NodeId),
}

/// Result alias for graph edits.
pub type GraphResult<T> = std::result::Result<T, GraphError>;
