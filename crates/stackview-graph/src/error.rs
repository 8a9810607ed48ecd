use crate::graph::{EdgeIndex, ElementRef, NodeIndex};
use stackview_core::{EdgeId, NodeId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Invalid view scale: {value} (must be finite and positive)")]
    InvalidScale { value: f64 },
    #[error("Invalid marker size: {value} (must be finite and positive)")]
    InvalidMarkerSize { value: f32 },
    #[error("No node with index {0} in the overlay")]
    UnknownNode(NodeId),
    #[error("No edge with index {0} in the overlay")]
    UnknownEdge(EdgeId),
    #[error("Node slot {0} is out of range")]
    NodeOutOfRange(NodeIndex),
    #[error("Edge slot {0} is out of range")]
    EdgeOutOfRange(EdgeIndex),
    #[error("{0} is not part of the overlay or has no edge")]
    UnknownElement(ElementRef),
}
