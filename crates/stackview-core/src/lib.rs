use serde::{Deserialize, Serialize};
use std::fmt;

pub mod calibration;
pub mod error;
pub mod rows;
pub mod window;

pub use calibration::Calibration;
pub use error::TableError;
pub use rows::{EdgeRow, NodeRow, SlabRow, parse_edge_list};
pub use window::SliceWindow;

/// Index of a node (junction or spine) as it appears in the source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a vascular edge (`edgeIdx` on slab rows, `i` on edge rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub i64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The annotation schema a stack was loaded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AnnotationMode {
    /// Nodes, slabs and edges describing a vessel graph.
    #[default]
    Vascular,
    /// A flat list of spine points; no slabs or edges.
    Spines,
}

impl AnnotationMode {
    /// Picks the schema from the columns present on the node table.
    ///
    /// Spine tables key their rows by `Idx`, vascular node tables by `i`.
    pub fn from_node_columns<S: AsRef<str>>(columns: &[S]) -> Result<Self, TableError> {
        let has = |name: &str| columns.iter().any(|c| c.as_ref() == name);
        if has("Idx") {
            Ok(AnnotationMode::Spines)
        } else if has("i") {
            Ok(AnnotationMode::Vascular)
        } else {
            Err(TableError::UnknownSchema {
                columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            })
        }
    }

    pub fn has_edges(&self) -> bool {
        matches!(self, AnnotationMode::Vascular)
    }
}

impl fmt::Display for AnnotationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vascular => write!(f, "Vascular"),
            Self::Spines => write!(f, "Spines"),
        }
    }
}
