//! Row shapes of the node, slab and edge tables.
//!
//! Column names follow the exported annotation files (`i`, `edgeIdx`, `sourceIdx`, ...),
//! so rows can be deserialized directly by whatever reads the tables.

use crate::{EdgeId, NodeId, TableError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRow {
    /// `i` for vascular junctions, `Idx` for spines.
    #[serde(rename = "i", alias = "Idx")]
    pub index: NodeId,
    pub x: f64,
    pub y: f64,
    pub z: i64,
    /// Semicolon separated incident edges, e.g. `"3;7;"`. Absent for spines.
    #[serde(rename = "edgeList", default, skip_serializing_if = "Option::is_none")]
    pub edge_list: Option<String>,
}

impl NodeRow {
    pub fn new(index: i64, x: f64, y: f64, z: i64) -> Self {
        Self {
            index: NodeId(index),
            x,
            y,
            z,
            edge_list: None,
        }
    }

    pub fn with_edge_list(mut self, edge_list: impl Into<String>) -> Self {
        self.edge_list = Some(edge_list.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlabRow {
    /// Position of the slab along its edge.
    pub i: i64,
    pub x: f64,
    pub y: f64,
    pub z: i64,
    #[serde(rename = "edgeIdx")]
    pub edge_idx: EdgeId,
}

impl SlabRow {
    pub fn new(i: i64, x: f64, y: f64, z: i64, edge_idx: i64) -> Self {
        Self {
            i,
            x,
            y,
            z,
            edge_idx: EdgeId(edge_idx),
        }
    }

    /// True when `self` directly follows `prev` on the same edge.
    pub fn follows(&self, prev: &SlabRow) -> bool {
        self.edge_idx == prev.edge_idx && self.i == prev.i + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRow {
    pub i: EdgeId,
    #[serde(rename = "sourceIdx")]
    pub source_idx: NodeId,
    #[serde(rename = "targetIdx")]
    pub target_idx: NodeId,
}

impl EdgeRow {
    pub fn new(i: i64, source_idx: i64, target_idx: i64) -> Self {
        Self {
            i: EdgeId(i),
            source_idx: NodeId(source_idx),
            target_idx: NodeId(target_idx),
        }
    }
}

/// Splits an `edgeList` cell into edge ids.
///
/// Empty entries (including the trailing one left by `"1;2;"`) are ignored and a
/// `nan` cell yields nothing. Unparseable entries are reported individually so the
/// caller can keep the valid ones.
pub fn parse_edge_list(cell: &str) -> impl Iterator<Item = Result<EdgeId, TableError>> + '_ {
    cell.split(';')
        .map(str::trim)
        .filter(|token| !token.is_empty() && !token.eq_ignore_ascii_case("nan"))
        .map(|token| {
            token
                .parse::<i64>()
                .map(EdgeId)
                .map_err(|_| TableError::InvalidEdgeListEntry {
                    token: token.to_string(),
                })
        })
}
