use crate::error::GraphError;
use crate::spatial::{Buckets, SliceIndex};
use crate::style::Stroke;
use crate::surface::RenderCommand;
use serde::{Deserialize, Serialize};
use stackview_core::{AnnotationMode, EdgeId, NodeId};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Marker side length used when nothing else is configured.
pub const DEFAULT_MARKER_SIZE: f32 = 7.0;

pub(crate) fn check_marker_size(value: f32) -> Result<f32, GraphError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(GraphError::InvalidMarkerSize { value })
    }
}

macro_rules! arena_index {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub usize);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

arena_index!(NodeIndex);
arena_index!(SlabIndex);
arena_index!(SegmentIndex);
arena_index!(EdgeIndex);

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

/// A drawable element of the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementRef {
    Node(NodeIndex),
    Slab(SlabIndex),
    Segment(SegmentIndex),
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(i) => write!(f, "node#{i}"),
            Self::Slab(i) => write!(f, "slab#{i}"),
            Self::Segment(i) => write!(f, "segment#{i}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: NodeId,
    pub z: i64,
    /// Centre in pixel space at the model's current scale.
    pub position: Vec2,
    /// Centre at the scale the model was built at. Rescaling always starts from here.
    pub placed: Vec2,
    pub label: String,
    /// Edges that pin this node while selected: its `edgeList` plus edges it terminates.
    pub incident_edges: Vec<EdgeIndex>,
    pub visible: bool,
    pub selected: bool,
    pub style: Stroke,
}

#[derive(Debug, Clone)]
pub struct GraphSlab {
    /// Sequence number along the edge.
    pub i: i64,
    pub edge_id: EdgeId,
    /// Owning edge aggregate; `None` when the edge row was missing or had no segments.
    pub edge: Option<EdgeIndex>,
    /// Whether any segment was built for `edge_id`. Slabs without one are never drawn.
    pub connected: bool,
    pub z: i64,
    pub position: Vec2,
    pub placed: Vec2,
    pub visible: bool,
    pub style: Stroke,
}

#[derive(Debug, Clone)]
pub struct EdgeSegment {
    pub edge_id: EdgeId,
    pub endpoints: [SlabIndex; 2],
    pub line: (Vec2, Vec2),
    pub visible: bool,
    pub style: Stroke,
}

#[derive(Debug, Clone)]
pub struct GraphEdge {
    pub id: EdgeId,
    pub segments: Vec<SegmentIndex>,
    /// De-duplicated slabs touched by `segments`, in first-seen order.
    pub slabs: Vec<SlabIndex>,
    pub source: Option<NodeIndex>,
    pub target: Option<NodeIndex>,
    pub selected: bool,
}

/// Arena of every overlay element plus the lookups the engine needs.
///
/// Visual state changes go through [`GraphModel::set_visible`] and
/// [`GraphModel::set_style`], which queue a [`RenderCommand`] only when something changed.
#[derive(Debug)]
pub struct GraphModel {
    mode: AnnotationMode,
    pub(crate) nodes: Vec<GraphNode>,
    pub(crate) slabs: Vec<GraphSlab>,
    pub(crate) segments: Vec<EdgeSegment>,
    pub(crate) edges: Vec<GraphEdge>,
    pub(crate) nodes_by_z: SliceIndex<NodeIndex>,
    pub(crate) slabs_by_z: SliceIndex<SlabIndex>,
    pub(crate) segments_by_edge: Buckets<EdgeId, SegmentIndex>,
    pub(crate) node_map: HashMap<NodeId, NodeIndex>,
    pub(crate) edge_map: HashMap<EdgeId, EdgeIndex>,
    pub(crate) marker_size: f32,
    pending: Vec<RenderCommand>,
}

impl GraphModel {
    pub fn new(mode: AnnotationMode) -> Self {
        Self {
            mode,
            nodes: Vec::new(),
            slabs: Vec::new(),
            segments: Vec::new(),
            edges: Vec::new(),
            nodes_by_z: SliceIndex::new(),
            slabs_by_z: SliceIndex::new(),
            segments_by_edge: Buckets::new(),
            node_map: HashMap::new(),
            edge_map: HashMap::new(),
            marker_size: DEFAULT_MARKER_SIZE,
            pending: Vec::new(),
        }
    }

    pub fn mode(&self) -> AnnotationMode {
        self.mode
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn slab_count(&self) -> usize {
        self.slabs.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + use<> {
        (0..self.nodes.len()).map(NodeIndex)
    }

    pub fn slab_indices(&self) -> impl Iterator<Item = SlabIndex> + use<> {
        (0..self.slabs.len()).map(SlabIndex)
    }

    pub fn segment_indices(&self) -> impl Iterator<Item = SegmentIndex> + use<> {
        (0..self.segments.len()).map(SegmentIndex)
    }

    pub fn edge_indices(&self) -> impl Iterator<Item = EdgeIndex> + use<> {
        (0..self.edges.len()).map(EdgeIndex)
    }

    pub fn node(&self, index: NodeIndex) -> Option<&GraphNode> {
        self.nodes.get(index.0)
    }

    pub fn slab(&self, index: SlabIndex) -> Option<&GraphSlab> {
        self.slabs.get(index.0)
    }

    pub fn segment(&self, index: SegmentIndex) -> Option<&EdgeSegment> {
        self.segments.get(index.0)
    }

    pub fn edge(&self, index: EdgeIndex) -> Option<&GraphEdge> {
        self.edges.get(index.0)
    }

    pub fn node_by_id(&self, id: NodeId) -> Option<NodeIndex> {
        self.node_map.get(&id).copied()
    }

    pub fn edge_by_id(&self, id: EdgeId) -> Option<EdgeIndex> {
        self.edge_map.get(&id).copied()
    }

    pub fn nodes_at(&self, z: i64) -> &[NodeIndex] {
        self.nodes_by_z.get(&z)
    }

    pub fn slabs_at(&self, z: i64) -> &[SlabIndex] {
        self.slabs_by_z.get(&z)
    }

    pub fn segments_of(&self, edge: EdgeId) -> &[SegmentIndex] {
        self.segments_by_edge.get(&edge)
    }

    pub fn segment_buckets(&self) -> impl Iterator<Item = (&EdgeId, &[SegmentIndex])> {
        self.segments_by_edge.iter()
    }

    /// Highest slice holding a node or slab, if any.
    pub fn data_max_z(&self) -> Option<i64> {
        let nodes = self.nodes_by_z.keys().next_back().copied();
        let slabs = self.slabs_by_z.keys().next_back().copied();
        nodes.max(slabs)
    }

    pub fn is_edge_selected(&self, id: EdgeId) -> bool {
        self.edge_by_id(id)
            .map(|e| self.edges[e.0].selected)
            .unwrap_or(false)
    }

    /// A slab is held visible while its edge is selected.
    pub fn slab_pinned(&self, index: SlabIndex) -> bool {
        self.slabs[index.0]
            .edge
            .map(|e| self.edges[e.0].selected)
            .unwrap_or(false)
    }

    pub fn segment_pinned(&self, index: SegmentIndex) -> bool {
        self.is_edge_selected(self.segments[index.0].edge_id)
    }

    /// A node is held visible while it, or any edge referring to it, is selected.
    pub fn node_pinned(&self, index: NodeIndex) -> bool {
        let node = &self.nodes[index.0];
        node.selected || node.incident_edges.iter().any(|e| self.edges[e.0].selected)
    }

    pub fn is_pinned(&self, element: ElementRef) -> bool {
        match element {
            ElementRef::Node(i) => self.node_pinned(i),
            ElementRef::Slab(i) => self.slab_pinned(i),
            ElementRef::Segment(i) => self.segment_pinned(i),
        }
    }

    pub fn contains(&self, element: ElementRef) -> bool {
        match element {
            ElementRef::Node(i) => i.0 < self.nodes.len(),
            ElementRef::Slab(i) => i.0 < self.slabs.len(),
            ElementRef::Segment(i) => i.0 < self.segments.len(),
        }
    }

    pub fn is_visible(&self, element: ElementRef) -> bool {
        match element {
            ElementRef::Node(i) => self.nodes[i.0].visible,
            ElementRef::Slab(i) => self.slabs[i.0].visible,
            ElementRef::Segment(i) => self.segments[i.0].visible,
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = ElementRef> + use<> {
        let nodes = self.node_indices().map(ElementRef::Node);
        let slabs = self.slab_indices().map(ElementRef::Slab);
        let segments = self.segment_indices().map(ElementRef::Segment);
        nodes.chain(slabs).chain(segments)
    }

    /// Sets the shown flag, queueing `Show`/`Hide` if it changed. Returns whether it changed.
    pub fn set_visible(&mut self, element: ElementRef, visible: bool) -> bool {
        let flag = match element {
            ElementRef::Node(i) => &mut self.nodes[i.0].visible,
            ElementRef::Slab(i) => &mut self.slabs[i.0].visible,
            ElementRef::Segment(i) => &mut self.segments[i.0].visible,
        };
        if *flag == visible {
            return false;
        }
        *flag = visible;
        self.pending.push(if visible {
            RenderCommand::Show(element)
        } else {
            RenderCommand::Hide(element)
        });
        true
    }

    pub fn set_style(&mut self, element: ElementRef, style: Stroke) {
        let slot = match element {
            ElementRef::Node(i) => &mut self.nodes[i.0].style,
            ElementRef::Slab(i) => &mut self.slabs[i.0].style,
            ElementRef::Segment(i) => &mut self.segments[i.0].style,
        };
        if *slot != style {
            *slot = style;
            self.pending.push(RenderCommand::SetStyle { element, style });
        }
    }

    pub fn marker_size(&self) -> f32 {
        self.marker_size
    }

    /// Resizes every node and slab marker. Returns `Ok(false)` when the size is unchanged.
    pub fn set_marker_size(&mut self, size: f32) -> Result<bool, GraphError> {
        let size = check_marker_size(size)?;
        if size == self.marker_size {
            return Ok(false);
        }
        self.marker_size = size;
        self.push_marker_sizes();
        Ok(true)
    }

    pub(crate) fn push_marker_sizes(&mut self) {
        let size = self.marker_size;
        let markers: Vec<ElementRef> = self
            .node_indices()
            .map(ElementRef::Node)
            .chain(self.slab_indices().map(ElementRef::Slab))
            .collect();
        self.pending.extend(
            markers
                .into_iter()
                .map(|element| RenderCommand::SetMarkerSize { element, size }),
        );
    }

    pub(crate) fn push_command(&mut self, command: RenderCommand) {
        self.pending.push(command);
    }

    /// Drain queued render commands in the order they were produced.
    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending_commands(&self) -> &[RenderCommand] {
        &self.pending
    }

    pub fn visible_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.node_indices().filter(|i| self.nodes[i.0].visible)
    }

    pub fn visible_slabs(&self) -> impl Iterator<Item = SlabIndex> + '_ {
        self.slab_indices().filter(|i| self.slabs[i.0].visible)
    }

    pub fn visible_segments(&self) -> impl Iterator<Item = SegmentIndex> + '_ {
        self.segment_indices().filter(|i| self.segments[i.0].visible)
    }
}

impl Index<NodeIndex> for GraphModel {
    type Output = GraphNode;
    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index.0]
    }
}

impl IndexMut<NodeIndex> for GraphModel {
    fn index_mut(&mut self, index: NodeIndex) -> &mut Self::Output {
        &mut self.nodes[index.0]
    }
}

impl Index<SlabIndex> for GraphModel {
    type Output = GraphSlab;
    fn index(&self, index: SlabIndex) -> &Self::Output {
        &self.slabs[index.0]
    }
}

impl Index<SegmentIndex> for GraphModel {
    type Output = EdgeSegment;
    fn index(&self, index: SegmentIndex) -> &Self::Output {
        &self.segments[index.0]
    }
}

impl Index<EdgeIndex> for GraphModel {
    type Output = GraphEdge;
    fn index(&self, index: EdgeIndex) -> &Self::Output {
        &self.edges[index.0]
    }
}

impl IndexMut<EdgeIndex> for GraphModel {
    fn index_mut(&mut self, index: EdgeIndex) -> &mut Self::Output {
        &mut self.edges[index.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use stackview_core::{NodeRow, SlabRow};

    fn small_model() -> GraphModel {
        GraphBuilder::vascular()
            .build(
                &[NodeRow::new(0, 0.0, 0.0, 2), NodeRow::new(1, 1.0, 1.0, 7)],
                &[SlabRow::new(0, 0.0, 0.0, 2, 0), SlabRow::new(1, 1.0, 1.0, 3, 0)],
                &[],
            )
            .unwrap()
    }

    #[test]
    fn test_set_visible_queues_only_changes() {
        let mut model = small_model();
        model.take_commands();

        let node = ElementRef::Node(NodeIndex(0));
        assert!(model.set_visible(node, true));
        assert!(!model.set_visible(node, true));
        assert!(model.set_visible(node, false));

        assert_eq!(
            model.take_commands(),
            vec![RenderCommand::Show(node), RenderCommand::Hide(node)]
        );
        assert!(model.pending_commands().is_empty());
    }

    #[test]
    fn test_marker_size_resizes_nodes_and_slabs() {
        let mut model = small_model();
        model.take_commands();

        assert_eq!(model.set_marker_size(DEFAULT_MARKER_SIZE), Ok(false));
        assert!(model.pending_commands().is_empty());
        assert_eq!(
            model.set_marker_size(0.0),
            Err(GraphError::InvalidMarkerSize { value: 0.0 })
        );
        assert!(model.set_marker_size(f32::NAN).is_err());

        assert_eq!(model.set_marker_size(4.5), Ok(true));
        assert_eq!(model.marker_size(), 4.5);
        let commands = model.take_commands();
        assert_eq!(commands.len(), model.node_count() + model.slab_count());
        assert!(commands.contains(&RenderCommand::SetMarkerSize {
            element: ElementRef::Slab(SlabIndex(1)),
            size: 4.5,
        }));
    }

    #[test]
    fn test_data_max_z() {
        let model = small_model();
        assert_eq!(model.data_max_z(), Some(7));
        assert_eq!(GraphModel::new(AnnotationMode::Spines).data_max_z(), None);
    }

    #[test]
    fn test_elements_cover_every_arena() {
        let model = small_model();
        let all: Vec<_> = model.elements().collect();
        assert_eq!(
            all.len(),
            model.node_count() + model.slab_count() + model.segment_count()
        );
        assert!(all.iter().all(|e| model.contains(*e)));
    }

    #[test]
    fn test_edgeless_slab_is_not_pinned() {
        let model = small_model();
        assert!(!model.slab_pinned(SlabIndex(0)));
        assert!(!model.is_edge_selected(EdgeId(0)));
    }
}
