use crate::error::GraphError;
use crate::graph::{EdgeIndex, ElementRef, GraphModel, NodeIndex};
use crate::style::{Palette, Stroke};

/// Applies edge and node selection to the model's visual state.
///
/// The edge's `selected` flag is the single source of truth; this type fans it out to
/// segment, slab and endpoint colours and pins. Restoring the default window after a
/// deselect is the caller's job (the overlay re-runs its visibility pass).
#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    palette: Palette,
}

impl SelectionManager {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Returns `Ok(true)` when the edge's selection actually changed.
    pub fn set_edge_selected(
        &self,
        model: &mut GraphModel,
        edge: EdgeIndex,
        selected: bool,
    ) -> Result<bool, GraphError> {
        let current = model
            .edge(edge)
            .ok_or(GraphError::EdgeOutOfRange(edge))?;
        if current.selected == selected {
            return Ok(false);
        }
        let segments = current.segments.clone();
        let slabs = current.slabs.clone();
        let (source, target) = (current.source, current.target);

        model[edge].selected = selected;
        tracing::debug!(edge = %model[edge].id, selected, "edge selection");

        let (segment_style, slab_style) = if selected {
            (self.palette.selected_segment, self.palette.selected_slab)
        } else {
            (self.palette.segment, self.palette.slab)
        };
        for seg in segments {
            model.set_style(ElementRef::Segment(seg), segment_style);
            model.set_visible(ElementRef::Segment(seg), selected);
        }
        for slab in slabs {
            model.set_style(ElementRef::Slab(slab), slab_style);
            model.set_visible(ElementRef::Slab(slab), selected);
        }

        if !model.mode().has_edges() {
            return Ok(true);
        }

        if selected {
            if let Some(node) = source {
                model.set_style(ElementRef::Node(node), self.palette.edge_source);
                model.set_visible(ElementRef::Node(node), true);
            }
            if let Some(node) = target {
                model.set_style(ElementRef::Node(node), self.palette.edge_target);
                model.set_visible(ElementRef::Node(node), true);
            }
        } else {
            for node in [target, source].into_iter().flatten() {
                let style = self.resting_node_style(model, node);
                model.set_style(ElementRef::Node(node), style);
                if !model.node_pinned(node) {
                    model.set_visible(ElementRef::Node(node), false);
                }
            }
        }
        Ok(true)
    }

    /// Returns `Ok(true)` when the node's selection actually changed.
    pub fn set_node_selected(
        &self,
        model: &mut GraphModel,
        node: NodeIndex,
        selected: bool,
    ) -> Result<bool, GraphError> {
        let current = model
            .node(node)
            .ok_or(GraphError::NodeOutOfRange(node))?;
        if current.selected == selected {
            return Ok(false);
        }

        model[node].selected = selected;
        tracing::debug!(node = %model[node].id, selected, "node selection");

        let element = ElementRef::Node(node);
        if selected {
            model.set_style(element, self.palette.selected_node);
            model.set_visible(element, true);
        } else {
            let style = self.resting_node_style(model, node);
            model.set_style(element, style);
            if !model.node_pinned(node) {
                model.set_visible(element, false);
            }
        }
        Ok(true)
    }

    /// The edge a clicked slab or segment stands for.
    pub fn edge_for(
        &self,
        model: &GraphModel,
        element: ElementRef,
    ) -> Result<EdgeIndex, GraphError> {
        if !model.contains(element) {
            return Err(GraphError::UnknownElement(element));
        }
        let edge = match element {
            ElementRef::Slab(slab) => model[slab].edge,
            ElementRef::Segment(seg) => model.edge_by_id(model[seg].edge_id),
            ElementRef::Node(_) => None,
        };
        edge.ok_or(GraphError::UnknownElement(element))
    }

    /// Style a node falls back to when one reason for highlighting it goes away.
    fn resting_node_style(&self, model: &GraphModel, node: NodeIndex) -> Stroke {
        let n = &model[node];
        if n.selected {
            return self.palette.selected_node;
        }
        for e in &n.incident_edges {
            let edge = &model[*e];
            if !edge.selected {
                continue;
            }
            if edge.target == Some(node) {
                return self.palette.edge_target;
            }
            if edge.source == Some(node) {
                return self.palette.edge_source;
            }
        }
        self.palette.node
    }
}
