//! One stack's overlay: the graph model plus the slice window, visibility, selection
//! and scale state that drive it.

use crate::error::GraphError;
use crate::graph::{EdgeIndex, ElementRef, GraphModel, NodeIndex, SegmentIndex, SlabIndex};
use crate::rescale::ScaleState;
use crate::selection::SelectionManager;
use crate::style::Palette;
use crate::surface::{RenderCommand, RenderSurface};
use crate::visibility::{VisibilityEngine, VisibilityPass};
use crossbeam_channel::Sender;
use stackview_core::{AnnotationMode, EdgeId, NodeId, SliceWindow};
use stackview_events::{Event, SelectionOrigin};

#[derive(Debug)]
pub struct StackOverlay {
    model: GraphModel,
    window: SliceWindow,
    visibility: VisibilityEngine,
    selection: SelectionManager,
    scale: ScaleState,
    notifier: Option<Sender<Event>>,
}

impl StackOverlay {
    /// `start_scale` must be the scale the model was placed at.
    pub fn new(
        model: GraphModel,
        window: SliceWindow,
        palette: Palette,
        start_scale: f64,
    ) -> Result<Self, GraphError> {
        Ok(Self {
            model,
            window,
            visibility: VisibilityEngine::new(),
            selection: SelectionManager::new(palette),
            scale: ScaleState::new(start_scale)?,
            notifier: None,
        })
    }

    /// Node selection changes are published here as [`Event::NodeSelectionChanged`].
    pub fn with_notifier(mut self, sender: Sender<Event>) -> Self {
        self.notifier = Some(sender);
        self
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn mode(&self) -> AnnotationMode {
        self.model.mode()
    }

    pub fn window(&self) -> &SliceWindow {
        &self.window
    }

    pub fn scale(&self) -> &ScaleState {
        &self.scale
    }

    pub fn palette(&self) -> &Palette {
        self.selection.palette()
    }

    pub fn is_visible(&self) -> bool {
        self.visibility.is_enabled()
    }

    /// Moves the cursor to `z` (clamped) and applies the window.
    pub fn advance(&mut self, z: i64) -> VisibilityPass {
        self.window.set_z(z);
        self.visibility.advance(&mut self.model, &self.window)
    }

    /// Re-applies the window at the current slice.
    pub fn redraw(&mut self) -> VisibilityPass {
        self.visibility.advance(&mut self.model, &self.window)
    }

    pub fn set_offset(&mut self, offset: u32) -> VisibilityPass {
        self.window.set_offset(offset);
        self.visibility.invalidate();
        self.redraw()
    }

    /// Switching off hides everything, selected elements included.
    pub fn set_visible(&mut self, visible: bool) {
        if visible == self.visibility.is_enabled() {
            return;
        }
        self.visibility.set_enabled(visible);
        if visible {
            self.redraw();
        } else {
            let hidden = self.visibility.hide_all(&mut self.model);
            tracing::debug!(hidden, "overlay hidden");
        }
    }

    pub fn rescale(&mut self, new_scale: f64) -> Result<(), GraphError> {
        self.scale.rescale(&mut self.model, new_scale)
    }

    pub fn set_marker_size(&mut self, size: f32) -> Result<bool, GraphError> {
        self.model.set_marker_size(size)
    }

    pub fn set_edge_selected(&mut self, edge: EdgeIndex, selected: bool) -> Result<bool, GraphError> {
        let changed = self
            .selection
            .set_edge_selected(&mut self.model, edge, selected)?;
        if changed {
            self.settle();
        }
        Ok(changed)
    }

    pub fn select_edge_by_id(&mut self, id: EdgeId, selected: bool) -> Result<bool, GraphError> {
        let edge = self
            .model
            .edge_by_id(id)
            .ok_or(GraphError::UnknownEdge(id))?;
        self.set_edge_selected(edge, selected)
    }

    pub fn select_slab(&mut self, slab: SlabIndex, selected: bool) -> Result<bool, GraphError> {
        self.select_element(ElementRef::Slab(slab), selected)
    }

    pub fn select_segment(
        &mut self,
        segment: SegmentIndex,
        selected: bool,
    ) -> Result<bool, GraphError> {
        self.select_element(ElementRef::Segment(segment), selected)
    }

    /// Click routing: nodes select themselves, slabs and segments select their edge.
    pub fn select_element(
        &mut self,
        element: ElementRef,
        selected: bool,
    ) -> Result<bool, GraphError> {
        match element {
            ElementRef::Node(node) => {
                self.set_node_selected(node, selected, SelectionOrigin::Graph)
            }
            ElementRef::Slab(_) | ElementRef::Segment(_) => {
                let edge = self.selection.edge_for(&self.model, element)?;
                self.set_edge_selected(edge, selected)
            }
        }
    }

    /// Publishes [`Event::NodeSelectionChanged`] only when the flag actually flipped.
    pub fn set_node_selected(
        &mut self,
        node: NodeIndex,
        selected: bool,
        origin: SelectionOrigin,
    ) -> Result<bool, GraphError> {
        let changed = self
            .selection
            .set_node_selected(&mut self.model, node, selected)?;
        if !changed {
            return Ok(false);
        }
        self.settle();

        if let Some(tx) = &self.notifier {
            let _ = tx.send(Event::NodeSelectionChanged {
                id: self.model[node].id,
                selected,
                origin,
            });
        }
        Ok(true)
    }

    pub fn select_node_by_id(
        &mut self,
        id: NodeId,
        selected: bool,
        origin: SelectionOrigin,
    ) -> Result<bool, GraphError> {
        let node = self
            .model
            .node_by_id(id)
            .ok_or(GraphError::UnknownNode(id))?;
        self.set_node_selected(node, selected, origin)
    }

    pub fn selected_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.model
            .node_indices()
            .filter(|n| self.model[*n].selected)
            .map(|n| self.model[n].id)
    }

    pub fn selected_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.model
            .edge_indices()
            .filter(|e| self.model[*e].selected)
            .map(|e| self.model[e].id)
    }

    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        self.model.take_commands()
    }

    /// Applies every queued command to `surface` in order. Returns how many were sent.
    pub fn flush(&mut self, surface: &mut dyn RenderSurface) -> usize {
        let commands = self.model.take_commands();
        for command in &commands {
            surface.apply(command);
        }
        commands.len()
    }

    /// Pins changed, possibly for nodes far outside the window (edge lists reach across
    /// the stack), so the boundary-only pass cannot be trusted here.
    fn settle(&mut self) {
        if !self.visibility.is_enabled() {
            self.visibility.hide_all(&mut self.model);
        } else {
            self.visibility.invalidate();
            self.redraw();
        }
    }
}
