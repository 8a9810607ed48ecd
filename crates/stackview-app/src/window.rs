//! Headless stack viewer: slice navigation, view geometry and list mirroring on top of
//! a [`StackOverlay`].

use crate::settings::ViewerSettings;
use crate::timeseries::{TimeSeriesHub, WindowId};
use crossbeam_channel::Sender;
use stackview_core::{AnnotationMode, Calibration, EdgeRow, NodeId, NodeRow, SlabRow, SliceWindow};
use stackview_events::{Event, EventListener, SelectionOrigin};
use stackview_graph::{
    GraphBuilder, GraphError, Placement, RenderSurface, StackOverlay, VisibilityPass,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Tables and geometry of one image stack, already parsed.
#[derive(Debug, Clone, Default)]
pub struct StackData {
    pub mode: AnnotationMode,
    pub nodes: Vec<NodeRow>,
    pub slabs: Vec<SlabRow>,
    pub edges: Vec<EdgeRow>,
    pub calibration: Calibration,
    /// Width of one slice image in pixels.
    pub image_width: f32,
    /// Last slice of the stack.
    pub max_z: i64,
}

#[derive(Debug)]
struct TimeSeriesLink {
    hub: Rc<RefCell<TimeSeriesHub>>,
    id: WindowId,
}

#[derive(Debug)]
pub struct ViewerWindow {
    settings: ViewerSettings,
    view_width: f32,
    image_width: f32,
    zoom: f64,
    overlay: Option<StackOverlay>,
    time_series: Option<TimeSeriesLink>,
    notifier: Option<Sender<Event>>,
}

impl ViewerWindow {
    pub fn new(settings: ViewerSettings, view_width: f32) -> Self {
        Self {
            settings,
            view_width,
            image_width: view_width,
            zoom: 1.0,
            overlay: None,
            time_series: None,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, sender: Sender<Event>) -> Self {
        self.notifier = Some(sender);
        self
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn overlay(&self) -> Option<&StackOverlay> {
        self.overlay.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn marker_size(&self) -> f32 {
        self.settings.marker_size
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn current_z(&self) -> Option<i64> {
        self.overlay.as_ref().map(|o| o.window().z())
    }

    /// Image pixels to view pixels.
    pub fn view_scale(&self) -> f64 {
        view_scale(self.view_width, self.image_width, self.zoom)
    }

    pub fn time_series_id(&self) -> Option<WindowId> {
        self.time_series.as_ref().map(|link| link.id)
    }

    pub(crate) fn link_time_series(&mut self, hub: Rc<RefCell<TimeSeriesHub>>, id: WindowId) {
        self.time_series = Some(TimeSeriesLink { hub, id });
    }

    pub(crate) fn unlink_time_series(&mut self) {
        self.time_series = None;
    }

    /// Builds the overlay for `stack` and shows slice 0. Replaces any open stack.
    /// On error the previously open stack, if any, stays as it was.
    pub fn open(&mut self, stack: StackData) -> Result<(), GraphError> {
        let scale = view_scale(self.view_width, stack.image_width, self.zoom);
        let model = GraphBuilder::new(stack.mode)
            .with_calibration(stack.calibration)
            .with_placement(Placement {
                scale,
                ..Placement::default()
            })
            .with_palette(self.settings.palette)
            .with_marker_size(self.settings.marker_size)
            .build(&stack.nodes, &stack.slabs, &stack.edges)?;
        let node_count = model.node_count();

        let window = SliceWindow::new(stack.max_z, self.settings.offset);
        let mut overlay = StackOverlay::new(model, window, self.settings.palette, scale)?;
        if let Some(tx) = &self.notifier {
            overlay = overlay.with_notifier(tx.clone());
        }
        overlay.set_visible(self.settings.show_overlay);
        overlay.advance(0);
        self.image_width = stack.image_width;
        self.overlay = Some(overlay);

        tracing::info!(mode = %stack.mode, node_count, max_z = stack.max_z, "Stack opened");
        self.publish(Event::StackOpened {
            mode: stack.mode,
            node_count,
            max_z: stack.max_z,
        });
        Ok(())
    }

    pub fn close(&mut self) {
        if self.overlay.take().is_some() {
            self.publish(Event::StackClosed);
        }
    }

    /// Wheel handling: moves one slice against the wheel direction.
    pub fn scroll(&mut self, delta: i32) -> Option<i64> {
        let z = self.current_z()?;
        if delta == 0 {
            return Some(z);
        }
        self.view_slice(z - i64::from(delta.signum()))
    }

    /// Jumps to slice `z` (clamped). Returns the slice actually shown.
    pub fn view_slice(&mut self, z: i64) -> Option<i64> {
        let overlay = self.overlay.as_mut()?;
        overlay.advance(z);
        Some(overlay.window().z())
    }

    pub fn redraw(&mut self) -> Option<VisibilityPass> {
        self.overlay.as_mut().map(StackOverlay::redraw)
    }

    /// A width that yields no usable scale is rejected and the view keeps its old width.
    pub fn resize(&mut self, width: f32) -> Result<(), GraphError> {
        self.apply_scale(width, self.zoom)?;
        self.view_width = width;
        Ok(())
    }

    pub fn zoom_in(&mut self) -> Result<(), GraphError> {
        self.set_zoom(self.zoom * self.settings.zoom_factor)
    }

    pub fn zoom_out(&mut self) -> Result<(), GraphError> {
        self.set_zoom(self.zoom / self.settings.zoom_factor)
    }

    pub fn zoom_reset(&mut self) -> Result<(), GraphError> {
        self.set_zoom(1.0)
    }

    fn set_zoom(&mut self, zoom: f64) -> Result<(), GraphError> {
        self.apply_scale(self.view_width, zoom)?;
        self.zoom = zoom;
        Ok(())
    }

    pub fn set_marker_size(&mut self, size: f32) -> Result<(), GraphError> {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.set_marker_size(size)?;
        } else if !(size.is_finite() && size > 0.0) {
            return Err(GraphError::InvalidMarkerSize { value: size });
        }
        self.settings.marker_size = size;
        Ok(())
    }

    pub fn toggle_overlay(&mut self) -> bool {
        let visible = !self.settings.show_overlay;
        self.set_overlay_visible(visible);
        visible
    }

    pub fn set_overlay_visible(&mut self, visible: bool) {
        self.settings.show_overlay = visible;
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.set_visible(visible);
        }
    }

    pub fn set_offset(&mut self, offset: u32) {
        self.settings.offset = offset;
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.set_offset(offset);
        }
    }

    /// Selects or deselects a node by its table index and, unless the change came from
    /// the time-series table itself, queues its row in the shared hub for the session
    /// to mirror.
    ///
    /// Returns whether the node's selection changed. Without an open stack nothing changes.
    pub fn select_node(
        &mut self,
        id: NodeId,
        selected: bool,
        origin: SelectionOrigin,
    ) -> Result<bool, GraphError> {
        let Some(overlay) = self.overlay.as_mut() else {
            return Ok(false);
        };
        let changed = overlay.select_node_by_id(id, selected, origin)?;
        if changed && origin != SelectionOrigin::TimeSeries {
            self.record_in_hub(id, selected);
        }
        Ok(changed)
    }

    /// Mirrors a point-list selection change, then jumps to the slice of the last
    /// newly selected node. Unknown indices are skipped.
    pub fn apply_list_selection(&mut self, selected: &[NodeId], deselected: &[NodeId]) -> Option<i64> {
        for id in deselected {
            if let Err(e) = self.select_node(*id, false, SelectionOrigin::List) {
                tracing::warn!("List deselection skipped: {e}");
            }
        }
        let mut jump = None;
        for id in selected {
            match self.select_node(*id, true, SelectionOrigin::List) {
                Ok(_) => jump = Some(*id),
                Err(e) => tracing::warn!("List selection skipped: {e}"),
            }
        }

        let overlay = self.overlay.as_ref()?;
        let model = overlay.model();
        let z = model.node_by_id(jump?).map(|n| model[n].z)?;
        self.view_slice(z)
    }

    /// Sends queued overlay changes to `surface`.
    pub fn flush(&mut self, surface: &mut dyn RenderSurface) -> usize {
        self.overlay
            .as_mut()
            .map_or(0, |overlay| overlay.flush(surface))
    }

    /// Rescales the open overlay for a candidate geometry without committing it.
    fn apply_scale(&mut self, view_width: f32, zoom: f64) -> Result<(), GraphError> {
        let scale = view_scale(view_width, self.image_width, zoom);
        match self.overlay.as_mut() {
            Some(overlay) => overlay.rescale(scale),
            None if scale.is_finite() && scale > 0.0 => Ok(()),
            None => Err(GraphError::InvalidScale { value: scale }),
        }
    }

    /// The other windows pick the change up when the session mirrors the hub's queue.
    fn record_in_hub(&self, id: NodeId, selected: bool) {
        let Some(link) = &self.time_series else {
            return;
        };
        if let Err(e) = link.hub.borrow_mut().record_from_window(link.id, id, selected) {
            tracing::warn!("Time-series row update failed: {e}");
        }
    }

    fn publish(&self, event: Event) {
        if let Some(tx) = &self.notifier {
            let _ = tx.send(event);
        }
    }

    fn report(&self, result: Result<(), GraphError>) {
        if let Err(e) = result {
            tracing::warn!("{e}");
            self.publish(Event::ShowWarning {
                message: e.to_string(),
            });
        }
    }
}

fn view_scale(view_width: f32, image_width: f32, zoom: f64) -> f64 {
    f64::from(view_width) / f64::from(image_width) * zoom
}

impl EventListener for ViewerWindow {
    fn handle_event(&mut self, event: &Event) {
        match event {
            Event::SliceScroll { delta } => {
                self.scroll(*delta);
            }
            Event::SliceJump { z } => {
                self.view_slice(*z);
            }
            Event::ViewResized { width } => {
                let result = self.resize(*width);
                self.report(result);
            }
            Event::ZoomIn => {
                let result = self.zoom_in();
                self.report(result);
            }
            Event::ZoomOut => {
                let result = self.zoom_out();
                self.report(result);
            }
            Event::ZoomReset => {
                let result = self.zoom_reset();
                self.report(result);
            }
            Event::OverlayVisibility { visible } => self.set_overlay_visible(*visible),
            Event::OverlayOffset { offset } => self.set_offset(*offset),
            Event::EdgeSelect { id, selected } => {
                if let Some(overlay) = self.overlay.as_mut() {
                    let result = overlay.select_edge_by_id(*id, *selected).map(|_| ());
                    self.report(result);
                }
            }
            Event::NodeSelect {
                id,
                selected,
                origin,
            } => {
                let result = self.select_node(*id, *selected, *origin).map(|_| ());
                self.report(result);
            }
            Event::ListSelectionChanged {
                selected,
                deselected,
            } => {
                self.apply_list_selection(selected, deselected);
            }
            _ => {}
        }
    }
}
