use crate::timeseries::{TimeSeriesError, TimeSeriesHub, TimeSeriesMap, WindowId};
use crate::window::ViewerWindow;
use stackview_core::NodeId;
use stackview_events::{Event, EventBus, EventListener, SelectionOrigin};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// All windows of one time-series session, sharing a single [`TimeSeriesHub`].
///
/// Selecting a node in one window selects its row in the hub and the mapped node in
/// every other window. Windows only queue row changes in the hub; the session mirrors
/// the queue once the window is done, so no `RefCell` borrow is held across windows.
///
/// Events meant for a linked window go through [`Session::handle_event`] or
/// [`Session::dispatch_from`]. Driving the window directly through
/// [`Session::window_mut`] leaves its row changes queued until [`Session::sync`].
#[derive(Debug)]
pub struct Session {
    hub: Rc<RefCell<TimeSeriesHub>>,
    windows: BTreeMap<WindowId, ViewerWindow>,
}

impl Session {
    pub fn new(map: TimeSeriesMap) -> Self {
        Self::with_hub(TimeSeriesHub::new(map))
    }

    pub fn with_hub(hub: TimeSeriesHub) -> Self {
        Self {
            hub: Rc::new(RefCell::new(hub)),
            windows: BTreeMap::new(),
        }
    }

    pub fn hub(&self) -> Rc<RefCell<TimeSeriesHub>> {
        Rc::clone(&self.hub)
    }

    pub fn add_window(
        &mut self,
        time_point: usize,
        mut window: ViewerWindow,
    ) -> Result<WindowId, TimeSeriesError> {
        let id = self.hub.borrow_mut().add_window(time_point)?;
        window.link_time_series(Rc::clone(&self.hub), id);
        self.windows.insert(id, window);
        Ok(id)
    }

    pub fn remove_window(&mut self, id: WindowId) -> Result<ViewerWindow, TimeSeriesError> {
        self.hub.borrow_mut().remove_window(id)?;
        let mut window = self
            .windows
            .remove(&id)
            .ok_or(TimeSeriesError::UnknownWindow(id))?;
        window.unlink_time_series();
        Ok(window)
    }

    pub fn window(&self, id: WindowId) -> Option<&ViewerWindow> {
        self.windows.get(&id)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut ViewerWindow> {
        self.windows.get_mut(&id)
    }

    pub fn window_ids(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.windows.keys().copied()
    }

    /// Graph-side selection in `window`, mirrored to every other window.
    ///
    /// Returns whether the node's selection changed in `window`.
    pub fn select_node(
        &mut self,
        window: WindowId,
        node: NodeId,
        selected: bool,
    ) -> Result<bool, TimeSeriesError> {
        let source = self
            .windows
            .get_mut(&window)
            .ok_or(TimeSeriesError::UnknownWindow(window))?;
        let changed = source.select_node(node, selected, SelectionOrigin::Graph)?;
        self.sync();
        Ok(changed)
    }

    /// Delivers `event` to one window, then mirrors any row selection it caused.
    pub fn handle_event(
        &mut self,
        window: WindowId,
        event: &Event,
    ) -> Result<(), TimeSeriesError> {
        self.windows
            .get_mut(&window)
            .ok_or(TimeSeriesError::UnknownWindow(window))?
            .handle_event(event);
        self.sync();
        Ok(())
    }

    /// Drains `bus` into one window, like [`EventBus::dispatch_to`], then mirrors.
    pub fn dispatch_from(
        &mut self,
        bus: &EventBus,
        window: WindowId,
    ) -> Result<(), TimeSeriesError> {
        let target = self
            .windows
            .get_mut(&window)
            .ok_or(TimeSeriesError::UnknownWindow(window))?;
        bus.dispatch_to(target);
        self.sync();
        Ok(())
    }

    /// Mirrors row changes queued by windows into every other window.
    ///
    /// Returns how many row changes were mirrored.
    pub fn sync(&mut self) -> usize {
        let changes = self.hub.borrow_mut().take_unmirrored();
        for change in &changes {
            self.propagate(change.row, change.selected, Some(change.source));
        }
        changes.len()
    }

    /// Table-side selection of a whole row, applied to every window.
    pub fn select_row(&mut self, row: usize, selected: bool) -> Result<bool, TimeSeriesError> {
        let changed = {
            let mut hub = self.hub.borrow_mut();
            if selected {
                hub.on_row_selected(row)?
            } else {
                hub.on_row_deselected(row)?
            }
        };
        if changed {
            self.propagate(row, selected, None);
        }
        Ok(changed)
    }

    fn propagate(&mut self, row: usize, selected: bool, except: Option<WindowId>) {
        let targets = self.hub.borrow().targets(row, except);
        for (id, node) in targets {
            let Some(window) = self.windows.get_mut(&id) else {
                continue;
            };
            if let Err(e) = window.select_node(node, selected, SelectionOrigin::TimeSeries) {
                tracing::warn!(%id, row, "Time-series selection skipped: {e}");
            }
        }
    }
}
