//! Shared map of tracked points across time points, and the registry of windows
//! showing those time points.

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use stackview_core::NodeId;
use stackview_events::Event;
use stackview_graph::GraphError;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub usize);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeSeriesError {
    #[error("Row {row} has {found} time points, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("Time point {time_point} is outside the table ({time_points} time points)")]
    TimePointOutOfRange {
        time_point: usize,
        time_points: usize,
    },
    #[error("Row {row} is outside the table ({rows} rows)")]
    RowOutOfRange { row: usize, rows: usize },
    #[error("{0} is not registered")]
    UnknownWindow(WindowId),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// One row per tracked point, one column per time point. A cell holds the node that
/// represents the point at that time, if it was found there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesMap {
    time_points: usize,
    rows: Vec<Vec<Option<NodeId>>>,
}

impl TimeSeriesMap {
    pub fn new(rows: Vec<Vec<Option<NodeId>>>) -> Result<Self, TimeSeriesError> {
        let time_points = rows.first().map_or(0, Vec::len);
        if let Some((row, r)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != time_points)
        {
            return Err(TimeSeriesError::RaggedRow {
                row,
                found: r.len(),
                expected: time_points,
            });
        }
        Ok(Self { time_points, rows })
    }

    pub fn time_points(&self) -> usize {
        self.time_points
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn node(&self, row: usize, time_point: usize) -> Option<NodeId> {
        self.rows.get(row)?.get(time_point).copied().flatten()
    }

    pub fn row_for_node(&self, time_point: usize, node: NodeId) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| r.get(time_point).copied().flatten() == Some(node))
    }
}

/// A row selection made inside one window that the other windows still have to mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowChange {
    pub row: usize,
    pub selected: bool,
    pub source: WindowId,
}

/// Per-session state every window reads: the map, which rows are selected, and which
/// window shows which time point.
#[derive(Debug, Default)]
pub struct TimeSeriesHub {
    map: TimeSeriesMap,
    windows: BTreeMap<WindowId, usize>,
    selected_rows: BTreeSet<usize>,
    unmirrored: Vec<RowChange>,
    next_window: usize,
    notifier: Option<Sender<Event>>,
}

impl TimeSeriesHub {
    pub fn new(map: TimeSeriesMap) -> Self {
        Self {
            map,
            ..Self::default()
        }
    }

    /// Row selection changes are published here as [`Event::TimeSeriesRowChanged`].
    pub fn with_notifier(mut self, sender: Sender<Event>) -> Self {
        self.notifier = Some(sender);
        self
    }

    pub fn map(&self) -> &TimeSeriesMap {
        &self.map
    }

    pub fn add_window(&mut self, time_point: usize) -> Result<WindowId, TimeSeriesError> {
        if time_point >= self.map.time_points() {
            return Err(TimeSeriesError::TimePointOutOfRange {
                time_point,
                time_points: self.map.time_points(),
            });
        }
        let id = WindowId(self.next_window);
        self.next_window += 1;
        self.windows.insert(id, time_point);
        tracing::debug!(%id, time_point, "window registered");
        Ok(id)
    }

    /// Returns the time point the window was showing.
    pub fn remove_window(&mut self, id: WindowId) -> Result<usize, TimeSeriesError> {
        let time_point = self
            .windows
            .remove(&id)
            .ok_or(TimeSeriesError::UnknownWindow(id))?;
        tracing::debug!(%id, time_point, "window removed");
        Ok(time_point)
    }

    pub fn windows(&self) -> impl Iterator<Item = (WindowId, usize)> + '_ {
        self.windows.iter().map(|(id, tp)| (*id, *tp))
    }

    pub fn time_point_of(&self, id: WindowId) -> Option<usize> {
        self.windows.get(&id).copied()
    }

    pub fn selected_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected_rows.iter().copied()
    }

    pub fn is_row_selected(&self, row: usize) -> bool {
        self.selected_rows.contains(&row)
    }

    pub fn row_for_node(
        &self,
        window: WindowId,
        node: NodeId,
    ) -> Result<Option<usize>, TimeSeriesError> {
        let time_point = self
            .time_point_of(window)
            .ok_or(TimeSeriesError::UnknownWindow(window))?;
        Ok(self.map.row_for_node(time_point, node))
    }

    /// Returns whether the row's selection changed.
    pub fn on_row_selected(&mut self, row: usize) -> Result<bool, TimeSeriesError> {
        self.set_row_selected(row, true)
    }

    pub fn on_row_deselected(&mut self, row: usize) -> Result<bool, TimeSeriesError> {
        self.set_row_selected(row, false)
    }

    /// Records a node selection made in `window` against the node's row, if it has one.
    ///
    /// A row that actually changed is queued for the other windows; collect the queue
    /// with [`TimeSeriesHub::take_unmirrored`].
    pub fn record_from_window(
        &mut self,
        window: WindowId,
        node: NodeId,
        selected: bool,
    ) -> Result<Option<usize>, TimeSeriesError> {
        let Some(row) = self.row_for_node(window, node)? else {
            return Ok(None);
        };
        if self.set_row_selected(row, selected)? {
            self.unmirrored.push(RowChange {
                row,
                selected,
                source: window,
            });
        }
        Ok(Some(row))
    }

    pub fn take_unmirrored(&mut self) -> Vec<RowChange> {
        std::mem::take(&mut self.unmirrored)
    }

    /// Node standing for `row` in every registered window except `except`.
    pub fn targets(&self, row: usize, except: Option<WindowId>) -> Vec<(WindowId, NodeId)> {
        self.windows
            .iter()
            .filter(|(id, _)| Some(**id) != except)
            .filter_map(|(id, tp)| self.map.node(row, *tp).map(|node| (*id, node)))
            .collect()
    }

    fn set_row_selected(&mut self, row: usize, selected: bool) -> Result<bool, TimeSeriesError> {
        if row >= self.map.row_count() {
            return Err(TimeSeriesError::RowOutOfRange {
                row,
                rows: self.map.row_count(),
            });
        }
        let changed = if selected {
            self.selected_rows.insert(row)
        } else {
            self.selected_rows.remove(&row)
        };
        if changed {
            if let Some(tx) = &self.notifier {
                let _ = tx.send(Event::TimeSeriesRowChanged { row, selected });
            }
        }
        Ok(changed)
    }
}
