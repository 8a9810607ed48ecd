//! Slice-windowed visibility.
//!
//! Each pass shows everything inside the current [`SliceWindow`] and hides what falls
//! off its edges, leaving selected elements (and the slabs/segments/endpoints of
//! selected edges) alone. Single-slice steps only touch the two boundary slices and
//! the window itself; jumps and offset changes fall back to a full resync.

use crate::graph::{ElementRef, GraphModel, NodeIndex, SegmentIndex, SlabIndex};
use stackview_core::{EdgeId, SliceWindow};

/// What one pass did, mostly for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityPass {
    pub skipped: bool,
    pub resynced: bool,
    pub shown: usize,
    pub hidden: usize,
}

impl VisibilityPass {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    fn show(&mut self, model: &mut GraphModel, element: ElementRef) {
        if model.set_visible(element, true) {
            self.shown += 1;
        }
    }

    fn hide(&mut self, model: &mut GraphModel, element: ElementRef) {
        if model.set_visible(element, false) {
            self.hidden += 1;
        }
    }
}

#[derive(Debug, Clone)]
pub struct VisibilityEngine {
    enabled: bool,
    last_z: Option<i64>,
    needs_resync: bool,
}

impl Default for VisibilityEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityEngine {
    pub fn new() -> Self {
        Self {
            enabled: true,
            last_z: None,
            needs_resync: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turning the overlay off freezes it; turning it back on forces a resync.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled && !self.enabled {
            self.needs_resync = true;
        }
        self.enabled = enabled;
    }

    /// Makes the next pass rebuild visibility from scratch.
    pub fn invalidate(&mut self) {
        self.needs_resync = true;
    }

    pub fn last_z(&self) -> Option<i64> {
        self.last_z
    }

    pub fn advance(&mut self, model: &mut GraphModel, window: &SliceWindow) -> VisibilityPass {
        if !self.enabled {
            return VisibilityPass::skipped();
        }

        let mut pass = VisibilityPass::default();
        let jumped = self.last_z.is_none_or(|last| (window.z() - last).abs() > 1);

        if self.needs_resync || jumped {
            pass.resynced = true;
            resync(model, &mut pass);
        } else {
            for boundary in [window.previous_boundary(), window.next_boundary()]
                .into_iter()
                .flatten()
            {
                hide_boundary(model, window, boundary, &mut pass);
            }
        }

        for z in window.range() {
            show_slice(model, z, &mut pass);
        }

        self.last_z = Some(window.z());
        self.needs_resync = false;

        tracing::debug!(
            z = window.z(),
            lower = window.lower(),
            upper = window.upper(),
            resynced = pass.resynced,
            shown = pass.shown,
            hidden = pass.hidden,
            "visibility pass"
        );
        pass
    }

    /// Hides every element regardless of selection, e.g. when the overlay is switched off.
    pub fn hide_all(&mut self, model: &mut GraphModel) -> usize {
        let mut pass = VisibilityPass::default();
        for element in model.elements() {
            pass.hide(model, element);
        }
        self.needs_resync = true;
        pass.hidden
    }
}

/// Every element goes back to "visible iff pinned" before the window is applied.
fn resync(model: &mut GraphModel, pass: &mut VisibilityPass) {
    for element in model.elements() {
        if model.is_pinned(element) {
            pass.show(model, element);
        } else {
            pass.hide(model, element);
        }
    }
}

fn hide_boundary(model: &mut GraphModel, window: &SliceWindow, z: i64, pass: &mut VisibilityPass) {
    let slabs: Vec<SlabIndex> = model.slabs_at(z).to_vec();
    let mut touched: Vec<EdgeId> = Vec::new();

    for slab in slabs {
        if !model.slab_pinned(slab) {
            pass.hide(model, ElementRef::Slab(slab));
        }
        let edge_id = model[slab].edge_id;
        if !touched.contains(&edge_id) {
            touched.push(edge_id);
        }
    }

    for edge_id in touched {
        if model.is_edge_selected(edge_id) {
            continue;
        }
        let segments: Vec<SegmentIndex> = model.segments_of(edge_id).to_vec();
        for seg in segments {
            let [a, b] = model[seg].endpoints;
            if !window.contains(model[a].z) && !window.contains(model[b].z) {
                pass.hide(model, ElementRef::Segment(seg));
            }
        }
    }

    let nodes: Vec<NodeIndex> = model.nodes_at(z).to_vec();
    for node in nodes {
        if !model.node_pinned(node) {
            pass.hide(model, ElementRef::Node(node));
        }
    }
}

fn show_slice(model: &mut GraphModel, z: i64, pass: &mut VisibilityPass) {
    let slabs: Vec<SlabIndex> = model.slabs_at(z).to_vec();
    let mut touched: Vec<EdgeId> = Vec::new();

    for slab in slabs {
        if !model[slab].connected {
            continue;
        }
        pass.show(model, ElementRef::Slab(slab));
        let edge_id = model[slab].edge_id;
        if !touched.contains(&edge_id) {
            touched.push(edge_id);
        }
    }

    for edge_id in touched {
        let segments: Vec<SegmentIndex> = model.segments_of(edge_id).to_vec();
        for seg in segments {
            let [a, b] = model[seg].endpoints;
            if model[a].visible || model[b].visible {
                pass.show(model, ElementRef::Segment(seg));
            }
        }
    }

    let nodes: Vec<NodeIndex> = model.nodes_at(z).to_vec();
    for node in nodes {
        pass.show(model, ElementRef::Node(node));
    }
}
