use crate::error::GraphError;
use crate::graph::{
    DEFAULT_MARKER_SIZE, EdgeIndex, EdgeSegment, ElementRef, GraphEdge, GraphModel, GraphNode,
    GraphSlab, NodeIndex, SegmentIndex, SlabIndex, Vec2, check_marker_size,
};
use crate::style::Palette;
use crate::surface::RenderCommand;
use stackview_core::{AnnotationMode, Calibration, EdgeRow, NodeRow, SlabRow, parse_edge_list};
use std::collections::HashSet;

/// How stored coordinates map onto the view: `pixel = coord / d * scale + translate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f64,
    pub translate: Vec2,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: Vec2::default(),
        }
    }
}

/// Turns the node, slab and edge tables into a [`GraphModel`].
///
/// Slab adjacency is a single-row lookback, so slab rows must arrive sorted by
/// `(edgeIdx, i)`. Unsorted input is not reordered; it just produces fewer segments.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    mode: AnnotationMode,
    calibration: Calibration,
    placement: Placement,
    palette: Palette,
    marker_size: f32,
}

impl GraphBuilder {
    pub fn new(mode: AnnotationMode) -> Self {
        Self {
            mode,
            calibration: Calibration::identity(),
            placement: Placement::default(),
            palette: Palette::default(),
            marker_size: DEFAULT_MARKER_SIZE,
        }
    }

    pub fn vascular() -> Self {
        Self::new(AnnotationMode::Vascular)
    }

    pub fn spines() -> Self {
        Self::new(AnnotationMode::Spines)
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_marker_size(mut self, size: f32) -> Self {
        self.marker_size = size;
        self
    }

    pub fn build(
        &self,
        nodes: &[NodeRow],
        slabs: &[SlabRow],
        edges: &[EdgeRow],
    ) -> Result<GraphModel, GraphError> {
        let scale = self.placement.scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(GraphError::InvalidScale { value: scale });
        }
        let marker_size = check_marker_size(self.marker_size)?;

        let mut model = GraphModel::new(self.mode);
        model.marker_size = marker_size;
        match self.mode {
            AnnotationMode::Vascular => {
                self.add_slabs(&mut model, slabs);
                self.add_nodes(&mut model, nodes);
                self.add_edges(&mut model, edges);
                self.link_nodes(&mut model, nodes);
            }
            AnnotationMode::Spines => {
                if !slabs.is_empty() || !edges.is_empty() {
                    tracing::warn!(
                        slabs = slabs.len(),
                        edges = edges.len(),
                        "Spines stacks have no slabs or edges; ignoring those rows"
                    );
                }
                self.add_nodes(&mut model, nodes);
            }
        }

        model.push_marker_sizes();

        tracing::info!(
            mode = %self.mode,
            nodes = model.node_count(),
            slabs = model.slab_count(),
            segments = model.segment_count(),
            edges = model.edge_count(),
            "Built overlay graph"
        );
        Ok(model)
    }

    fn place(&self, x: f64, y: f64) -> Vec2 {
        let (px, py) = self.calibration.to_pixels(x, y);
        let Placement { scale, translate } = self.placement;
        Vec2::new(
            (px * scale) as f32 + translate.x,
            (py * scale) as f32 + translate.y,
        )
    }

    fn add_slabs(&self, model: &mut GraphModel, rows: &[SlabRow]) {
        let mut prev: Option<(&SlabRow, SlabIndex)> = None;

        for row in rows {
            let idx = SlabIndex(model.slabs.len());
            let position = self.place(row.x, row.y);
            model.slabs.push(GraphSlab {
                i: row.i,
                edge_id: row.edge_idx,
                edge: None,
                connected: false,
                z: row.z,
                position,
                placed: position,
                visible: false,
                style: self.palette.slab,
            });
            model.slabs_by_z.insert(idx, row.z);
            model.push_command(RenderCommand::SetPosition {
                element: ElementRef::Slab(idx),
                center: position,
            });
            model.push_command(RenderCommand::SetStyle {
                element: ElementRef::Slab(idx),
                style: self.palette.slab,
            });

            if let Some((prev_row, prev_idx)) = prev {
                if row.follows(prev_row) {
                    self.connect(model, prev_idx, idx);
                }
            }
            prev = Some((row, idx));
        }
    }

    fn connect(&self, model: &mut GraphModel, from: SlabIndex, to: SlabIndex) {
        let seg = SegmentIndex(model.segments.len());
        let edge_id = model.slabs[to.0].edge_id;
        let line = (model.slabs[from.0].position, model.slabs[to.0].position);
        model.segments.push(EdgeSegment {
            edge_id,
            endpoints: [from, to],
            line,
            visible: false,
            style: self.palette.segment,
        });
        model.segments_by_edge.insert(seg, edge_id);
        model.slabs[from.0].connected = true;
        model.slabs[to.0].connected = true;
        model.push_command(RenderCommand::SetLine {
            segment: seg,
            from: line.0,
            to: line.1,
        });
        model.push_command(RenderCommand::SetStyle {
            element: ElementRef::Segment(seg),
            style: self.palette.segment,
        });
    }

    fn add_nodes(&self, model: &mut GraphModel, rows: &[NodeRow]) {
        for row in rows {
            let idx = NodeIndex(model.nodes.len());
            let position = self.place(row.x, row.y);
            model.nodes.push(GraphNode {
                id: row.index,
                z: row.z,
                position,
                placed: position,
                label: format!("{}/z{}", row.index, row.z),
                incident_edges: Vec::new(),
                visible: false,
                selected: false,
                style: self.palette.node,
            });
            model.nodes_by_z.insert(idx, row.z);
            if model.node_map.insert(row.index, idx).is_some() {
                tracing::warn!(node = %row.index, "Duplicate node index; later row wins lookups");
            }
            model.push_command(RenderCommand::SetPosition {
                element: ElementRef::Node(idx),
                center: position,
            });
            model.push_command(RenderCommand::SetStyle {
                element: ElementRef::Node(idx),
                style: self.palette.node,
            });
            model.push_command(RenderCommand::SetLabel {
                node: idx,
                text: model.nodes[idx.0].label.clone(),
                color: self.palette.label,
            });
        }
    }

    fn add_edges(&self, model: &mut GraphModel, rows: &[EdgeRow]) {
        for row in rows {
            let segments = model.segments_of(row.i).to_vec();
            if segments.is_empty() {
                tracing::debug!(edge = %row.i, "Skipping edge without segments");
                continue;
            }
            if model.edge_map.contains_key(&row.i) {
                tracing::warn!(edge = %row.i, "Duplicate edge row ignored");
                continue;
            }

            // An edge with an unresolvable endpoint gets no endpoints at all.
            let (source, target) = match (
                model.node_by_id(row.source_idx),
                model.node_by_id(row.target_idx),
            ) {
                (Some(source), Some(target)) => (Some(source), Some(target)),
                _ => {
                    tracing::debug!(
                        edge = %row.i,
                        source = %row.source_idx,
                        target = %row.target_idx,
                        "Edge endpoint missing from node table; edge has no endpoints"
                    );
                    (None, None)
                }
            };

            let mut seen = HashSet::new();
            let slabs: Vec<SlabIndex> = segments
                .iter()
                .flat_map(|s| model.segments[s.0].endpoints)
                .filter(|slab| seen.insert(*slab))
                .collect();

            let idx = EdgeIndex(model.edges.len());
            for slab in &slabs {
                model.slabs[slab.0].edge = Some(idx);
            }
            model.edges.push(GraphEdge {
                id: row.i,
                segments,
                slabs,
                source,
                target,
                selected: false,
            });
            model.edge_map.insert(row.i, idx);
        }
    }

    /// Resolves each node's `edgeList` and the edges it terminates into edge indices.
    fn link_nodes(&self, model: &mut GraphModel, rows: &[NodeRow]) {
        for (n, row) in rows.iter().enumerate() {
            let Some(cell) = row.edge_list.as_deref() else {
                continue;
            };
            for entry in parse_edge_list(cell) {
                match entry {
                    Ok(id) => match model.edge_by_id(id) {
                        Some(edge) => push_unique(&mut model.nodes[n].incident_edges, edge),
                        None => {
                            tracing::debug!(node = %row.index, edge = %id, "edgeList names unknown edge")
                        }
                    },
                    Err(err) => tracing::warn!(node = %row.index, "{err}"),
                }
            }
        }

        for e in model.edge_indices() {
            let (source, target) = (model.edges[e.0].source, model.edges[e.0].target);
            for node in [source, target].into_iter().flatten() {
                push_unique(&mut model.nodes[node.0].incident_edges, e);
            }
        }
    }
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;
    use stackview_core::{EdgeId, NodeId};

    fn chain(edge: i64, z: &[i64]) -> Vec<SlabRow> {
        z.iter()
            .enumerate()
            .map(|(i, &z)| SlabRow::new(i as i64, i as f64, 0.0, z, edge))
            .collect()
    }

    #[test]
    fn test_consecutive_slabs_make_n_minus_one_segments() {
        let slabs = chain(0, &[1, 2, 3, 4, 5]);
        let model = GraphBuilder::vascular().build(&[], &slabs, &[]).unwrap();

        assert_eq!(model.slab_count(), 5);
        assert_eq!(model.segment_count(), 4);
        for (k, seg) in model.segments_of(EdgeId(0)).iter().enumerate() {
            assert_eq!(model[*seg].endpoints, [SlabIndex(k), SlabIndex(k + 1)]);
        }
    }

    #[test]
    fn test_gap_in_sequence_breaks_segment() {
        let slabs = vec![
            SlabRow::new(0, 0.0, 0.0, 1, 0),
            SlabRow::new(1, 0.0, 0.0, 1, 0),
            SlabRow::new(3, 0.0, 0.0, 1, 0),
            SlabRow::new(4, 0.0, 0.0, 1, 0),
        ];
        let model = GraphBuilder::vascular().build(&[], &slabs, &[]).unwrap();
        let endpoints: Vec<_> = model
            .segments_of(EdgeId(0))
            .iter()
            .map(|s| model[*s].endpoints)
            .collect();
        assert_eq!(
            endpoints,
            vec![
                [SlabIndex(0), SlabIndex(1)],
                [SlabIndex(2), SlabIndex(3)]
            ]
        );
    }

    #[test]
    fn test_edge_change_breaks_segment() {
        let mut slabs = chain(0, &[1, 2]);
        slabs.extend(chain(1, &[3, 4]));
        let model = GraphBuilder::vascular().build(&[], &slabs, &[]).unwrap();
        assert_eq!(model.segments_of(EdgeId(0)).len(), 1);
        assert_eq!(model.segments_of(EdgeId(1)).len(), 1);
    }

    #[test]
    fn test_unsorted_input_is_not_repaired() {
        let slabs = vec![
            SlabRow::new(0, 0.0, 0.0, 1, 0),
            SlabRow::new(0, 0.0, 0.0, 1, 1),
            SlabRow::new(1, 0.0, 0.0, 1, 0),
        ];
        let model = GraphBuilder::vascular().build(&[], &slabs, &[]).unwrap();
        assert_eq!(model.segment_count(), 0);
        assert!(model.slab_indices().all(|s| !model[s].connected));
    }

    #[test]
    fn test_edge_without_segments_is_skipped() {
        let nodes = vec![NodeRow::new(0, 0.0, 0.0, 1), NodeRow::new(1, 0.0, 0.0, 2)];
        let slabs = chain(5, &[1, 2]);
        let edges = vec![EdgeRow::new(5, 0, 1), EdgeRow::new(9, 0, 1)];
        let model = GraphBuilder::vascular()
            .build(&nodes, &slabs, &edges)
            .unwrap();

        assert_eq!(model.edge_count(), 1);
        assert!(model.edge_by_id(EdgeId(9)).is_none());
        let edge = &model[model.edge_by_id(EdgeId(5)).unwrap()];
        assert_eq!(edge.source, model.node_by_id(NodeId(0)));
        assert_eq!(edge.target, model.node_by_id(NodeId(1)));
        assert_eq!(edge.slabs, vec![SlabIndex(0), SlabIndex(1)]);
    }

    #[test]
    fn test_missing_endpoint_node_drops_both_endpoints() {
        let nodes = vec![NodeRow::new(0, 0.0, 0.0, 1)];
        let slabs = chain(2, &[1, 2, 3]);
        let edges = vec![EdgeRow::new(2, 0, 77)];
        let model = GraphBuilder::vascular()
            .build(&nodes, &slabs, &edges)
            .unwrap();

        let edge = &model[EdgeIndex(0)];
        assert_eq!(edge.source, None);
        assert_eq!(edge.target, None);
        assert_eq!(edge.segments.len(), 2);
        assert_eq!(edge.slabs.len(), 3);
        assert!(model[NodeIndex(0)].incident_edges.is_empty());
    }

    #[test]
    fn test_edge_slabs_are_deduplicated() {
        let slabs = chain(0, &[1, 1, 1, 1]);
        let model = GraphBuilder::vascular()
            .build(&[], &slabs, &[EdgeRow::new(0, 0, 0)])
            .unwrap();
        assert_eq!(model[EdgeIndex(0)].slabs.len(), 4);
    }

    #[test]
    fn test_nodes_link_edge_list_and_endpoints() {
        let _ = tracing_subscriber::fmt::try_init();
        let nodes = vec![
            NodeRow::new(0, 0.0, 0.0, 1).with_edge_list("0;1;bogus;42;"),
            NodeRow::new(1, 0.0, 0.0, 2),
            NodeRow::new(2, 0.0, 0.0, 3),
        ];
        let mut slabs = chain(0, &[1, 2]);
        slabs.extend(chain(1, &[2, 3]));
        let edges = vec![EdgeRow::new(0, 0, 1), EdgeRow::new(1, 1, 2)];
        let model = GraphBuilder::vascular()
            .build(&nodes, &slabs, &edges)
            .unwrap();

        assert_eq!(model[NodeIndex(0)].incident_edges, vec![EdgeIndex(0), EdgeIndex(1)]);
        assert_eq!(model[NodeIndex(1)].incident_edges, vec![EdgeIndex(0), EdgeIndex(1)]);
        assert_eq!(model[NodeIndex(2)].incident_edges, vec![EdgeIndex(1)]);
    }

    #[test]
    fn test_spines_mode_has_no_edges() {
        let nodes = vec![NodeRow::new(4, 1.0, 1.0, 0), NodeRow::new(5, 1.0, 1.0, 3)];
        let model = GraphBuilder::spines()
            .build(&nodes, &chain(0, &[1, 2]), &[EdgeRow::new(0, 4, 5)])
            .unwrap();

        assert_eq!(model.mode(), AnnotationMode::Spines);
        assert_eq!(model.node_count(), 2);
        assert_eq!(model.slab_count(), 0);
        assert_eq!(model.edge_count(), 0);
        assert_eq!(model.node_by_id(NodeId(5)), Some(NodeIndex(1)));
        assert_eq!(model.nodes_at(3), &[NodeIndex(1)]);
    }

    #[test]
    fn test_placement_applies_calibration_scale_and_translate() {
        let builder = GraphBuilder::vascular()
            .with_calibration(Calibration::new(0.5, 2.0).unwrap())
            .with_placement(Placement {
                scale: 2.0,
                translate: Vec2::new(1.0, -1.0),
            });
        let model = builder
            .build(&[NodeRow::new(0, 10.0, 10.0, 0)], &[], &[])
            .unwrap();
        assert_eq!(model[NodeIndex(0)].position, Vec2::new(41.0, 9.0));
        assert_eq!(model[NodeIndex(0)].label, "0/z0");
    }

    #[test]
    fn test_rejects_bad_scale() {
        let builder = GraphBuilder::vascular().with_placement(Placement {
            scale: 0.0,
            translate: Vec2::default(),
        });
        assert!(matches!(
            builder.build(&[], &[], &[]),
            Err(GraphError::InvalidScale { .. })
        ));
    }

    #[test]
    fn test_everything_starts_hidden_and_placed() {
        let mut model = GraphBuilder::vascular()
            .build(&[NodeRow::new(0, 0.0, 0.0, 0)], &chain(0, &[0, 1]), &[])
            .unwrap();
        assert_eq!(model.visible_nodes().count(), 0);
        assert_eq!(model.visible_slabs().count(), 0);

        let commands = model.take_commands();
        assert!(
            commands
                .iter()
                .all(|c| !matches!(c, RenderCommand::Show(_) | RenderCommand::Hide(_)))
        );
        assert!(commands.iter().any(|c| matches!(c, RenderCommand::SetLine { .. })));
    }

    #[test]
    fn test_labels_and_marker_sizes_reach_the_surface() {
        let mut palette = Palette::default();
        palette.label = Color::YELLOW;
        let mut model = GraphBuilder::vascular()
            .with_palette(palette)
            .with_marker_size(5.0)
            .build(&[NodeRow::new(3, 0.0, 0.0, 2)], &chain(0, &[0, 1]), &[])
            .unwrap();
        assert_eq!(model.marker_size(), 5.0);

        let commands = model.take_commands();
        assert!(commands.contains(&RenderCommand::SetLabel {
            node: NodeIndex(0),
            text: "3/z2".to_string(),
            color: Color::YELLOW,
        }));
        let sized: Vec<ElementRef> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::SetMarkerSize { element, size } if *size == 5.0 => Some(*element),
                _ => None,
            })
            .collect();
        assert_eq!(
            sized,
            vec![
                ElementRef::Node(NodeIndex(0)),
                ElementRef::Slab(SlabIndex(0)),
                ElementRef::Slab(SlabIndex(1)),
            ]
        );

        assert_eq!(
            GraphBuilder::spines().with_marker_size(-1.0).build(&[], &[], &[]).err(),
            Some(GraphError::InvalidMarkerSize { value: -1.0 })
        );
    }
}
