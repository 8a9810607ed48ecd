use stackview_core::{EdgeRow, NodeRow, SlabRow};
use stackview_graph::{GraphBuilder, GraphError, GraphModel};

/// Synthetic vessel tables: `edge_count` edges, each a run of `slabs_per_edge` slabs
/// climbing one slice per slab from a staggered start, with a junction node at both ends.
pub struct SyntheticStack {
    pub nodes: Vec<NodeRow>,
    pub slabs: Vec<SlabRow>,
    pub edges: Vec<EdgeRow>,
    pub max_z: i64,
}

pub fn generate_synthetic_stack(edge_count: usize, slabs_per_edge: usize) -> SyntheticStack {
    let mut nodes = Vec::with_capacity(edge_count * 2);
    let mut slabs = Vec::with_capacity(edge_count * slabs_per_edge);
    let mut edges = Vec::with_capacity(edge_count);
    let mut max_z = 0;

    for e in 0..edge_count as i64 {
        let start = (e * 7) % 200;
        let end = start + slabs_per_edge as i64 - 1;
        let x = (e % 64) as f64 * 8.0;
        let y = (e / 64) as f64 * 8.0;

        let source = e * 2;
        let target = source + 1;
        nodes.push(NodeRow::new(source, x, y, start).with_edge_list(e.to_string()));
        nodes.push(NodeRow::new(target, x + 4.0, y + 4.0, end).with_edge_list(e.to_string()));

        for i in 0..slabs_per_edge as i64 {
            slabs.push(SlabRow::new(i, x + i as f64 * 0.1, y, start + i, e));
        }
        edges.push(EdgeRow::new(e, source, target));
        max_z = max_z.max(end);
    }

    SyntheticStack {
        nodes,
        slabs,
        edges,
        max_z,
    }
}

pub fn build_model(stack: &SyntheticStack) -> Result<GraphModel, GraphError> {
    GraphBuilder::vascular().build(&stack.nodes, &stack.slabs, &stack.edges)
}
