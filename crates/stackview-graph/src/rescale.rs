use crate::error::GraphError;
use crate::graph::{ElementRef, GraphModel, SegmentIndex};
use crate::surface::RenderCommand;

fn check_scale(value: f64) -> Result<f64, GraphError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(GraphError::InvalidScale { value })
    }
}

/// Scale the overlay was built at and the scale it is currently drawn at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleState {
    start_scale: f64,
    cur_scale: f64,
}

impl ScaleState {
    pub fn new(start_scale: f64) -> Result<Self, GraphError> {
        let start_scale = check_scale(start_scale)?;
        Ok(Self {
            start_scale,
            cur_scale: start_scale,
        })
    }

    pub fn start_scale(&self) -> f64 {
        self.start_scale
    }

    pub fn current(&self) -> f64 {
        self.cur_scale
    }

    /// Moves every element so the overlay tracks an image now drawn at `new_scale`.
    ///
    /// Positions are recomputed from the build-time positions times
    /// `new_scale / start_scale`, so any translation applied at build time scales along
    /// with them and repeated zooming does not accumulate rounding. Queues `SetPosition`
    /// and `SetLine` for each element; rescaling to the current scale queues nothing.
    pub fn rescale(&mut self, model: &mut GraphModel, new_scale: f64) -> Result<(), GraphError> {
        let new_scale = check_scale(new_scale)?;
        if new_scale == self.cur_scale {
            return Ok(());
        }
        let ratio = new_scale / self.start_scale;
        self.cur_scale = new_scale;
        let factor = ratio as f32;

        for index in model.node_indices() {
            let node = &mut model.nodes[index.0];
            node.position = node.placed.scaled(factor);
            let center = node.position;
            model.push_command(RenderCommand::SetPosition {
                element: ElementRef::Node(index),
                center,
            });
        }

        for index in model.slab_indices() {
            let slab = &mut model.slabs[index.0];
            slab.position = slab.placed.scaled(factor);
            let center = slab.position;
            model.push_command(RenderCommand::SetPosition {
                element: ElementRef::Slab(index),
                center,
            });
        }

        let buckets: Vec<Vec<SegmentIndex>> = model
            .segment_buckets()
            .map(|(_, segments)| segments.to_vec())
            .collect();
        for segments in buckets {
            for segment in segments {
                self.move_segment(model, segment);
            }
        }

        tracing::debug!(
            scale = new_scale,
            ratio,
            start = self.start_scale,
            "Rescaled overlay"
        );
        Ok(())
    }

    fn move_segment(&self, model: &mut GraphModel, index: SegmentIndex) {
        let [a, b] = model.segments[index.0].endpoints;
        let (Some(from), Some(to)) = (model.slab(a), model.slab(b)) else {
            tracing::warn!(segment = %index, "Segment endpoints missing; leaving it in place");
            return;
        };
        let (from, to) = (from.position, to.position);
        model.segments[index.0].line = (from, to);
        model.push_command(RenderCommand::SetLine {
            segment: index,
            from,
            to,
        });
    }
}
