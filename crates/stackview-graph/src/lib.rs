pub mod builder;
pub mod error;
pub mod graph;
pub mod overlay;
pub mod rescale;
pub mod selection;
pub mod spatial;
pub mod style;
pub mod surface;
pub mod visibility;

pub use builder::{GraphBuilder, Placement};
pub use error::GraphError;
pub use graph::{
    DEFAULT_MARKER_SIZE, EdgeIndex, EdgeSegment, ElementRef, GraphEdge, GraphModel, GraphNode,
    GraphSlab, NodeIndex, SegmentIndex, SlabIndex, Vec2,
};
pub use overlay::StackOverlay;
pub use rescale::ScaleState;
pub use selection::SelectionManager;
pub use spatial::{Buckets, SliceIndex};
pub use style::{Color, Palette, Stroke};
pub use surface::{MirroredItem, RenderCommand, RenderSurface, SceneMirror};
pub use visibility::{VisibilityEngine, VisibilityPass};
