//! Boundary between the overlay and whatever toolkit draws it.

use crate::graph::{ElementRef, NodeIndex, SegmentIndex, Vec2};
use crate::style::{Color, Stroke};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    Show(ElementRef),
    Hide(ElementRef),
    /// Centre of a node or slab marker.
    SetPosition { element: ElementRef, center: Vec2 },
    SetLine {
        segment: SegmentIndex,
        from: Vec2,
        to: Vec2,
    },
    SetStyle { element: ElementRef, style: Stroke },
    /// Text drawn next to a node marker.
    SetLabel {
        node: NodeIndex,
        text: String,
        color: Color,
    },
    /// Side length of a node or slab marker, in pixels.
    SetMarkerSize { element: ElementRef, size: f32 },
}

impl RenderCommand {
    pub fn element(&self) -> ElementRef {
        match self {
            Self::Show(e) | Self::Hide(e) => *e,
            Self::SetPosition { element, .. }
            | Self::SetStyle { element, .. }
            | Self::SetMarkerSize { element, .. } => *element,
            Self::SetLine { segment, .. } => ElementRef::Segment(*segment),
            Self::SetLabel { node, .. } => ElementRef::Node(*node),
        }
    }
}

/// Implemented by the toolkit binding that owns the real scene items.
pub trait RenderSurface {
    fn apply(&mut self, command: &RenderCommand);
}

/// Last known state of one drawn item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MirroredItem {
    pub visible: bool,
    pub center: Option<Vec2>,
    pub line: Option<(Vec2, Vec2)>,
    pub style: Option<Stroke>,
    pub label: Option<(String, Color)>,
    pub marker_size: Option<f32>,
}

/// Retained copy of everything sent to a surface.
///
/// Bindings without their own scene graph can diff against it; it is also what
/// headless callers inspect to see the outcome of a pass.
#[derive(Debug, Default)]
pub struct SceneMirror {
    items: HashMap<ElementRef, MirroredItem>,
    applied: usize,
}

impl SceneMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item(&self, element: ElementRef) -> Option<&MirroredItem> {
        self.items.get(&element)
    }

    pub fn is_shown(&self, element: ElementRef) -> bool {
        self.items.get(&element).is_some_and(|i| i.visible)
    }

    pub fn shown(&self) -> impl Iterator<Item = ElementRef> + '_ {
        self.items
            .iter()
            .filter(|(_, item)| item.visible)
            .map(|(element, _)| *element)
    }

    /// Number of commands applied since creation.
    pub fn applied(&self) -> usize {
        self.applied
    }
}

impl RenderSurface for SceneMirror {
    fn apply(&mut self, command: &RenderCommand) {
        self.applied += 1;
        let item = self.items.entry(command.element()).or_default();
        match command {
            RenderCommand::Show(_) => item.visible = true,
            RenderCommand::Hide(_) => item.visible = false,
            RenderCommand::SetPosition { center, .. } => item.center = Some(*center),
            RenderCommand::SetLine { from, to, .. } => item.line = Some((*from, *to)),
            RenderCommand::SetStyle { style, .. } => item.style = Some(*style),
            RenderCommand::SetLabel { text, color, .. } => {
                item.label = Some((text.clone(), *color));
            }
            RenderCommand::SetMarkerSize { size, .. } => item.marker_size = Some(*size),
        }
    }
}
