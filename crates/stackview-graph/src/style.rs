//! Overlay Style System
//!
//! Colours and stroke widths for nodes, slabs and segments. The palette is plain
//! configuration handed to the overlay; nothing here is global.

use serde::{Deserialize, Serialize};

/// RGBA color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const CYAN: Color = Color::rgb(0, 255, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const MAGENTA: Color = Color::rgb(255, 105, 255);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Colour plus pen width of one drawn element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
}

impl Stroke {
    pub const fn new(color: Color, width: f32) -> Self {
        Self { color, width }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub slab: Stroke,
    pub segment: Stroke,
    pub node: Stroke,
    /// Segments and slabs of a selected edge.
    pub selected_segment: Stroke,
    pub selected_slab: Stroke,
    /// Endpoints of a selected edge.
    pub edge_source: Stroke,
    pub edge_target: Stroke,
    /// A node picked on its own.
    pub selected_node: Stroke,
    /// Node label text.
    pub label: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            slab: Stroke::new(Color::CYAN, 4.0),
            segment: Stroke::new(Color::RED, 1.0),
            node: Stroke::new(Color::RED, 7.0),
            selected_segment: Stroke::new(Color::MAGENTA, 3.0),
            selected_slab: Stroke::new(Color::MAGENTA, 4.0),
            edge_source: Stroke::new(Color::RED, 7.0),
            edge_target: Stroke::new(Color::GREEN, 7.0),
            selected_node: Stroke::new(Color::YELLOW, 7.0),
            label: Color::WHITE,
        }
    }
}
