//! Scene colors and limits, named so draw code never carries magic numbers.

use crate::geometry::Color;

/// Outline of the selected node and fill of its depth slab.
pub const SELECTION_COLOR: Color = Color::rgb(1.0, 0.45, 0.45);

/// Outline of every other node.
pub const BOUNDS_COLOR: Color = Color::rgb(0.33, 0.33, 0.33);

/// Depth slab of a node that only draws a background.
pub const LAYER_BACKGROUND_COLOR: Color = Color::rgba(0.5, 0.658, 0.733, 0.5);

/// Depth slab of a node that draws content.
pub const LAYER_CONTENT_COLOR: Color = Color::rgba(0.976, 0.823, 0.592, 0.5);

/// Depth slab of a node with neither background nor content.
pub const LAYER_EMPTY_COLOR: Color = Color::rgba(0.85, 0.85, 0.85, 0.5);

/// Overdraw tints for levels 2, 3, 4 and 5 or more, in that order.
pub const OVERDRAW_COLORS: [Color; 4] = [
    Color::rgba(0.7, 0.7, 1.0, 0.7),
    Color::rgba(0.7, 1.0, 0.7, 0.7),
    Color::rgba(1.0, 0.7, 0.7, 0.7),
    Color::rgba(1.0, 0.3, 0.3, 0.7),
];

/// Lowest overdraw level that is tinted.
pub const FIRST_OVERDRAW_LEVEL: u8 = 2;

/// Overdraw level tinted for this count and every count above it.
pub const LAST_OVERDRAW_LEVEL: u8 = 5;

/// Stencil bits compared by the overdraw overlay.
pub const STENCIL_READ_MASK: u8 = 0x0f;

/// Fragments with alpha at or below this are discarded.
pub const ALPHA_CUTOFF: f32 = 0.01;
