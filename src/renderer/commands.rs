//! Draw items produced by the scene builder and consumed by backends.
//!
//! Items are fully resolved: each carries the model-view-projection matrix
//! for its vertices, so a backend only has to transform, test and shade.

use bytemuck::{Pod, Zeroable};

use super::TextureHandle;
use crate::geometry::Color;
use crate::transform::Transform;

/// A vertex in node-local space.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
            uv: [0.0, 0.0],
        }
    }

    pub const fn with_uv(x: f32, y: f32, z: f32, u: f32, v: f32) -> Self {
        Self {
            position: [x, y, z],
            uv: [u, v],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Every three vertices form a filled triangle.
    Triangles,
    /// Every two vertices form a one pixel wide segment.
    Lines,
}

/// Stencil behaviour of a draw item.
///
/// Tests compare against the stored value masked with
/// [`STENCIL_READ_MASK`](super::constants::STENCIL_READ_MASK).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilMode {
    /// Always pass and leave the stencil alone.
    Keep,
    /// Always pass and add one, saturating, wherever the depth test passes.
    Increment,
    /// Pass only where the masked stencil equals the reference.
    Equal(u8),
    /// Pass only where the masked stencil is at least the reference.
    AtLeast(u8),
}

impl StencilMode {
    pub fn reference(self) -> u8 {
        match self {
            StencilMode::Keep | StencilMode::Increment => 0,
            StencilMode::Equal(r) | StencilMode::AtLeast(r) => r,
        }
    }
}

/// One batch of geometry sharing state.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub topology: Topology,
    pub vertices: Vec<Vertex>,
    /// Local space to clip space.
    pub transform: Transform,
    /// Modulates the texture, or is the flat color when there is none.
    pub color: Color,
    pub texture: Option<TextureHandle>,
    pub stencil: StencilMode,
    /// Source-over blending. Off for the pick pass.
    pub blend: bool,
    /// Line width in pixels. Only used by [`Topology::Lines`].
    pub line_width: f32,
}

impl DrawItem {
    pub fn fill(vertices: Vec<Vertex>, transform: Transform, color: Color) -> Self {
        Self {
            topology: Topology::Triangles,
            vertices,
            transform,
            color,
            texture: None,
            stencil: StencilMode::Keep,
            blend: true,
            line_width: 1.0,
        }
    }

    pub fn lines(vertices: Vec<Vertex>, transform: Transform, color: Color) -> Self {
        Self {
            topology: Topology::Lines,
            ..Self::fill(vertices, transform, color)
        }
    }

    pub fn with_texture(mut self, texture: TextureHandle) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_stencil(mut self, stencil: StencilMode) -> Self {
        self.stencil = stencil;
        self
    }

    pub fn with_line_width(mut self, width: f32) -> Self {
        self.line_width = width;
        self
    }

    pub fn opaque(mut self) -> Self {
        self.blend = false;
        self
    }
}
