//! Scene construction and the backends that execute it.
//!
//! [`scene::build_frame`] turns a resolved tree, the camera and the display
//! options into a [`Frame`]: a flat list of [`DrawItem`]s with their
//! transforms already composed. A [`RenderBackend`] executes frames with
//! a depth buffer (less-or-equal), an 8-bit stencil buffer and an alpha
//! cutoff, and can read back single pixels for picking.
//!
//! Two backends ship with the crate: [`SoftwareBackend`] rasterizes on the
//! CPU and needs no GPU, [`GpuBackend`] renders with wgpu.

pub mod commands;
pub mod constants;
pub mod drawables;
pub mod gpu;
pub mod gpu_context;
pub mod pipeline;
pub mod primitives;
pub mod render;
pub mod scene;
pub mod software;

use image::RgbaImage;

use crate::geometry::Color;

pub use commands::{DrawItem, StencilMode, Topology, Vertex};
pub use drawables::{DrawableCache, Realized};
pub use gpu_context::{GpuContext, SurfaceState};
pub use render::GpuBackend;
pub use scene::{build_frame, SceneParams};
pub use software::SoftwareBackend;

/// Opaque handle to a texture owned by a backend.
///
/// Handles stay valid until [`RenderBackend::release_textures`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) u32);

/// Why a frame is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePurpose {
    /// A visible frame, presented after drawing.
    Display,
    /// An off-screen frame in pick colors, never presented.
    Pick,
}

/// Everything a backend needs to draw one frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub clear_color: Color,
    pub purpose: FramePurpose,
    pub items: Vec<DrawItem>,
}

/// A target that can execute frames and read pixels back.
///
/// All methods are synchronous. Drawing to a zero-sized target is a no-op.
pub trait RenderBackend {
    /// Current target size in pixels.
    fn size(&self) -> (u32, u32);

    fn resize(&mut self, width: u32, height: u32);

    /// Upload an RGBA image. Returns `None` if the backend cannot hold it.
    fn upload_texture(&mut self, image: &RgbaImage) -> Option<TextureHandle>;

    /// Drop every uploaded texture. Existing handles become invalid.
    fn release_textures(&mut self);

    /// Clear color, depth and stencil, then draw every item in order.
    fn draw(&mut self, frame: &Frame);

    /// Color of the last drawn frame at `(x, y)`, with the origin at the
    /// top left. `None` outside the target or before anything was drawn.
    fn read_pixel(&mut self, x: u32, y: u32) -> Option<Color>;

    /// Show the last drawn frame.
    fn present(&mut self);
}
