use bitflags::bitflags;

use crate::camera::ProjectionMode;
use crate::geometry::Color;

bitflags! {
    /// Toolbar-driven display flags.
    ///
    /// Depth and split content only affect the perspective view, bounds
    /// and overdraw only the orthographic one. All flags are kept
    /// regardless of the current mode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DisplayOptions: u8 {
        /// Extrude every node into a slab one depth unit thick.
        const SHOW_DEPTH = 1 << 0;
        /// Outline every node in the orthographic view.
        const SHOW_BOUNDS = 1 << 1;
        /// Tint pixels drawn two or more times in the orthographic view.
        const SHOW_OVERDRAW = 1 << 2;
        /// Push backgrounds half a depth unit behind their content.
        const SPLIT_CONTENT = 1 << 3;
    }
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self::all()
    }
}

/// Settings for an [`Inspector`](crate::inspector::Inspector).
#[derive(Debug, Clone)]
pub struct InspectorConfig {
    /// Scene background. Pick colors are allocated to avoid it.
    pub clear_color: Color,
    /// Maximum pointer travel, in pixels, for a press to count as a click.
    pub touch_slop: f32,
    /// Eye distance change per wheel step in perspective mode.
    pub zoom_step: f32,
    /// Scale change per wheel step in orthographic mode.
    pub ortho_scale_step: f32,
    pub max_ortho_scale: f32,
    /// Pitch and yaw are clamped to plus or minus this many degrees.
    pub max_rotation: f32,
    pub fov_y: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub initial_mode: ProjectionMode,
    pub initial_options: DisplayOptions,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::rgb(0.2, 0.2, 0.2),
            touch_slop: 2.0,
            zoom_step: 2.0,
            ortho_scale_step: 0.01,
            max_ortho_scale: 2.0,
            max_rotation: 89.9,
            fov_y: 45.0,
            z_near: 1.0,
            z_far: 4000.0,
            initial_mode: ProjectionMode::Perspective,
            initial_options: DisplayOptions::default(),
        }
    }
}

impl InspectorConfig {
    pub fn clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn touch_slop(mut self, pixels: f32) -> Self {
        self.touch_slop = pixels;
        self
    }

    pub fn zoom_step(mut self, step: f32) -> Self {
        self.zoom_step = step;
        self
    }

    pub fn max_rotation(mut self, degrees: f32) -> Self {
        self.max_rotation = degrees;
        self
    }

    pub fn initial_mode(mut self, mode: ProjectionMode) -> Self {
        self.initial_mode = mode;
        self
    }

    pub fn initial_options(mut self, options: DisplayOptions) -> Self {
        self.initial_options = options;
        self
    }
}
