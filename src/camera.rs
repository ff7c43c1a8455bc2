//! Camera state for the perspective and orthographic views.
//!
//! The two modes keep separate pan state, and switching between them never
//! touches either, so a user can flip back and forth without losing their
//! place. [`Camera::reset`] is the only way back to the defaults.

use crate::config::InspectorConfig;
use crate::geometry::Rect;
use crate::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    #[default]
    Perspective,
    Orthographic,
}

impl ProjectionMode {
    pub fn toggled(self) -> Self {
        match self {
            ProjectionMode::Perspective => ProjectionMode::Orthographic,
            ProjectionMode::Orthographic => ProjectionMode::Perspective,
        }
    }
}

/// Default yaw in degrees, so a freshly loaded tree shows its layers.
pub const DEFAULT_YAW: f32 = 60.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    mode: ProjectionMode,
    /// Eye position on the +Z axis.
    distance: f32,
    /// Perspective pan.
    translate: (f32, f32),
    /// Pitch about X and yaw about Y, in degrees.
    rotate: (f32, f32),
    ortho_translate: (f32, f32),
    ortho_scale: f32,

    fov_y: f32,
    z_near: f32,
    z_far: f32,
    max_rotation: f32,
    max_ortho_scale: f32,
}

impl Camera {
    pub fn new(config: &InspectorConfig) -> Self {
        let mut camera = Self {
            mode: config.initial_mode,
            distance: 0.0,
            translate: (0.0, 0.0),
            rotate: (0.0, 0.0),
            ortho_translate: (0.0, 0.0),
            ortho_scale: 1.0,
            fov_y: config.fov_y,
            z_near: config.z_near,
            z_far: config.z_far,
            max_rotation: config.max_rotation,
            max_ortho_scale: config.max_ortho_scale,
        };
        camera.reset();
        camera
    }

    /// Restore pan, rotation and zoom for both modes. The mode is kept.
    pub fn reset(&mut self) {
        self.distance = self.z_far / 2.0;
        self.translate = (0.0, 0.0);
        self.rotate = (0.0, DEFAULT_YAW);
        self.ortho_translate = (0.0, 0.0);
        self.ortho_scale = 1.0;
    }

    pub fn mode(&self) -> ProjectionMode {
        self.mode
    }

    pub fn is_ortho(&self) -> bool {
        self.mode == ProjectionMode::Orthographic
    }

    /// Switch projection. Pan, rotation and zoom are preserved.
    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn translate(&self) -> (f32, f32) {
        self.translate
    }

    pub fn rotation(&self) -> (f32, f32) {
        self.rotate
    }

    pub fn ortho_translate(&self) -> (f32, f32) {
        self.ortho_translate
    }

    pub fn ortho_scale(&self) -> f32 {
        self.ortho_scale
    }

    /// Separation between stacked layers. Grows with the tilt and is zero
    /// for a head-on view.
    pub fn depth_unit(&self) -> f32 {
        self.rotate.0.abs().max(self.rotate.1.abs()) * 5.0 / 9.0
    }

    /// Drag by `(dx, dy)` pixels in screen space (positive is right and down).
    ///
    /// Orthographic drags always pan. Perspective drags rotate when
    /// `rotate` is set, scaled so that dragging across the whole root
    /// sweeps twice the rotation limit, and pan otherwise.
    pub fn drag(&mut self, dx: f32, dy: f32, rotate: bool, root: Rect) {
        match self.mode {
            ProjectionMode::Orthographic => {
                self.ortho_translate.0 += dx;
                self.ortho_translate.1 += dy;
            }
            ProjectionMode::Perspective if rotate => {
                let limit = self.max_rotation;
                if root.height != 0 {
                    self.rotate.0 += dy * 2.0 * limit / root.height as f32;
                }
                if root.width != 0 {
                    self.rotate.1 += dx * 2.0 * limit / root.width as f32;
                }
                self.rotate.0 = self.rotate.0.clamp(-limit, limit);
                self.rotate.1 = self.rotate.1.clamp(-limit, limit);
            }
            ProjectionMode::Perspective => {
                self.translate.0 += dx;
                self.translate.1 -= dy;
            }
        }
    }

    /// Apply `count` wheel steps.
    ///
    /// Orthographic zoom changes the scale within
    /// `[min(viewport / max_bounds) / 2, max_ortho_scale]`. Perspective zoom
    /// moves the eye, staying strictly between the clip planes.
    pub fn zoom(&mut self, count: f32, config: &InspectorConfig, viewport: (u32, u32), max_bounds: Rect) {
        match self.mode {
            ProjectionMode::Orthographic => {
                let sx = viewport.0 as f32 / max_bounds.width.max(1) as f32;
                let sy = viewport.1 as f32 / max_bounds.height.max(1) as f32;
                let min_scale = sx.min(sy) / 2.0;
                self.ortho_scale += count * config.ortho_scale_step;
                if self.ortho_scale < min_scale {
                    self.ortho_scale = min_scale;
                } else if self.ortho_scale > self.max_ortho_scale {
                    self.ortho_scale = self.max_ortho_scale;
                }
            }
            ProjectionMode::Perspective => {
                self.distance += count * config.zoom_step;
                if self.distance >= self.z_far {
                    self.distance = self.z_far - 0.1;
                } else if self.distance <= self.z_near {
                    self.distance = self.z_near + 0.1;
                }
            }
        }
    }

    pub fn projection(&self, width: u32, height: u32) -> Transform {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        match self.mode {
            ProjectionMode::Orthographic => Transform::ortho(0.0, w, h, 0.0, self.z_near, self.z_far),
            ProjectionMode::Perspective => {
                Transform::perspective(self.fov_y, w / h, self.z_near, self.z_far)
            }
        }
    }

    /// Model-view matrix for the root of the scene.
    ///
    /// Nodes are laid out with x to the right and y negated, so `(x, -y)`
    /// places a device rectangle in the fourth quadrant.
    pub fn view(&self, root: Rect, viewport_width: u32) -> Transform {
        let eye = Transform::look_at([0.0, 0.0, self.distance], [0.0; 3], [0.0, 1.0, 0.0]);
        match self.mode {
            ProjectionMode::Orthographic => {
                let scale = self.ortho_scale;
                let scaled_w = root.width as f32 * scale;
                let scaled_h = root.height as f32 * scale;
                eye.then(&Transform::translate(self.ortho_translate.0, self.ortho_translate.1, 0.0))
                    .then(&Transform::rotate_x_degrees(180.0))
                    .then(&Transform::translate(
                        (viewport_width as f32 - scaled_w) / 2.0,
                        0.0,
                        0.0,
                    ))
                    .then(&Transform::translate(scaled_w / 2.0, -scaled_h / 2.0, 0.0))
                    .then(&Transform::scale(scale, scale, 0.0))
                    .then(&Transform::translate(-scaled_w / 2.0, scaled_h / 2.0, 0.0))
            }
            ProjectionMode::Perspective => eye
                .then(&Transform::translate(self.translate.0, self.translate.1, 0.0))
                .then(&Transform::rotate_x_degrees(self.rotate.0))
                .then(&Transform::rotate_y_degrees(self.rotate.1))
                .then(&Transform::translate(
                    -(root.width as f32) / 2.0,
                    root.height as f32 / 2.0,
                    0.0,
                )),
        }
    }
}
