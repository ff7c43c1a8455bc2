//! CPU rasterizer implementing [`RenderBackend`].
//!
//! Produces the same images as the GPU path closely enough for picking and
//! overdraw to agree: less-or-equal depth test, 8-bit saturating stencil,
//! alpha cutoff, source-over blending and nearest texture sampling.
//! Triangles use a fixed-point edge test with a consistent tie rule, so two
//! triangles sharing an edge never both cover a pixel on it. That matters
//! here because every covered pixel bumps the overdraw count.
//!
//! Geometry with a vertex behind the eye is dropped rather than clipped.

use image::{Rgba, RgbaImage};

use super::commands::{DrawItem, StencilMode, Topology};
use super::constants::{ALPHA_CUTOFF, STENCIL_READ_MASK};
use super::{Frame, FramePurpose, RenderBackend, TextureHandle};
use crate::geometry::Color;

/// Sub-pixel precision of triangle setup, in bits.
const SUBPIXEL_BITS: i64 = 8;
const SUBPIXEL_ONE: i64 = 1 << SUBPIXEL_BITS;

/// Lines are pulled this far toward the viewer so outlines win against
/// the faces they trace.
const LINE_DEPTH_BIAS: f32 = 1e-6;

/// A vertex after projection and viewport mapping.
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    z: f32,
    inv_w: f32,
    u: f32,
    v: f32,
}

pub struct SoftwareBackend {
    width: u32,
    height: u32,
    color: RgbaImage,
    depth: Vec<f32>,
    stencil: Vec<u8>,
    textures: Vec<RgbaImage>,
    has_frame: bool,
    presented_frames: u64,
}

impl SoftwareBackend {
    pub fn new(width: u32, height: u32) -> Self {
        let mut backend = Self {
            width: 0,
            height: 0,
            color: RgbaImage::new(0, 0),
            depth: Vec::new(),
            stencil: Vec::new(),
            textures: Vec::new(),
            has_frame: false,
            presented_frames: 0,
        };
        backend.resize(width, height);
        backend
    }

    /// The color buffer of the last drawn frame.
    pub fn snapshot(&self) -> &RgbaImage {
        &self.color
    }

    pub fn pixel_at(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        (x < self.width && y < self.height).then(|| self.color.get_pixel(x, y).0)
    }

    /// Stencil count at `(x, y)` after the last frame.
    pub fn stencil_at(&self, x: u32, y: u32) -> Option<u8> {
        (x < self.width && y < self.height).then(|| self.stencil[self.index(x, y)])
    }

    /// Number of frames shown with [`RenderBackend::present`].
    pub fn presented_frames(&self) -> u64 {
        self.presented_frames
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    fn clear(&mut self, color: Color) {
        let px = Rgba(to_rgba8(color.to_array()));
        for p in self.color.pixels_mut() {
            *p = px;
        }
        self.depth.fill(1.0);
        self.stencil.fill(0);
    }

    fn project(&self, item: &DrawItem, index: usize) -> Option<ScreenVertex> {
        let vertex = item.vertices[index];
        let [x, y, z] = vertex.position;
        let [cx, cy, cz, cw] = item.transform.transform_point4(x, y, z);
        if cw <= f32::EPSILON {
            return None;
        }
        let inv_w = 1.0 / cw;
        Some(ScreenVertex {
            x: (cx * inv_w + 1.0) * 0.5 * self.width as f32,
            y: (1.0 - cy * inv_w) * 0.5 * self.height as f32,
            z: cz * inv_w,
            inv_w,
            u: vertex.uv[0],
            v: vertex.uv[1],
        })
    }

    fn draw_item(&mut self, item: &DrawItem) {
        match item.topology {
            Topology::Triangles => {
                for tri in 0..item.vertices.len() / 3 {
                    let v = (
                        self.project(item, tri * 3),
                        self.project(item, tri * 3 + 1),
                        self.project(item, tri * 3 + 2),
                    );
                    if let (Some(a), Some(b), Some(c)) = v {
                        self.fill_triangle(item, a, b, c);
                    }
                }
            }
            Topology::Lines => {
                for seg in 0..item.vertices.len() / 2 {
                    if let (Some(a), Some(b)) = (self.project(item, seg * 2), self.project(item, seg * 2 + 1)) {
                        self.draw_line(item, a, b);
                    }
                }
            }
        }
    }

    fn fill_triangle(&mut self, item: &DrawItem, a: ScreenVertex, b: ScreenVertex, c: ScreenVertex) {
        let fixed = |v: &ScreenVertex| {
            (
                (v.x * SUBPIXEL_ONE as f32).round() as i64,
                (v.y * SUBPIXEL_ONE as f32).round() as i64,
            )
        };
        let (mut a, mut b) = (a, b);
        let (mut pa, mut pb, pc) = (fixed(&a), fixed(&b), fixed(&c));
        let mut area = edge(pa, pb, pc);
        if area == 0 {
            return;
        }
        if area < 0 {
            std::mem::swap(&mut a, &mut b);
            std::mem::swap(&mut pa, &mut pb);
            area = -area;
        }

        let min_x = pa.0.min(pb.0).min(pc.0);
        let max_x = pa.0.max(pb.0).max(pc.0);
        let min_y = pa.1.min(pb.1).min(pc.1);
        let max_y = pa.1.max(pb.1).max(pc.1);
        let x0 = (min_x >> SUBPIXEL_BITS).max(0);
        let x1 = ((max_x >> SUBPIXEL_BITS) + 1).min(self.width as i64 - 1);
        let y0 = (min_y >> SUBPIXEL_BITS).max(0);
        let y1 = ((max_y >> SUBPIXEL_BITS) + 1).min(self.height as i64 - 1);

        let area_f = area as f32;
        let flat_z = (a.z == b.z && b.z == c.z).then_some(a.z);
        for py in y0..=y1 {
            for px in x0..=x1 {
                let p = (
                    px * SUBPIXEL_ONE + SUBPIXEL_ONE / 2,
                    py * SUBPIXEL_ONE + SUBPIXEL_ONE / 2,
                );
                let w0 = edge(pb, pc, p);
                let w1 = edge(pc, pa, p);
                let w2 = edge(pa, pb, p);
                if !covers(w0, pb, pc) || !covers(w1, pc, pa) || !covers(w2, pa, pb) {
                    continue;
                }

                let (l0, l1, l2) = (w0 as f32 / area_f, w1 as f32 / area_f, w2 as f32 / area_f);
                let z = flat_z.unwrap_or_else(|| l0 * a.z + l1 * b.z + l2 * c.z);
                let (pw0, pw1, pw2) = (l0 * a.inv_w, l1 * b.inv_w, l2 * c.inv_w);
                let sum = pw0 + pw1 + pw2;
                let (u, v) = if sum.abs() > f32::EPSILON {
                    (
                        (pw0 * a.u + pw1 * b.u + pw2 * c.u) / sum,
                        (pw0 * a.v + pw1 * b.v + pw2 * c.v) / sum,
                    )
                } else {
                    (0.0, 0.0)
                };
                self.shade(item, px as u32, py as u32, z, u, v);
            }
        }
    }

    fn draw_line(&mut self, item: &DrawItem, a: ScreenVertex, b: ScreenVertex) {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
        let thickness = item.line_width.max(1.0).round() as i64;
        let horizontal = dx.abs() >= dy.abs();

        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let x = (a.x + dx * t).floor() as i64;
            let y = (a.y + dy * t).floor() as i64;
            let z = a.z + (b.z - a.z) * t - LINE_DEPTH_BIAS;
            for k in 0..thickness {
                let (px, py) = if horizontal { (x, y + k) } else { (x + k, y) };
                if px < 0 || py < 0 || px >= self.width as i64 || py >= self.height as i64 {
                    continue;
                }
                self.shade(item, px as u32, py as u32, z, 0.0, 0.0);
            }
        }
    }

    fn shade(&mut self, item: &DrawItem, x: u32, y: u32, z: f32, u: f32, v: f32) {
        if !(0.0..=1.0).contains(&z) {
            return;
        }

        let mut rgba = item.color.to_array();
        if let Some(texture) = item.texture.and_then(|t| self.textures.get(t.0 as usize)) {
            let tx = ((u * texture.width() as f32) as i64).clamp(0, texture.width() as i64 - 1) as u32;
            let ty = ((v * texture.height() as f32) as i64).clamp(0, texture.height() as i64 - 1) as u32;
            let texel = texture.get_pixel(tx, ty).0;
            for (channel, t) in rgba.iter_mut().zip(texel) {
                *channel *= t as f32 / 255.0;
            }
        }
        if rgba[3] <= ALPHA_CUTOFF {
            return;
        }

        let i = self.index(x, y);
        let stored = self.stencil[i] & STENCIL_READ_MASK;
        let stencil_pass = match item.stencil {
            StencilMode::Keep | StencilMode::Increment => true,
            StencilMode::Equal(reference) => stored == reference,
            StencilMode::AtLeast(reference) => reference <= stored,
        };
        if !stencil_pass || z > self.depth[i] {
            return;
        }

        self.depth[i] = z;
        if item.stencil == StencilMode::Increment {
            self.stencil[i] = self.stencil[i].saturating_add(1);
        }

        let dst = self.color.get_pixel(x, y).0;
        let out = if item.blend {
            let a = rgba[3];
            let d = dst.map(|c| c as f32 / 255.0);
            [
                rgba[0] * a + d[0] * (1.0 - a),
                rgba[1] * a + d[1] * (1.0 - a),
                rgba[2] * a + d[2] * (1.0 - a),
                a + d[3] * (1.0 - a),
            ]
        } else {
            rgba
        };
        self.color.put_pixel(x, y, Rgba(to_rgba8(out)));
    }
}

impl RenderBackend for SoftwareBackend {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.color = RgbaImage::new(width, height);
        let len = (width as usize) * (height as usize);
        self.depth = vec![1.0; len];
        self.stencil = vec![0; len];
        self.has_frame = false;
    }

    fn upload_texture(&mut self, image: &RgbaImage) -> Option<TextureHandle> {
        if image.width() == 0 || image.height() == 0 {
            return None;
        }
        self.textures.push(image.clone());
        Some(TextureHandle(self.textures.len() as u32 - 1))
    }

    fn release_textures(&mut self) {
        self.textures.clear();
    }

    fn draw(&mut self, frame: &Frame) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        self.clear(frame.clear_color);
        for item in &frame.items {
            self.draw_item(item);
        }
        self.has_frame = true;
        if frame.purpose == FramePurpose::Pick {
            log::trace!("Rendered pick frame with {} items", frame.items.len());
        }
    }

    fn read_pixel(&mut self, x: u32, y: u32) -> Option<Color> {
        if !self.has_frame {
            return None;
        }
        let [r, g, b, a] = self.pixel_at(x, y)?;
        Some(Color::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        ))
    }

    fn present(&mut self) {
        if self.has_frame {
            self.presented_frames += 1;
        }
    }
}

/// Twice the signed area of `(a, b, p)`.
fn edge(a: (i64, i64), b: (i64, i64), p: (i64, i64)) -> i64 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

/// Inside test for one edge. Points exactly on the edge belong to only one
/// of the two triangles sharing it, picked by the edge's direction.
fn covers(w: i64, a: (i64, i64), b: (i64, i64)) -> bool {
    if w != 0 {
        return w > 0;
    }
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    dy > 0 || (dy == 0 && dx < 0)
}

fn to_rgba8(c: [f32; 4]) -> [u8; 4] {
    c.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::primitives;
    use crate::transform::Transform;

    /// Maps pixel coordinates straight to clip space, y down.
    fn pixel_space(w: u32, h: u32) -> Transform {
        Transform::ortho(0.0, w as f32, h as f32, 0.0, -1.0, 1.0)
    }

    fn quad(x: f32, y: f32, w: f32, h: f32) -> Vec<crate::renderer::Vertex> {
        let mut v = primitives::front_face(w, -h, 0.0);
        for vertex in &mut v {
            vertex.position[0] += x;
            vertex.position[1] += y;
        }
        v
    }

    fn frame(items: Vec<DrawItem>) -> Frame {
        Frame {
            width: 8,
            height: 8,
            clear_color: Color::BLACK,
            purpose: FramePurpose::Display,
            items,
        }
    }

    #[test]
    fn test_quad_stencil_counts_once() {
        let mut backend = SoftwareBackend::new(8, 8);
        let item = DrawItem::fill(quad(0.0, 0.0, 8.0, 8.0), pixel_space(8, 8), Color::WHITE)
            .with_stencil(StencilMode::Increment);
        backend.draw(&frame(vec![item]));
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(backend.stencil_at(x, y), Some(1), "pixel {x},{y}");
            }
        }
    }

    #[test]
    fn test_stencil_equal_gates_overlay() {
        let mut backend = SoftwareBackend::new(8, 8);
        let t = pixel_space(8, 8);
        let items = vec![
            DrawItem::fill(quad(0.0, 0.0, 8.0, 8.0), t, Color::WHITE).with_stencil(StencilMode::Increment),
            DrawItem::fill(quad(0.0, 0.0, 4.0, 8.0), t, Color::WHITE).with_stencil(StencilMode::Increment),
            DrawItem::fill(quad(0.0, 0.0, 8.0, 8.0), t, Color::rgb(1.0, 0.0, 0.0))
                .opaque()
                .with_stencil(StencilMode::Equal(2)),
        ];
        backend.draw(&frame(items));
        assert_eq!(backend.pixel_at(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(backend.pixel_at(6, 1), Some([255, 255, 255, 255]));
        assert_eq!(backend.stencil_at(1, 1), Some(2));
    }

    #[test]
    fn test_alpha_cutoff_skips_stencil() {
        let mut backend = SoftwareBackend::new(8, 8);
        let item = DrawItem::fill(quad(0.0, 0.0, 8.0, 8.0), pixel_space(8, 8), Color::rgba(1.0, 1.0, 1.0, 0.005))
            .with_stencil(StencilMode::Increment);
        backend.draw(&frame(vec![item]));
        assert_eq!(backend.stencil_at(3, 3), Some(0));
        assert_eq!(backend.pixel_at(3, 3), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_blending() {
        let mut backend = SoftwareBackend::new(8, 8);
        let item = DrawItem::fill(quad(0.0, 0.0, 8.0, 8.0), pixel_space(8, 8), Color::rgba(1.0, 1.0, 1.0, 0.5));
        backend.draw(&frame(vec![item]));
        assert_eq!(backend.pixel_at(0, 0), Some([128, 128, 128, 255]));
    }

    #[test]
    fn test_texture_sampling() {
        let mut backend = SoftwareBackend::new(8, 8);
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
        let handle = backend.upload_texture(&image).unwrap();
        let item = DrawItem::fill(primitives::textured_face(8.0, -8.0), pixel_space(8, 8), Color::WHITE)
            .with_texture(handle);
        backend.draw(&frame(vec![item]));
        assert_eq!(backend.pixel_at(1, 4), Some([255, 0, 0, 255]));
        assert_eq!(backend.pixel_at(6, 4), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_read_pixel_before_draw_is_none() {
        let mut backend = SoftwareBackend::new(4, 4);
        assert_eq!(backend.read_pixel(0, 0), None);
        backend.draw(&frame(Vec::new()));
        assert_eq!(backend.read_pixel(0, 0), Some(Color::BLACK));
        assert_eq!(backend.read_pixel(4, 0), None);
    }

    #[test]
    fn test_zero_size_is_noop() {
        let mut backend = SoftwareBackend::new(0, 0);
        backend.draw(&frame(Vec::new()));
        backend.present();
        assert_eq!(backend.presented_frames(), 0);
        assert_eq!(backend.read_pixel(0, 0), None);
    }
}
