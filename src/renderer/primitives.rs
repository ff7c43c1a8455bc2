//! Tessellation of node rectangles into triangles and line segments.
//!
//! A node of size `w x h` occupies `(0, 0)..(w, -h)` in its local frame:
//! x grows to the right, y is negated so device rows go down, and z grows
//! toward the viewer. Depth values passed here are offsets along z and are
//! negative for geometry behind the front face.

use super::commands::Vertex;

/// Corners of the front face, clockwise from the top left.
fn corners(w: f32, h: f32) -> [(f32, f32); 4] {
    [(0.0, 0.0), (w, 0.0), (w, -h), (0.0, -h)]
}

/// Filled rectangle at depth `z`.
pub fn front_face(w: f32, h: f32, z: f32) -> Vec<Vertex> {
    let [tl, tr, br, bl] = corners(w, h);
    vec![
        Vertex::new(tl.0, tl.1, z),
        Vertex::new(tr.0, tr.1, z),
        Vertex::new(br.0, br.1, z),
        Vertex::new(tl.0, tl.1, z),
        Vertex::new(br.0, br.1, z),
        Vertex::new(bl.0, bl.1, z),
    ]
}

/// Filled rectangle at depth 0 with texture coordinates `(0,0)..(1,1)`
/// from the top left to the bottom right.
pub fn textured_face(w: f32, h: f32) -> Vec<Vertex> {
    let tl = Vertex::with_uv(0.0, 0.0, 0.0, 0.0, 0.0);
    let tr = Vertex::with_uv(w, 0.0, 0.0, 1.0, 0.0);
    let br = Vertex::with_uv(w, -h, 0.0, 1.0, 1.0);
    let bl = Vertex::with_uv(0.0, -h, 0.0, 0.0, 1.0);
    vec![tl, tr, br, tl, br, bl]
}

/// The four side walls of a slab running from z = 0 to z = `depth`.
pub fn slab_sides(w: f32, h: f32, depth: f32) -> Vec<Vertex> {
    let c = corners(w, h);
    let mut out = Vec::with_capacity(24);
    for i in 0..4 {
        let (ax, ay) = c[i];
        let (bx, by) = c[(i + 1) % 4];
        let a0 = Vertex::new(ax, ay, 0.0);
        let a1 = Vertex::new(ax, ay, depth);
        let b0 = Vertex::new(bx, by, 0.0);
        let b1 = Vertex::new(bx, by, depth);
        out.extend_from_slice(&[a0, a1, b0, b0, a1, b1]);
    }
    out
}

/// The four edges of a slab that run along z, from z = 0 to z = `depth`.
pub fn slab_edges(w: f32, h: f32, depth: f32) -> Vec<Vertex> {
    corners(w, h)
        .iter()
        .flat_map(|&(x, y)| [Vertex::new(x, y, 0.0), Vertex::new(x, y, depth)])
        .collect()
}

/// Rectangle outline at depth `z`, as line segment pairs.
pub fn front_outline(w: f32, h: f32, z: f32) -> Vec<Vertex> {
    let c = corners(w, h);
    let mut out = Vec::with_capacity(8);
    for i in 0..4 {
        let (ax, ay) = c[i];
        let (bx, by) = c[(i + 1) % 4];
        out.push(Vertex::new(ax, ay, z));
        out.push(Vertex::new(bx, by, z));
    }
    out
}

/// Expand a clip-space segment into two triangles `width` pixels wide.
///
/// Returns `None` when an endpoint is behind the eye. The quad is built in
/// normalized device coordinates, so the result has `w = 1`.
pub fn thick_segment(
    a: [f32; 4],
    b: [f32; 4],
    width: f32,
    viewport: (u32, u32),
) -> Option<[[f32; 4]; 6]> {
    if a[3] <= f32::EPSILON || b[3] <= f32::EPSILON {
        return None;
    }
    let (vw, vh) = (viewport.0.max(1) as f32, viewport.1.max(1) as f32);
    let na = [a[0] / a[3], a[1] / a[3], a[2] / a[3]];
    let nb = [b[0] / b[3], b[1] / b[3], b[2] / b[3]];

    // Perpendicular in pixel space, converted back to NDC per axis.
    let dx = (nb[0] - na[0]) * vw;
    let dy = (nb[1] - na[1]) * vh;
    let len = (dx * dx + dy * dy).sqrt();
    if len < f32::EPSILON {
        return None;
    }
    let half = width / 2.0;
    let ox = -dy / len * half * 2.0 / vw;
    let oy = dx / len * half * 2.0 / vh;

    let p = |n: [f32; 3], s: f32| [n[0] + ox * s, n[1] + oy * s, n[2], 1.0];
    let (a0, a1, b0, b1) = (p(na, 1.0), p(na, -1.0), p(nb, 1.0), p(nb, -1.0));
    Some([a0, a1, b0, b0, a1, b1])
}
