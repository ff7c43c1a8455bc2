//! Vertex data uploaded to the GPU.
//!
//! Vertices are transformed on the CPU, so the shader receives clip-space
//! positions and only has to interpolate, sample and test.

use wgpu::{VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

use super::commands::{DrawItem, Topology};
use super::primitives;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVertex {
    /// Homogeneous clip-space position
    pub clip: [f32; 4],
    /// Flat color, multiplied with the sampled texel
    pub color: [f32; 4],
    /// Texture coordinates
    pub uv: [f32; 2],
}

impl GpuVertex {
    pub fn desc() -> VertexBufferLayout<'static> {
        VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as u64,
            step_mode: VertexStepMode::Vertex,
            attributes: &[
                // clip
                VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: VertexFormat::Float32x4,
                },
                // color
                VertexAttribute {
                    offset: 16,
                    shader_location: 1,
                    format: VertexFormat::Float32x4,
                },
                // uv
                VertexAttribute {
                    offset: 32,
                    shader_location: 2,
                    format: VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Vertices for one draw item and the topology to draw them with.
///
/// Lines wider than one pixel become triangles, since the GPU only
/// rasterizes hairlines.
pub fn tessellate(item: &DrawItem, viewport: (u32, u32)) -> (Topology, Vec<GpuVertex>) {
    let color = item.color.to_array();
    let clip: Vec<[f32; 4]> = item
        .vertices
        .iter()
        .map(|v| item.transform.transform_point4(v.position[0], v.position[1], v.position[2]))
        .collect();

    if item.topology == Topology::Lines && item.line_width > 1.0 {
        let vertices = clip
            .chunks_exact(2)
            .filter_map(|seg| primitives::thick_segment(seg[0], seg[1], item.line_width, viewport))
            .flatten()
            .map(|clip| GpuVertex {
                clip,
                color,
                uv: [0.0, 0.0],
            })
            .collect();
        return (Topology::Triangles, vertices);
    }

    let vertices = clip
        .into_iter()
        .zip(&item.vertices)
        .map(|(clip, v)| GpuVertex {
            clip,
            color,
            uv: v.uv,
        })
        .collect();
    (item.topology, vertices)
}
