use std::collections::HashMap;

use wgpu::{BindGroupLayout, Device, PipelineLayout, RenderPipeline, ShaderModule, TextureFormat};

use super::commands::{StencilMode, Topology};
use super::constants::{ALPHA_CUTOFF, STENCIL_READ_MASK};
use super::gpu::GpuVertex;

pub const DEPTH_STENCIL_FORMAT: TextureFormat = TextureFormat::Depth24PlusStencil8;

fn shader_source() -> String {
    format!(
        r#"
struct VertexInput {{
    @location(0) clip: vec4<f32>,
    @location(1) color: vec4<f32>,
    @location(2) uv: vec2<f32>,
}}

struct VertexOutput {{
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) uv: vec2<f32>,
}}

@group(0) @binding(0) var t_image: texture_2d<f32>;
@group(0) @binding(1) var s_image: sampler;

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {{
    var out: VertexOutput;
    out.position = in.clip;
    out.color = in.color;
    out.uv = in.uv;
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let color = in.color * textureSample(t_image, s_image, in.uv);
    if (color.a <= {cutoff}) {{
        discard;
    }}
    return color;
}}
"#,
        cutoff = format!("{:.4}", ALPHA_CUTOFF)
    )
}

/// Stencil behaviour without the reference value, which is dynamic state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilKind {
    Keep,
    Increment,
    Equal,
    AtLeast,
}

impl From<StencilMode> for StencilKind {
    fn from(mode: StencilMode) -> Self {
        match mode {
            StencilMode::Keep => StencilKind::Keep,
            StencilMode::Increment => StencilKind::Increment,
            StencilMode::Equal(_) => StencilKind::Equal,
            StencilMode::AtLeast(_) => StencilKind::AtLeast,
        }
    }
}

impl StencilKind {
    fn face_state(self) -> wgpu::StencilFaceState {
        // The reference is on the left of the comparison, so "at least"
        // is `reference <= stored`.
        let (compare, pass_op) = match self {
            StencilKind::Keep => (wgpu::CompareFunction::Always, wgpu::StencilOperation::Keep),
            StencilKind::Increment => (
                wgpu::CompareFunction::Always,
                wgpu::StencilOperation::IncrementClamp,
            ),
            StencilKind::Equal => (wgpu::CompareFunction::Equal, wgpu::StencilOperation::Keep),
            StencilKind::AtLeast => (
                wgpu::CompareFunction::LessEqual,
                wgpu::StencilOperation::Keep,
            ),
        };
        wgpu::StencilFaceState {
            compare,
            fail_op: wgpu::StencilOperation::Keep,
            depth_fail_op: wgpu::StencilOperation::Keep,
            pass_op,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub format: TextureFormat,
    pub topology: Topology,
    pub stencil: StencilKind,
    pub blend: bool,
}

/// Render pipelines created on first use, one per state combination.
pub struct PipelineCache {
    shader: ShaderModule,
    layout: PipelineLayout,
    pub bind_group_layout: BindGroupLayout,
    pipelines: HashMap<PipelineKey, RenderPipeline>,
}

impl PipelineCache {
    pub fn new(device: &Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Inspector Shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source().into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Inspector Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Inspector Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        Self {
            shader,
            layout,
            bind_group_layout,
            pipelines: HashMap::new(),
        }
    }

    pub fn get(&mut self, device: &Device, key: PipelineKey) -> &RenderPipeline {
        let Self {
            shader,
            layout,
            pipelines,
            ..
        } = self;
        pipelines
            .entry(key)
            .or_insert_with(|| create_pipeline(device, shader, layout, key))
    }

    /// A pipeline previously created with [`PipelineCache::get`].
    pub fn cached(&self, key: &PipelineKey) -> Option<&RenderPipeline> {
        self.pipelines.get(key)
    }
}

fn create_pipeline(
    device: &Device,
    shader: &ShaderModule,
    layout: &PipelineLayout,
    key: PipelineKey,
) -> RenderPipeline {
    log::debug!("Creating pipeline {:?}", key);

    let blend = key.blend.then_some(wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    });

    let topology = match key.topology {
        Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
        Topology::Lines => wgpu::PrimitiveTopology::LineList,
    };

    let face = key.stencil.face_state();

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Inspector Render Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[GpuVertex::desc()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: key.format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_STENCIL_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState {
                front: face,
                back: face,
                read_mask: STENCIL_READ_MASK as u32,
                write_mask: 0xff,
            },
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
