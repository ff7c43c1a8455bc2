//! wgpu implementation of [`RenderBackend`].
//!
//! Frames are drawn into an off-screen `Rgba8Unorm` target with a combined
//! depth/stencil attachment, which is what picking reads from. When a
//! window surface is attached, [`RenderBackend::present`] replays the last
//! display frame into the surface texture.

use std::sync::mpsc;
use std::sync::Arc;

use image::RgbaImage;
use wgpu::util::DeviceExt;
use wgpu::{BindGroup, Buffer, Device, Extent3d, Queue, Sampler, Texture, TextureFormat, TextureView};

use super::gpu::{tessellate, GpuVertex};
use super::gpu_context::{GpuContext, SurfaceState};
use super::pipeline::{PipelineCache, PipelineKey, StencilKind, DEPTH_STENCIL_FORMAT};
use super::{Frame, FramePurpose, RenderBackend, TextureHandle};
use crate::geometry::Color;

const TARGET_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

struct GpuTexture {
    _texture: Texture,
    bind_group: BindGroup,
}

struct Target {
    color: Texture,
    color_view: TextureView,
    depth_view: TextureView,
}

/// Vertex range and state of one item inside the frame's vertex buffer.
struct Batch {
    key: PipelineKey,
    range: std::ops::Range<u32>,
    texture: Option<TextureHandle>,
    reference: u32,
}

pub struct GpuBackend {
    device: Arc<Device>,
    queue: Arc<Queue>,
    pipelines: PipelineCache,
    sampler: Sampler,
    white: GpuTexture,
    textures: Vec<GpuTexture>,
    width: u32,
    height: u32,
    target: Option<Target>,
    surface: Option<SurfaceState>,
    surface_depth: Option<(TextureView, u32, u32)>,
    readback: Buffer,
    last_display: Option<Frame>,
    has_frame: bool,
}

impl GpuBackend {
    pub fn new(context: &GpuContext, width: u32, height: u32) -> Self {
        let device = context.device.clone();
        let queue = context.queue.clone();
        let pipelines = PipelineCache::new(&device);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Inspector Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let mut white_image = RgbaImage::new(1, 1);
        white_image.put_pixel(0, 0, image::Rgba([255, 255, 255, 255]));
        let white = upload(&device, &queue, &pipelines, &sampler, &white_image);

        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pick Readback Buffer"),
            size: wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut backend = Self {
            device,
            queue,
            pipelines,
            sampler,
            white,
            textures: Vec::new(),
            width: 0,
            height: 0,
            target: None,
            surface: None,
            surface_depth: None,
            readback,
            last_display: None,
            has_frame: false,
        };
        backend.resize(width, height);
        backend
    }

    /// Present display frames to `surface` from now on.
    pub fn attach_surface(&mut self, surface: SurfaceState) {
        self.surface = Some(surface);
        self.surface_depth = None;
    }

    /// Copy the whole off-screen target back to the CPU.
    pub fn snapshot(&mut self) -> Option<RgbaImage> {
        let target = self.target.as_ref().filter(|_| self.has_frame)?;
        let padded = align_row(self.width * 4);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Snapshot Buffer"),
            size: padded as u64 * self.height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        self.copy_region(&target.color, &buffer, 0, 0, self.width, self.height, padded);

        let data = self.map_read(&buffer)?;
        let mut pixels = Vec::with_capacity((self.width * self.height * 4) as usize);
        for row in data.chunks_exact(padded as usize).take(self.height as usize) {
            pixels.extend_from_slice(&row[..(self.width * 4) as usize]);
        }
        RgbaImage::from_raw(self.width, self.height, pixels)
    }

    #[allow(clippy::too_many_arguments)]
    fn copy_region(&self, texture: &Texture, buffer: &Buffer, x: u32, y: u32, w: u32, h: u32, bytes_per_row: u32) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(h),
                },
            },
            Extent3d {
                width: w,
                height: h,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Map `buffer`, wait for the GPU, and copy its contents out.
    fn map_read(&self, buffer: &Buffer) -> Option<Vec<u8>> {
        let slice = buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        if let Err(err) = self.device.poll(wgpu::PollType::wait_indefinitely()) {
            log::error!("Device poll failed: {:?}", err);
            return None;
        }
        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                log::error!("Failed to map readback buffer: {:?}", err);
                return None;
            }
            Err(_) => return None,
        }
        let data = slice.get_mapped_range().to_vec();
        buffer.unmap();
        Some(data)
    }

    fn create_depth_view(&self, width: u32, height: u32) -> TextureView {
        self.device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("Depth Stencil Texture"),
                size: Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_STENCIL_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Record and submit `frame` into `color_view` using pipelines for `format`.
    fn encode(
        &mut self,
        frame: &Frame,
        format: TextureFormat,
        color_view: &TextureView,
        depth_view: &TextureView,
        size: (u32, u32),
    ) {
        let mut vertices: Vec<GpuVertex> = Vec::new();
        let mut batches = Vec::with_capacity(frame.items.len());
        for item in &frame.items {
            let (topology, item_vertices) = tessellate(item, size);
            if item_vertices.is_empty() {
                continue;
            }
            let start = vertices.len() as u32;
            vertices.extend(item_vertices);
            let key = PipelineKey {
                format,
                topology,
                stencil: StencilKind::from(item.stencil),
                blend: item.blend,
            };
            self.pipelines.get(&self.device, key);
            batches.push(Batch {
                key,
                range: start..vertices.len() as u32,
                texture: item.texture,
                reference: item.stencil.reference() as u32,
            });
        }

        let vertex_buffer = (!vertices.is_empty()).then(|| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Frame Vertex Buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Inspector Encoder"),
            });

        {
            let clear = frame.clear_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Inspector Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.r as f64,
                            g: clear.g as f64,
                            b: clear.b as f64,
                            a: clear.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Discard,
                    }),
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if let Some(vertex_buffer) = &vertex_buffer {
                render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                for batch in &batches {
                    let Some(pipeline) = self.pipelines.cached(&batch.key) else {
                        continue;
                    };
                    let bind_group = batch
                        .texture
                        .and_then(|t| self.textures.get(t.0 as usize))
                        .unwrap_or(&self.white);
                    render_pass.set_pipeline(pipeline);
                    render_pass.set_bind_group(0, &bind_group.bind_group, &[]);
                    render_pass.set_stencil_reference(batch.reference);
                    render_pass.draw(batch.range.clone(), 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn present_to_surface(&mut self, frame: &Frame) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let output = match surface.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost) => {
                surface.resize(surface.width(), surface.height());
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory");
                return;
            }
            Err(e) => {
                log::error!("Surface error: {:?}", e);
                return;
            }
        };
        let (w, h, format) = (surface.width(), surface.height(), surface.format());

        let stale = !matches!(&self.surface_depth, Some((_, dw, dh)) if *dw == w && *dh == h);
        if stale {
            self.surface_depth = Some((self.create_depth_view(w, h), w, h));
        }
        let Some((depth_view, _, _)) = self.surface_depth.take() else {
            return;
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.encode(frame, format, &view, &depth_view, (w, h));
        self.surface_depth = Some((depth_view, w, h));
        output.present();
    }
}

impl RenderBackend for GpuBackend {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.has_frame = false;
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(width, height);
        }
        if width == 0 || height == 0 {
            self.target = None;
            return;
        }

        let color = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Inspector Target"),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = self.create_depth_view(width, height);
        self.target = Some(Target {
            color,
            color_view,
            depth_view,
        });
    }

    fn upload_texture(&mut self, image: &RgbaImage) -> Option<TextureHandle> {
        if image.width() == 0 || image.height() == 0 {
            return None;
        }
        let limit = self.device.limits().max_texture_dimension_2d;
        if image.width() > limit || image.height() > limit {
            return None;
        }
        let texture = upload(&self.device, &self.queue, &self.pipelines, &self.sampler, image);
        self.textures.push(texture);
        Some(TextureHandle(self.textures.len() as u32 - 1))
    }

    fn release_textures(&mut self) {
        self.textures.clear();
    }

    fn draw(&mut self, frame: &Frame) {
        let Some(target) = self.target.take() else {
            return;
        };
        self.encode(
            frame,
            TARGET_FORMAT,
            &target.color_view,
            &target.depth_view,
            (self.width, self.height),
        );
        self.target = Some(target);
        self.has_frame = true;
        if frame.purpose == FramePurpose::Display {
            self.last_display = Some(frame.clone());
        }
    }

    fn read_pixel(&mut self, x: u32, y: u32) -> Option<Color> {
        if !self.has_frame || x >= self.width || y >= self.height {
            return None;
        }
        let target = self.target.as_ref()?;
        self.copy_region(
            &target.color,
            &self.readback,
            x,
            y,
            1,
            1,
            wgpu::COPY_BYTES_PER_ROW_ALIGNMENT,
        );
        let data = self.map_read(&self.readback)?;
        let [r, g, b, a] = [data[0], data[1], data[2], data[3]];
        Some(Color::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        ))
    }

    fn present(&mut self) {
        if let Some(frame) = self.last_display.take() {
            self.present_to_surface(&frame);
            self.last_display = Some(frame);
        }
    }
}

fn upload(
    device: &Device,
    queue: &Queue,
    pipelines: &PipelineCache,
    sampler: &Sampler,
    rgba: &RgbaImage,
) -> GpuTexture {
    let (width, height) = rgba.dimensions();
    let size = Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Drawable Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba.as_raw(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Drawable Bind Group"),
        layout: &pipelines.bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    GpuTexture {
        _texture: texture,
        bind_group,
    }
}

fn align_row(bytes: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    bytes.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::commands::Topology;

    #[test]
    fn test_align_row() {
        assert_eq!(align_row(4), 256);
        assert_eq!(align_row(256), 256);
        assert_eq!(align_row(1024 + 4), 1280);
    }

    #[test]
    fn test_lines_have_own_pipeline_key() {
        let a = PipelineKey {
            format: TARGET_FORMAT,
            topology: Topology::Lines,
            stencil: StencilKind::Keep,
            blend: true,
        };
        let b = PipelineKey {
            topology: Topology::Triangles,
            ..a
        };
        assert_ne!(a, b);
    }
}
