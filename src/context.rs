//! Rendering context abstraction over the GPU backend.
//!
//! The replay engine only ever talks to the narrow [`DrawContext`] seam:
//! upload a vertex buffer once, set a transform, issue ranged point draws.
//! [`PointPipeline`] is the wgpu-backed production implementation;
//! [`TraceContext`] records the same calls for headless verification.

use crate::error::RenderResult;
use crate::gpu;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

/// Opaque handle to a backend vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// The graphics seam the replay engine batches against.
pub trait DrawContext {
    /// Allocate a backend vertex buffer and upload `data` once.
    /// The buffer is immutable afterwards.
    fn upload_vertices(&mut self, label: &str, data: &[f32]) -> BufferId;

    /// Set the projection transform and pixel ratio for subsequent draws.
    fn set_transform(&mut self, transform: Mat4, pixel_ratio: f32);

    /// Bind the vertex buffer used by subsequent draws.
    fn bind_vertex_buffer(&mut self, buffer: BufferId);

    /// Draw `vertex_count` point primitives starting at `first_vertex`
    /// of the bound buffer.
    fn draw_points(&mut self, first_vertex: u32, vertex_count: u32);
}

/// One recorded draw run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRun {
    pub buffer: BufferId,
    pub first_vertex: u32,
    pub vertex_count: u32,
}

/// Recording backend: captures uploads and draw runs instead of touching
/// the GPU. Used for headless verification and in tests.
#[derive(Debug, Default)]
pub struct TraceContext {
    pub uploads: Vec<Vec<f32>>,
    pub transforms: Vec<Mat4>,
    pub draws: Vec<DrawRun>,
    bound: Option<BufferId>,
}

impl TraceContext {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DrawContext for TraceContext {
    fn upload_vertices(&mut self, _label: &str, data: &[f32]) -> BufferId {
        let id = BufferId(self.uploads.len() as u32);
        self.uploads.push(data.to_vec());
        id
    }

    fn set_transform(&mut self, transform: Mat4, _pixel_ratio: f32) {
        self.transforms.push(transform);
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferId) {
        self.bound = Some(buffer);
    }

    fn draw_points(&mut self, first_vertex: u32, vertex_count: u32) {
        let Some(buffer) = self.bound else {
            log::warn!("draw_points with no bound vertex buffer");
            return;
        };
        self.draws.push(DrawRun {
            buffer,
            first_vertex,
            vertex_count,
        });
    }
}

/// Point rendering uniforms
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct PointUniform {
    transform: [[f32; 4]; 4], // Projection transform
    viewport_size: [f32; 2],  // Viewport dimensions in pixels
    point_size: f32,          // Point diameter in CSS pixels
    pixel_ratio: f32,         // Device pixel ratio
    color: [f32; 4],          // Uniform point color (RGBA)
}

struct DrawCmd {
    buffer: BufferId,
    first: u32,
    count: u32,
}

/// wgpu-backed point context: uniformly styled points expanded to
/// screen-space quads, one instance per batched vertex.
///
/// `DrawContext` calls accumulate a deferred command list; [`flush`]
/// issues it into an open render pass.
///
/// [`flush`]: PointPipeline::flush
pub struct PointPipeline {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    uniform: PointUniform,
    buffers: Vec<wgpu::Buffer>,
    bound: Option<BufferId>,
    pending: Vec<DrawCmd>,
}

impl PointPipeline {
    pub fn new(target_format: wgpu::TextureFormat) -> RenderResult<Self> {
        let g = gpu::ctx();

        let shader = g.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("point.wgsl"),
            source: wgpu::ShaderSource::Wgsl(std::borrow::Cow::Borrowed(include_str!(
                "shaders/point.wgsl"
            ))),
        });

        let uniform = PointUniform {
            transform: Mat4::IDENTITY.to_cols_array_2d(),
            viewport_size: [1.0, 1.0],
            point_size: 4.0,
            pixel_ratio: 1.0,
            color: [0.2, 0.4, 0.8, 1.0],
        };

        let uniform_buffer = g.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mf.Vector.Point.Uniform"),
            size: std::mem::size_of::<PointUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout =
            g.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("mf.Vector.Point.BindGroupLayout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });

        let bind_group = g.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mf.Vector.Point.BindGroup"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = g
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("mf.Vector.Point.PipelineLayout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = g
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("mf.Vector.Point.Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: 8,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &[wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x2,
                        }],
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: target_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

        Ok(Self {
            pipeline,
            uniform_buffer,
            bind_group,
            uniform,
            buffers: Vec::new(),
            bound: None,
            pending: Vec::new(),
        })
    }

    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        self.uniform.viewport_size = [width as f32, height as f32];
        self.write_uniform();
    }

    pub fn set_point_style(&mut self, size: f32, color: [f32; 4]) {
        self.uniform.point_size = size;
        self.uniform.color = color;
        self.write_uniform();
    }

    fn write_uniform(&self) {
        gpu::ctx()
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniform));
    }

    /// Issue all deferred draw runs into an open render pass.
    pub fn flush<'pass>(&'pass self, render_pass: &mut wgpu::RenderPass<'pass>) {
        if self.pending.is_empty() {
            return;
        }
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        for cmd in &self.pending {
            let Some(buffer) = self.buffers.get(cmd.buffer.0 as usize) else {
                log::warn!("stale vertex buffer handle {:?}", cmd.buffer);
                continue;
            };
            render_pass.set_vertex_buffer(0, buffer.slice(..));
            render_pass.draw(0..4, cmd.first..cmd.first + cmd.count);
        }
    }

    /// Forget deferred draws; uploaded buffers stay valid.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.bound = None;
    }
}

impl DrawContext for PointPipeline {
    fn upload_vertices(&mut self, label: &str, data: &[f32]) -> BufferId {
        let g = gpu::ctx();
        let buffer = g
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let id = BufferId(self.buffers.len() as u32);
        self.buffers.push(buffer);
        log::debug!("uploaded {} point vertices to {:?}", data.len() / 2, id);
        id
    }

    fn set_transform(&mut self, transform: Mat4, pixel_ratio: f32) {
        self.uniform.transform = transform.to_cols_array_2d();
        self.uniform.pixel_ratio = pixel_ratio;
        self.write_uniform();
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferId) {
        self.bound = Some(buffer);
    }

    fn draw_points(&mut self, first_vertex: u32, vertex_count: u32) {
        let Some(buffer) = self.bound else {
            log::warn!("draw_points with no bound vertex buffer");
            return;
        };
        if vertex_count == 0 {
            return;
        }
        self.pending.push(DrawCmd {
            buffer,
            first: first_vertex,
            count: vertex_count,
        });
    }
}
