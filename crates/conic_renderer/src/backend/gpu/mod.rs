//! wgpu implementation of [`RenderContext`].
//!
//! Creation calls run inside a validation error scope so the device's
//! complaints come back as `ResourceCreation` errors instead of reaching the
//! uncaptured-error handler.  Activation calls only update the tracked
//! [`BoundState`]; `draw_indexed` resolves it into a cached render pipeline
//! and a pair of bind groups and queues the draw.  The queued draws are
//! replayed into a single render pass at `end_frame`.
//!
//! Constant-buffer slots map onto bind groups by stage: vertex slot `n` is
//! `@group(0) @binding(n)`, pixel slot `n` is `@group(1) @binding(n)`.
//! Buffer writes go through the queue and land before the frame is
//! submitted, so a buffer rewritten twice within one frame shows its last
//! contents to every draw of that frame.

mod target;

pub use target::RenderTarget;

use std::collections::HashMap;
use std::sync::{mpsc, Arc};

use conic_core::context::EngineContext;
use conic_core::Color;
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::context::{
    BoundState, BufferDesc, BufferUsage, FrameStats, PrimitiveTopology, RenderContext, ResolvedDraw,
    ResourceId,
};
use crate::error::{GraphicsError, ResourceKind};
use crate::geometry::VertexLayout;
use crate::shader::{self, ShaderReflection, ShaderSource, ShaderStage};

enum GpuResource {
    Buffer {
        buffer: Arc<wgpu::Buffer>,
        usage: BufferUsage,
    },
    Shader {
        module: wgpu::ShaderModule,
        stage: ShaderStage,
        entry_point: String,
    },
    InputLayout(VertexLayout),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    vertex_shader: ResourceId,
    pixel_shader: ResourceId,
    input_layout: ResourceId,
    topology: PrimitiveTopology,
    vertex_slots: Vec<u32>,
    pixel_slots: Vec<u32>,
}

struct QueuedDraw {
    pipeline: usize,
    vertex_buffer: Arc<wgpu::Buffer>,
    index_buffer: Arc<wgpu::Buffer>,
    bind_groups: [wgpu::BindGroup; 2],
    index_count: u32,
}

/// An RGBA8 copy of the colour target, rows tightly packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

pub struct WgpuContext {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    target: RenderTarget,
    resources: Vec<Option<GpuResource>>,
    bound: BoundState,
    group_layouts: HashMap<(ShaderStage, Vec<u32>), wgpu::BindGroupLayout>,
    pipeline_index: HashMap<PipelineKey, usize>,
    pipelines: Vec<wgpu::RenderPipeline>,
    queued: Vec<QueuedDraw>,
    /// `Some` between `begin_frame` and `end_frame`.
    clear: Option<Color>,
    view: Mat4,
    projection: Mat4,
    frames_finished: u64,
    stats: FrameStats,
}

impl WgpuContext {
    pub fn new(context: &EngineContext, width: u32, height: u32) -> Result<Self, GraphicsError> {
        Self::with_sample_count(context, width, height, 1)
    }

    pub fn with_sample_count(
        context: &EngineContext,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Result<Self, GraphicsError> {
        if width == 0 || height == 0 {
            return Err(GraphicsError::invalid(format!(
                "render target must not be empty ({width}x{height})"
            )));
        }
        if !matches!(sample_count, 1 | 4) {
            return Err(GraphicsError::invalid(format!(
                "unsupported sample count {sample_count}"
            )));
        }
        let target = RenderTarget::new(&context.device, width, height, sample_count);
        log::info!("wgpu context ready: {width}x{height}, {sample_count}x MSAA");
        Ok(Self {
            device: Arc::clone(&context.device),
            queue: Arc::clone(&context.queue),
            target,
            resources: Vec::new(),
            bound: BoundState::default(),
            group_layouts: HashMap::new(),
            pipeline_index: HashMap::new(),
            pipelines: Vec::new(),
            queued: Vec::new(),
            clear: None,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            frames_finished: 0,
            stats: FrameStats::default(),
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    /// Number of distinct render pipelines built so far.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Runs `f` inside a validation error scope.
    fn scoped<T>(&self, f: impl FnOnce(&wgpu::Device) -> T) -> (T, Option<wgpu::Error>) {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(&self.device);
        let error = pollster::block_on(self.device.pop_error_scope());
        (value, error)
    }

    fn push(&mut self, resource: GpuResource) -> ResourceId {
        let id = ResourceId(self.resources.len() as u32);
        self.resources.push(Some(resource));
        id
    }

    fn resource(&self, id: ResourceId) -> Result<&GpuResource, GraphicsError> {
        self.resources
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| GraphicsError::draw(format!("resource {id} does not exist")))
    }

    fn buffer(&self, id: ResourceId, want: BufferUsage) -> Result<&Arc<wgpu::Buffer>, GraphicsError> {
        match self.resource(id)? {
            GpuResource::Buffer { buffer, usage } if *usage == want => Ok(buffer),
            _ => Err(GraphicsError::draw(format!("{id} is not a {want:?} buffer"))),
        }
    }

    fn ensure_group_layout(&mut self, stage: ShaderStage, slots: &[u32]) {
        let key = (stage, slots.to_vec());
        if self.group_layouts.contains_key(&key) {
            return;
        }
        let entries: Vec<_> = slots
            .iter()
            .map(|&binding| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: stage.to_wgpu(),
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect();
        let layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(match stage {
                    ShaderStage::Vertex => "conic vertex constants",
                    ShaderStage::Pixel => "conic pixel constants",
                }),
                entries: &entries,
            });
        self.group_layouts.insert(key, layout);
    }

    fn bind_group(
        &self,
        stage: ShaderStage,
        constants: &[(u32, ResourceId)],
    ) -> Result<wgpu::BindGroup, GraphicsError> {
        let slots: Vec<u32> = constants.iter().map(|(slot, _)| *slot).collect();
        let layout = self
            .group_layouts
            .get(&(stage, slots))
            .ok_or_else(|| GraphicsError::draw("missing bind group layout"))?;
        let mut entries = Vec::with_capacity(constants.len());
        for &(binding, id) in constants {
            let buffer = self.buffer(id, BufferUsage::Uniform)?;
            entries.push(wgpu::BindGroupEntry {
                binding,
                resource: buffer.as_entire_binding(),
            });
        }
        Ok(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout,
            entries: &entries,
        }))
    }

    fn pipeline_for(&mut self, draw: &ResolvedDraw) -> Result<usize, GraphicsError> {
        let key = PipelineKey {
            vertex_shader: draw.vertex_shader,
            pixel_shader: draw.pixel_shader,
            input_layout: draw.input_layout,
            topology: draw.topology,
            vertex_slots: draw.vertex_constants.iter().map(|(s, _)| *s).collect(),
            pixel_slots: draw.pixel_constants.iter().map(|(s, _)| *s).collect(),
        };
        if let Some(&index) = self.pipeline_index.get(&key) {
            return Ok(index);
        }

        self.ensure_group_layout(ShaderStage::Vertex, &key.vertex_slots);
        self.ensure_group_layout(ShaderStage::Pixel, &key.pixel_slots);

        let (vs_module, vs_entry) = match self.resource(key.vertex_shader)? {
            GpuResource::Shader {
                module,
                stage: ShaderStage::Vertex,
                entry_point,
            } => (module, entry_point.as_str()),
            _ => return Err(GraphicsError::draw("bound vertex shader is not a vertex shader")),
        };
        let (ps_module, ps_entry) = match self.resource(key.pixel_shader)? {
            GpuResource::Shader {
                module,
                stage: ShaderStage::Pixel,
                entry_point,
            } => (module, entry_point.as_str()),
            _ => return Err(GraphicsError::draw("bound pixel shader is not a pixel shader")),
        };
        let layout = match self.resource(key.input_layout)? {
            GpuResource::InputLayout(layout) => layout,
            _ => return Err(GraphicsError::draw("bound input layout was released")),
        };
        if layout.stride != draw.stride {
            return Err(GraphicsError::draw(format!(
                "vertex buffer stride {} does not match the input layout's {}",
                draw.stride, layout.stride
            )));
        }
        let attributes = layout.wgpu_attributes();
        let vs_group = &self.group_layouts[&(ShaderStage::Vertex, key.vertex_slots.clone())];
        let ps_group = &self.group_layouts[&(ShaderStage::Pixel, key.pixel_slots.clone())];
        let sample_count = self.target.sample_count;
        let topology = key.topology;

        let (pipeline, error) = self.scoped(|device| {
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("conic pipeline layout"),
                bind_group_layouts: &[vs_group, ps_group],
                push_constant_ranges: &[],
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("conic pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vs_module,
                    entry_point: Some(vs_entry),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: layout.stride as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &attributes,
                    }],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: ps_module,
                    entry_point: Some(ps_entry),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: RenderTarget::COLOR_FORMAT,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: topology.to_wgpu(),
                    strip_index_format: (topology == PrimitiveTopology::TriangleStrip)
                        .then_some(wgpu::IndexFormat::Uint16),
                    // meshes wind their front faces clockwise
                    front_face: wgpu::FrontFace::Cw,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: RenderTarget::DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: sample_count,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            })
        });
        if let Some(e) = error {
            log::error!("pipeline creation failed: {e}");
            return Err(GraphicsError::draw(format!("pipeline creation failed: {e}")));
        }

        let index = self.pipelines.len();
        self.pipelines.push(pipeline);
        self.pipeline_index.insert(key, index);
        log::debug!("built render pipeline #{index}");
        Ok(index)
    }

    /// Copies the colour target of the last finished frame to the CPU.
    pub fn capture_frame(&self) -> Result<CapturedFrame, GraphicsError> {
        let (width, height) = (self.target.width, self.target.height);
        // bytes per row must be a multiple of COPY_BYTES_PER_ROW_ALIGNMENT
        let unpadded = 4 * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;

        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("conic readback"),
            size: padded as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("conic readback encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.target.color,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| GraphicsError::draw("readback callback was dropped"))?
            .map_err(|e| GraphicsError::draw(format!("readback failed: {e}")))?;

        let data = slice.get_mapped_range();
        let mut rgba = Vec::with_capacity((unpadded * height) as usize);
        // rows may be padded; keep only the first `unpadded` bytes of each
        for row in data.chunks_exact(padded as usize) {
            rgba.extend_from_slice(&row[..unpadded as usize]);
        }
        drop(data);
        readback.unmap();

        Ok(CapturedFrame { width, height, rgba })
    }
}

impl RenderContext for WgpuContext {
    fn backend_name(&self) -> &'static str {
        "wgpu"
    }

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<ResourceId, GraphicsError> {
        let kind = desc.usage.resource_kind();
        if desc.contents.is_empty() {
            return Err(GraphicsError::resource(
                kind,
                format!("`{}` has no contents", desc.label),
            ));
        }
        let usage = match desc.usage {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
            BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        };
        let (buffer, error) = self.scoped(|device| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(desc.label),
                contents: desc.contents,
                usage,
            })
        });
        if let Some(e) = error {
            return Err(GraphicsError::resource(kind, format!("`{}`: {e}", desc.label)));
        }
        Ok(self.push(GpuResource::Buffer {
            buffer: Arc::new(buffer),
            usage: desc.usage,
        }))
    }

    fn write_buffer(&mut self, id: ResourceId, bytes: &[u8]) -> Result<(), GraphicsError> {
        let buffer = self.buffer(id, BufferUsage::Uniform)?;
        if bytes.len() as u64 > buffer.size() || bytes.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(GraphicsError::draw(format!(
                "{}-byte write does not fit the {}-byte buffer {id}",
                bytes.len(),
                buffer.size()
            )));
        }
        self.queue.write_buffer(buffer, 0, bytes);
        self.stats.buffer_writes += 1;
        Ok(())
    }

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &ShaderSource,
    ) -> Result<(ResourceId, ShaderReflection), GraphicsError> {
        // naga catches source errors with a readable diagnostic before the
        // device sees the module
        let compiled = shader::compile(stage, source)?;
        let (module, error) = self.scoped(|device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(source.name.as_ref()),
                source: wgpu::ShaderSource::Wgsl(source.code.clone()),
            })
        });
        if let Some(e) = error {
            return Err(GraphicsError::resource(
                stage.resource_kind(),
                format!("`{}`: {e}", source.name),
            ));
        }
        let id = self.push(GpuResource::Shader {
            module,
            stage,
            entry_point: source.entry_point.to_string(),
        });
        Ok((id, compiled.reflection))
    }

    fn create_input_layout(
        &mut self,
        layout: &VertexLayout,
        vertex_shader: &ShaderReflection,
    ) -> Result<ResourceId, GraphicsError> {
        layout.validate()?;
        layout.validate_against(vertex_shader)?;
        if layout.stride as u64 > self.device.limits().max_vertex_buffer_array_stride as u64 {
            return Err(GraphicsError::resource(
                ResourceKind::InputLayout,
                format!("stride {} exceeds the device limit", layout.stride),
            ));
        }
        Ok(self.push(GpuResource::InputLayout(layout.clone())))
    }

    fn set_vertex_buffer(&mut self, id: ResourceId, stride: u32) -> Result<(), GraphicsError> {
        self.buffer(id, BufferUsage::Vertex)?;
        self.bound.vertex_buffer = Some((id, stride));
        Ok(())
    }

    fn set_index_buffer(&mut self, id: ResourceId) -> Result<(), GraphicsError> {
        self.buffer(id, BufferUsage::Index)?;
        self.bound.index_buffer = Some(id);
        Ok(())
    }

    fn set_shader(&mut self, stage: ShaderStage, id: ResourceId) -> Result<(), GraphicsError> {
        match self.resource(id)? {
            GpuResource::Shader { stage: compiled, .. } if *compiled == stage => {}
            _ => return Err(GraphicsError::draw(format!("{id} is not a {stage:?} shader"))),
        }
        self.bound.set_shader(stage, id);
        Ok(())
    }

    fn set_input_layout(&mut self, id: ResourceId) -> Result<(), GraphicsError> {
        if !matches!(self.resource(id)?, GpuResource::InputLayout(_)) {
            return Err(GraphicsError::draw(format!("{id} is not an input layout")));
        }
        self.bound.input_layout = Some(id);
        Ok(())
    }

    fn set_topology(&mut self, topology: PrimitiveTopology) -> Result<(), GraphicsError> {
        self.bound.topology = Some(topology);
        Ok(())
    }

    fn set_constant_buffer(
        &mut self,
        stage: ShaderStage,
        slot: u32,
        id: ResourceId,
    ) -> Result<(), GraphicsError> {
        self.buffer(id, BufferUsage::Uniform)?;
        self.bound.set_constant(stage, slot, id);
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32) -> Result<(), GraphicsError> {
        if self.clear.is_none() {
            return Err(GraphicsError::draw("draw issued outside of a frame"));
        }
        let draw = self.bound.resolve()?;
        let pipeline = self.pipeline_for(&draw)?;

        let index_buffer = Arc::clone(self.buffer(draw.index_buffer, BufferUsage::Index)?);
        let available = index_buffer.size() / 2;
        if index_count as u64 > available {
            return Err(GraphicsError::draw(format!(
                "draw of {index_count} indices exceeds the {available} bound"
            )));
        }
        let vertex_buffer = Arc::clone(self.buffer(draw.vertex_buffer, BufferUsage::Vertex)?);
        let bind_groups = [
            self.bind_group(ShaderStage::Vertex, &draw.vertex_constants)?,
            self.bind_group(ShaderStage::Pixel, &draw.pixel_constants)?,
        ];

        self.queued.push(QueuedDraw {
            pipeline,
            vertex_buffer,
            index_buffer,
            bind_groups,
            index_count,
        });
        self.stats.draw_calls += 1;
        Ok(())
    }

    fn begin_frame(&mut self, clear: Color) -> Result<(), GraphicsError> {
        if self.clear.is_some() {
            return Err(GraphicsError::draw("begin_frame called inside a frame"));
        }
        self.clear = Some(clear);
        self.queued.clear();
        self.stats = FrameStats {
            frame: self.frames_finished,
            ..Default::default()
        };
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), GraphicsError> {
        let clear = self
            .clear
            .take()
            .ok_or_else(|| GraphicsError::draw("end_frame called outside a frame"))?;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("conic frame encoder"),
            });
        {
            let (view, resolve_target) = self.target.attachment_views();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("conic frame"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            for draw in &self.queued {
                pass.set_pipeline(&self.pipelines[draw.pipeline]);
                pass.set_bind_group(0, &draw.bind_groups[0], &[]);
                pass.set_bind_group(1, &draw.bind_groups[1], &[]);
                pass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
                pass.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        let error = pollster::block_on(self.device.pop_error_scope());

        log::trace!(
            "frame {} submitted with {} draws",
            self.frames_finished,
            self.queued.len()
        );
        self.queued.clear();
        self.frames_finished += 1;
        match error {
            Some(e) => Err(GraphicsError::draw(format!("frame submission failed: {e}"))),
            None => Ok(()),
        }
    }

    fn set_view(&mut self, view: Mat4) {
        self.view = view;
    }

    fn view(&self) -> Mat4 {
        self.view
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    fn projection(&self) -> Mat4 {
        self.projection
    }

    fn release(&mut self, id: ResourceId) {
        // queued draws keep their own `Arc`s, so a buffer is not destroyed here
        if let Some(slot) = self.resources.get_mut(id.index()) {
            if slot.take().is_some() {
                log::debug!("wgpu context released {id}");
            }
        }
    }

    fn release_all(&mut self) {
        self.queued.clear();
        self.bound.clear();
        self.pipeline_index.clear();
        self.pipelines.clear();
        self.group_layouts.clear();
        let mut released = 0;
        for slot in self.resources.iter_mut().rev() {
            if let Some(resource) = slot.take() {
                if let GpuResource::Buffer { buffer, .. } = &resource {
                    buffer.destroy();
                }
                released += 1;
            }
        }
        log::debug!("wgpu context released {released} resources");
    }

    fn frame_stats(&self) -> FrameStats {
        self.stats
    }
}
