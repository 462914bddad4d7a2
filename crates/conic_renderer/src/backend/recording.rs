//! Headless rendering context.
//!
//! `RecordingContext` owns no GPU: buffers are byte vectors, shaders are
//! compiled and reflected through naga exactly as the wgpu backend does, and
//! input layouts are validated against the reflected inputs.  Every call is
//! appended to a [`Command`] log and counted, so tests can assert how many
//! uploads, compiles, writes and draws a scene performed.
//!
//! Faults can be injected to exercise error paths:
//!
//! ```
//! use conic_renderer::backend::{Fault, RecordingContext};
//! use conic_renderer::context::{BufferDesc, BufferUsage, RenderContext};
//!
//! let mut ctx = RecordingContext::new();
//! ctx.inject_fault(Fault::RejectBuffers);
//! let desc = BufferDesc { label: "v", usage: BufferUsage::Vertex, contents: &[0; 12] };
//! assert!(ctx.create_buffer(&desc).is_err());
//! ```

use std::collections::HashMap;

use conic_core::Color;
use glam::Mat4;

use crate::context::{
    BoundState, BufferDesc, BufferUsage, FrameStats, PrimitiveTopology, RenderContext, ResourceId,
};
use crate::error::GraphicsError;
use crate::geometry::VertexLayout;
use crate::shader::{self, ShaderReflection, ShaderSource, ShaderStage};

/// One call made against a [`RecordingContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateBuffer {
        id: ResourceId,
        usage: BufferUsage,
        size: usize,
    },
    WriteBuffer {
        id: ResourceId,
        size: usize,
    },
    CompileShader {
        id: ResourceId,
        stage: ShaderStage,
        name: String,
    },
    CreateInputLayout {
        id: ResourceId,
    },
    SetVertexBuffer {
        id: ResourceId,
        stride: u32,
    },
    SetIndexBuffer {
        id: ResourceId,
    },
    SetShader {
        stage: ShaderStage,
        id: ResourceId,
    },
    SetInputLayout {
        id: ResourceId,
    },
    SetTopology(PrimitiveTopology),
    SetConstantBuffer {
        stage: ShaderStage,
        slot: u32,
        id: ResourceId,
    },
    DrawIndexed {
        index_count: u32,
    },
    BeginFrame(Color),
    EndFrame,
}

impl Command {
    /// Shader, input-layout and topology activations.
    pub fn is_pipeline_state(&self) -> bool {
        matches!(
            self,
            Self::SetShader { .. } | Self::SetInputLayout { .. } | Self::SetTopology(_)
        )
    }
}

/// Failure modes a test can switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// Every buffer creation is rejected.
    RejectBuffers,
    /// Creation, activation and draw calls all fail.
    DeviceLost,
}

#[derive(Debug)]
enum Resource {
    Buffer { usage: BufferUsage, bytes: Vec<u8> },
    Shader { stage: ShaderStage },
    InputLayout { stride: u32 },
}

#[derive(Debug, Default)]
pub struct RecordingContext {
    resources: Vec<Option<Resource>>,
    commands: Vec<Command>,
    bound: BoundState,
    view: Mat4,
    projection: Mat4,
    in_frame: bool,
    frames_finished: u64,
    stats: FrameStats,
    faults: Vec<Fault>,
    released: Vec<ResourceId>,
    uploads: HashMap<BufferUsage, usize>,
    writes: HashMap<ResourceId, usize>,
    compiles: usize,
    draws: usize,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            ..Default::default()
        }
    }

    pub fn inject_fault(&mut self, fault: Fault) {
        if !self.faults.contains(&fault) {
            self.faults.push(fault);
        }
    }

    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Returns the log and starts a fresh one.  Counters are unaffected.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Buffers created with `usage` since construction.
    pub fn uploads(&self, usage: BufferUsage) -> usize {
        self.uploads.get(&usage).copied().unwrap_or(0)
    }

    pub fn shader_compiles(&self) -> usize {
        self.compiles
    }

    /// Draw calls issued since construction.
    pub fn draw_calls(&self) -> usize {
        self.draws
    }

    pub fn buffer_writes(&self, id: ResourceId) -> usize {
        self.writes.get(&id).copied().unwrap_or(0)
    }

    /// Current contents of a live buffer.
    pub fn buffer_contents(&self, id: ResourceId) -> Option<&[u8]> {
        match self.resources.get(id.index())? {
            Some(Resource::Buffer { bytes, .. }) => Some(bytes),
            _ => None,
        }
    }

    pub fn live_resources(&self) -> usize {
        self.resources.iter().filter(|r| r.is_some()).count()
    }

    /// Ids in the order they were released.
    pub fn release_order(&self) -> &[ResourceId] {
        &self.released
    }

    fn has_fault(&self, fault: Fault) -> bool {
        self.faults.contains(&fault)
    }

    fn check_device(&self) -> Result<(), GraphicsError> {
        if self.has_fault(Fault::DeviceLost) {
            Err(GraphicsError::draw("device lost"))
        } else {
            Ok(())
        }
    }

    fn push(&mut self, resource: Resource) -> ResourceId {
        let id = ResourceId(self.resources.len() as u32);
        self.resources.push(Some(resource));
        id
    }

    fn resource(&self, id: ResourceId) -> Result<&Resource, GraphicsError> {
        self.resources
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| GraphicsError::draw(format!("resource {id} does not exist")))
    }

    fn expect_buffer(&self, id: ResourceId, want: BufferUsage) -> Result<&[u8], GraphicsError> {
        match self.resource(id)? {
            Resource::Buffer { usage, bytes } if *usage == want => Ok(bytes),
            _ => Err(GraphicsError::draw(format!("{id} is not a {want:?} buffer"))),
        }
    }
}

impl RenderContext for RecordingContext {
    fn backend_name(&self) -> &'static str {
        "recording"
    }

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<ResourceId, GraphicsError> {
        let kind = desc.usage.resource_kind();
        if self.has_fault(Fault::DeviceLost) {
            return Err(GraphicsError::resource(kind, "device lost"));
        }
        if self.has_fault(Fault::RejectBuffers) {
            return Err(GraphicsError::resource(
                kind,
                format!("`{}` rejected by device", desc.label),
            ));
        }
        if desc.contents.is_empty() {
            return Err(GraphicsError::resource(
                kind,
                format!("`{}` has no contents", desc.label),
            ));
        }
        let id = self.push(Resource::Buffer {
            usage: desc.usage,
            bytes: desc.contents.to_vec(),
        });
        *self.uploads.entry(desc.usage).or_default() += 1;
        self.commands.push(Command::CreateBuffer {
            id,
            usage: desc.usage,
            size: desc.contents.len(),
        });
        log::trace!("created {:?} buffer `{}` as {}", desc.usage, desc.label, id);
        Ok(id)
    }

    fn write_buffer(&mut self, id: ResourceId, bytes: &[u8]) -> Result<(), GraphicsError> {
        self.check_device()?;
        match self.resources.get_mut(id.index()).and_then(Option::as_mut) {
            Some(Resource::Buffer {
                usage: BufferUsage::Uniform,
                bytes: contents,
            }) => {
                if bytes.len() > contents.len() {
                    return Err(GraphicsError::draw(format!(
                        "{} bytes written to the {}-byte buffer {id}",
                        bytes.len(),
                        contents.len()
                    )));
                }
                contents[..bytes.len()].copy_from_slice(bytes);
            }
            _ => return Err(GraphicsError::draw(format!("{id} is not a writable buffer"))),
        }
        *self.writes.entry(id).or_default() += 1;
        self.stats.buffer_writes += 1;
        self.commands.push(Command::WriteBuffer {
            id,
            size: bytes.len(),
        });
        Ok(())
    }

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &ShaderSource,
    ) -> Result<(ResourceId, ShaderReflection), GraphicsError> {
        if self.has_fault(Fault::DeviceLost) {
            return Err(GraphicsError::resource(stage.resource_kind(), "device lost"));
        }
        let compiled = shader::compile(stage, source)?;
        let id = self.push(Resource::Shader { stage });
        self.compiles += 1;
        self.commands.push(Command::CompileShader {
            id,
            stage,
            name: source.name.to_string(),
        });
        Ok((id, compiled.reflection))
    }

    fn create_input_layout(
        &mut self,
        layout: &VertexLayout,
        vertex_shader: &ShaderReflection,
    ) -> Result<ResourceId, GraphicsError> {
        if self.has_fault(Fault::DeviceLost) {
            return Err(GraphicsError::resource(
                crate::error::ResourceKind::InputLayout,
                "device lost",
            ));
        }
        layout.validate()?;
        layout.validate_against(vertex_shader)?;
        let id = self.push(Resource::InputLayout {
            stride: layout.stride,
        });
        self.commands.push(Command::CreateInputLayout { id });
        Ok(id)
    }

    fn set_vertex_buffer(&mut self, id: ResourceId, stride: u32) -> Result<(), GraphicsError> {
        self.check_device()?;
        self.expect_buffer(id, BufferUsage::Vertex)?;
        self.bound.vertex_buffer = Some((id, stride));
        self.commands.push(Command::SetVertexBuffer { id, stride });
        Ok(())
    }

    fn set_index_buffer(&mut self, id: ResourceId) -> Result<(), GraphicsError> {
        self.check_device()?;
        self.expect_buffer(id, BufferUsage::Index)?;
        self.bound.index_buffer = Some(id);
        self.commands.push(Command::SetIndexBuffer { id });
        Ok(())
    }

    fn set_shader(&mut self, stage: ShaderStage, id: ResourceId) -> Result<(), GraphicsError> {
        self.check_device()?;
        match self.resource(id)? {
            Resource::Shader { stage: compiled } if *compiled == stage => {}
            _ => return Err(GraphicsError::draw(format!("{id} is not a {stage:?} shader"))),
        }
        self.bound.set_shader(stage, id);
        self.commands.push(Command::SetShader { stage, id });
        Ok(())
    }

    fn set_input_layout(&mut self, id: ResourceId) -> Result<(), GraphicsError> {
        self.check_device()?;
        if !matches!(self.resource(id)?, Resource::InputLayout { .. }) {
            return Err(GraphicsError::draw(format!("{id} is not an input layout")));
        }
        self.bound.input_layout = Some(id);
        self.commands.push(Command::SetInputLayout { id });
        Ok(())
    }

    fn set_topology(&mut self, topology: PrimitiveTopology) -> Result<(), GraphicsError> {
        self.check_device()?;
        self.bound.topology = Some(topology);
        self.commands.push(Command::SetTopology(topology));
        Ok(())
    }

    fn set_constant_buffer(
        &mut self,
        stage: ShaderStage,
        slot: u32,
        id: ResourceId,
    ) -> Result<(), GraphicsError> {
        self.check_device()?;
        self.expect_buffer(id, BufferUsage::Uniform)?;
        self.bound.set_constant(stage, slot, id);
        self.commands.push(Command::SetConstantBuffer { stage, slot, id });
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32) -> Result<(), GraphicsError> {
        self.check_device()?;
        if !self.in_frame {
            return Err(GraphicsError::draw("draw issued outside of a frame"));
        }
        let draw = self.bound.resolve()?;

        let layout_stride = match self.resource(draw.input_layout)? {
            Resource::InputLayout { stride } => *stride,
            _ => return Err(GraphicsError::draw("bound input layout was released")),
        };
        if layout_stride != draw.stride {
            return Err(GraphicsError::draw(format!(
                "vertex buffer stride {} does not match the input layout's {}",
                draw.stride, layout_stride
            )));
        }
        let available = self.expect_buffer(draw.index_buffer, BufferUsage::Index)?.len() / 2;
        if index_count as usize > available {
            return Err(GraphicsError::draw(format!(
                "draw of {index_count} indices exceeds the {available} bound"
            )));
        }

        self.draws += 1;
        self.stats.draw_calls += 1;
        self.commands.push(Command::DrawIndexed { index_count });
        Ok(())
    }

    fn begin_frame(&mut self, clear: Color) -> Result<(), GraphicsError> {
        self.check_device()?;
        if self.in_frame {
            return Err(GraphicsError::draw("begin_frame called inside a frame"));
        }
        self.in_frame = true;
        self.stats = FrameStats {
            frame: self.frames_finished,
            ..Default::default()
        };
        self.commands.push(Command::BeginFrame(clear));
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), GraphicsError> {
        self.check_device()?;
        if !self.in_frame {
            return Err(GraphicsError::draw("end_frame called outside a frame"));
        }
        self.in_frame = false;
        self.frames_finished += 1;
        self.commands.push(Command::EndFrame);
        Ok(())
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
        if let Some(slot) = self.resources.get_mut(id.index()) {
            if slot.take().is_some() {
                self.released.push(id);
            }
        }
    }

    fn release_all(&mut self) {
        for (index, slot) in self.resources.iter_mut().enumerate().rev() {
            if slot.take().is_some() {
                self.released.push(ResourceId(index as u32));
            }
        }
        self.bound.clear();
        log::debug!("recording context released {} resources", self.released.len());
    }

    fn frame_stats(&self) -> FrameStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Semantic, VertexAttribute, VertexFormat};
    use crate::shader::{BLENDED_PHONG_PS, BLENDED_PHONG_VS};

    fn buffer(ctx: &mut RecordingContext, usage: BufferUsage, len: usize) -> ResourceId {
        let contents = vec![0u8; len];
        ctx.create_buffer(&BufferDesc {
            label: "test",
            usage,
            contents: &contents,
        })
        .unwrap()
    }

    fn phong_layout() -> VertexLayout {
        VertexLayout::new(
            32,
            [
                VertexAttribute::new(Semantic::Position, VertexFormat::Float32x3, 0, 0),
                VertexAttribute::new(Semantic::Normal, VertexFormat::Float32x3, 12, 1),
                VertexAttribute::new(Semantic::Color, VertexFormat::Unorm8x4, 24, 2),
            ],
        )
    }

    /// Binds a complete pipeline over a 6-index buffer.
    fn bind_pipeline(ctx: &mut RecordingContext) {
        let vb = buffer(ctx, BufferUsage::Vertex, 96);
        let ib = buffer(ctx, BufferUsage::Index, 12);
        let (vs, reflection) = ctx.compile_shader(ShaderStage::Vertex, &BLENDED_PHONG_VS).unwrap();
        let (ps, _) = ctx.compile_shader(ShaderStage::Pixel, &BLENDED_PHONG_PS).unwrap();
        let layout = ctx.create_input_layout(&phong_layout(), &reflection).unwrap();
        ctx.set_shader(ShaderStage::Vertex, vs).unwrap();
        ctx.set_shader(ShaderStage::Pixel, ps).unwrap();
        ctx.set_input_layout(layout).unwrap();
        ctx.set_topology(PrimitiveTopology::TriangleList).unwrap();
        ctx.set_vertex_buffer(vb, 32).unwrap();
        ctx.set_index_buffer(ib).unwrap();
    }

    #[test]
    fn complete_pipeline_draws() {
        let mut ctx = RecordingContext::new();
        bind_pipeline(&mut ctx);
        ctx.begin_frame(Color::BLACK).unwrap();
        ctx.draw_indexed(6).unwrap();
        ctx.end_frame().unwrap();
        assert_eq!(ctx.draw_calls(), 1);
        assert_eq!(ctx.frame_stats().draw_calls, 1);
        assert_eq!(ctx.shader_compiles(), 2);
    }

    #[test]
    fn draw_without_pipeline_is_a_draw_time_error() {
        let mut ctx = RecordingContext::new();
        ctx.begin_frame(Color::BLACK).unwrap();
        assert!(matches!(ctx.draw_indexed(3), Err(GraphicsError::DrawTime(_))));
    }

    #[test]
    fn draw_past_the_index_buffer_fails() {
        let mut ctx = RecordingContext::new();
        bind_pipeline(&mut ctx);
        ctx.begin_frame(Color::BLACK).unwrap();
        assert!(ctx.draw_indexed(7).is_err());
    }

    #[test]
    fn stride_mismatch_fails_at_draw() {
        let mut ctx = RecordingContext::new();
        bind_pipeline(&mut ctx);
        let vb = buffer(&mut ctx, BufferUsage::Vertex, 96);
        ctx.set_vertex_buffer(vb, 24).unwrap();
        ctx.begin_frame(Color::BLACK).unwrap();
        let err = ctx.draw_indexed(6).unwrap_err();
        assert!(err.to_string().contains("stride"));
    }

    #[test]
    fn device_lost_fails_activation() {
        let mut ctx = RecordingContext::new();
        let vb = buffer(&mut ctx, BufferUsage::Vertex, 32);
        ctx.inject_fault(Fault::DeviceLost);
        assert!(matches!(
            ctx.set_vertex_buffer(vb, 32),
            Err(GraphicsError::DrawTime(_))
        ));
    }

    #[test]
    fn writes_only_reach_uniform_buffers() {
        let mut ctx = RecordingContext::new();
        let vb = buffer(&mut ctx, BufferUsage::Vertex, 16);
        let cb = buffer(&mut ctx, BufferUsage::Uniform, 16);
        assert!(ctx.write_buffer(vb, &[1; 16]).is_err());
        ctx.write_buffer(cb, &[7; 8]).unwrap();
        assert_eq!(&ctx.buffer_contents(cb).unwrap()[..9], &[7, 7, 7, 7, 7, 7, 7, 7, 0]);
        assert_eq!(ctx.buffer_writes(cb), 1);
        assert!(ctx.write_buffer(cb, &[0; 32]).is_err());
    }

    #[test]
    fn release_runs_in_reverse_acquisition_order() {
        let mut ctx = RecordingContext::new();
        let ids: Vec<_> = (0..4)
            .map(|_| buffer(&mut ctx, BufferUsage::Uniform, 16))
            .collect();
        ctx.release_all();
        let expected: Vec<_> = ids.into_iter().rev().collect();
        assert_eq!(ctx.release_order(), expected.as_slice());
        assert_eq!(ctx.live_resources(), 0);
    }

    #[test]
    fn single_release_frees_only_that_resource() {
        let mut ctx = RecordingContext::new();
        let keep = buffer(&mut ctx, BufferUsage::Uniform, 16);
        let gone = buffer(&mut ctx, BufferUsage::Uniform, 16);
        ctx.release(gone);
        ctx.release(gone);
        assert_eq!(ctx.live_resources(), 1);
        assert_eq!(ctx.release_order(), &[gone]);
        assert!(ctx.write_buffer(gone, &[0; 4]).is_err());
        ctx.write_buffer(keep, &[0; 4]).unwrap();
    }

    #[test]
    fn frames_must_alternate() {
        let mut ctx = RecordingContext::new();
        assert!(ctx.end_frame().is_err());
        ctx.begin_frame(Color::BLACK).unwrap();
        assert!(ctx.begin_frame(Color::BLACK).is_err());
        ctx.end_frame().unwrap();
        ctx.begin_frame(Color::BLACK).unwrap();
        assert_eq!(ctx.frame_stats().frame, 1);
    }
}
