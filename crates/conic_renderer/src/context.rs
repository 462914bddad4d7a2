//! The rendering-context seam.
//!
//! Bindings, drawables and the scene never talk to wgpu directly: they drive
//! a `&mut dyn RenderContext`.  Two implementations live in
//! [`crate::backend`]: [`RecordingContext`](crate::backend::RecordingContext),
//! a headless device that validates and records every call, and
//! [`WgpuContext`](crate::backend::WgpuContext), which renders for real.
//!
//! Resources are named by opaque [`ResourceId`]s handed out by the context
//! that created them.  Creation calls fail with `ResourceCreation`;
//! activation and draw calls fail with `DrawTime`.

use std::collections::BTreeMap;
use std::fmt;

use conic_core::Color;
use glam::Mat4;

use crate::error::{GraphicsError, ResourceKind};
use crate::geometry::VertexLayout;
use crate::shader::{ShaderReflection, ShaderSource, ShaderStage};

/// Handle to a resource owned by a [`RenderContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(crate) u32);

impl ResourceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Vertex,
    Index,
    /// Constant (uniform) buffer; the only kind that may be rewritten.
    Uniform,
}

impl BufferUsage {
    pub fn resource_kind(self) -> ResourceKind {
        match self {
            Self::Vertex => ResourceKind::VertexBuffer,
            Self::Index => ResourceKind::IndexBuffer,
            Self::Uniform => ResourceKind::ConstantBuffer,
        }
    }
}

/// Everything needed to create a buffer.
#[derive(Debug, Clone, Copy)]
pub struct BufferDesc<'a> {
    pub label: &'a str,
    pub usage: BufferUsage,
    pub contents: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveTopology {
    TriangleList,
    TriangleStrip,
    LineList,
}

impl PrimitiveTopology {
    pub fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Self::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Self::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
            Self::LineList => wgpu::PrimitiveTopology::LineList,
        }
    }
}

/// Counters for the frame in progress (or the last one finished).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub draw_calls: u32,
    pub buffer_writes: u32,
}

/// The capability set every backend provides.
///
/// Object safe: drawables receive `&mut dyn RenderContext`.
pub trait RenderContext {
    fn backend_name(&self) -> &'static str;

    // ── creation ──────────────────────────────────────────────────────────

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<ResourceId, GraphicsError>;

    /// Replaces the start of a uniform buffer with `bytes`.
    fn write_buffer(&mut self, id: ResourceId, bytes: &[u8]) -> Result<(), GraphicsError>;

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &ShaderSource,
    ) -> Result<(ResourceId, ShaderReflection), GraphicsError>;

    /// Creates an input layout after checking it against the vertex memory
    /// it describes and against the inputs of `vertex_shader`.
    fn create_input_layout(
        &mut self,
        layout: &VertexLayout,
        vertex_shader: &ShaderReflection,
    ) -> Result<ResourceId, GraphicsError>;

    // ── activation ────────────────────────────────────────────────────────

    fn set_vertex_buffer(&mut self, id: ResourceId, stride: u32) -> Result<(), GraphicsError>;
    fn set_index_buffer(&mut self, id: ResourceId) -> Result<(), GraphicsError>;
    fn set_shader(&mut self, stage: ShaderStage, id: ResourceId) -> Result<(), GraphicsError>;
    fn set_input_layout(&mut self, id: ResourceId) -> Result<(), GraphicsError>;
    fn set_topology(&mut self, topology: PrimitiveTopology) -> Result<(), GraphicsError>;
    fn set_constant_buffer(
        &mut self,
        stage: ShaderStage,
        slot: u32,
        id: ResourceId,
    ) -> Result<(), GraphicsError>;

    /// Issues an indexed draw with whatever is currently bound.
    fn draw_indexed(&mut self, index_count: u32) -> Result<(), GraphicsError>;

    // ── frame ─────────────────────────────────────────────────────────────

    fn begin_frame(&mut self, clear: Color) -> Result<(), GraphicsError>;
    /// Finishes and presents the frame.
    fn end_frame(&mut self) -> Result<(), GraphicsError>;

    fn set_view(&mut self, view: Mat4);
    fn view(&self) -> Mat4;
    fn set_projection(&mut self, projection: Mat4);
    fn projection(&self) -> Mat4;

    /// Releases one resource.  Unknown or already released ids are ignored.
    fn release(&mut self, id: ResourceId);

    /// Releases every resource in reverse acquisition order.  Ids handed
    /// out earlier are invalid afterwards.
    fn release_all(&mut self);

    fn frame_stats(&self) -> FrameStats;
}

/// What is currently bound, tracked identically by every backend.
#[derive(Debug, Clone, Default)]
pub(crate) struct BoundState {
    pub vertex_buffer: Option<(ResourceId, u32)>,
    pub index_buffer: Option<ResourceId>,
    pub vertex_shader: Option<ResourceId>,
    pub pixel_shader: Option<ResourceId>,
    pub input_layout: Option<ResourceId>,
    pub topology: Option<PrimitiveTopology>,
    pub vertex_constants: BTreeMap<u32, ResourceId>,
    pub pixel_constants: BTreeMap<u32, ResourceId>,
}

/// A fully bound pipeline, as seen at draw time.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedDraw {
    pub vertex_buffer: ResourceId,
    pub stride: u32,
    pub index_buffer: ResourceId,
    pub vertex_shader: ResourceId,
    pub pixel_shader: ResourceId,
    pub input_layout: ResourceId,
    pub topology: PrimitiveTopology,
    pub vertex_constants: Vec<(u32, ResourceId)>,
    pub pixel_constants: Vec<(u32, ResourceId)>,
}

impl BoundState {
    pub fn set_shader(&mut self, stage: ShaderStage, id: ResourceId) {
        match stage {
            ShaderStage::Vertex => self.vertex_shader = Some(id),
            ShaderStage::Pixel => self.pixel_shader = Some(id),
        }
    }

    pub fn set_constant(&mut self, stage: ShaderStage, slot: u32, id: ResourceId) {
        let slots = match stage {
            ShaderStage::Vertex => &mut self.vertex_constants,
            ShaderStage::Pixel => &mut self.pixel_constants,
        };
        slots.insert(slot, id);
    }

    /// Fails with `DrawTime` naming the first missing piece of state.
    pub fn resolve(&self) -> Result<ResolvedDraw, GraphicsError> {
        let missing = |what: &str| GraphicsError::draw(format!("no {what} bound"));
        let (vertex_buffer, stride) = self.vertex_buffer.ok_or_else(|| missing("vertex buffer"))?;
        Ok(ResolvedDraw {
            vertex_buffer,
            stride,
            index_buffer: self.index_buffer.ok_or_else(|| missing("index buffer"))?,
            vertex_shader: self.vertex_shader.ok_or_else(|| missing("vertex shader"))?,
            pixel_shader: self.pixel_shader.ok_or_else(|| missing("pixel shader"))?,
            input_layout: self.input_layout.ok_or_else(|| missing("input layout"))?,
            topology: self.topology.ok_or_else(|| missing("topology"))?,
            vertex_constants: self.vertex_constants.iter().map(|(&s, &id)| (s, id)).collect(),
            pixel_constants: self.pixel_constants.iter().map(|(&s, &id)| (s, id)).collect(),
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
