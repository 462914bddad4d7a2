use crate::bind::{Bindable, BindingKind, VertexShader};
use crate::context::{PrimitiveTopology, RenderContext, ResourceId};
use crate::error::GraphicsError;
use crate::geometry::VertexLayout;

/// A vertex layout validated against the vertex shader it feeds.
#[derive(Debug)]
pub struct InputLayout {
    id: ResourceId,
    stride: u32,
}

impl InputLayout {
    pub fn new(
        ctx: &mut dyn RenderContext,
        layout: &VertexLayout,
        vertex_shader: &VertexShader,
    ) -> Result<Self, GraphicsError> {
        let id = ctx.create_input_layout(layout, vertex_shader.reflection())?;
        Ok(Self {
            id,
            stride: layout.stride,
        })
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }
}

impl Bindable for InputLayout {
    fn bind(&self, ctx: &mut dyn RenderContext) -> Result<(), GraphicsError> {
        ctx.set_input_layout(self.id)
    }

    fn kind(&self) -> BindingKind {
        BindingKind::InputLayout
    }
}

/// Primitive topology.  Owns no device resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology(pub PrimitiveTopology);

impl Topology {
    pub fn new(topology: PrimitiveTopology) -> Self {
        Self(topology)
    }
}

impl Bindable for Topology {
    fn bind(&self, ctx: &mut dyn RenderContext) -> Result<(), GraphicsError> {
        ctx.set_topology(self.0)
    }

    fn kind(&self) -> BindingKind {
        BindingKind::Topology
    }
}
