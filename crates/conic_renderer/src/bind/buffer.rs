use crate::bind::{Bindable, BindingKind};
use crate::context::{BufferDesc, BufferUsage, RenderContext, ResourceId};
use crate::error::GraphicsError;
use crate::geometry::VertexData;

/// Immutable vertex data on the device.
#[derive(Debug)]
pub struct VertexBuffer {
    id: ResourceId,
    stride: u32,
    count: u32,
}

impl VertexBuffer {
    pub fn new(
        ctx: &mut dyn RenderContext,
        label: &str,
        data: &VertexData,
    ) -> Result<Self, GraphicsError> {
        let id = ctx.create_buffer(&BufferDesc {
            label,
            usage: BufferUsage::Vertex,
            contents: &data.bytes,
        })?;
        Ok(Self {
            id,
            stride: data.stride,
            count: data.count,
        })
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn vertex_count(&self) -> u32 {
        self.count
    }
}

impl Bindable for VertexBuffer {
    fn bind(&self, ctx: &mut dyn RenderContext) -> Result<(), GraphicsError> {
        ctx.set_vertex_buffer(self.id, self.stride)
    }

    fn kind(&self) -> BindingKind {
        BindingKind::VertexBuffer
    }
}

/// 16-bit triangle indices on the device.  `count` is what a drawable
/// passes to `draw_indexed`.
#[derive(Debug)]
pub struct IndexBuffer {
    id: ResourceId,
    count: u32,
}

impl IndexBuffer {
    pub fn new(
        ctx: &mut dyn RenderContext,
        label: &str,
        indices: &[u16],
    ) -> Result<Self, GraphicsError> {
        let id = ctx.create_buffer(&BufferDesc {
            label,
            usage: BufferUsage::Index,
            contents: bytemuck::cast_slice(indices),
        })?;
        Ok(Self {
            id,
            count: indices.len() as u32,
        })
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl Bindable for IndexBuffer {
    fn bind(&self, ctx: &mut dyn RenderContext) -> Result<(), GraphicsError> {
        ctx.set_index_buffer(self.id)
    }

    fn kind(&self) -> BindingKind {
        BindingKind::IndexBuffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Command, Fault, RecordingContext};
    use crate::error::ResourceKind;

    #[test]
    fn index_buffer_counts_indices() {
        let mut ctx = RecordingContext::new();
        let ib = IndexBuffer::new(&mut ctx, "ib", &[0, 1, 2, 2, 1, 3]).unwrap();
        assert_eq!(ib.count(), 6);
        assert_eq!(
            ctx.commands(),
            &[Command::CreateBuffer {
                id: ib.id(),
                usage: BufferUsage::Index,
                size: 12
            }]
        );
    }

    #[test]
    fn rejected_vertex_buffer_names_its_kind() {
        let mut ctx = RecordingContext::new();
        ctx.inject_fault(Fault::RejectBuffers);
        let data = VertexData::from_slice(&[[0.0f32; 3]; 3]);
        let err = VertexBuffer::new(&mut ctx, "vb", &data).unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::ResourceCreation {
                kind: ResourceKind::VertexBuffer,
                ..
            }
        ));
    }

    #[test]
    fn vertex_buffer_binds_with_its_stride() {
        let mut ctx = RecordingContext::new();
        let data = VertexData::from_slice(&[[0.0f32; 3]; 4]);
        let vb = VertexBuffer::new(&mut ctx, "vb", &data).unwrap();
        assert_eq!(vb.vertex_count(), 4);
        vb.bind(&mut ctx).unwrap();
        assert_eq!(
            ctx.commands().last(),
            Some(&Command::SetVertexBuffer {
                id: vb.id(),
                stride: 12
            })
        );
    }
}
