use std::fmt;
use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::bind::{Bindable, BindingKind};
use crate::context::{BufferDesc, BufferUsage, RenderContext, ResourceId};
use crate::error::GraphicsError;
use crate::shader::ShaderStage;

/// Vertex-stage slot the per-object transforms occupy.
pub const TRANSFORM_SLOT: u32 = 0;

/// A uniform buffer holding one `T`, bound to a fixed stage and slot.
pub struct ConstantBuffer<T> {
    id: ResourceId,
    stage: ShaderStage,
    slot: u32,
    _marker: PhantomData<T>,
}

impl<T: Pod> ConstantBuffer<T> {
    pub fn new(
        ctx: &mut dyn RenderContext,
        stage: ShaderStage,
        slot: u32,
        initial: &T,
    ) -> Result<Self, GraphicsError> {
        let label = format!("{stage:?} constants (slot {slot})");
        let id = ctx.create_buffer(&BufferDesc {
            label: &label,
            usage: BufferUsage::Uniform,
            contents: bytemuck::bytes_of(initial),
        })?;
        Ok(Self {
            id,
            stage,
            slot,
            _marker: PhantomData,
        })
    }

    pub fn vertex(ctx: &mut dyn RenderContext, slot: u32, initial: &T) -> Result<Self, GraphicsError> {
        Self::new(ctx, ShaderStage::Vertex, slot, initial)
    }

    pub fn pixel(ctx: &mut dyn RenderContext, slot: u32, initial: &T) -> Result<Self, GraphicsError> {
        Self::new(ctx, ShaderStage::Pixel, slot, initial)
    }

    pub fn update(&self, ctx: &mut dyn RenderContext, value: &T) -> Result<(), GraphicsError> {
        ctx.write_buffer(self.id, bytemuck::bytes_of(value))
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl<T> fmt::Debug for ConstantBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstantBuffer")
            .field("id", &self.id)
            .field("stage", &self.stage)
            .field("slot", &self.slot)
            .field("size", &std::mem::size_of::<T>())
            .finish()
    }
}

impl<T: Pod> Bindable for ConstantBuffer<T> {
    fn bind(&self, ctx: &mut dyn RenderContext) -> Result<(), GraphicsError> {
        ctx.set_constant_buffer(self.stage, self.slot, self.id)
    }

    fn kind(&self) -> BindingKind {
        match self.stage {
            ShaderStage::Vertex => BindingKind::VertexConstants,
            ShaderStage::Pixel => BindingKind::PixelConstants,
        }
    }
}

/// Layout of the transform constants (matches `Transforms` in
/// `blended_phong_vs.wgsl`).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Transforms {
    pub model_view: [[f32; 4]; 4],
    pub model_view_proj: [[f32; 4]; 4],
}

impl Transforms {
    pub fn new(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        let model_view = view * model;
        Self {
            model_view: model_view.to_cols_array_2d(),
            model_view_proj: (projection * model_view).to_cols_array_2d(),
        }
    }
}

/// Per-instance transform constants.
///
/// Never shared: every drawable owns one and refreshes it from the
/// context's current view and projection right before its draw.
#[derive(Debug)]
pub struct TransformCbuf {
    buffer: ConstantBuffer<Transforms>,
}

impl TransformCbuf {
    pub fn new(ctx: &mut dyn RenderContext) -> Result<Self, GraphicsError> {
        let identity = Transforms::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY);
        Ok(Self {
            buffer: ConstantBuffer::vertex(ctx, TRANSFORM_SLOT, &identity)?,
        })
    }

    pub fn id(&self) -> ResourceId {
        self.buffer.id()
    }

    pub fn update_and_bind(&self, ctx: &mut dyn RenderContext, model: Mat4) -> Result<(), GraphicsError> {
        let transforms = Transforms::new(model, ctx.view(), ctx.projection());
        self.buffer.update(ctx, &transforms)?;
        self.buffer.bind(ctx)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::backend::{Command, RecordingContext};

    #[repr(C)]
    #[derive(Debug, Copy, Clone, Pod, Zeroable)]
    struct Material {
        specular_intensity: f32,
        specular_power: f32,
        padding: [f32; 2],
    }

    #[test]
    fn pixel_constants_bind_to_their_slot() {
        let mut ctx = RecordingContext::new();
        let material = Material {
            specular_intensity: 0.6,
            specular_power: 30.0,
            padding: [0.0; 2],
        };
        let cb = ConstantBuffer::pixel(&mut ctx, 1, &material).unwrap();
        assert_eq!(cb.kind(), BindingKind::PixelConstants);
        cb.bind(&mut ctx).unwrap();
        assert_eq!(
            ctx.commands().last(),
            Some(&Command::SetConstantBuffer {
                stage: ShaderStage::Pixel,
                slot: 1,
                id: cb.id()
            })
        );
    }

    #[test]
    fn transforms_are_128_bytes() {
        assert_eq!(std::mem::size_of::<Transforms>(), 128);
    }

    #[test]
    fn transform_cbuf_uses_the_current_camera() {
        let mut ctx = RecordingContext::new();
        let cbuf = TransformCbuf::new(&mut ctx).unwrap();
        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0));
        ctx.set_view(view);
        let model = Mat4::from_translation(Vec3::X);
        cbuf.update_and_bind(&mut ctx, model).unwrap();

        let written: Transforms =
            bytemuck::pod_read_unaligned(ctx.buffer_contents(cbuf.id()).unwrap());
        let model_view = Mat4::from_cols_array_2d(&written.model_view);
        assert!(model_view.abs_diff_eq(view * model, 1e-6));
        assert_eq!(ctx.buffer_writes(cbuf.id()), 1);
    }
}
