use crate::bind::{Bindable, BindingKind};
use crate::context::{RenderContext, ResourceId};
use crate::error::GraphicsError;
use crate::shader::{ShaderReflection, ShaderSource, ShaderStage};

/// A compiled vertex program plus the inputs it reads, which the
/// [`InputLayout`](super::InputLayout) is checked against.
#[derive(Debug)]
pub struct VertexShader {
    id: ResourceId,
    reflection: ShaderReflection,
}

impl VertexShader {
    pub fn new(ctx: &mut dyn RenderContext, source: &ShaderSource) -> Result<Self, GraphicsError> {
        let (id, reflection) = ctx.compile_shader(ShaderStage::Vertex, source)?;
        Ok(Self { id, reflection })
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }
}

impl Bindable for VertexShader {
    fn bind(&self, ctx: &mut dyn RenderContext) -> Result<(), GraphicsError> {
        ctx.set_shader(ShaderStage::Vertex, self.id)
    }

    fn kind(&self) -> BindingKind {
        BindingKind::VertexShader
    }
}

#[derive(Debug)]
pub struct PixelShader {
    id: ResourceId,
}

impl PixelShader {
    pub fn new(ctx: &mut dyn RenderContext, source: &ShaderSource) -> Result<Self, GraphicsError> {
        let (id, _) = ctx.compile_shader(ShaderStage::Pixel, source)?;
        Ok(Self { id })
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }
}

impl Bindable for PixelShader {
    fn bind(&self, ctx: &mut dyn RenderContext) -> Result<(), GraphicsError> {
        ctx.set_shader(ShaderStage::Pixel, self.id)
    }

    fn kind(&self) -> BindingKind {
        BindingKind::PixelShader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingContext;
    use crate::error::ResourceKind;
    use crate::shader::{BLENDED_PHONG_PS, BLENDED_PHONG_VS};

    #[test]
    fn vertex_shader_keeps_its_reflection() {
        let mut ctx = RecordingContext::new();
        let vs = VertexShader::new(&mut ctx, &BLENDED_PHONG_VS).unwrap();
        assert_eq!(vs.reflection().inputs.len(), 3);
        assert_eq!(ctx.shader_compiles(), 1);
    }

    #[test]
    fn broken_pixel_shader_is_a_pixel_shader_error() {
        let mut ctx = RecordingContext::new();
        let broken = ShaderSource::owned(
            "broken_ps",
            BLENDED_PHONG_PS.code.replace("saturate(lit)", "undefined_fn(lit)"),
            "ps_main",
        );
        let err = PixelShader::new(&mut ctx, &broken).unwrap_err();
        match err {
            GraphicsError::ResourceCreation { kind, diagnostic } => {
                assert_eq!(kind, ResourceKind::PixelShader);
                assert!(diagnostic.contains("broken_ps"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(ctx.shader_compiles(), 0);
    }
}
