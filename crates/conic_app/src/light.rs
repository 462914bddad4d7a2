//! The scene's single point light.

use bytemuck::{Pod, Zeroable};
use conic_renderer::bind::{Bindable, ConstantBuffer};
use conic_renderer::{GraphicsError, RenderContext};
use glam::{Mat4, Vec3};

use crate::config::LightConfig;

/// Pixel-stage slot the light occupies.
pub const LIGHT_SLOT: u32 = 0;

/// GPU layout of `PointLight` in `blended_phong_ps.wgsl` (std140 padding).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PointLightData {
    pub position: [f32; 3],
    _pad0: f32,
    pub ambient: [f32; 3],
    _pad1: f32,
    pub diffuse_color: [f32; 3],
    pub diffuse_intensity: f32,
    pub att_const: f32,
    pub att_lin: f32,
    pub att_quad: f32,
    _pad2: f32,
}

impl From<&LightConfig> for PointLightData {
    fn from(c: &LightConfig) -> Self {
        Self {
            position: c.position,
            _pad0: 0.0,
            ambient: c.ambient,
            _pad1: 0.0,
            diffuse_color: c.diffuse_color,
            diffuse_intensity: c.diffuse_intensity,
            att_const: c.att_const,
            att_lin: c.att_lin,
            att_quad: c.att_quad,
            _pad2: 0.0,
        }
    }
}

#[derive(Debug)]
pub struct PointLight {
    initial: LightConfig,
    data: PointLightData,
    cbuf: ConstantBuffer<PointLightData>,
}

impl PointLight {
    pub fn new(ctx: &mut dyn RenderContext, config: &LightConfig) -> Result<Self, GraphicsError> {
        let data = PointLightData::from(config);
        Ok(Self {
            initial: *config,
            data,
            cbuf: ConstantBuffer::pixel(ctx, LIGHT_SLOT, &data)?,
        })
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from(self.data.position)
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.data.position = position.to_array();
    }

    pub fn data(&self) -> &PointLightData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut PointLightData {
        &mut self.data
    }

    /// Uploads the parameters with the position moved into view space and
    /// binds them for the frame's draws.
    pub fn bind(&self, ctx: &mut dyn RenderContext, view: Mat4) -> Result<(), GraphicsError> {
        let mut data = self.data;
        data.position = view.transform_point3(self.position()).to_array();
        self.cbuf.update(ctx, &data)?;
        self.cbuf.bind(ctx)
    }

    /// Back to the configured parameters.
    pub fn reset(&mut self) {
        self.data = PointLightData::from(&self.initial);
    }
}

#[cfg(test)]
mod tests {
    use conic_renderer::backend::{Command, RecordingContext};
    use conic_renderer::shader::ShaderStage;

    use super::*;

    #[test]
    fn matches_the_shader_struct_size() {
        assert_eq!(std::mem::size_of::<PointLightData>(), 64);
    }

    #[test]
    fn bind_uploads_view_space_position() {
        let mut ctx = RecordingContext::new();
        let mut light = PointLight::new(&mut ctx, &LightConfig::default()).unwrap();
        light.set_position(Vec3::new(1.0, 2.0, 3.0));
        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0));
        light.bind(&mut ctx, view).unwrap();

        let id = match ctx.commands().last() {
            Some(&Command::SetConstantBuffer {
                stage: ShaderStage::Pixel,
                slot: LIGHT_SLOT,
                id,
            }) => id,
            other => panic!("unexpected {other:?}"),
        };
        let uploaded: PointLightData = bytemuck::pod_read_unaligned(ctx.buffer_contents(id).unwrap());
        assert_eq!(uploaded.position, [1.0, 2.0, 13.0]);
        // the stored world-space position is untouched
        assert_eq!(light.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(uploaded.att_lin, 0.045);
    }

    #[test]
    fn reset_restores_the_config() {
        let mut ctx = RecordingContext::new();
        let mut light = PointLight::new(&mut ctx, &LightConfig::default()).unwrap();
        light.set_position(Vec3::splat(4.0));
        light.data_mut().diffuse_intensity = 3.0;
        light.reset();
        assert_eq!(light.data(), &PointLightData::from(&LightConfig::default()));
    }
}
