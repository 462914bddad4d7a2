//! Drawables: shared static bindings plus per-instance state.
//!
//! A [`Shape`] type describes its geometry, shaders and material once.  The
//! first [`Drawable`] of that type turns the description into bindings and
//! commits them to the [`StaticRegistry`]; later instances only create their
//! own [`TransformCbuf`].  Each drawable advances its [`Motion`] in
//! [`update`](Drawable::update) and issues exactly one indexed draw in
//! [`draw`](Drawable::draw).

pub mod motion;

pub use motion::{Motion, MotionParams};

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use conic_core::Transform;
use glam::Vec3;

use crate::bind::{
    Bindable, ConstantBuffer, IndexBuffer, InputLayout, PixelShader, Topology, TransformCbuf,
    VertexBuffer, VertexShader,
};
use crate::context::{PrimitiveTopology, RenderContext, ResourceId};
use crate::error::{GraphicsError, ResourceKind};
use crate::geometry::{VertexData, VertexLayout};
use crate::registry::{BindingList, StaticRegistry};
use crate::shader::ShaderSource;

/// Pixel-stage slot of the per-shape material constants.
pub const MATERIAL_SLOT: u32 = 1;

/// Specular material constants (matches `Material` in
/// `blended_phong_ps.wgsl`).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Material {
    pub specular_intensity: f32,
    pub specular_power: f32,
    pub padding: [f32; 2],
}

impl Material {
    pub const fn new(specular_intensity: f32, specular_power: f32) -> Self {
        Self {
            specular_intensity,
            specular_power,
            padding: [0.0; 2],
        }
    }
}

/// Per-instance construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeParams {
    /// Segment count for tessellated shapes; ignored by the rest.
    pub tessellation: u32,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self { tessellation: 3 }
    }
}

/// Everything the first instance of a shape needs to build its static set.
#[derive(Debug, Clone)]
pub struct ShapeDescriptor {
    pub vertices: VertexData,
    pub indices: Vec<u16>,
    pub layout: VertexLayout,
    pub vertex_shader: ShaderSource,
    pub pixel_shader: ShaderSource,
    pub topology: PrimitiveTopology,
    pub material: Option<Material>,
}

/// A drawable type.  One static binding set exists per implementor.
pub trait Shape: 'static {
    const NAME: &'static str;

    /// Rejects parameters this shape cannot be built from.  Runs for every
    /// instance, before anything is created.
    fn validate(_params: &ShapeParams) -> Result<(), GraphicsError> {
        Ok(())
    }

    /// Builds the CPU-side description of the shape.
    fn describe(params: &ShapeParams) -> Result<ShapeDescriptor, GraphicsError>;
}

#[derive(Debug)]
pub struct Drawable {
    shape: &'static str,
    bindings: BindingList,
    index_buffer: Arc<IndexBuffer>,
    transform: TransformCbuf,
    motion: Motion,
}

impl Drawable {
    /// Creates one instance of `S`, building the static set of `S` first if
    /// this is the first instance.
    ///
    /// On error nothing is committed to `registry` and every resource created
    /// on the way is released again.
    pub fn new<S: Shape>(
        ctx: &mut dyn RenderContext,
        registry: &mut StaticRegistry,
        params: &ShapeParams,
        motion: MotionParams,
    ) -> Result<Self, GraphicsError> {
        S::validate(params)?;

        let transform = if registry.is_initialized::<S>() {
            TransformCbuf::new(ctx)?
        } else {
            let mut created = Vec::new();
            match Self::build_static::<S>(ctx, registry, params, &mut created) {
                Ok(transform) => transform,
                Err(e) => {
                    for id in created.into_iter().rev() {
                        ctx.release(id);
                    }
                    log::warn!("`{}` static set aborted: {e}", S::NAME);
                    return Err(e);
                }
            }
        };

        let (bindings, index_buffer) = Self::set_index_from_static::<S>(registry)?;
        Ok(Self {
            shape: S::NAME,
            bindings,
            index_buffer,
            transform,
            motion: Motion::new(motion),
        })
    }

    /// Builds and commits the static set of `S` plus the first instance's
    /// transform buffer.  Every id is pushed to `created` as soon as it
    /// exists.
    fn build_static<S: Shape>(
        ctx: &mut dyn RenderContext,
        registry: &mut StaticRegistry,
        params: &ShapeParams,
        created: &mut Vec<ResourceId>,
    ) -> Result<TransformCbuf, GraphicsError> {
        let desc = S::describe(params)?;
        if desc.vertices.stride != desc.layout.stride {
            return Err(GraphicsError::resource(
                ResourceKind::InputLayout,
                format!(
                    "`{}` vertices are {} bytes but the layout describes {}",
                    S::NAME,
                    desc.vertices.stride,
                    desc.layout.stride
                ),
            ));
        }
        let mut init = registry.begin::<S>()?;

        let vertex_buffer = VertexBuffer::new(ctx, S::NAME, &desc.vertices)?;
        created.push(vertex_buffer.id());
        init.add_static_binding(Arc::new(vertex_buffer));

        let vertex_shader = Arc::new(VertexShader::new(ctx, &desc.vertex_shader)?);
        created.push(vertex_shader.id());
        init.add_static_binding(vertex_shader.clone());

        let pixel_shader = PixelShader::new(ctx, &desc.pixel_shader)?;
        created.push(pixel_shader.id());
        init.add_static_binding(Arc::new(pixel_shader));

        let index_buffer = IndexBuffer::new(ctx, S::NAME, &desc.indices)?;
        created.push(index_buffer.id());
        init.add_static_index_buffer(index_buffer)?;

        let layout = InputLayout::new(ctx, &desc.layout, &vertex_shader)?;
        created.push(layout.id());
        init.add_static_binding(Arc::new(layout));

        init.add_static_binding(Arc::new(Topology::new(desc.topology)));
        if let Some(material) = &desc.material {
            let material = ConstantBuffer::pixel(ctx, MATERIAL_SLOT, material)?;
            created.push(material.id());
            init.add_static_binding(Arc::new(material));
        }

        // per-instance resources must exist before the set is sealed
        let transform = TransformCbuf::new(ctx)?;
        created.push(transform.id());
        init.commit()?;
        log::debug!(
            "`{}` static set built: {} vertices, {} indices",
            S::NAME,
            desc.vertices.count,
            desc.indices.len()
        );
        Ok(transform)
    }

    /// Adopts the committed static set of `S`, index buffer included.
    fn set_index_from_static<S: Shape>(
        registry: &StaticRegistry,
    ) -> Result<(BindingList, Arc<IndexBuffer>), GraphicsError> {
        let missing = || GraphicsError::invalid(format!("`{}` has no static set", S::NAME));
        let bindings = registry.static_bindings::<S>().ok_or_else(missing)?;
        let index_buffer = registry.index_buffer::<S>().ok_or_else(missing)?;
        Ok((bindings, index_buffer))
    }

    pub fn update(&mut self, dt: f32) {
        self.motion.update(dt);
    }

    /// Activates the static set (pipeline state first), the shared index
    /// buffer and the refreshed transform constants, then issues one indexed
    /// draw over the whole index buffer.
    pub fn draw(&self, ctx: &mut dyn RenderContext) -> Result<(), GraphicsError> {
        for binding in self.bindings.iter() {
            binding.bind(ctx)?;
        }
        self.index_buffer.bind(ctx)?;
        self.transform
            .update_and_bind(ctx, self.world_transform().matrix())?;
        log::trace!("draw `{}` ({} indices)", self.shape, self.index_count());
        ctx.draw_indexed(self.index_count())
    }

    pub fn world_transform(&self) -> Transform {
        self.motion.world_transform()
    }

    pub fn position(&self) -> Vec3 {
        self.world_transform().position
    }

    pub fn shape(&self) -> &'static str {
        self.shape
    }

    pub fn index_count(&self) -> u32 {
        self.index_buffer.count()
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    pub fn transform_cbuf(&self) -> &TransformCbuf {
        &self.transform
    }
}
