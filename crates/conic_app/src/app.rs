//! The scene container: a fixed set of drawables orbiting the origin, one
//! orbit camera and one point light.

use anyhow::Context as _;
use conic_core::{Camera, Color, FrameClock};
use conic_renderer::{
    Cube, Drawable, GraphicsError, MotionParams, Pyramid, RenderContext, ShapeParams,
    StaticRegistry,
};
use glam::{Mat4, Vec4};

use crate::config::{SceneConfig, SHAPE_BOX, SHAPE_PYRAMID};
use crate::light::PointLight;
use crate::sampler::ParamSampler;

/// Near and far planes of the scene projection.
pub const NEAR_PLANE: f32 = 0.5;
pub const FAR_PLANE: f32 = 40.0;

/// Left-handed perspective projection from the view-volume size at the near
/// plane, mapping depth to `0..=1`.
pub fn perspective_lh(width: f32, height: f32, near: f32, far: f32) -> Mat4 {
    let depth = far / (far - near);
    Mat4::from_cols(
        Vec4::new(2.0 * near / width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / height, 0.0, 0.0),
        Vec4::new(0.0, 0.0, depth, 1.0),
        Vec4::new(0.0, 0.0, -near * depth, 0.0),
    )
}

/// What one [`App::do_frame`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    /// Simulation step applied to every drawable.
    pub dt: f32,
    pub draw_calls: u32,
}

pub struct App<C: RenderContext> {
    ctx: C,
    registry: StaticRegistry,
    drawables: Vec<Drawable>,
    camera: Camera,
    light: PointLight,
    clock: Box<dyn FrameClock>,
    clear_color: Color,
    speed_factor: f32,
    paused: bool,
    frames: u64,
}

impl<C: RenderContext> App<C> {
    /// Builds `config.drawable_count` drawables in order, drawing every
    /// random parameter from `sampler`.
    ///
    /// An invalid `config` is rejected with `InvalidParameter` before any
    /// resource is created.
    pub fn new(
        mut ctx: C,
        config: &SceneConfig,
        sampler: &mut dyn ParamSampler,
        clock: Box<dyn FrameClock>,
    ) -> Result<Self, GraphicsError> {
        config
            .validate()
            .map_err(|e| GraphicsError::InvalidParameter(format!("{e:#}")))?;
        let mut registry = StaticRegistry::new();
        let mut drawables = Vec::with_capacity(config.drawable_count);
        for _ in 0..config.drawable_count {
            let index = sampler.shape_index(config.shapes.len());
            let shape = config.shapes.get(index).ok_or_else(|| {
                GraphicsError::InvalidParameter(format!(
                    "sampler picked shape {index} of {}",
                    config.shapes.len()
                ))
            })?;
            let motion = sampler.motion();
            let params = sampler.shape_params();
            drawables.push(make_drawable(&mut ctx, &mut registry, shape, &params, motion)?);
        }

        ctx.set_projection(perspective_lh(1.0, config.aspect(), NEAR_PLANE, FAR_PLANE));
        let light = PointLight::new(&mut ctx, &config.light)?;

        log::info!(
            "scene built on {}: {} drawables, {} shape types",
            ctx.backend_name(),
            drawables.len(),
            registry.shape_count()
        );
        Ok(Self {
            ctx,
            registry,
            drawables,
            camera: Camera::orbit(config.camera.radius, config.camera.theta, config.camera.phi),
            light,
            clock,
            clear_color: Color::from(config.clear_color),
            speed_factor: config.speed_factor,
            paused: config.paused,
            frames: 0,
        })
    }

    /// Advances the clock, then clears, binds camera and light, updates and
    /// draws every drawable in creation order and presents.
    pub fn do_frame(&mut self) -> Result<FrameReport, GraphicsError> {
        let time = self.clock.tick();
        let dt = if self.paused {
            0.0
        } else {
            time.delta * self.speed_factor
        };

        let ctx: &mut dyn RenderContext = &mut self.ctx;
        ctx.begin_frame(self.clear_color)?;
        let view = self.camera.view();
        ctx.set_view(view);
        self.light.bind(ctx, view)?;

        for drawable in &mut self.drawables {
            drawable.update(dt);
            drawable.draw(ctx)?;
        }
        ctx.end_frame()?;

        let report = FrameReport {
            frame: self.frames,
            dt,
            draw_calls: ctx.frame_stats().draw_calls,
        };
        self.frames += 1;
        log::trace!("{report:?}");
        Ok(report)
    }

    /// Runs `frames` frames; the first failing frame ends the run.
    pub fn run(&mut self, frames: u32) -> anyhow::Result<()> {
        for _ in 0..frames {
            let frame = self.frames;
            self.do_frame()
                .with_context(|| format!("frame {frame} failed"))?;
        }
        log::info!("ran {frames} frames");
        Ok(())
    }

    /// Drops the drawables newest first, then the cached static sets, then
    /// every device resource.
    pub fn shutdown(&mut self) {
        while let Some(drawable) = self.drawables.pop() {
            drop(drawable);
        }
        self.registry.clear();
        self.ctx.release_all();
        log::info!("scene shut down after {} frames", self.frames);
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    pub fn registry(&self) -> &StaticRegistry {
        &self.registry
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn light_mut(&mut self) -> &mut PointLight {
        &mut self.light
    }

    pub fn speed_factor(&self) -> f32 {
        self.speed_factor
    }

    pub fn set_speed_factor(&mut self, speed_factor: f32) {
        self.speed_factor = speed_factor;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

fn make_drawable(
    ctx: &mut dyn RenderContext,
    registry: &mut StaticRegistry,
    shape: &str,
    params: &ShapeParams,
    motion: MotionParams,
) -> Result<Drawable, GraphicsError> {
    match shape {
        SHAPE_PYRAMID => Drawable::new::<Pyramid>(ctx, registry, params, motion),
        SHAPE_BOX => Drawable::new::<Cube>(ctx, registry, params, motion),
        other => Err(GraphicsError::InvalidParameter(format!(
            "unknown shape `{other}`"
        ))),
    }
}
