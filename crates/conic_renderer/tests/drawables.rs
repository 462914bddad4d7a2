//! Drawables against the recording backend: static-set sharing, draw
//! ordering and failure atomicity.

use conic_core::Color;
use conic_renderer::backend::{Command, Fault, RecordingContext};
use conic_renderer::context::{BufferUsage, RenderContext};
use conic_renderer::drawable::{Drawable, MotionParams, Shape, ShapeDescriptor, ShapeParams};
use conic_renderer::geometry::{Semantic, VertexAttribute, VertexFormat, VertexLayout};
use conic_renderer::shader::{ShaderStage, BLENDED_PHONG_PS};
use conic_renderer::shapes::{Cube, Pyramid};
use conic_renderer::{GraphicsError, ResourceKind, StaticRegistry};

fn motion(i: usize) -> MotionParams {
    MotionParams {
        r: 6.0 + i as f32 * 0.1,
        roll: 0.1 * i as f32,
        dyaw: 0.5,
        dtheta: 0.05,
        ..Default::default()
    }
}

fn build<S: Shape>(
    ctx: &mut RecordingContext,
    registry: &mut StaticRegistry,
    n: usize,
) -> Vec<Drawable> {
    (0..n)
        .map(|i| {
            let params = ShapeParams {
                tessellation: 3 + (i % 10) as u32,
            };
            Drawable::new::<S>(ctx, registry, &params, motion(i)).unwrap()
        })
        .collect()
}

#[test]
fn one_static_set_for_180_pyramids() {
    let mut ctx = RecordingContext::new();
    let mut registry = StaticRegistry::new();
    let drawables = build::<Pyramid>(&mut ctx, &mut registry, 180);

    assert_eq!(registry.shape_count(), 1);
    assert_eq!(ctx.uploads(BufferUsage::Vertex), 1);
    assert_eq!(ctx.uploads(BufferUsage::Index), 1);
    assert_eq!(ctx.shader_compiles(), 2);
    // one material plus one transform buffer per instance
    assert_eq!(ctx.uploads(BufferUsage::Uniform), 1 + 180);

    ctx.begin_frame(Color::BLACK).unwrap();
    for d in &drawables {
        d.draw(&mut ctx).unwrap();
    }
    ctx.end_frame().unwrap();

    assert_eq!(ctx.draw_calls(), 180);
    assert_eq!(ctx.frame_stats().buffer_writes, 180);
    for d in &drawables {
        assert_eq!(ctx.buffer_writes(d.transform_cbuf().id()), 1);
    }
}

#[test]
fn upload_counts_do_not_depend_on_instance_count() {
    let counts = |n| {
        let mut ctx = RecordingContext::new();
        let mut registry = StaticRegistry::new();
        build::<Pyramid>(&mut ctx, &mut registry, n);
        (
            ctx.uploads(BufferUsage::Vertex),
            ctx.uploads(BufferUsage::Index),
            ctx.shader_compiles(),
        )
    };
    assert_eq!(counts(1), counts(50));
}

#[test]
fn later_instances_share_the_first_index_buffer() {
    let mut ctx = RecordingContext::new();
    let mut registry = StaticRegistry::new();
    let first = Drawable::new::<Pyramid>(
        &mut ctx,
        &mut registry,
        &ShapeParams { tessellation: 4 },
        motion(0),
    )
    .unwrap();
    // a different tessellation does not rebuild the shared geometry
    let second = Drawable::new::<Pyramid>(
        &mut ctx,
        &mut registry,
        &ShapeParams { tessellation: 20 },
        motion(1),
    )
    .unwrap();
    assert_eq!(first.index_count(), 6 * 4);
    assert_eq!(second.index_count(), first.index_count());
    assert_eq!(ctx.uploads(BufferUsage::Index), 1);
}

#[test]
fn pipeline_state_is_bound_before_data() {
    let mut ctx = RecordingContext::new();
    let mut registry = StaticRegistry::new();
    let pyramid = Drawable::new::<Pyramid>(
        &mut ctx,
        &mut registry,
        &ShapeParams::default(),
        motion(0),
    )
    .unwrap();
    ctx.take_commands();

    ctx.begin_frame(Color::BLACK).unwrap();
    pyramid.draw(&mut ctx).unwrap();
    let commands = ctx.take_commands();

    let first_data = commands
        .iter()
        .position(|c| {
            matches!(
                c,
                Command::SetVertexBuffer { .. }
                    | Command::SetIndexBuffer { .. }
                    | Command::SetConstantBuffer { .. }
            )
        })
        .unwrap();
    let last_pipeline = commands.iter().rposition(Command::is_pipeline_state).unwrap();
    assert!(last_pipeline < first_data, "{commands:#?}");

    // transforms are refreshed right before the draw
    let n = commands.len();
    assert!(matches!(commands[n - 1], Command::DrawIndexed { index_count: 18 }));
    assert!(matches!(
        commands[n - 2],
        Command::SetConstantBuffer {
            stage: ShaderStage::Vertex,
            slot: 0,
            ..
        }
    ));
    assert!(matches!(commands[n - 3], Command::WriteBuffer { .. }));
}

#[test]
fn each_shape_type_gets_its_own_set() {
    let mut ctx = RecordingContext::new();
    let mut registry = StaticRegistry::new();
    build::<Pyramid>(&mut ctx, &mut registry, 3);
    let boxes = build::<Cube>(&mut ctx, &mut registry, 3);

    assert_eq!(registry.shape_count(), 2);
    assert_eq!(ctx.uploads(BufferUsage::Vertex), 2);
    assert_eq!(ctx.shader_compiles(), 4);
    assert!(boxes.iter().all(|b| b.index_count() == 36));
    assert_eq!(boxes[0].shape(), "box");
}

#[test]
fn bad_tessellation_fails_before_any_resource() {
    let mut ctx = RecordingContext::new();
    let mut registry = StaticRegistry::new();
    let err = Drawable::new::<Pyramid>(
        &mut ctx,
        &mut registry,
        &ShapeParams { tessellation: 2 },
        motion(0),
    )
    .unwrap_err();

    assert!(matches!(err, GraphicsError::InvalidParameter(_)));
    assert!(ctx.commands().is_empty());
    assert!(!registry.is_initialized::<Pyramid>());
}

/// Pyramid geometry described with a different vertex layout.
macro_rules! relaid_pyramid {
    ($name:ident, $label:literal, $stride:expr, [$($attr:expr),* $(,)?]) => {
        struct $name;

        impl Shape for $name {
            const NAME: &'static str = $label;

            fn describe(params: &ShapeParams) -> Result<ShapeDescriptor, GraphicsError> {
                let mut desc = Pyramid::describe(params)?;
                desc.layout = VertexLayout::new($stride, [$($attr),*]);
                Ok(desc)
            }
        }
    };
}

relaid_pyramid!(Colourless, "colourless", 32, [
    VertexAttribute::new(Semantic::Position, VertexFormat::Float32x3, 0, 0),
    VertexAttribute::new(Semantic::Normal, VertexFormat::Float32x3, 12, 1),
]);

relaid_pyramid!(ShortStride, "short", 28, [
    VertexAttribute::new(Semantic::Position, VertexFormat::Float32x3, 0, 0),
    VertexAttribute::new(Semantic::Normal, VertexFormat::Float32x3, 12, 1),
    VertexAttribute::new(Semantic::Color, VertexFormat::Unorm8x4, 24, 2),
]);

relaid_pyramid!(FlatNormal, "flat_normal", 32, [
    VertexAttribute::new(Semantic::Position, VertexFormat::Float32x3, 0, 0),
    VertexAttribute::new(Semantic::Normal, VertexFormat::Float32x2, 12, 1),
    VertexAttribute::new(Semantic::Color, VertexFormat::Unorm8x4, 24, 2),
]);

relaid_pyramid!(Overlapping, "overlapping", 32, [
    VertexAttribute::new(Semantic::Position, VertexFormat::Float32x3, 0, 0),
    VertexAttribute::new(Semantic::Normal, VertexFormat::Float32x3, 12, 1),
    VertexAttribute::new(Semantic::Color, VertexFormat::Unorm8x4, 20, 2),
]);

fn assert_layout_rejected<S: Shape>() {
    let mut ctx = RecordingContext::new();
    let mut registry = StaticRegistry::new();
    let err = Drawable::new::<S>(&mut ctx, &mut registry, &ShapeParams::default(), motion(0))
        .unwrap_err();

    assert!(
        matches!(
            err,
            GraphicsError::ResourceCreation {
                kind: ResourceKind::InputLayout,
                ..
            }
        ),
        "{err:?}"
    );
    assert!(!registry.is_initialized::<S>());
    assert_eq!(registry.shape_count(), 0);
    assert_eq!(ctx.live_resources(), 0);
}

#[test]
fn missing_attribute_is_a_layout_error() {
    assert_layout_rejected::<Colourless>();
}

#[test]
fn wrong_stride_is_a_layout_error() {
    assert_layout_rejected::<ShortStride>();
}

#[test]
fn wrong_format_is_a_layout_error() {
    assert_layout_rejected::<FlatNormal>();
}

#[test]
fn overlapping_attributes_are_a_layout_error() {
    assert_layout_rejected::<Overlapping>();
}

/// Pyramid whose pixel shader does not compile.
struct BrokenShader;

impl Shape for BrokenShader {
    const NAME: &'static str = "broken";

    fn describe(params: &ShapeParams) -> Result<ShapeDescriptor, GraphicsError> {
        let mut desc = Pyramid::describe(params)?;
        desc.pixel_shader = conic_renderer::shader::ShaderSource::owned(
            "broken_ps",
            BLENDED_PHONG_PS.code.replace("fn ps_main", "fn ps_main("),
            "ps_main",
        );
        Ok(desc)
    }
}

#[test]
fn shader_failure_names_the_pixel_stage() {
    let mut ctx = RecordingContext::new();
    let mut registry = StaticRegistry::new();
    for _ in 0..3 {
        let err = Drawable::new::<BrokenShader>(
            &mut ctx,
            &mut registry,
            &ShapeParams::default(),
            motion(0),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::ResourceCreation {
                kind: ResourceKind::PixelShader,
                ..
            }
        ));
        assert!(!registry.is_initialized::<BrokenShader>());
        // the vertex buffer and vertex shader made before the failure are gone
        assert_eq!(ctx.live_resources(), 0);
    }
    assert_eq!(ctx.release_order().len(), 3 * 2);
}

#[test]
fn rejected_buffers_abort_construction() {
    let mut ctx = RecordingContext::new();
    let mut registry = StaticRegistry::new();
    ctx.inject_fault(Fault::RejectBuffers);
    let err = Drawable::new::<Pyramid>(
        &mut ctx,
        &mut registry,
        &ShapeParams::default(),
        motion(0),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        GraphicsError::ResourceCreation {
            kind: ResourceKind::VertexBuffer,
            ..
        }
    ));

    assert_eq!(ctx.live_resources(), 0);

    ctx.clear_faults();
    Drawable::new::<Pyramid>(&mut ctx, &mut registry, &ShapeParams::default(), motion(0)).unwrap();
    assert!(registry.is_initialized::<Pyramid>());
}

#[test]
fn device_lost_is_a_draw_time_error() {
    let mut ctx = RecordingContext::new();
    let mut registry = StaticRegistry::new();
    let drawables = build::<Pyramid>(&mut ctx, &mut registry, 2);
    ctx.begin_frame(Color::BLACK).unwrap();
    drawables[0].draw(&mut ctx).unwrap();
    ctx.inject_fault(Fault::DeviceLost);
    assert!(matches!(
        drawables[1].draw(&mut ctx),
        Err(GraphicsError::DrawTime(_))
    ));
}

#[test]
fn zero_dt_keeps_the_transform() {
    let mut ctx = RecordingContext::new();
    let mut registry = StaticRegistry::new();
    let mut d = build::<Pyramid>(&mut ctx, &mut registry, 1).remove(0);
    let before = d.world_transform();
    d.update(0.0);
    assert_eq!(d.world_transform(), before);
    d.update(1.0);
    assert_ne!(d.world_transform(), before);
}
