//! `conic_renderer`: procedural meshes, GPU bindings and per-type shared
//! static resources.
//!
//! # Module layout
//!
//! | Module      | Responsibility                                                |
//! |-------------|---------------------------------------------------------------|
//! | `error`     | `GraphicsError`, `ResourceKind`                               |
//! | `geometry`  | `IndexedTriangleList`, cone/cube primitives, vertex layouts   |
//! | `shader`    | WGSL sources, naga compilation and input reflection           |
//! | `context`   | `RenderContext` trait, resource ids, buffer descriptors       |
//! | `backend`   | `RecordingContext` (headless) and `WgpuContext`               |
//! | `bind`      | `Bindable` and the concrete bindings                          |
//! | `registry`  | `StaticRegistry`: one static binding set per shape type       |
//! | `drawable`  | `Shape`, `Drawable`, orbit/spin `Motion`                      |
//! | `shapes`    | Built-in `Pyramid` and `Cube`                                 |
//!
//! # Example
//!
//! ```
//! use conic_core::Color;
//! use conic_renderer::backend::RecordingContext;
//! use conic_renderer::context::RenderContext;
//! use conic_renderer::drawable::{Drawable, MotionParams, ShapeParams};
//! use conic_renderer::registry::StaticRegistry;
//! use conic_renderer::shapes::Pyramid;
//!
//! let mut ctx = RecordingContext::new();
//! let mut registry = StaticRegistry::new();
//! let params = ShapeParams { tessellation: 8 };
//! let motion = MotionParams { r: 6.0, ..Default::default() };
//! let pyramid = Drawable::new::<Pyramid>(&mut ctx, &mut registry, &params, motion)?;
//!
//! ctx.begin_frame(Color::BLACK)?;
//! pyramid.draw(&mut ctx)?;
//! ctx.end_frame()?;
//! assert_eq!(ctx.draw_calls(), 1);
//! # Ok::<(), conic_renderer::GraphicsError>(())
//! ```

pub mod backend;
pub mod bind;
pub mod context;
pub mod drawable;
pub mod error;
pub mod geometry;
pub mod registry;
pub mod shader;
pub mod shapes;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use glam;

pub use backend::{RecordingContext, WgpuContext};
pub use context::{RenderContext, ResourceId};
pub use drawable::{Drawable, MotionParams, Shape, ShapeParams};
pub use error::{GraphicsError, ResourceKind};
pub use registry::StaticRegistry;
pub use shapes::{Cube, Pyramid};
