//! conic_app: the orbiting-drawables scene.
//!
//! [`App`] owns a rendering context, the [`StaticRegistry`] shared by its
//! drawables, an orbit camera and a point light, and renders one frame per
//! [`App::do_frame`].  Everything random about the scene comes from a
//! [`ParamSampler`], so a seeded sampler reproduces the same scene.
//!
//! ```
//! use conic_app::{App, SceneConfig, SeededSampler};
//! use conic_core::FixedClock;
//! use conic_renderer::RecordingContext;
//!
//! let config = SceneConfig { drawable_count: 10, ..Default::default() };
//! let mut sampler = SeededSampler::new(config.seed, config.tessellation)?;
//! let mut app = App::new(
//!     RecordingContext::new(),
//!     &config,
//!     &mut sampler,
//!     Box::new(FixedClock::sixty_hz()),
//! )?;
//! let report = app.do_frame()?;
//! assert_eq!(report.draw_calls, 10);
//! # Ok::<(), conic_renderer::GraphicsError>(())
//! ```
//!
//! [`StaticRegistry`]: conic_renderer::StaticRegistry

pub mod app;
pub mod config;
pub mod light;
pub mod logging;
pub mod sampler;

pub use app::{App, FrameReport};
pub use config::SceneConfig;
pub use light::{PointLight, PointLightData};
pub use sampler::{ParamSampler, SeededSampler};
