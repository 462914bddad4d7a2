//! conic_core: math, colour, camera and timing types shared by the renderer
//! and the application layer.
//!
//! Nothing in this crate touches the GPU unless the `gpu` feature is enabled,
//! in which case [`context::EngineContext`] is available for headless device
//! setup.

pub mod camera;
pub mod color;
#[cfg(feature = "gpu")]
pub mod context;
pub mod time;
pub mod transform;

pub use camera::Camera;
pub use color::Color;
pub use time::{FixedClock, FrameClock, Time, TimeClock};
pub use transform::Transform;

// glam is part of the public API (matrices flow into constant buffers).
pub use glam;
