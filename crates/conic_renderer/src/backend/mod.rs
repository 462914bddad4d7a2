//! [`RenderContext`](crate::context::RenderContext) implementations.
//!
//! - [`RecordingContext`]: headless; validates every call like a device
//!   would and keeps a command log plus counters.  Used by every test.
//! - [`WgpuContext`]: renders into an offscreen target through wgpu.

pub mod gpu;
pub mod recording;

pub use gpu::{CapturedFrame, RenderTarget, WgpuContext};
pub use recording::{Command, Fault, RecordingContext};
