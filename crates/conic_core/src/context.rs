//! Headless device setup.
//!
//! Nothing here ever sees a window: frames go to an offscreen target, so the
//! adapter is requested without a surface and a software adapter is accepted
//! when no hardware one exists (CI machines, containers).

use std::sync::Arc;

use anyhow::Context as _;
use thiserror::Error;

/// Instance, adapter, device and queue of one headless GPU session.
///
/// `Device` and `Queue` are `Arc`-wrapped so the renderer backend can hold
/// its own handle while the application keeps one for readbacks.
pub struct EngineContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("no GPU adapter, hardware or fallback, was found")]
    AdapterUnavailable,
    #[error("device request failed: {0}")]
    DeviceRequest(String),
}

impl EngineContext {
    /// Opens a headless session on the backends named by `WGPU_BACKEND`, or
    /// on every backend when the variable is unset.
    pub async fn new() -> anyhow::Result<Self> {
        let backends = wgpu::util::backend_bits_from_env().unwrap_or(wgpu::Backends::all());
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });
        Self::new_with_instance(instance).await
    }

    /// Opens a headless session on an existing `Instance`.
    ///
    /// A hardware adapter is preferred; the fallback (software) adapter is
    /// tried second.  Limits are the downlevel defaults raised to what the
    /// adapter supports, so software rasterisers qualify.
    pub async fn new_with_instance(instance: wgpu::Instance) -> anyhow::Result<Self> {
        let adapter = match request_adapter(&instance, false).await {
            Some(adapter) => adapter,
            None => {
                log::warn!("no hardware adapter, retrying with the fallback adapter");
                request_adapter(&instance, true)
                    .await
                    .context(ContextError::AdapterUnavailable)?
            }
        };

        let info = adapter.get_info();
        log::info!(
            "headless adapter: {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("conic headless device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| ContextError::DeviceRequest(e.to_string()))?;

        Ok(Self {
            instance,
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }
}

async fn request_adapter(instance: &wgpu::Instance, fallback: bool) -> Option<wgpu::Adapter> {
    instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: fallback,
        })
        .await
}
