//! `conic [config.toml]`: renders the scene offscreen for the configured
//! number of frames and optionally saves the last one as a PNG.

use anyhow::Context as _;
use conic_app::{logging, App, SceneConfig, SeededSampler};
use conic_core::context::EngineContext;
use conic_core::TimeClock;
use conic_renderer::WgpuContext;

fn main() -> anyhow::Result<()> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    let level = config
        .log_level
        .parse()
        .context("invalid log_level")?;
    logging::init(level)?;

    let engine = pollster::block_on(EngineContext::new()).context("no GPU available")?;
    let ctx = WgpuContext::new(&engine, config.window.width, config.window.height)
        .context("cannot create the offscreen target")?;

    let mut sampler = SeededSampler::new(config.seed, config.tessellation)?;
    let mut app = App::new(ctx, &config, &mut sampler, Box::new(TimeClock::new()))
        .context("cannot build the scene")?;
    app.run(config.frames)?;

    if let Some(path) = &config.screenshot {
        let frame = app.context().capture_frame()?;
        image::save_buffer(
            path,
            &frame.rgba,
            frame.width,
            frame.height,
            image::ColorType::Rgba8,
        )
        .with_context(|| format!("cannot write {}", path.display()))?;
        log::info!("last frame written to {}", path.display());
    }

    app.shutdown();
    Ok(())
}
