//! fern logger setup.

use anyhow::Context as _;
use log::LevelFilter;

/// Installs the global logger: `[LEVEL target] message` on stderr.
///
/// wgpu and naga internals are capped at `warn` whatever `level` is.
/// Fails if a logger is already installed.
pub fn init(level: LevelFilter) -> anyhow::Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("wgpu_core", LevelFilter::Warn)
        .level_for("wgpu_hal", LevelFilter::Warn)
        .level_for("naga", LevelFilter::Warn)
        .chain(std::io::stderr())
        .apply()
        .context("a logger is already installed")?;
    log::debug!("logging initialised at {level}");
    Ok(())
}
