//! Scene configuration, loaded from TOML.
//!
//! Every field is optional in the file; missing ones take the defaults of
//! the stock demo (180 pyramids, 1280x720, purple clear colour).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _};
use serde::Deserialize;

pub const SHAPE_PYRAMID: &str = "pyramid";
pub const SHAPE_BOX: &str = "box";

const KNOWN_SHAPES: [&str; 2] = [SHAPE_PYRAMID, SHAPE_BOX];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    pub drawable_count: usize,
    pub seed: u64,
    pub speed_factor: f32,
    pub paused: bool,
    pub shapes: Vec<String>,
    pub tessellation: TessellationRange,
    pub clear_color: [f32; 3],
    pub camera: CameraConfig,
    pub light: LightConfig,
    pub window: WindowConfig,
    pub frames: u32,
    pub screenshot: Option<PathBuf>,
    pub log_level: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            drawable_count: 180,
            seed: 0x5eed,
            speed_factor: 1.0,
            paused: false,
            shapes: vec![SHAPE_PYRAMID.to_owned()],
            tessellation: TessellationRange::default(),
            clear_color: [0.07, 0.0, 0.12],
            camera: CameraConfig::default(),
            light: LightConfig::default(),
            window: WindowConfig::default(),
            frames: 600,
            screenshot: None,
            log_level: "info".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TessellationRange {
    pub min: u32,
    pub max: u32,
}

impl Default for TessellationRange {
    fn default() -> Self {
        Self { min: 3, max: 30 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            radius: 20.0,
            theta: 0.0,
            phi: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightConfig {
    pub position: [f32; 3],
    pub ambient: [f32; 3],
    pub diffuse_color: [f32; 3],
    pub diffuse_intensity: f32,
    pub att_const: f32,
    pub att_lin: f32,
    pub att_quad: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            ambient: [0.05, 0.05, 0.05],
            diffuse_color: [1.0, 1.0, 1.0],
            diffuse_intensity: 1.0,
            att_const: 1.0,
            att_lin: 0.045,
            att_quad: 0.0075,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl SceneConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(src: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(src).context("malformed scene config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Self::from_toml_str(&src).with_context(|| format!("in {}", path.display()))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.drawable_count == 0 {
            bail!("drawable_count must be at least 1");
        }
        if self.shapes.is_empty() {
            bail!("shapes must name at least one shape");
        }
        if let Some(unknown) = self
            .shapes
            .iter()
            .find(|s| !KNOWN_SHAPES.contains(&s.as_str()))
        {
            bail!("unknown shape `{unknown}` (expected one of {KNOWN_SHAPES:?})");
        }
        let TessellationRange { min, max } = self.tessellation;
        if min < 3 {
            bail!("tessellation.min is {min}, a cone needs at least 3 segments");
        }
        if min > max {
            bail!("tessellation range {min}..={max} is empty");
        }
        if self.speed_factor.is_nan() || self.speed_factor <= 0.0 {
            bail!("speed_factor must be positive, got {}", self.speed_factor);
        }
        if self.window.width == 0 || self.window.height == 0 {
            bail!(
                "window size {}x{} has a zero dimension",
                self.window.width,
                self.window.height
            );
        }
        self.log_level
            .parse::<log::LevelFilter>()
            .map_err(|_| anyhow::anyhow!("unknown log_level `{}`", self.log_level))?;
        Ok(())
    }

    /// Height over width, as the projection expects it.
    pub fn aspect(&self) -> f32 {
        self.window.height as f32 / self.window.width as f32
    }
}
