//! Random construction parameters for the scene's drawables.

use std::f32::consts::PI;

use conic_renderer::{GraphicsError, MotionParams, ShapeParams};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::TessellationRange;

/// Source of per-drawable parameters.
pub trait ParamSampler {
    /// Orbit radius, spin and orbit rates, initial orbit angles.
    fn motion(&mut self) -> MotionParams;

    /// Tessellation within the configured range.
    fn shape_params(&mut self) -> ShapeParams;

    /// Index into a list of `count` shape names.
    fn shape_index(&mut self, count: usize) -> usize;
}

/// Uniform distributions over a seeded [`StdRng`]; the same seed always
/// yields the same scene.
pub struct SeededSampler {
    rng: StdRng,
    /// Initial angles.
    adist: Uniform<f32>,
    /// Spin rates.
    ddist: Uniform<f32>,
    /// Orbit rates.
    odist: Uniform<f32>,
    /// Orbit radius.
    rdist: Uniform<f32>,
    tdist: Uniform<u32>,
}

impl SeededSampler {
    /// Fails with `InvalidParameter` for a tessellation range that is empty
    /// or starts below three segments.
    pub fn new(seed: u64, tessellation: TessellationRange) -> Result<Self, GraphicsError> {
        let TessellationRange { min, max } = tessellation;
        if min < 3 || min > max {
            return Err(GraphicsError::InvalidParameter(format!(
                "tessellation range {min}..={max} must be non-empty and start at 3 or more"
            )));
        }
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            adist: Uniform::new(0.0, 2.0 * PI),
            ddist: Uniform::new(0.0, PI * 0.5),
            odist: Uniform::new(0.0, PI * 0.08),
            rdist: Uniform::new(6.0, 20.0),
            tdist: Uniform::new_inclusive(min, max),
        })
    }
}

impl ParamSampler for SeededSampler {
    fn motion(&mut self) -> MotionParams {
        let rng = &mut self.rng;
        MotionParams {
            r: self.rdist.sample(rng),
            droll: self.ddist.sample(rng),
            dpitch: self.ddist.sample(rng),
            dyaw: self.ddist.sample(rng),
            dphi: self.odist.sample(rng),
            dtheta: self.odist.sample(rng),
            dchi: self.odist.sample(rng),
            chi: self.adist.sample(rng),
            theta: self.adist.sample(rng),
            phi: self.adist.sample(rng),
            ..Default::default()
        }
    }

    fn shape_params(&mut self) -> ShapeParams {
        ShapeParams {
            tessellation: self.tdist.sample(&mut self.rng),
        }
    }

    fn shape_index(&mut self, count: usize) -> usize {
        match count {
            0 | 1 => 0,
            n => Uniform::new(0, n).sample(&mut self.rng),
        }
    }
}
