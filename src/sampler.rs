//! Bounded random variate sampling
//!
//! The sampler owns the only random generator of a pose generator. Every draw
//! and every shuffle advances the same stream, so the output sequence is fully
//! determined by the seed and the order of calls.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution as _, Normal, Uniform};

use crate::params::{Distribution, RandomParams};
use crate::{PoseGenError, Result};

/// Upper limit on Gaussian redraws before sampling is reported as exhausted
pub const DEFAULT_MAX_REJECTIONS: usize = 100_000;

/// Seeded source of bounded random scalars
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: ChaCha8Rng,
    max_rejections: usize,
}

impl Sampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            max_rejections: DEFAULT_MAX_REJECTIONS,
        }
    }

    /// Change the Gaussian redraw limit. At least one draw is always made.
    pub fn with_max_rejections(mut self, max_rejections: usize) -> Self {
        self.max_rejections = max_rejections.max(1);
        self
    }

    pub fn max_rejections(&self) -> usize {
        self.max_rejections
    }

    /// Draw one value in `[-max, max]` according to `params`.
    pub fn sample(&mut self, params: &RandomParams) -> Result<f64> {
        match params.distribution() {
            Distribution::Gaussian => self.sample_gaussian(params),
            Distribution::Uniform => Ok(self.sample_uniform(params)),
        }
    }

    /// Shuffle `items` in place with the shared stream.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    // Out-of-range draws are redrawn, never clamped.
    fn sample_gaussian(&mut self, params: &RandomParams) -> Result<f64> {
        let max = params.max();
        let normal = Normal::new(0.0, params.std_dev())
            .map_err(|e| PoseGenError::InvalidParams(e.to_string()))?;

        for _ in 0..self.max_rejections {
            let value = normal.sample(&mut self.rng);
            if (-max..=max).contains(&value) {
                return Ok(value);
            }
        }

        Err(PoseGenError::SamplingExhausted {
            max,
            std_dev: params.std_dev(),
            attempts: self.max_rejections,
        })
    }

    fn sample_uniform(&mut self, params: &RandomParams) -> f64 {
        let max = params.max();
        Uniform::new_inclusive(-max, max).sample(&mut self.rng)
    }
}
