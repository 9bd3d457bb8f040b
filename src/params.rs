//! Perturbation parameters
//!
//! Distribution recipes for each pose field, validated once at construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{PoseGenError, Result};

/// Largest accepted `max`; uniform sampling over `[-max, max]` needs headroom
/// above the interval width to stay finite.
pub const MAX_BOUND: f64 = f64::MAX / 4.0;

/// Supported sampling distributions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    /// Zero-mean normal, truncated to `[-max, max]` by rejection
    Gaussian,
    /// Uniform over `[-max, max]`
    Uniform,
}

impl FromStr for Distribution {
    type Err = PoseGenError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "gaussian" | "normal" => Ok(Distribution::Gaussian),
            "uniform" => Ok(Distribution::Uniform),
            other => Err(PoseGenError::UnknownDistribution(other.to_string())),
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::Gaussian => write!(f, "gaussian"),
            Distribution::Uniform => write!(f, "uniform"),
        }
    }
}

/// Parameters for one random scalar.
///
/// Samples never leave `[-max, max]`. `std_dev` is only read for Gaussian
/// draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRandomParams")]
pub struct RandomParams {
    distribution: Distribution,
    max: f64,
    std_dev: f64,
}

impl RandomParams {
    /// Build parameters from a distribution name such as `"gaussian"`,
    /// `"normal"` or `"uniform"`.
    pub fn new(distribution: &str, max: f64, std_dev: f64) -> Result<Self> {
        Self::with_distribution(distribution.parse()?, max, std_dev)
    }

    pub fn with_distribution(distribution: Distribution, max: f64, std_dev: f64) -> Result<Self> {
        if !max.is_finite() || max < 0.0 {
            return Err(PoseGenError::InvalidParams(format!(
                "max must be finite and >= 0, got {max}"
            )));
        }
        if max > MAX_BOUND {
            return Err(PoseGenError::InvalidParams(format!(
                "max must not exceed {MAX_BOUND:e}, got {max}"
            )));
        }
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(PoseGenError::InvalidParams(format!(
                "std_dev must be finite and >= 0, got {std_dev}"
            )));
        }
        Ok(Self {
            distribution,
            max,
            std_dev,
        })
    }

    pub fn gaussian(max: f64, std_dev: f64) -> Result<Self> {
        Self::with_distribution(Distribution::Gaussian, max, std_dev)
    }

    pub fn uniform(max: f64) -> Result<Self> {
        Self::with_distribution(Distribution::Uniform, max, 0.0)
    }

    /// A field that is always exactly zero.
    pub fn zero() -> Self {
        Self {
            distribution: Distribution::Gaussian,
            max: 0.0,
            std_dev: 0.0,
        }
    }

    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }
}

#[derive(Deserialize)]
struct RawRandomParams {
    distribution: String,
    max: f64,
    #[serde(default)]
    std_dev: f64,
}

impl TryFrom<RawRandomParams> for RandomParams {
    type Error = PoseGenError;

    fn try_from(raw: RawRandomParams) -> Result<Self> {
        RandomParams::new(&raw.distribution, raw.max, raw.std_dev)
    }
}

/// Full perturbation recipe of one rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerturbParams {
    /// Lateral shift
    pub shift: RandomParams,
    /// Rotation about the vertical axis
    pub rotation: RandomParams,
    /// Forward offset
    pub forward: RandomParams,
    /// Per-sensor yaw, drawn independently for every sensor
    pub sensor_yaw: RandomParams,
    /// Per-sensor pitch
    pub sensor_pitch: RandomParams,
    /// Per-sensor roll
    pub sensor_roll: RandomParams,
    /// Emit every second pose mirrored left to right
    #[serde(default)]
    pub flip: bool,
}

impl PerturbParams {
    /// Parameters that produce an all-zero, unflipped pose
    pub fn identity() -> Self {
        Self {
            shift: RandomParams::zero(),
            rotation: RandomParams::zero(),
            forward: RandomParams::zero(),
            sensor_yaw: RandomParams::zero(),
            sensor_pitch: RandomParams::zero(),
            sensor_roll: RandomParams::zero(),
            flip: false,
        }
    }
}

impl Default for PerturbParams {
    fn default() -> Self {
        Self::identity()
    }
}
