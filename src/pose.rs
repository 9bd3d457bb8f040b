//! Pose synthesis
//!
//! A pose is one set of perturbation amounts handed to the augmenter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::params::PerturbParams;
use crate::sampler::Sampler;
use crate::Result;

/// One perturbation of a source frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Lateral shift
    pub shift: f64,
    /// Rotation about the vertical axis
    pub rotation: f64,
    /// Forward offset
    pub forward: f64,
    /// Yaw per sensor name
    pub sensor_yaw: BTreeMap<String, f64>,
    /// Pitch per sensor name
    pub sensor_pitch: BTreeMap<String, f64>,
    /// Roll per sensor name
    pub sensor_roll: BTreeMap<String, f64>,
    /// Mirrored left to right
    pub flip: bool,
    /// Frame the pose was generated for
    pub src_frame: Option<usize>,
}

impl Pose {
    /// Draw one pose from `params`.
    ///
    /// Draw order is shift, rotation, forward, then yaw, pitch and roll for
    /// each sensor in `sensors` order. The result is unflipped and carries no
    /// source frame.
    pub fn synthesize(
        sampler: &mut Sampler,
        sensors: &[String],
        params: &PerturbParams,
    ) -> Result<Self> {
        let shift = sampler.sample(&params.shift)?;
        let rotation = sampler.sample(&params.rotation)?;
        let forward = sampler.sample(&params.forward)?;

        let mut sensor_yaw = BTreeMap::new();
        let mut sensor_pitch = BTreeMap::new();
        let mut sensor_roll = BTreeMap::new();
        for sensor in sensors {
            sensor_yaw.insert(sensor.clone(), sampler.sample(&params.sensor_yaw)?);
            sensor_pitch.insert(sensor.clone(), sampler.sample(&params.sensor_pitch)?);
            sensor_roll.insert(sensor.clone(), sampler.sample(&params.sensor_roll)?);
        }

        Ok(Self {
            shift,
            rotation,
            forward,
            sensor_yaw,
            sensor_pitch,
            sensor_roll,
            flip: false,
            src_frame: None,
        })
    }

    /// Mirror the pose about the world y-z plane.
    ///
    /// Shift and rotation change sign; sensor angles and forward offset are
    /// kept.
    pub fn flipped(&self) -> Self {
        Self {
            shift: -self.shift,
            rotation: -self.rotation,
            flip: true,
            ..self.clone()
        }
    }
}
