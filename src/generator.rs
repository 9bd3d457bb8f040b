//! Pose generator
//!
//! Plans poses for every frame of a label trace: each frame is resolved to
//! the first matching rule, and that rule's parameters are sampled once per
//! requested pose.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::labels::LabelCatalog;
use crate::params::PerturbParams;
use crate::pose::Pose;
use crate::rules::RuleTable;
use crate::sampler::Sampler;
use crate::shuffle;
use crate::trace::{LabelSource, LabelTrace};
use crate::{PoseGenError, Result};

/// Rule-driven pose generator.
///
/// Owns its random stream. Two generators built from the same rules, sensors
/// and seed produce identical output for identical call sequences.
#[derive(Debug, Clone)]
pub struct PoseGenerator {
    rules: RuleTable,
    sensor_names: Vec<String>,
    sampler: Sampler,
}

impl PoseGenerator {
    /// Build a generator from `(label string, params)` rules.
    ///
    /// Fails with [`PoseGenError::InvalidRule`] for label conditions on
    /// numeric or unknown fields, and for empty or repeated sensor names.
    pub fn new<C>(
        config_rules: &[(String, PerturbParams)],
        sensor_names: Vec<String>,
        seed: u64,
        catalog: &C,
    ) -> Result<Self>
    where
        C: LabelCatalog + ?Sized,
    {
        let rules = RuleTable::build(config_rules, catalog)?;

        let mut seen = BTreeSet::new();
        for name in &sensor_names {
            if name.is_empty() {
                return Err(PoseGenError::InvalidRule(
                    "sensor names must not be empty".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(PoseGenError::InvalidRule(format!(
                    "sensor name \"{name}\" is listed more than once"
                )));
            }
        }

        info!(
            rules = rules.len(),
            sensors = sensor_names.len(),
            seed,
            "pose generator ready"
        );

        Ok(Self {
            rules,
            sensor_names,
            sampler: Sampler::new(seed),
        })
    }

    /// Build a generator from a loaded configuration.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let generator = Self::new(
            &config.rule_pairs(),
            config.sensors.clone(),
            config.seed,
            &config.labels,
        )?;
        Ok(generator.with_max_rejections(config.max_rejections))
    }

    /// Change the Gaussian redraw limit of the underlying sampler.
    pub fn with_max_rejections(mut self, max_rejections: usize) -> Self {
        self.sampler = self.sampler.with_max_rejections(max_rejections);
        self
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn sensor_names(&self) -> &[String] {
        &self.sensor_names
    }

    /// Draw one unflipped pose with no source frame.
    pub fn synthesize_one(&mut self, params: &PerturbParams) -> Result<Pose> {
        Pose::synthesize(&mut self.sampler, &self.sensor_names, params)
    }

    /// Poses for a single frame.
    ///
    /// With a flipping rule every second pose (indices 1, 3, 5, ...) is the
    /// mirrored counterpart of a fresh draw.
    pub fn plan_frame<S>(&mut self, use_count: u32, frame: usize, source: &S) -> Result<Vec<Pose>>
    where
        S: LabelSource + ?Sized,
    {
        if use_count == 0 {
            return Ok(Vec::new());
        }

        let params = match self.rules.first_match(frame, source) {
            Some(rule) => rule.params,
            None => return Err(PoseGenError::NoMatchingRule { frame }),
        };

        let mut poses = Vec::with_capacity(use_count as usize);
        for i in 0..use_count {
            let mut pose = Pose::synthesize(&mut self.sampler, &self.sensor_names, &params)?;
            pose.src_frame = Some(frame);
            if params.flip && i % 2 == 1 {
                pose = pose.flipped();
            }
            poses.push(pose);
        }

        debug!(frame, use_count, flip = params.flip, "planned frame");
        Ok(poses)
    }

    /// Poses for every frame of `source`, one list per frame.
    pub fn plan_all_frames<S>(&mut self, use_counts: &[u32], source: &S) -> Result<Vec<Vec<Pose>>>
    where
        S: LabelSource + ?Sized,
    {
        let num_frames = use_counts.len();
        let trace_frames = source.num_datapoints();
        if trace_frames != num_frames {
            return Err(PoseGenError::FrameCountMismatch {
                trace: trace_frames,
                use_counts: num_frames,
            });
        }

        let mut frames = Vec::with_capacity(num_frames);
        for (frame, &use_count) in use_counts.iter().enumerate() {
            frames.push(self.plan_frame(use_count, frame, source)?);
        }

        if frames.len() != num_frames {
            return Err(PoseGenError::InternalInconsistency(format!(
                "planned {} frames, expected {num_frames}",
                frames.len()
            )));
        }

        info!(
            frames = num_frames,
            poses = frames.iter().map(Vec::len).sum::<usize>(),
            "planned poses"
        );
        Ok(frames)
    }

    /// All poses of `source` flattened and shuffled, never starting with a
    /// flipped pose.
    pub fn plan_shuffled<S>(&mut self, use_counts: &[u32], source: &S) -> Result<Vec<Pose>>
    where
        S: LabelSource + ?Sized,
    {
        let frames = self.plan_all_frames(use_counts, source)?;
        let mut poses = shuffle::flatten(frames);
        shuffle::shuffle_poses(&mut self.sampler, &mut poses)?;
        Ok(poses)
    }

    /// Load the label trace at `labels_path` and plan poses per frame.
    pub fn generate_poses_for_frames(
        &mut self,
        use_counts: &[u32],
        labels_path: impl AsRef<Path>,
    ) -> Result<Vec<Vec<Pose>>> {
        let trace = LabelTrace::from_path(labels_path)?;
        self.plan_all_frames(use_counts, &trace)
    }

    /// Load the label trace at `labels_path` and plan one shuffled sequence.
    pub fn generate_shuffled_poses(
        &mut self,
        use_counts: &[u32],
        labels_path: impl AsRef<Path>,
    ) -> Result<Vec<Pose>> {
        let trace = LabelTrace::from_path(labels_path)?;
        self.plan_shuffled(use_counts, &trace)
    }
}
