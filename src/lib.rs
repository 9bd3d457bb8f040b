//! posegen - rule-driven pose perturbation generator
//!
//! Produces bounded random poses (shift, rotation, forward offset and
//! per-sensor yaw/pitch/roll) for a video augmentation pipeline. Each frame is
//! matched against an ordered list of label rules; the first matching rule
//! supplies the distributions its poses are drawn from. All randomness comes
//! from one seeded generator, so output is reproducible for a given seed and
//! call sequence.

pub mod config;
pub mod generator;
pub mod io;
pub mod labels;
pub mod params;
pub mod pose;
pub mod rules;
pub mod sampler;
pub mod shuffle;
pub mod trace;

use std::path::PathBuf;

use thiserror::Error;

// Re-export main types
pub use config::{GeneratorConfig, RuleConfig};
pub use generator::PoseGenerator;
pub use labels::{parse_label_string, FieldKind, LabelCatalog, LabelSchema, Predicates};
pub use params::{Distribution, PerturbParams, RandomParams};
pub use pose::Pose;
pub use rules::{Rule, RuleTable};
pub use sampler::{Sampler, DEFAULT_MAX_REJECTIONS};
pub use trace::{LabelSource, LabelTrace};

#[derive(Debug, Error)]
pub enum PoseGenError {
    #[error("invalid rule: {0}")]
    InvalidRule(String),
    #[error("invalid random parameters: {0}")]
    InvalidParams(String),
    #[error("unknown distribution type: {0}")]
    UnknownDistribution(String),
    #[error("no perturbation rule found for frame {frame}")]
    NoMatchingRule { frame: usize },
    #[error("trace has {trace} frames, but use count has {use_counts} entries")]
    FrameCountMismatch { trace: usize, use_counts: usize },
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),
    #[error("failed to load label trace {}: {source}", path.display())]
    TraceLoad {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error(
        "gaussian sampling gave up after {attempts} draws (max = {max}, std_dev = {std_dev})"
    )]
    SamplingExhausted {
        max: f64,
        std_dev: f64,
        attempts: usize,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, PoseGenError>;
