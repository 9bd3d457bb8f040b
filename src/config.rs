use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::labels::LabelSchema;
use crate::params::PerturbParams;
use crate::sampler::DEFAULT_MAX_REJECTIONS;
use crate::{PoseGenError, Result};

/// One rule as written in a config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Space-separated `field=value` conditions; empty matches every frame
    #[serde(default)]
    pub labels: String,
    #[serde(flatten)]
    pub params: PerturbParams,
}

/// Generator configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub sensors: Vec<String>,
    #[serde(default = "default_max_rejections")]
    pub max_rejections: usize,
    #[serde(default)]
    pub labels: LabelSchema,
    pub rules: Vec<RuleConfig>,
}

fn default_max_rejections() -> usize {
    DEFAULT_MAX_REJECTIONS
}

impl GeneratorConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg: GeneratorConfig = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rules.is_empty() {
            return Err(PoseGenError::InvalidConfig(
                "at least one rule must be configured".to_string(),
            ));
        }
        if self.sensors.iter().any(|s| s.trim().is_empty()) {
            return Err(PoseGenError::InvalidConfig(
                "sensor names must be non-empty".to_string(),
            ));
        }
        if self.max_rejections == 0 {
            return Err(PoseGenError::InvalidConfig(
                "max_rejections must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Rules as `(label string, params)` pairs in declaration order.
    pub fn rule_pairs(&self) -> Vec<(String, PerturbParams)> {
        self.rules
            .iter()
            .map(|rule| (rule.labels.clone(), rule.params))
            .collect()
    }
}
