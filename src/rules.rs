//! Ordered perturbation rules
//!
//! Rules are kept in configuration order. The first rule whose predicates
//! hold for a frame decides how that frame is perturbed; later rules that can
//! never be reached are accepted as they are.

use crate::labels::{parse_label_string, LabelCatalog, Predicates};
use crate::params::PerturbParams;
use crate::trace::LabelSource;
use crate::{PoseGenError, Result};

/// Label predicates paired with the parameters they select
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub predicates: Predicates,
    pub params: PerturbParams,
}

/// Validated rules in declaration order
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Parse and validate `(label string, params)` pairs.
    ///
    /// Numeric label fields cannot gate a rule, and every `field=value` pair
    /// must be known to `catalog`.
    pub fn build<C>(config_rules: &[(String, PerturbParams)], catalog: &C) -> Result<Self>
    where
        C: LabelCatalog + ?Sized,
    {
        let mut rules = Vec::with_capacity(config_rules.len());

        for (raw, params) in config_rules {
            let predicates = parse_label_string(raw)?;
            for (field, value) in &predicates {
                if catalog.is_field_numeric(field) {
                    return Err(PoseGenError::InvalidRule(format!(
                        "poses cannot be generated based on numeric label \"{field}\""
                    )));
                }
                if !catalog.is_label_valid(field, value) {
                    return Err(PoseGenError::InvalidRule(format!(
                        "invalid label condition \"{field}\":\"{value}\""
                    )));
                }
            }
            rules.push(Rule {
                predicates,
                params: *params,
            });
        }

        Ok(Self { rules })
    }

    /// First rule matching `frame`, scanning in declaration order.
    pub fn first_match<S>(&self, frame: usize, source: &S) -> Option<&Rule>
    where
        S: LabelSource + ?Sized,
    {
        self.rules
            .iter()
            .find(|rule| source.labels_match(frame, &rule.predicates))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
