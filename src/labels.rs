//! Label schema and label-condition parsing
//!
//! Rules are gated by strings such as `"road_type=highway user_label=stable"`.
//! This module turns them into predicate maps and knows which fields and
//! values a trace may carry.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{PoseGenError, Result};

/// Field name to expected value. All entries must hold for a frame to match.
pub type Predicates = BTreeMap<String, String>;

/// Knowledge about label fields needed to validate rule conditions
pub trait LabelCatalog {
    /// Numeric fields hold measurements and cannot gate a rule.
    fn is_field_numeric(&self, field: &str) -> bool;

    /// Whether `value` is a recognized value of the string field `field`.
    fn is_label_valid(&self, field: &str, value: &str) -> bool;
}

/// Type of one label column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Numeric,
    Categorical { values: BTreeSet<String> },
}

/// Declared label fields of a trace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSchema {
    fields: BTreeMap<String, FieldKind>,
}

impl LabelSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_numeric(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), FieldKind::Numeric);
        self
    }

    pub fn with_categorical<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.fields
            .insert(field.into(), FieldKind::Categorical { values });
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldKind> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl LabelCatalog for LabelSchema {
    fn is_field_numeric(&self, field: &str) -> bool {
        matches!(self.fields.get(field), Some(FieldKind::Numeric))
    }

    fn is_label_valid(&self, field: &str, value: &str) -> bool {
        match self.fields.get(field) {
            Some(FieldKind::Categorical { values }) => values.contains(value),
            _ => false,
        }
    }
}

/// Split a whitespace-separated `key=value` list into predicates.
///
/// An empty string gives an empty map, which matches every frame.
pub fn parse_label_string(raw: &str) -> Result<Predicates> {
    let mut predicates = Predicates::new();

    for token in raw.split_whitespace() {
        let (field, value) = token.split_once('=').ok_or_else(|| {
            PoseGenError::InvalidRule(format!(
                "label condition \"{token}\" is not of the form key=value"
            ))
        })?;
        if field.is_empty() || value.is_empty() {
            return Err(PoseGenError::InvalidRule(format!(
                "label condition \"{token}\" has an empty key or value"
            )));
        }
        if predicates
            .insert(field.to_string(), value.to_string())
            .is_some()
        {
            return Err(PoseGenError::InvalidRule(format!(
                "label field \"{field}\" appears more than once in \"{raw}\""
            )));
        }
    }

    Ok(predicates)
}
