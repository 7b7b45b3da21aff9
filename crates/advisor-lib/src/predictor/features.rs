//! Feature vector construction for ML inference
//!
//! A model can only be fed columns in the order it was trained on. The
//! schema stored with each artifact is that order; the builder reproduces
//! it from a loosely typed feature map, filling absent features with 0.

use crate::error::FeatureError;
use crate::models::StudentFeatures;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

/// Schema version assumed when an artifact does not declare one
pub const DEFAULT_SCHEMA_VERSION: u32 = 1;

/// Ordered, unique feature names a pipeline was trained against
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSchema {
    version: u32,
    names: Vec<String>,
}

impl FeatureSchema {
    /// Create a schema, rejecting duplicate names
    pub fn new(names: Vec<String>) -> Result<Self, String> {
        Self::versioned(names, DEFAULT_SCHEMA_VERSION)
    }

    pub fn versioned(names: Vec<String>, version: u32) -> Result<Self, String> {
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(format!("duplicate feature `{}` in schema", name));
            }
        }
        Ok(Self { version, names })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Builds feature vectors in schema order
pub struct FeatureVectorBuilder<'a> {
    schema: &'a FeatureSchema,
}

impl<'a> FeatureVectorBuilder<'a> {
    pub fn new(schema: &'a FeatureSchema) -> Self {
        Self { schema }
    }

    /// One value per schema entry, in order; absent features are 0
    pub fn build(&self, features: &StudentFeatures) -> Result<Vec<f64>, FeatureError> {
        build_feature_vector(features, self.schema.names())
    }
}

/// Build a vector for an arbitrary ordered list of names.
///
/// The output always has exactly `schema.len()` entries.
pub fn build_feature_vector(
    features: &StudentFeatures,
    schema: &[String],
) -> Result<Vec<f64>, FeatureError> {
    schema
        .iter()
        .map(|name| match features.get(name) {
            Some(value) => coerce(name, value),
            None => Ok(0.0),
        })
        .collect()
}

/// Coerce a loosely typed value to a float
fn coerce(name: &str, value: &Value) -> Result<f64, FeatureError> {
    let invalid = || FeatureError::TypeInvalid {
        name: name.to_string(),
        value: value.to_string(),
    };
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(invalid),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| invalid()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(invalid()),
    }
}
