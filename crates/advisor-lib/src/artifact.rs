//! Model artifact reader
//!
//! An artifact is a JSON record written by the training job: a fitted
//! pipeline plus the metadata needed to feed it (feature order, classes)
//! and to report on it (accuracy, cross-validation scores).
//!
//! Decoding follows a two-attempt policy. The bytes are first decoded as
//! strict UTF-8 JSON; if that fails they are re-read as Latin-1 text and
//! decoded once more. Only when both attempts fail is the artifact corrupt.

use crate::error::ArtifactError;
use crate::pipeline::{BuildError, Pipeline, PipelineSpec};
use crate::predictor::{FeatureSchema, DEFAULT_SCHEMA_VERSION};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A loaded, immutable model
#[derive(Debug)]
pub struct ModelArtifact {
    name: String,
    pipeline: Box<dyn Pipeline>,
    feature_schema: FeatureSchema,
    classes: Vec<String>,
    accuracy: f64,
    cv_mean: f64,
    cv_std: f64,
    source: Option<PathBuf>,
    checksum: Option<String>,
    loaded_at: i64,
}

impl ModelArtifact {
    /// Assemble an artifact from an in-memory pipeline
    pub fn new(
        name: impl Into<String>,
        pipeline: Box<dyn Pipeline>,
        feature_schema: FeatureSchema,
        classes: Vec<String>,
        accuracy: f64,
    ) -> Self {
        Self {
            name: name.into(),
            pipeline,
            feature_schema,
            classes,
            accuracy,
            cv_mean: 0.0,
            cv_std: 0.0,
            source: None,
            checksum: None,
            loaded_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pipeline(&self) -> &dyn Pipeline {
        self.pipeline.as_ref()
    }

    pub fn feature_schema(&self) -> &FeatureSchema {
        &self.feature_schema
    }

    pub fn feature_names(&self) -> &[String] {
        self.feature_schema.names()
    }

    /// Classes recorded by the training job. Predictions use the
    /// pipeline's own class order, which may differ.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn cv_mean(&self) -> f64 {
        self.cv_mean
    }

    pub fn cv_std(&self) -> f64 {
        self.cv_std
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// SHA-256 of the artifact file, hex encoded
    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    pub fn loaded_at(&self) -> i64 {
        self.loaded_at
    }
}

/// On-disk record. Only `pipeline` is required.
#[derive(Debug, Deserialize)]
struct ArtifactRecord {
    pipeline: PipelineSpec,
    #[serde(default, deserialize_with = "crate::pipeline::deserialize_nullable")]
    feature_names: Vec<String>,
    #[serde(default, deserialize_with = "crate::pipeline::deserialize_labels")]
    classes: Vec<String>,
    #[serde(default)]
    accuracy: Option<f64>,
    #[serde(default)]
    cv_mean: Option<f64>,
    #[serde(default)]
    cv_std: Option<f64>,
    #[serde(default)]
    schema_version: Option<u32>,
}

/// Load the artifact at `path` under the logical model `name`
pub fn load(path: &Path, name: &str) -> Result<ModelArtifact, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ArtifactError::Missing {
            path: path.to_path_buf(),
        },
        _ => ArtifactError::Corrupt {
            path: path.to_path_buf(),
            reason: format!("read failed: {}", e),
        },
    })?;

    let value = decode(&bytes).map_err(|reason| ArtifactError::Corrupt {
        path: path.to_path_buf(),
        reason,
    })?;

    let schema_invalid = |reason: String| ArtifactError::SchemaInvalid {
        path: path.to_path_buf(),
        reason,
    };

    match value.as_object() {
        None => return Err(schema_invalid("artifact is not a record".to_string())),
        Some(record) if !record.contains_key("pipeline") => {
            return Err(schema_invalid("record has no pipeline field".to_string()))
        }
        Some(_) => {}
    }

    let record: ArtifactRecord =
        serde_json::from_value(value).map_err(|e| schema_invalid(e.to_string()))?;

    let feature_schema = FeatureSchema::versioned(
        record.feature_names,
        record.schema_version.unwrap_or(DEFAULT_SCHEMA_VERSION),
    )
    .map_err(schema_invalid)?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let pipeline = record
        .pipeline
        .build(base_dir, feature_schema.len())
        .map_err(|e| match e {
            BuildError::Invalid(reason) => schema_invalid(reason),
            BuildError::Unreadable(reason) => ArtifactError::Corrupt {
                path: path.to_path_buf(),
                reason,
            },
        })?;

    if let Some(width) = pipeline.n_features() {
        if width != feature_schema.len() {
            // Kept loadable: every prediction will fail with a dimension
            // mismatch, which is the honest outcome for such an artifact.
            warn!(
                model = %name,
                schema_len = feature_schema.len(),
                pipeline_width = width,
                "Feature schema does not match pipeline input width"
            );
        }
    }

    Ok(ModelArtifact {
        name: name.to_string(),
        pipeline,
        feature_schema,
        classes: record.classes,
        accuracy: record.accuracy.unwrap_or(0.0),
        cv_mean: record.cv_mean.unwrap_or(0.0),
        cv_std: record.cv_std.unwrap_or(0.0),
        source: Some(path.to_path_buf()),
        checksum: Some(hex::encode(Sha256::digest(&bytes))),
        loaded_at: chrono::Utc::now().timestamp(),
    })
}

/// Strict UTF-8 JSON first, Latin-1 text second
fn decode(bytes: &[u8]) -> Result<Value, String> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => Ok(value),
        Err(strict) => {
            debug!(error = %strict, "Strict decode failed, retrying as Latin-1");
            let text: String = bytes.iter().map(|&b| b as char).collect();
            serde_json::from_str::<Value>(&text).map_err(|fallback| {
                format!("strict decode: {}; latin-1 decode: {}", strict, fallback)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &TempDir, file: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(file);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn learner_record() -> Value {
        json!({
            "pipeline": {
                "scaler": {"mean": [0.5, 10.0], "scale": [0.2, 5.0]},
                "classifier": {
                    "kind": "logistic_regression",
                    "classes": ["advanced", "moderate", "struggling"],
                    "coef": [[2.0, 0.0], [0.0, 0.0], [-2.0, 0.0]],
                    "intercept": [0.0, 0.0, 0.0]
                }
            },
            "feature_names": ["accuracy", "total_questions"],
            "classes": ["moderate", "advanced", "struggling"],
            "accuracy": 0.87,
            "cv_mean": 0.84,
            "cv_std": 0.03
        })
    }

    #[test]
    fn test_load_round_trips_metadata() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "learner.json", learner_record().to_string().as_bytes());

        let artifact = load(&path, "learner-classification").unwrap();
        assert_eq!(artifact.name(), "learner-classification");
        assert_eq!(artifact.feature_names(), ["accuracy", "total_questions"]);
        assert_eq!(artifact.classes(), ["moderate", "advanced", "struggling"]);
        assert_eq!(artifact.accuracy(), 0.87);
        assert_eq!(artifact.cv_mean(), 0.84);
        assert_eq!(artifact.feature_schema().version(), DEFAULT_SCHEMA_VERSION);
        assert_eq!(artifact.source(), Some(path.as_path()));
        assert_eq!(artifact.checksum().map(str::len), Some(64));
        assert_eq!(artifact.pipeline().classes().len(), 3);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("absent.json"), "m").unwrap_err();
        assert!(matches!(err, ArtifactError::Missing { .. }));
    }

    #[test]
    fn test_truncated_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let full = learner_record().to_string();
        let path = write(&dir, "cut.json", &full.as_bytes()[..full.len() / 2]);
        let err = load(&path, "m").unwrap_err();
        match err {
            ArtifactError::Corrupt { reason, .. } => {
                assert!(reason.contains("strict decode"));
                assert!(reason.contains("latin-1 decode"));
            }
            other => panic!("expected corrupt, got {:?}", other),
        }
    }

    #[test]
    fn test_latin1_fallback_recovers_non_utf8_bytes() {
        let dir = TempDir::new().unwrap();
        let mut bytes = br#"{"pipeline": {"classifier": {"kind": "logistic_regression"}}, "trainer": "Jos"#.to_vec();
        bytes.push(0xE9); // 'é' in Latin-1, invalid on its own in UTF-8
        bytes.extend_from_slice(br#""}"#);
        let path = write(&dir, "latin1.json", &bytes);

        let artifact = load(&path, "m").unwrap();
        assert!(artifact.feature_names().is_empty());
        assert_eq!(artifact.accuracy(), 0.0);
    }

    #[test]
    fn test_null_optional_fields_default_to_empty() {
        let dir = TempDir::new().unwrap();
        let record = json!({
            "pipeline": {"classifier": {"kind": "logistic_regression", "classes": null}},
            "feature_names": null,
            "classes": null,
            "accuracy": null,
            "cv_mean": null,
            "cv_std": null,
            "schema_version": null
        });
        let path = write(&dir, "nulls.json", record.to_string().as_bytes());

        let artifact = load(&path, "m").unwrap();
        assert!(artifact.feature_names().is_empty());
        assert!(artifact.classes().is_empty());
        assert!(artifact.pipeline().classes().is_empty());
        assert_eq!(artifact.accuracy(), 0.0);
        assert_eq!(artifact.feature_schema().version(), DEFAULT_SCHEMA_VERSION);
    }

    #[test]
    fn test_non_record_is_schema_invalid() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "list.json", b"[1, 2, 3]");
        assert!(matches!(load(&path, "m"), Err(ArtifactError::SchemaInvalid { .. })));
    }

    #[test]
    fn test_record_without_pipeline_is_schema_invalid() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "nopipe.json", br#"{"feature_names": ["a"], "accuracy": 0.9}"#);
        match load(&path, "m").unwrap_err() {
            ArtifactError::SchemaInvalid { reason, .. } => assert!(reason.contains("pipeline")),
            other => panic!("expected schema invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_pipeline_kind_is_schema_invalid() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "svm.json",
            br#"{"pipeline": {"classifier": {"kind": "svm"}}}"#,
        );
        assert!(matches!(load(&path, "m"), Err(ArtifactError::SchemaInvalid { .. })));
    }

    #[test]
    fn test_duplicate_feature_names_are_schema_invalid() {
        let dir = TempDir::new().unwrap();
        let mut record = learner_record();
        record["feature_names"] = json!(["accuracy", "accuracy"]);
        let path = write(&dir, "dup.json", record.to_string().as_bytes());
        assert!(matches!(load(&path, "m"), Err(ArtifactError::SchemaInvalid { .. })));
    }

    #[test]
    fn test_unreadable_onnx_graph_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let record = json!({
            "pipeline": {"classifier": {"kind": "onnx", "classes": ["0", "1"], "path": "gone.onnx"}},
            "feature_names": ["attempts"]
        });
        let path = write(&dir, "onnx.json", record.to_string().as_bytes());
        assert!(matches!(load(&path, "m"), Err(ArtifactError::Corrupt { .. })));
    }

    #[test]
    fn test_width_mismatch_still_loads() {
        let dir = TempDir::new().unwrap();
        let mut record = learner_record();
        record["feature_names"] = json!(["accuracy"]);
        let path = write(&dir, "narrow.json", record.to_string().as_bytes());
        let artifact = load(&path, "m").unwrap();
        assert_eq!(artifact.pipeline().n_features(), Some(2));
    }

    #[test]
    fn test_checksum_identifies_content() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.json", learner_record().to_string().as_bytes());
        let b = write(&dir, "b.json", learner_record().to_string().as_bytes());
        assert_eq!(
            load(&a, "m").unwrap().checksum(),
            load(&b, "m").unwrap().checksum()
        );
    }
}
