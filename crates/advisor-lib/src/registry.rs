//! Model registry
//!
//! Loads the fixed set of models once and serves them read-only. A model
//! that fails to load is recorded in the load report and simply absent from
//! the registry; the remaining models stay usable.

use crate::artifact::{self, ModelArtifact};
use crate::error::ArtifactError;
use crate::models::ModelKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::info;

/// Default location of the artifacts written by the training job
pub const DEFAULT_ARTIFACTS_DIR: &str = "models/artifacts";

/// Where the registry looks for artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub artifacts_dir: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ARTIFACTS_DIR)
    }
}

impl RegistryConfig {
    pub fn new(artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
        }
    }

    pub fn artifact_path(&self, kind: ModelKind) -> PathBuf {
        self.artifacts_dir.join(kind.artifact_file())
    }
}

/// Outcome of loading one model
#[derive(Debug, Clone)]
pub enum LoadStatus {
    Loaded,
    Failed(ArtifactError),
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub name: String,
    pub path: Option<PathBuf>,
    pub status: LoadStatus,
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self.status, LoadStatus::Loaded)
    }

    pub fn error(&self) -> Option<&ArtifactError> {
        match &self.status {
            LoadStatus::Loaded => None,
            LoadStatus::Failed(e) => Some(e),
        }
    }
}

/// Operator-facing summary of one known model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub loaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_count: Option<usize>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Loaded models keyed by logical name
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, Arc<ModelArtifact>>,
    report: Vec<LoadOutcome>,
}

impl ModelRegistry {
    /// Load every known model from `config.artifacts_dir`.
    ///
    /// Never fails as a whole: each model that cannot be loaded is recorded
    /// in the load report and left out. Per-model events are the caller's
    /// to emit from that report.
    pub fn load(config: &RegistryConfig) -> Self {
        let mut registry = Self::default();

        for kind in ModelKind::ALL {
            let path = config.artifact_path(kind);
            let status = match artifact::load(&path, kind.name()) {
                Ok(artifact) => {
                    registry
                        .models
                        .insert(kind.name().to_string(), Arc::new(artifact));
                    LoadStatus::Loaded
                }
                Err(e) => LoadStatus::Failed(e),
            };
            registry.report.push(LoadOutcome {
                name: kind.name().to_string(),
                path: Some(path),
                status,
            });
        }

        info!(
            loaded = registry.len(),
            failed = registry.failure_count(),
            "Model registry initialized"
        );
        registry
    }

    /// Registry holding already-built artifacts, keyed by their names
    pub fn from_artifacts(artifacts: impl IntoIterator<Item = ModelArtifact>) -> Self {
        let mut registry = Self::default();
        for artifact in artifacts {
            let name = artifact.name().to_string();
            registry.report.retain(|o| o.name != name);
            registry.report.push(LoadOutcome {
                name: name.clone(),
                path: artifact.source().map(Path::to_path_buf),
                status: LoadStatus::Loaded,
            });
            registry.models.insert(name, Arc::new(artifact));
        }
        registry
    }

    pub fn get(&self, name: &str) -> Option<&ModelArtifact> {
        self.models.get(name).map(Arc::as_ref)
    }

    pub fn get_kind(&self, kind: ModelKind) -> Option<&ModelArtifact> {
        self.get(kind.name())
    }

    /// Shared handle to an artifact, for callers that outlive the borrow
    pub fn get_shared(&self, name: &str) -> Option<Arc<ModelArtifact>> {
        self.models.get(name).cloned()
    }

    pub fn contains(&self, kind: ModelKind) -> bool {
        self.models.contains_key(kind.name())
    }

    pub fn available_names(&self) -> BTreeSet<String> {
        self.models.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn load_report(&self) -> &[LoadOutcome] {
        &self.report
    }

    pub fn failure_count(&self) -> usize {
        self.report.iter().filter(|o| !o.is_loaded()).count()
    }

    pub fn model_info(&self) -> Vec<ModelInfo> {
        self.report
            .iter()
            .map(|outcome| {
                let path = outcome.path.as_ref().map(|p| p.display().to_string());
                match self.get(&outcome.name) {
                    Some(artifact) if outcome.is_loaded() => ModelInfo {
                        name: outcome.name.clone(),
                        loaded: true,
                        path,
                        accuracy: Some(artifact.accuracy()),
                        feature_count: Some(artifact.feature_schema().len()),
                        classes: artifact.pipeline().classes().to_vec(),
                        checksum: artifact.checksum().map(str::to_string),
                        error: None,
                    },
                    _ => ModelInfo {
                        name: outcome.name.clone(),
                        loaded: false,
                        path,
                        accuracy: None,
                        feature_count: None,
                        classes: Vec::new(),
                        checksum: None,
                        error: outcome.error().map(ToString::to_string),
                    },
                }
            })
            .collect()
    }
}

/// Registry initialized on first use.
///
/// Concurrent first callers block until the single load completes and then
/// all observe the same registry.
#[derive(Debug)]
pub struct SharedRegistry {
    config: RegistryConfig,
    cell: OnceLock<Arc<ModelRegistry>>,
}

impl SharedRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            cell: OnceLock::new(),
        }
    }

    pub fn get(&self) -> Arc<ModelRegistry> {
        self.cell
            .get_or_init(|| Arc::new(ModelRegistry::load(&self.config)))
            .clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}
