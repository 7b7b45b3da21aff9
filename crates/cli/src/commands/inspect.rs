//! Offline artifact inspection

use advisor_lib::artifact::{self, ModelArtifact};
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use crate::output::{format_percent, print_heading, print_json, print_list, OutputFormat};

/// What an artifact file contains
#[derive(Debug, Serialize)]
pub struct ArtifactSummary {
    pub name: String,
    pub path: String,
    pub checksum: Option<String>,
    pub schema_version: u32,
    pub feature_names: Vec<String>,
    pub pipeline_classes: Vec<String>,
    pub recorded_classes: Vec<String>,
    pub input_width: Option<usize>,
    pub accuracy: f64,
    pub cv_mean: f64,
    pub cv_std: f64,
    pub loaded_at: String,
}

impl ArtifactSummary {
    pub fn describe(artifact: &ModelArtifact) -> Self {
        let loaded_at = chrono::DateTime::from_timestamp(artifact.loaded_at(), 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        Self {
            name: artifact.name().to_string(),
            path: artifact
                .source()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            checksum: artifact.checksum().map(str::to_string),
            schema_version: artifact.feature_schema().version(),
            feature_names: artifact.feature_names().to_vec(),
            pipeline_classes: artifact.pipeline().classes().to_vec(),
            recorded_classes: artifact.classes().to_vec(),
            input_width: artifact.pipeline().n_features(),
            accuracy: artifact.accuracy(),
            cv_mean: artifact.cv_mean(),
            cv_std: artifact.cv_std(),
            loaded_at,
        }
    }

    /// Whether the pipeline's input width agrees with the feature schema
    pub fn width_matches(&self) -> bool {
        self.input_width
            .map_or(true, |width| width == self.feature_names.len())
    }
}

/// Load an artifact with the core reader and print its metadata
pub fn inspect(path: &Path, name: Option<String>, format: OutputFormat) -> Result<()> {
    let name = name.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let artifact = artifact::load(path, &name)
        .with_context(|| format!("Failed to load artifact {}", path.display()))?;
    let summary = ArtifactSummary::describe(&artifact);

    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Table => {
            println!("{} {}", "Artifact".bold(), summary.name);
            println!("  Path:       {}", summary.path);
            println!("  SHA-256:    {}", summary.checksum.as_deref().unwrap_or("-"));
            println!("  Loaded at:  {}", summary.loaded_at);
            println!(
                "  Accuracy:   {} (cv {:.3} ± {:.3})",
                format_percent(summary.accuracy),
                summary.cv_mean,
                summary.cv_std
            );
            println!("  Schema:     v{}", summary.schema_version);
            if !summary.width_matches() {
                println!(
                    "  {} pipeline expects {} features, schema lists {}",
                    "⚠".yellow().bold(),
                    summary.input_width.unwrap_or_default(),
                    summary.feature_names.len()
                );
            }

            print_heading("Features");
            print_list(&summary.feature_names, "none recorded");
            print_heading("Classes");
            print_list(&summary.pipeline_classes, "none (unfitted)");
        }
    }

    Ok(())
}
