//! Service configuration

use advisor_lib::registry::DEFAULT_ARTIFACTS_DIR;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AdvisorConfig {
    /// Name reported in structured log events
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding the trained model artifacts
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Log filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_node_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACTS_DIR)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            node_name: default_node_name(),
            api_port: default_api_port(),
            artifacts_dir: default_artifacts_dir(),
            log_level: default_log_level(),
        }
    }
}

impl AdvisorConfig {
    /// Load configuration from an optional `advisor.toml` and `ADVISOR_*` variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("advisor").required(false))
            .add_source(config::Environment::with_prefix("ADVISOR"))
            .build()
            .context("failed to read configuration")?;

        config
            .try_deserialize()
            .context("invalid advisor configuration")
    }

    /// Load configuration from an explicit file, environment still overriding it
    pub fn load_file(path: &Path) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("ADVISOR"))
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        config
            .try_deserialize()
            .context("invalid advisor configuration")
    }
}
