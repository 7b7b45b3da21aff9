//! CLI command implementations

pub mod health;
pub mod inspect;
pub mod models;
pub mod recommend;

use anyhow::{Context, Result};
use std::io::Read;

/// Read a JSON document from a file path, or from stdin when the path is `-`
pub fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        return Ok(buffer);
    }
    std::fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))
}
