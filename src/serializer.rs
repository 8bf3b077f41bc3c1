//! Writes the API model as YAML or JSON.

use crate::engine::ApiModel;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes the API model to YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(model: &ApiModel) -> Result<String> {
    debug!("Serializing API model to YAML");
    serde_yaml::to_string(model).context("Failed to serialize API model to YAML")
}

/// Serializes the API model to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(model: &ApiModel) -> Result<String> {
    debug!("Serializing API model to JSON");
    serde_json::to_string_pretty(model).context("Failed to serialize API model to JSON")
}

/// Writes string content to a file, creating parent directories as needed.
///
/// Overwrites the file if it exists.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
