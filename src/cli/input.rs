//! Loading manuscripts and context files from disk.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::models::{Manuscript, ProjectContext};

/// Parse a YAML or JSON file. `.json` files are read as JSON, everything
/// else as YAML (a superset of JSON).
pub fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file '{}'", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON in '{}'", path.display()))
    } else {
        serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse YAML in '{}'", path.display()))
    }
}

/// Load a manuscript bundle.
pub fn load_manuscript(path: &Path) -> Result<Manuscript> {
    let manuscript: Manuscript = load_file(path)?;
    tracing::debug!(
        "Loaded manuscript {} ({} chapters, {} characters)",
        manuscript.project_id,
        manuscript.chapters.len(),
        manuscript.characters.len()
    );
    Ok(manuscript)
}

pub fn load_context(path: &Path) -> Result<ProjectContext> {
    load_file(path)
}
