use anyhow::{Context, Result};
use rbac_harness_core::Topology;
use std::path::Path;

/// Reads a topology document from disk.
pub fn topology(path: &Path) -> Result<Topology> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read topology {}", path.display()))?;
    parse(path, &contents).with_context(|| format!("failed to parse topology {}", path.display()))
}

fn parse(path: &Path, contents: &str) -> Result<Topology> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml" | "yml") => Ok(serde_yaml::from_str(contents)?),
        _ => Ok(serde_json::from_str(contents)?),
    }
}
