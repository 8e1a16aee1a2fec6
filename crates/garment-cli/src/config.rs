use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Batch sampling settings, read from YAML (or JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    /// Template specification to sample from.
    pub template: PathBuf,
    /// Directory receiving one specification per sample.
    pub output: PathBuf,
    pub size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Sample name prefix; defaults to the template name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_to_subfolder")]
    pub to_subfolder: bool,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_to_subfolder() -> bool {
    true
}

fn default_workers() -> usize {
    4
}

impl DatasetConfig {
    /// Read a config file. Relative paths inside it are taken relative to
    /// the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dataset config {}", path.display()))?;
        let mut config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse dataset config {}", path.display()))?;

        if config.workers == 0 {
            bail!("dataset config {}: workers must be at least 1", path.display());
        }
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.template = base.join(&config.template);
        config.output = base.join(&config.output);
        Ok(config)
    }
}
