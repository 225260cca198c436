//! Configuration loading for covgap
//!
//! Settings live in `.covgaprc.json`, found in the working directory or any
//! parent. CLI flags always win over the config file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = ".covgaprc.json";

/// Persistent defaults for the CLI surface.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Root directory for resolving source paths from the report
    pub source_root: Option<PathBuf>,
    /// Keep suggestions at or above this priority
    pub priority: Option<String>,
    /// Gate threshold: none, critical, high, any
    pub fail_on: Option<String>,
    /// Cap the number of reported suggestions
    pub limit: Option<usize>,
}

impl Config {
    /// Overlay CLI flags on top of the loaded config.
    pub fn merge_with_cli(
        mut self,
        source_root: Option<PathBuf>,
        priority: Option<String>,
        fail_on: Option<String>,
        limit: Option<usize>,
    ) -> Self {
        if source_root.is_some() {
            self.source_root = source_root;
        }
        if priority.is_some() {
            self.priority = priority;
        }
        if fail_on.is_some() {
            self.fail_on = fail_on;
        }
        if limit.is_some() {
            self.limit = limit;
        }
        self
    }
}

/// Find and load the config file. Searches `work_dir` then its parents;
/// a missing config is not an error, an unreadable or invalid one is.
pub fn load_config(work_dir: &Path, custom_path: Option<&Path>) -> Result<Config> {
    let path = if let Some(p) = custom_path {
        let path = if p.is_absolute() {
            p.to_path_buf()
        } else {
            work_dir.join(p)
        };
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        Some(path)
    } else {
        find_config_in_parents(work_dir)
    };

    match path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON in config: {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

/// Search for .covgaprc.json in directory and its parents
fn find_config_in_parents(mut dir: &Path) -> Option<PathBuf> {
    loop {
        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}
