//! Configuration management.
//!
//! Settings live in `~/.tagdex/config.json`; a missing file means
//! defaults. The loaded config is passed explicitly to whatever needs
//! it; there is no ambient global state.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ingest::RetryPolicy;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Override for the store document path (defaults to
    /// `~/.tagdex/store.json`).
    pub store_path: Option<PathBuf>,

    /// Command prefixes the dispatcher answers to.
    pub prefixes: Vec<String>,

    /// Where the documentation mirror comes from.
    pub source: SourceConfig,

    /// Page sessions idle longer than this are eligible for pruning.
    pub session_ttl_minutes: i64,
}

/// Documentation source settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Contents-API root of the documentation repository.
    pub api_url: String,

    /// Logical path under the API root to mirror.
    pub docs_path: String,

    /// Retry behavior for the bulk load.
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: None,
            prefixes: vec!["!".to_string()],
            source: SourceConfig::default(),
            session_ttl_minutes: 24 * 60,
        }
    }
}

impl Config {
    /// Loads the config file, or defaults if it does not exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Path of the config file (`~/.tagdex/config.json`).
    pub fn config_path() -> Result<PathBuf> {
        Ok(tagdex_dir()?.join("config.json"))
    }

    /// Resolves the store document path: explicit override, then config,
    /// then the default location.
    pub fn resolve_store_path(&self, override_path: Option<&std::path::Path>) -> Result<PathBuf> {
        if let Some(path) = override_path {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = &self.store_path {
            return Ok(path.clone());
        }
        default_store_path()
    }
}

/// Default store document location (`~/.tagdex/store.json`).
pub fn default_store_path() -> Result<PathBuf> {
    Ok(tagdex_dir()?.join("store.json"))
}

fn tagdex_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Could not find home directory")?
        .join(".tagdex");

    std::fs::create_dir_all(&dir)
        .context("Failed to create ~/.tagdex directory")?;
    Ok(dir)
}
