//! Command-line interface for Tagdex.
//!
//! Provides the CLI commands for operating on the tag store: creating,
//! viewing and deleting tags, mirroring remote documentation, and
//! inspecting or pruning page sessions.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use tagdex::config::Config;
use tagdex::store::Store;

/// Individual CLI command implementations.
pub mod commands;

/// Opens the store a command should operate on: the `--store` flag
/// first, then the config file, then `~/.tagdex/store.json`.
pub fn open_store(store_override: Option<&Path>) -> Result<(Arc<Store>, Config)> {
    let config = Config::load()?;
    let path = config.resolve_store_path(store_override)?;
    let store = Store::open(&path)
        .with_context(|| format!("Failed to open store at {}", path.display()))?;
    Ok((Arc::new(store), config))
}
