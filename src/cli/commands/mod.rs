//! CLI commands for Tagdex.
//!
//! Each submodule implements a single CLI command with its argument
//! parsing and execution logic.

/// Create or overwrite a tag.
pub mod add;

/// Delete a tag.
pub mod delete;

/// Mirror remote documentation into the store.
pub mod ingest;

/// List or prune page sessions.
pub mod sessions;

/// Render a tag page the way the bot would.
pub mod show;

/// List stored tags.
pub mod tags;
