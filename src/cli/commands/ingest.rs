//! Ingest command - mirror remote documentation into the tag store.
//!
//! This is the same bulk load a bot process runs at startup; a failed
//! load (after retries) exits non-zero and writes nothing.

use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;

use crate::cli::open_store;
use tagdex::ingest::{bulk_load, HttpDocSource};
use tagdex::tags::TagRepository;

/// Arguments for the ingest command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    tagdex ingest                  Mirror the configured source\n    \
    tagdex ingest --url https://api.example.com/repos/acme/docs/contents --path guides")]
pub struct Args {
    /// Contents-API root of the documentation repository
    /// (defaults to source.api_url from the config file)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Logical path to mirror (defaults to source.docs_path)
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,
}

/// Executes the ingest command.
pub fn run(args: Args, store_override: Option<&Path>) -> Result<()> {
    let (store, config) = open_store(store_override)?;
    let repo = TagRepository::new(store);

    let api_url = args.url.unwrap_or_else(|| config.source.api_url.clone());
    if api_url.is_empty() {
        bail!("No documentation source configured. Pass --url or set source.api_url in the config file.");
    }
    let docs_path = args.path.unwrap_or_else(|| config.source.docs_path.clone());

    let source = HttpDocSource::new(&api_url)?;
    let loaded = bulk_load(&repo, &source, &docs_path, &config.source.retry)
        .context("Documentation mirror failed")?;

    println!("{} {} tag(s) from {}", "Mirrored".green(), loaded, api_url.cyan());
    Ok(())
}
