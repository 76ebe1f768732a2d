//! Add command - create or overwrite a tag.

use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;

use crate::cli::open_store;
use tagdex::tags::TagRepository;

/// Arguments for the add command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    tagdex add install \"Run the installer, then restart.\"\n    \
    tagdex add faq --file docs/faq.md --author alice")]
pub struct Args {
    /// Tag name (the command word users will type)
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Tag content, given inline
    #[arg(value_name = "CONTENT")]
    pub content: Option<String>,

    /// Read the content from a file instead
    #[arg(long, value_name = "FILE", conflicts_with = "content")]
    pub file: Option<std::path::PathBuf>,

    /// Attribution recorded on the tag
    #[arg(long, default_value = "cli")]
    pub author: String,
}

/// Executes the add command.
///
/// Writes the tag, overwriting any previous entry with the same name.
pub fn run(args: Args, store_override: Option<&Path>) -> Result<()> {
    let content = match (&args.content, &args.file) {
        (Some(content), None) => content.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => bail!("Provide CONTENT inline or via --file"),
        (Some(_), Some(_)) => unreachable!("clap rejects content together with --file"),
    };

    let (store, _config) = open_store(store_override)?;
    let repo = TagRepository::new(store);

    let existed = repo.get(&args.name)?.is_some();
    let tag = repo.add(&args.name, &args.author, &args.author, &content, false)?;

    println!(
        "{} tag {} ({} page{})",
        if existed { "Replaced".yellow() } else { "Added".green() },
        args.name.cyan(),
        tag.pages.len(),
        if tag.pages.len() == 1 { "" } else { "s" }
    );

    Ok(())
}
