//! Tags command - list every stored tag.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::cli::open_store;
use tagdex::tags::TagRepository;

/// Arguments for the tags command.
#[derive(clap::Args)]
pub struct Args {
    /// Only list tags mirrored from the documentation source
    #[arg(long)]
    pub mirrored: bool,
}

/// Executes the tags command.
pub fn run(args: Args, store_override: Option<&Path>) -> Result<()> {
    let (store, _config) = open_store(store_override)?;
    let repo = TagRepository::new(store);

    let all = repo.all()?;
    let listed: Vec<_> = all
        .iter()
        .filter(|(_, tag)| !args.mirrored || tag.from_source)
        .collect();

    if listed.is_empty() {
        println!("{}", "No tags stored yet. Run 'tagdex add' or 'tagdex ingest'.".dimmed());
        return Ok(());
    }

    println!(
        "{:<24} {:>5}  {:<19} {}",
        "NAME".bold(),
        "PAGES".bold(),
        "DATE".bold(),
        "SOURCE".bold()
    );
    for (name, tag) in listed {
        println!(
            "{:<24} {:>5}  {:<19} {}",
            name.cyan(),
            tag.pages.len(),
            tag.date.format("%Y-%m-%d %H:%M:%S"),
            if tag.from_source {
                "mirror".yellow()
            } else {
                tag.user_tag.normal()
            }
        );
    }

    Ok(())
}
