//! Show command - render a tag page the way the bot would.

use std::path::Path;

use anyhow::{bail, Result};
use colored::Colorize;

use crate::cli::open_store;
use tagdex::paginate::render;
use tagdex::tags::TagRepository;

/// Arguments for the show command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    tagdex show install            Render the first page\n    \
    tagdex show install --page 3   Render the third page\n    \
    tagdex show install --raw      Print the stored content unpaginated")]
pub struct Args {
    /// Tag name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Page to render (1-based)
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Print the raw stored content instead of a rendered page
    #[arg(long)]
    pub raw: bool,
}

/// Executes the show command.
pub fn run(args: Args, store_override: Option<&Path>) -> Result<()> {
    let (store, _config) = open_store(store_override)?;
    let repo = TagRepository::new(store);

    let Some(tag) = repo.get(&args.name)? else {
        bail!("No tag named '{}'. Run 'tagdex tags' to list tags.", args.name);
    };

    if args.raw {
        println!("{}", tag.content);
        return Ok(());
    }

    if args.page == 0 || args.page > tag.pages.len() {
        bail!(
            "Tag '{}' has {} page(s); --page must be between 1 and {}",
            args.name,
            tag.pages.len(),
            tag.pages.len()
        );
    }

    let rendered = render(&tag, args.page - 1);

    println!(
        "{} {}{}",
        args.name.bold().cyan(),
        format!("(page {}/{})", rendered.page, rendered.pages).dimmed(),
        if tag.from_source { " [mirrored]".yellow() } else { "".normal() }
    );
    println!("  {}  {}", "By:".dimmed(), tag.user_tag);
    println!("  {}  {}", "On:".dimmed(), tag.date.format("%Y-%m-%d %H:%M:%S"));
    println!();
    println!("{}", rendered.content);

    Ok(())
}
