//! Delete command - remove a tag by name.
//!
//! Live page sessions that reference the tag are left in place; they
//! report the page as gone on the next navigation and can be swept with
//! 'tagdex sessions --prune'.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Result};
use colored::Colorize;

use crate::cli::open_store;
use tagdex::tags::TagRepository;

/// Arguments for the delete command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    tagdex delete install          Delete (prompts for confirmation)\n    \
    tagdex delete install --force  Delete without confirmation")]
pub struct Args {
    /// Tag name to delete
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub force: bool,
}

/// Executes the delete command.
pub fn run(args: Args, store_override: Option<&Path>) -> Result<()> {
    let (store, _config) = open_store(store_override)?;
    let repo = TagRepository::new(store);

    let Some(tag) = repo.get(&args.name)? else {
        bail!("No tag named '{}'. Run 'tagdex tags' to list tags.", args.name);
    };

    if !args.force {
        print!(
            "Delete tag {} ({} page{})? [y/N] ",
            args.name.cyan(),
            tag.pages.len(),
            if tag.pages.len() == 1 { "" } else { "s" }
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("{}", "Cancelled".dimmed());
            return Ok(());
        }
    }

    repo.delete(&args.name)?;
    println!("{} tag {}", "Deleted".green(), args.name.cyan());

    Ok(())
}
