use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::commands;

/// The main CLI command line interface.
#[derive(Parser)]
#[command(name = "tagdex")]
#[command(version)]
#[command(about = "Paginated documentation tags for chat platforms")]
#[command(long_about = "Tagdex stores named documentation entries (\"tags\") split into\n\
    fixed-size pages, and tracks per-message pagination state for chat bots.\n\n\
    The CLI operates on the same store document a bot process serves from:\n\
    tags can be written by hand or mirrored from a remote documentation\n\
    repository, and live pagination sessions can be inspected and pruned.")]
#[command(after_help = "EXAMPLES:\n    \
    tagdex add install \"Run the installer.\"   Create a tag\n    \
    tagdex tags                               List stored tags\n    \
    tagdex show install --page 2              Render a page\n    \
    tagdex ingest                             Mirror the configured doc source\n    \
    tagdex sessions --prune                   Evict stale page sessions\n\n\
    For more information about a command, run 'tagdex <command> --help'.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Operate on this store document instead of the configured one
    #[arg(long, global = true, value_name = "FILE")]
    store: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Create or overwrite a tag
    #[command(long_about = "Stores a tag under the given name, splitting its content into\n\
        fixed-size pages. An existing tag with the same name is replaced\n\
        and its pagination recomputed.")]
    Add(commands::add::Args),

    /// Render a tag page the way the bot would
    #[command(long_about = "Looks up a tag and renders one of its pages with the same\n\
        footer text (ellipsis, attribution, navigation hint) a bot\n\
        message would carry.")]
    Show(commands::show::Args),

    /// List stored tags
    Tags(commands::tags::Args),

    /// Delete a tag
    #[command(long_about = "Removes a tag by name. Page sessions still pointing at it\n\
        report the page as gone on their next navigation.")]
    Delete(commands::delete::Args),

    /// Mirror remote documentation into the store
    #[command(long_about = "Fetches every Markdown document under the configured contents-API\n\
        path, strips heading markers, and stores each as a tag flagged as\n\
        mirrored. Transient fetch failures are retried before the load fails.")]
    Ingest(commands::ingest::Args),

    /// List or prune page sessions
    #[command(long_about = "Lists live pagination sessions, or with --prune evicts sessions\n\
        that have been idle longer than the configured TTL.")]
    Sessions(commands::sessions::Args),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "tagdex=debug"
    } else {
        "tagdex=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let store = cli.store.as_deref();
    match cli.command {
        Commands::Add(args) => commands::add::run(args, store),
        Commands::Show(args) => commands::show::run(args, store),
        Commands::Tags(args) => commands::tags::run(args, store),
        Commands::Delete(args) => commands::delete::run(args, store),
        Commands::Ingest(args) => commands::ingest::run(args, store),
        Commands::Sessions(args) => commands::sessions::run(args, store),
    }
}
