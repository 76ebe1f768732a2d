//! Sessions command - inspect or prune page sessions.
//!
//! Page sessions never expire on their own; this command is the
//! operator's sweep.

use std::path::Path;

use anyhow::Result;
use chrono::Duration;
use colored::Colorize;

use crate::cli::open_store;
use tagdex::pages::{PageTracker, RenderPhase};

/// Arguments for the sessions command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    tagdex sessions                      List live page sessions\n    \
    tagdex sessions --prune              Evict sessions idle past the configured TTL\n    \
    tagdex sessions --prune --max-age-minutes 60")]
pub struct Args {
    /// Evict stale sessions instead of listing
    #[arg(long)]
    pub prune: bool,

    /// Idle age (minutes) past which a session is stale
    /// (defaults to session_ttl_minutes from the config file)
    #[arg(long, value_name = "MINUTES", requires = "prune")]
    pub max_age_minutes: Option<i64>,
}

/// Executes the sessions command.
pub fn run(args: Args, store_override: Option<&Path>) -> Result<()> {
    let (store, config) = open_store(store_override)?;
    let tracker = PageTracker::new(store);

    if args.prune {
        let minutes = args.max_age_minutes.unwrap_or(config.session_ttl_minutes);
        let pruned = tracker.prune_stale(Duration::minutes(minutes))?;
        println!(
            "{} {} session(s) idle longer than {} minute(s)",
            "Pruned".green(),
            pruned,
            minutes
        );
        return Ok(());
    }

    let all = tracker.all()?;
    if all.is_empty() {
        println!("{}", "No live page sessions.".dimmed());
        return Ok(());
    }

    println!(
        "{:<20} {:<20} {:>9}  {:<19} {}",
        "MESSAGE".bold(),
        "TAG".bold(),
        "PAGE".bold(),
        "LAST ACTIVITY".bold(),
        "PHASE".bold()
    );
    for (message_id, session) in all {
        let phase = match session.phase {
            RenderPhase::Pending => "pending".yellow(),
            RenderPhase::Rendered { .. } => "rendered".normal(),
        };
        println!(
            "{:<20} {:<20} {:>5}/{:<3}  {:<19} {}",
            message_id.cyan(),
            session.tag,
            session.page + 1,
            session.pages,
            session.updated_at.format("%Y-%m-%d %H:%M:%S"),
            phase
        );
    }

    Ok(())
}
