//! Command line entry point for the skill ledger
//!
//! Loads the ledger from its JSON snapshot, applies one operation and writes
//! the snapshot back when the operation changed anything.

use anyhow::Result;
use clap::{Parser, Subcommand};
use skill_ledger::config::AppConfig;
use skill_ledger::store::{load_snapshot, save_snapshot, InMemoryLedgerStore};
use skill_ledger::types::{Match, NewMatch, RatingKind};
use skill_ledger::{Ledger, LedgerStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Skill Ledger - Elo and TrueSkill ratings from approved match history
#[derive(Parser)]
#[command(
    name = "skill-ledger",
    version,
    about = "Track matches and derive Elo and TrueSkill ratings from approved match history"
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Snapshot path override
    #[arg(short, long, value_name = "FILE", help = "Override the ledger snapshot path")]
    snapshot: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a new user
    AddUser { shortname: String, nickname: String },

    /// Change a user's shortname and nickname
    UpdateUser {
        /// Current shortname
        user: String,
        #[arg(long)]
        shortname: String,
        #[arg(long)]
        nickname: String,
    },

    /// Record a match
    AddMatch {
        #[arg(long = "winner", required = true, value_name = "SHORTNAME")]
        winners: Vec<String>,
        #[arg(long = "loser", required = true, value_name = "SHORTNAME")]
        losers: Vec<String>,
        #[arg(long)]
        winner_score: u32,
        #[arg(long)]
        loser_score: u32,
        #[arg(long, default_value_t = 30.0)]
        importance: f64,
        /// Shortname of the user recording the match
        #[arg(long)]
        creator: Option<String>,
    },

    /// Approve a match on behalf of a participant's team
    Approve { match_id: Uuid, user: String },

    /// Delete a match and rebuild ratings
    DeleteMatch { match_id: Uuid },

    /// Rebuild every rating from match history
    Recompute,

    /// Show users ranked by Elo
    Leaderboard,

    /// Show a user's rating history
    History {
        user: String,
        #[arg(long, default_value = "elo")]
        kind: RatingKind,
    },

    /// Show match details
    ShowMatch { match_id: Uuid },

    /// List matches waiting for a user's approval
    Pending { user: String },

    /// Print metrics for this run in Prometheus text format
    Metrics,
}

impl Command {
    fn mutates(&self) -> bool {
        matches!(
            self,
            Command::AddUser { .. }
                | Command::UpdateUser { .. }
                | Command::AddMatch { .. }
                | Command::Approve { .. }
                | Command::DeleteMatch { .. }
                | Command::Recompute
        )
    }
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from file/environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(snapshot) = &args.snapshot {
        config.storage.snapshot_path = snapshot.clone();
    }

    Ok(config)
}

fn shortnames(ledger: &Ledger, ids: &[Uuid]) -> Result<Vec<String>> {
    let mut names = Vec::with_capacity(ids.len());
    for id in ids {
        let name = ledger
            .store()
            .get_user(id)?
            .map(|user| user.shortname)
            .unwrap_or_else(|| id.to_string());
        names.push(name);
    }
    Ok(names)
}

fn user_ids(ledger: &Ledger, shortnames: &[String]) -> Result<Vec<Uuid>> {
    let mut ids = Vec::with_capacity(shortnames.len());
    for name in shortnames {
        ids.push(ledger.user_by_shortname(name)?.id);
    }
    Ok(ids)
}

fn print_match(ledger: &Ledger, game: &Match) -> Result<()> {
    println!("Match {}", game.id);
    println!("  Played:     {}", game.timestamp);
    println!(
        "  Result:     {} {} - {} {}",
        shortnames(ledger, &game.winners)?.join(", "),
        game.winner_score,
        game.loser_score,
        shortnames(ledger, &game.losers)?.join(", ")
    );
    println!("  Importance: {}", game.importance);
    println!("  Status:     {}", game.approval);
    Ok(())
}

fn run(ledger: &Ledger, command: Command) -> Result<()> {
    match command {
        Command::AddUser {
            shortname,
            nickname,
        } => {
            let user = ledger.create_user(&shortname, &nickname)?;
            println!("Created {} ({}) with id {}", user.shortname, user.nickname, user.id);
        }
        Command::UpdateUser {
            user,
            shortname,
            nickname,
        } => {
            let user = ledger.user_by_shortname(&user)?;
            let user = ledger.update_user(&user.id, &shortname, &nickname)?;
            println!("Updated {} ({})", user.shortname, user.nickname);
        }
        Command::AddMatch {
            winners,
            losers,
            winner_score,
            loser_score,
            importance,
            creator,
        } => {
            let creator = match creator {
                Some(name) => Some(ledger.user_by_shortname(&name)?.id),
                None => None,
            };

            let game = ledger.create_match(
                NewMatch {
                    winners: user_ids(ledger, &winners)?,
                    losers: user_ids(ledger, &losers)?,
                    winner_score,
                    loser_score,
                    importance,
                    timestamp: None,
                },
                creator,
            )?;
            print_match(ledger, &game)?;
        }
        Command::Approve { match_id, user } => {
            let user = ledger.user_by_shortname(&user)?;
            let outcome = ledger.approve_match(&match_id, &user.id)?;
            println!("Match {} is now {}", match_id, outcome.game.approval);
            if let Some(report) = outcome.replay {
                println!("Replayed {} matches", report.matches_replayed);
            }
        }
        Command::DeleteMatch { match_id } => {
            let report = ledger.delete_match(&match_id)?;
            println!(
                "Deleted match {}; replayed {} matches",
                match_id, report.matches_replayed
            );
        }
        Command::Recompute => {
            let report = ledger.recompute_all()?;
            println!(
                "Replayed {} matches for {} users ({} observations)",
                report.matches_replayed, report.users_seeded, report.observations
            );
        }
        Command::Leaderboard => {
            println!(
                "{:<4} {:<10} {:<20} {:>8} {:>8} {:>8}",
                "#", "Short", "Nickname", "Elo", "TS mu", "TS sigma"
            );
            for (rank, entry) in ledger.leaderboard()?.iter().enumerate() {
                println!(
                    "{:<4} {:<10} {:<20} {:>8.1} {:>8.2} {:>8.3}",
                    rank + 1,
                    entry.user.shortname,
                    entry.user.nickname,
                    entry.elo,
                    entry.trueskill.mean,
                    entry.trueskill.deviation
                );
            }
        }
        Command::History { user, kind } => {
            let user = ledger.user_by_shortname(&user)?;
            for observation in ledger.rating_history(&user.id, kind)? {
                let source = observation
                    .source_match
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "seed".to_string());
                println!("{}  {:>10.3}  {}", observation.timestamp, observation.value, source);
            }
        }
        Command::ShowMatch { match_id } => {
            let game = ledger.match_details(&match_id)?;
            print_match(ledger, &game)?;
        }
        Command::Pending { user } => {
            let user = ledger.user_by_shortname(&user)?;
            for game in ledger.pending_approvals(&user.id)? {
                print_match(ledger, &game)?;
            }
        }
        Command::Metrics => {
            print!("{}", ledger.metrics().encode_text()?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let snapshot_path = config.storage.snapshot_path.clone();
    let store = match load_snapshot(&snapshot_path)? {
        Some(snapshot) => Arc::new(InMemoryLedgerStore::from_snapshot(snapshot)),
        None => {
            info!("No snapshot at {}, starting empty", snapshot_path.display());
            Arc::new(InMemoryLedgerStore::new())
        }
    };

    let ledger = Ledger::new(store.clone(), &config.rating)?;
    ledger.metrics().set_user_count(store.list_users()?.len());

    let mut dirty = args.command.mutates();
    if config.storage.recompute_on_load {
        ledger.recompute_all()?;
        dirty = true;
    }

    if let Err(e) = run(&ledger, args.command) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if dirty {
        save_snapshot(&snapshot_path, &store.to_snapshot()?)?;
    }

    Ok(())
}
