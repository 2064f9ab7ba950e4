//! Command-line front end for the Dayscore journal.
//!
//! # Responsibility
//! - Parse commands and resolve the acting user into a `Session`.
//! - Delegate every operation to `dayscore_core` services.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dayscore_core::config::LOG_LEVEL_VAR;
use dayscore_core::{init_logging, CoreConfig, LogLevel, LogTarget};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "dayscore")]
#[command(about = "Daily satisfaction journal", long_about = None, version)]
struct Cli {
    /// SQLite database file (overrides DAYSCORE_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Email of the acting user.
    #[arg(long, short, global = true)]
    user: Option<String>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Log level (overrides DAYSCORE_LOG_LEVEL).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Record the satisfaction level and notes for a day
    Log(EntryArgs),
    /// Show one record
    Show { id: i64 },
    /// Edit a record; omitted fields keep their current value
    Edit {
        id: i64,
        #[command(flatten)]
        entry: EditArgs,
    },
    /// Delete a record
    Delete { id: i64 },
    /// List records, newest first
    List {
        /// Inclusive start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Inclusive end date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Home summary: average, yesterday and streak
    Home {
        /// Evaluate as of this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },
    /// Leaderboard by cumulative satisfaction points
    Ranking,
    /// Print the satisfaction scale
    Levels,
    /// Import records from a JSON listing (paginated object or plain array)
    Import { file: PathBuf },
}

#[derive(Subcommand)]
enum UserAction {
    /// Register a user
    Add { username: String, email: String },
    /// List registered users
    List,
}

#[derive(Args)]
struct EntryArgs {
    /// Day to record (YYYY-MM-DD); defaults to today
    #[arg(long)]
    date: Option<String>,
    /// Satisfaction level, 0 (worst) to 5 (best)
    #[arg(long)]
    level: u8,
    /// Things done
    #[arg(long, default_value = "")]
    done: String,
    /// Things not done
    #[arg(long, default_value = "")]
    not_done: String,
}

#[derive(Args)]
struct EditArgs {
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    level: Option<u8>,
    #[arg(long)]
    done: Option<String>,
    #[arg(long)]
    not_done: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CoreConfig::from_env().context("failed to read configuration")?;

    if let Some(db) = cli.db.clone() {
        config.db_path = db;
    }
    match cli.log_level.as_deref() {
        Some(level) => config.log_level = level.parse::<LogLevel>()?,
        None if config.log_target == LogTarget::Stderr
            && std::env::var_os(LOG_LEVEL_VAR).is_none() =>
        {
            config.log_level = LogLevel::Warn;
        }
        None => {}
    }
    init_logging(config.log_level, config.log_target.clone())
        .context("failed to initialize logging")?;

    commands::run(&cli, &config)
}
