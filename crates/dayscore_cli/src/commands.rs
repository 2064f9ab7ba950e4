//! Command handlers.
//!
//! Each handler opens its own repositories over one shared connection and
//! prints either text or JSON.

use crate::{Cli, Commands, EditArgs, EntryArgs, UserAction};
use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use dayscore_core::db::open_db;
use dayscore_core::model::satisfaction::display;
use dayscore_core::{
    CoreConfig, ImportedRecord, Listing, MemoPayload, NewUser, Page, RecordEntry,
    RecordPageRequest, RecordService, SatisfactionLevel, SaveOutcome, Session,
    SqliteRecordRepository, SqliteUserRepository, StatsService, UserRepository,
};
use log::debug;
use rusqlite::Connection;
use serde::Serialize;

pub fn run(cli: &Cli, config: &CoreConfig) -> Result<()> {
    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open database `{}`", config.db_path.display()))?;
    debug!(
        "event=cli_command module=cli status=start db={}",
        config.db_path.display()
    );
    let records = RecordService::new(SqliteRecordRepository::new(&conn));

    match &cli.command {
        Commands::User { action } => run_user(cli, &conn, action),
        Commands::Levels => print_levels(cli.json),
        Commands::Ranking => print_ranking(cli, &conn),
        Commands::Log(args) => log_entry(cli, &records, &resolve_session(cli, &conn)?, args),
        Commands::Show { id } => {
            let entry = records.get_entry(&resolve_session(cli, &conn)?, *id)?;
            if cli.json {
                return print_json(&entry);
            }
            print_entry_detail(&entry);
            Ok(())
        }
        Commands::Edit { id, entry } => {
            edit_entry(cli, &records, &resolve_session(cli, &conn)?, *id, entry)
        }
        Commands::Delete { id } => {
            records.delete_entry(&resolve_session(cli, &conn)?, *id)?;
            if cli.json {
                return print_json(&DeletedRecord { deleted: *id });
            }
            println!("Deleted record #{id}");
            Ok(())
        }
        Commands::List {
            from,
            to,
            page,
            page_size,
        } => {
            let session = resolve_session(cli, &conn)?;
            let request = RecordPageRequest {
                start_date: from.as_deref().map(parse_date).transpose()?,
                end_date: to.as_deref().map(parse_date).transpose()?,
                page: *page,
                page_size: *page_size,
            };
            print_listing(cli, &records.list_entries(&session, &request)?)
        }
        Commands::Home { today } => {
            let session = resolve_session(cli, &conn)?;
            let today = match today {
                Some(value) => parse_date(value)?,
                None => Local::now().date_naive(),
            };
            print_home(cli, &conn, &session, today)
        }
        Commands::Import { file } => {
            let session = resolve_session(cli, &conn)?;
            let input = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read `{}`", file.display()))?;
            let listing = Listing::<ImportedRecord>::from_json(&input)
                .with_context(|| format!("`{}` is not a record listing", file.display()))?;
            let summary = records.import_listing(&session, listing)?;
            if cli.json {
                return print_json(&summary);
            }
            println!(
                "Imported {} new and {} updated record(s)",
                summary.created, summary.updated
            );
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct DeletedRecord {
    deleted: i64,
}

fn run_user(cli: &Cli, conn: &Connection, action: &UserAction) -> Result<()> {
    let users = SqliteUserRepository::new(conn);
    match action {
        UserAction::Add { username, email } => {
            let user = users.create_user(&NewUser::new(username.as_str(), email.as_str()))?;
            if cli.json {
                return print_json(&user);
            }
            println!("Registered user #{} {} <{}>", user.id, user.username, user.email);
        }
        UserAction::List => {
            let all = users.list_users()?;
            if cli.json {
                return print_json(&all);
            }
            for user in all {
                println!("#{:<4} {:<16} {}", user.id, user.username, user.email);
            }
        }
    }
    Ok(())
}

fn print_ranking(cli: &Cli, conn: &Connection) -> Result<()> {
    let ranking = StatsService::new(SqliteRecordRepository::new(conn)).ranking()?;
    if cli.json {
        return print_json(&ranking);
    }
    if ranking.is_empty() {
        println!("No records yet.");
    }
    for entry in ranking {
        println!(
            "{:>3}. {:<16} {:>5} pts  avg {:.1}  ({} records)",
            entry.rank,
            entry.username,
            entry.total_satisfaction,
            entry.average_satisfaction,
            entry.total_records
        );
    }
    Ok(())
}

fn print_listing(cli: &Cli, listing: &Page<RecordEntry>) -> Result<()> {
    if cli.json {
        return print_json(listing);
    }
    for entry in &listing.results {
        println!(
            "#{:<4} {}  {}  {}",
            entry.id,
            entry.date,
            display(i64::from(entry.satisfaction_level), true),
            entry.title
        );
    }
    println!(
        "-- {} shown, {} total{}",
        listing.results.len(),
        listing.count,
        if listing.next.is_some() {
            ", more with --page"
        } else {
            ""
        }
    );
    Ok(())
}

fn print_home(cli: &Cli, conn: &Connection, session: &Session, today: NaiveDate) -> Result<()> {
    let home = StatsService::new(SqliteRecordRepository::new(conn)).home_stats(session, today)?;
    if cli.json {
        return print_json(&home);
    }
    match (home.formatted_average(), home.image_path()) {
        (Some(average), Some(image)) => {
            println!("Average satisfaction: {average} / 5.0 ({image})")
        }
        _ => println!("Average satisfaction: no records yet"),
    }
    match home.yesterday_satisfaction {
        Some(level) => println!("Yesterday: {}", display(i64::from(level), true)),
        None => println!("Yesterday: not recorded"),
    }
    println!("Streak: {} day(s)", home.consecutive_days);
    Ok(())
}

fn log_entry(
    cli: &Cli,
    records: &RecordService<SqliteRecordRepository<'_>>,
    session: &Session,
    args: &EntryArgs,
) -> Result<()> {
    let date = match &args.date {
        Some(value) => parse_date(value)?,
        None => Local::now().date_naive(),
    };
    let level = SatisfactionLevel::new(args.level)?;
    let notes = MemoPayload::new(args.done.as_str(), args.not_done.as_str());

    let (entry, outcome) = records.save_entry(session, date, level, &notes)?;
    if cli.json {
        return print_json(&entry);
    }
    let verb = match outcome {
        SaveOutcome::Created => "Created",
        SaveOutcome::Updated => "Updated",
    };
    println!(
        "{verb} record #{} for {}: {}",
        entry.id,
        entry.date,
        display(i64::from(entry.satisfaction_level), true)
    );
    Ok(())
}

fn edit_entry(
    cli: &Cli,
    records: &RecordService<SqliteRecordRepository<'_>>,
    session: &Session,
    id: i64,
    args: &EditArgs,
) -> Result<()> {
    let current = records.get_entry(session, id)?;
    let date = match &args.date {
        Some(value) => parse_date(value)?,
        None => current.date,
    };
    let level = match args.level {
        Some(value) => SatisfactionLevel::new(value)?,
        None => current.satisfaction_level,
    };
    let notes = MemoPayload {
        things_done: args
            .done
            .clone()
            .unwrap_or(current.notes.things_done),
        things_not_done: args
            .not_done
            .clone()
            .unwrap_or(current.notes.things_not_done),
    };

    let entry = records.update_entry(session, id, date, level, &notes)?;
    if cli.json {
        return print_json(&entry);
    }
    println!("Updated record #{}", entry.id);
    print_entry_detail(&entry);
    Ok(())
}

fn print_entry_detail(entry: &RecordEntry) {
    let or_none = |text: &str| {
        if text.is_empty() {
            "(none)".to_string()
        } else {
            text.to_string()
        }
    };
    println!("#{} {}", entry.id, entry.date);
    println!(
        "Satisfaction: {} {} - {}",
        entry.satisfaction_emoji, entry.satisfaction_level, entry.satisfaction_label
    );
    println!("Things done:\n  {}", or_none(&entry.notes.things_done));
    println!("Things not done:\n  {}", or_none(&entry.notes.things_not_done));
}

fn print_levels(json: bool) -> Result<()> {
    #[derive(Serialize)]
    struct LevelRow {
        value: SatisfactionLevel,
        label: &'static str,
        emoji: &'static str,
    }

    let rows: Vec<LevelRow> = SatisfactionLevel::all()
        .map(|level| LevelRow {
            value: level,
            label: level.label(),
            emoji: level.emoji(),
        })
        .collect();
    if json {
        return print_json(&rows);
    }
    for row in rows {
        println!("{} {} {}", row.emoji, row.value, row.label);
    }
    Ok(())
}

fn resolve_session(cli: &Cli, conn: &Connection) -> Result<Session> {
    let Some(email) = cli.user.as_deref() else {
        bail!("this command needs the acting user: pass --user <email>");
    };
    let user = SqliteUserRepository::new(conn)
        .find_user_by_email(email)?
        .ok_or_else(|| anyhow!("no user registered with email `{email}`"))?;
    Ok(Session::new(user.id))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date `{value}`, expected YYYY-MM-DD"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::Cli;
    use clap::Parser;
    use dayscore_core::CoreConfig;
    use rusqlite::Connection;
    use std::path::Path;

    fn run_args(config: &CoreConfig, args: &[&str]) -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(std::iter::once("dayscore").chain(args.iter().copied()))?;
        run(&cli, config)
    }

    fn record_rows(path: &Path) -> i64 {
        Connection::open(path)
            .unwrap()
            .query_row("SELECT COUNT(*) FROM records;", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn user_scoped_commands_without_user_fail_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig {
            db_path: dir.path().join("cli.sqlite3"),
            ..CoreConfig::default()
        };

        for args in [
            &["show", "1"][..],
            &["delete", "1"],
            &["list"],
            &["home"],
            &["log", "--level", "3"],
        ] {
            let err = run_args(&config, args).unwrap_err();
            assert!(err.to_string().contains("--user"), "{args:?}: {err}");
        }
        run_args(&config, &["levels"]).unwrap();
        run_args(&config, &["ranking"]).unwrap();
    }

    #[test]
    fn delete_with_json_removes_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig {
            db_path: dir.path().join("cli.sqlite3"),
            ..CoreConfig::default()
        };

        run_args(&config, &["user", "add", "hana", "hana@example.com"]).unwrap();
        run_args(
            &config,
            &["-u", "hana@example.com", "log", "--date", "2026-10-15", "--level", "4"],
        )
        .unwrap();
        assert_eq!(record_rows(&config.db_path), 1);

        run_args(&config, &["-u", "hana@example.com", "--json", "delete", "1"]).unwrap();
        assert_eq!(record_rows(&config.db_path), 0);
    }
}
