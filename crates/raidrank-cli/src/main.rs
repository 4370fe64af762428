//! raidrank - raid progress tracking for guild groups.
//!
//! Polls the character progression API for every stored group, confirms
//! boss kills by quorum, records new kills in the daily history, and
//! announces them.

use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use raidrank_core::auth::{resolve_api_key, CredentialStore};
use raidrank_core::models::Difficulty;
use raidrank_core::notify::LogNotifier;
use raidrank_core::ranker::rank_groups;
use raidrank_core::roster::import_roster;
use raidrank_core::store::{FileStore, GroupStore, HistorySink};
use raidrank_core::{ApiClient, Config, Ranker};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ============================================================================
// Constants
// ============================================================================

/// Log file name prefix inside the configured log directory
const LOG_FILE_PREFIX: &str = "raidrank.log";

const USAGE: &str = "\
Usage: raidrank <command> [args]

Commands:
  rank                      Process every group, save progress, announce new kills
  loadone <group>           Process one group without saving anything
  history <group>           Show a group's kill history
  standings [raid]          Show groups ordered by progress
  add-group <name> <toon>.. Create a group or replace its roster
  announce [YYYY-MM-DD]     Announce unannounced kills for a date (default today)
  status                    Show when groups were last processed
  set-api-key               Store the progression API key in the OS keychain
  clear-api-key             Remove the stored API key";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr; with a log directory configured they are also written
/// to a daily rolling file. The returned guard must be held until exit.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    match command.as_str() {
        "set-api-key" => return set_api_key(),
        "clear-api-key" => {
            CredentialStore::delete_api_key()?;
            println!("API key removed");
            return Ok(());
        }
        _ => {}
    }

    let config = Config::load()?;
    config.validate().context("Invalid configuration")?;
    let _guard = init_tracing(config.log_dir.as_deref());

    let store = FileStore::new(config.data_dir()?)?;

    match command.as_str() {
        "rank" => rank(&config, store).await,
        "loadone" => {
            let name = required_arg(&args, 1, "group")?;
            load_one(&config, store, name).await
        }
        "history" => {
            let name = required_arg(&args, 1, "group")?;
            show_history(&store, name)
        }
        "standings" => show_standings(&config, &store, args.get(1).map(String::as_str)),
        "add-group" => {
            let name = required_arg(&args, 1, "name")?;
            add_group(&config, &store, name, args[2..].to_vec())
        }
        "announce" => {
            let date = match args.get(1) {
                Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .with_context(|| format!("Invalid date: {}", d))?,
                None => Utc::now().date_naive(),
            };
            announce(&config, store, date)
        }
        "status" => {
            println!("Groups last processed: {}", store.last_updated_display());
            println!("Store: {}", store.dir().display());
            println!(
                "API key: {}",
                if CredentialStore::has_api_key() { "stored" } else { "not stored" }
            );
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}\n\n{}", other, USAGE);
            Ok(())
        }
    }
}

fn required_arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    match args.get(index) {
        Some(value) => Ok(value.as_str()),
        None => bail!("Missing <{}> argument\n\n{}", name, USAGE),
    }
}

fn api_client(config: &Config) -> Result<ApiClient> {
    let key = resolve_api_key()?;
    ApiClient::new(key, config.api.clone(), config.raid_names())
}

/// Two handles on the same data directory: one as group store, one as history sink.
fn ranker(config: &Config, store: FileStore) -> Result<Ranker<ApiClient, FileStore, FileStore>> {
    let history = FileStore::new(store.dir().to_path_buf())?;
    Ok(Ranker::new(
        api_client(config)?,
        store,
        history,
        config.catalog.clone(),
        config.rules(),
    ))
}

async fn rank(config: &Config, store: FileStore) -> Result<()> {
    info!("Ranking all groups");
    let ranker = ranker(config, store)?;

    let batch = ranker.process_all(true).await?;
    for line in &batch.lines {
        println!("{}", line);
    }
    println!(
        "Processed {} groups ({} failed), {} new kills",
        batch.processed, batch.failed, batch.new_kills
    );

    let published = ranker.announce(Utc::now().date_naive(), &LogNotifier)?;
    info!(published, "Ranking complete");
    Ok(())
}

async fn load_one(config: &Config, store: FileStore, name: &str) -> Result<()> {
    let ranker = ranker(config, store)?;
    match ranker.process_by_name(name, false).await? {
        Some(summary) => {
            println!("{}", summary);
            for change in &summary.changes.changes {
                println!(
                    "  {} {}: {} -> {}",
                    change.raid,
                    change.difficulty,
                    change.killed.join(", "),
                    change.new_total
                );
            }
            println!("  average item level: {}", summary.avg_ilvl);
        }
        None => println!("No group named {}", name),
    }
    Ok(())
}

fn show_history(store: &FileStore, name: &str) -> Result<()> {
    let entries = store.for_group(name)?;
    if entries.is_empty() {
        println!("No history recorded for group {}", name);
        return Ok(());
    }
    println!("{}", name);
    for entry in entries {
        for change in &entry.changes {
            println!(
                "  {}  {} {}: {} (now {})",
                entry.date,
                change.raid,
                change.difficulty,
                change.killed.join(", "),
                change.new_total
            );
        }
    }
    Ok(())
}

fn show_standings(config: &Config, store: &FileStore, raid: Option<&str>) -> Result<()> {
    let def = match raid {
        Some(slug) => config
            .catalog
            .iter()
            .find(|r| r.slug == slug)
            .with_context(|| format!("No raid {} in the catalog", slug))?,
        None => config.catalog.first().context("Catalog is empty")?,
    };

    let mut groups = store.get_all()?;
    rank_groups(&mut groups, &def.slug);

    println!("{}", def.name);
    for group in &groups {
        let progress = match group.raid(&def.slug) {
            Some(raid) => Difficulty::ALL
                .iter()
                .rev()
                .map(|d| raid.progress_string(*d, def.boss_count()))
                .collect::<Vec<_>>()
                .join("  "),
            None => "no data".to_string(),
        };
        println!("  {:<30} {}  ilvl {}", group.name, progress, group.avg_ilvl);
    }
    Ok(())
}

fn add_group(config: &Config, store: &FileStore, name: &str, toons: Vec<String>) -> Result<()> {
    let count = toons.len();
    let outcome = import_roster(
        store,
        name,
        toons,
        &config.catalog,
        config.min_group_size,
        Utc::now().date_naive(),
    )?;
    if outcome.stored() {
        println!("Stored group {} with {} toons", name, count);
    } else {
        println!(
            "Group {} has {} toons, fewer than the {} needed to track it",
            name, count, config.min_group_size
        );
    }
    Ok(())
}

fn announce(config: &Config, store: FileStore, date: NaiveDate) -> Result<()> {
    let ranker = ranker(config, store)?;
    let published = ranker.announce(date, &LogNotifier)?;
    println!("Published {} announcements for {}", published, date);
    Ok(())
}

fn set_api_key() -> Result<()> {
    let key = rpassword::prompt_password("API key: ")?;
    if key.trim().is_empty() {
        bail!("No API key entered");
    }
    CredentialStore::store_api_key(key.trim())?;
    println!("API key stored");
    Ok(())
}
