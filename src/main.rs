use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Parser;
use clipkeep::cli::{Cli, Commands};
use clipkeep::config::Config;
use clipkeep::control::schemas::{EntryResponse, ListQuery, PinResponse};
use clipkeep::control::{Controller, HistoryControl};
use clipkeep::daemon::{self, Startup};
use clipkeep::history::ClipboardEntry;
use clipkeep::storage::export_history;
use clipkeep::utils::preview::preview;
use dialoguer::Confirm;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run);

    // The daemon logs at info; one-shot commands keep stderr quiet.
    let default_level = if matches!(command, Commands::Run) { "info" } else { "warn" };
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;
    handle_command(command, &config).await
}

async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    if let Commands::Run = command {
        match daemon::run(config).await? {
            Startup::Served => {}
            Startup::AlreadyRunning => println!("clipkeep is already running."),
        }
        return Ok(());
    }

    let controller = &Controller::connect(config).await?;
    match command {
        Commands::Run => {}
        Commands::List { query, pinned, json, limit } => {
            handle_list(controller, config, ListQuery { q: query, pinned, limit }, json).await?;
        }
        Commands::Copy { id } => {
            let entry = controller.copy(&id).await?;
            println!("✓ Copied {} to the clipboard", entry.short_id);
        }
        Commands::Pin { id } => {
            let update = controller.pin(&id).await?;
            println!("✓ Pinned {}", update.entry.short_id);
        }
        Commands::Unpin { id } => {
            let update = controller.unpin(&id).await?;
            println!("✓ Unpinned {}", update.entry.short_id);
            print_evicted(&update);
        }
        Commands::Delete { id } => {
            let entry = controller.delete(&id).await?;
            println!("✓ Deleted {}", entry.short_id);
        }
        Commands::Pause => {
            controller.set_paused(true).await?;
            println!("⏸ Clipboard monitoring paused");
        }
        Commands::Resume => {
            controller.set_paused(false).await?;
            println!("▶ Clipboard monitoring resumed");
        }
        Commands::Capacity { capacity } => {
            let response = controller.set_capacity(capacity).await?;
            println!("✓ Keeping up to {} unpinned entries", response.capacity);
            if !response.evicted.is_empty() {
                println!("  Removed {} older entries", response.evicted.len());
            }
        }
        Commands::Interval { interval_ms } => {
            let response = controller.set_interval(interval_ms).await?;
            println!("✓ Polling the clipboard every {} ms", response.interval_ms);
        }
        Commands::Clear { all, yes } => {
            handle_clear(controller, all, yes).await?;
        }
        Commands::Export { path } => {
            handle_export(controller, &path).await?;
        }
        Commands::Status => {
            let status = controller.status().await?;
            let state = if status.daemon_running { "running" } else { "not running" };
            let monitoring = if status.paused { "paused" } else { "active" };
            println!("Daemon:     {state}");
            println!("Monitoring: {monitoring}");
            println!("Entries:    {} ({} pinned)", status.entries, status.pinned);
            println!("Capacity:   {} unpinned", status.capacity);
            println!("Interval:   {} ms", status.poll_interval_ms);
            println!("Hotkey:     {}", status.hotkey);
        }
        Commands::Show => {
            controller.show().await?;
            println!("✓ Asked clipkeep to show itself");
        }
    }

    Ok(())
}

async fn handle_list(controller: &Controller, config: &Config, query: ListQuery, json: bool) -> Result<()> {
    let list = controller.list(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    if list.entries.is_empty() {
        println!("No clipboard history yet.");
        return Ok(());
    }

    for entry in &list.entries {
        println!("{}", format_row(entry, config.preview_width));
    }
    if list.total > list.entries.len() {
        println!("… {} more", list.total - list.entries.len());
    }

    Ok(())
}

fn format_row(entry: &EntryResponse, width: usize) -> String {
    let marker = if entry.pinned { "📌" } else { "  " };
    let time = DateTime::parse_from_rfc3339(&entry.timestamp)
        .map(|ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| entry.timestamp.clone());
    format!("{} {} {}  {}", entry.short_id, marker, time, preview(&entry.content, width))
}

fn print_evicted(update: &PinResponse) {
    if !update.evicted.is_empty() {
        println!("  Removed {} older entries to stay within capacity", update.evicted.len());
    }
}

async fn handle_clear(controller: &Controller, all: bool, yes: bool) -> Result<()> {
    let what = if all { "all entries, including pinned ones" } else { "all unpinned entries" };

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove {what}?"))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("Nothing removed.");
            return Ok(());
        }
    }

    let response = controller.clear(all).await?;
    println!("✓ Removed {} entries", response.removed);
    Ok(())
}

async fn handle_export(controller: &Controller, path: &Path) -> Result<()> {
    let list = controller.list(ListQuery::default()).await?;
    let entries = list
        .entries
        .iter()
        .map(EntryResponse::to_entry)
        .collect::<Result<Vec<ClipboardEntry>, _>>()?;

    export_history(path, &entries)?;
    println!("✓ Exported {} entries to {}", entries.len(), path.display());
    Ok(())
}
