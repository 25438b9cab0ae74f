//! Cache command - manage the local artifact cache

use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::Config;
use crate::error::PrebakeResult;
use crate::store::{format_bytes, CacheEntry, LocalCacheStore};
use console::style;
use std::io::{self, Write};

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> PrebakeResult<()> {
    let store = LocalCacheStore::new(config.cache.root.clone());

    match args.action {
        CacheAction::List { format } => list_entries(&store, format).await,
        CacheAction::Clear { yes } => clear_entries(&store, yes).await,
    }
}

async fn list_entries(store: &LocalCacheStore, format: OutputFormat) -> PrebakeResult<()> {
    let entries = store.entries().await?;

    if entries.is_empty() {
        println!("No cached artifacts.");
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_table(&entries),
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Plain => print_plain(&entries),
    }

    Ok(())
}

fn print_table(entries: &[CacheEntry]) {
    println!("{:<20} {:<30} {:>10}", "COMPONENT", "ARCHIVE", "SIZE");
    println!("{}", "-".repeat(62));

    for entry in entries {
        println!(
            "{:<20} {:<30} {:>10}",
            entry.component,
            entry.file_name,
            format_bytes(entry.size_bytes)
        );
    }

    let total: u64 = entries.iter().map(|e| e.size_bytes).sum();
    println!();
    println!("Total: {} archive(s), {}", entries.len(), format_bytes(total));
}

fn print_json(entries: &[CacheEntry]) -> PrebakeResult<()> {
    #[derive(serde::Serialize)]
    struct EntryJson<'a> {
        component: &'a str,
        archive: &'a str,
        path: String,
        size_bytes: u64,
    }

    let rows: Vec<EntryJson> = entries
        .iter()
        .map(|e| EntryJson {
            component: &e.component,
            archive: &e.file_name,
            path: e.path.display().to_string(),
            size_bytes: e.size_bytes,
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn print_plain(entries: &[CacheEntry]) {
    for entry in entries {
        println!("{}", entry.path.display());
    }
}

async fn clear_entries(store: &LocalCacheStore, yes: bool) -> PrebakeResult<()> {
    let entries = store.entries().await?;
    if entries.is_empty() {
        println!("No cached artifacts.");
        return Ok(());
    }

    if !yes {
        print!(
            "Remove {} cached archive(s) from {}? [y/N] ",
            entries.len(),
            store.root().display()
        );
        io::stdout().flush().ok();
        let mut answer = String::new();
        io::stdin()
            .read_line(&mut answer)
            .map_err(|e| crate::error::PrebakeError::io("reading confirmation", e))?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let removed = store.clear().await?;
    println!("{} Removed {} archive(s)", style("[OK]").green(), removed);
    Ok(())
}
