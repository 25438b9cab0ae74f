//! Status command - check system health and dependencies

use crate::config::Config;
use crate::error::PrebakeResult;
use crate::store::{CliRemoteStore, LocalCacheStore, RemoteStore};
use console::{style, Emoji};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");

/// Execute the status command
pub async fn execute(config: &Config) -> PrebakeResult<()> {
    println!("{}", style("Prebake System Status").bold().cyan());
    println!();

    println!("{}", style("Version control:").bold());
    check_cli("git", &["--version"]).await;

    println!();
    println!("{}", style("Remote store:").bold());
    let remote = CliRemoteStore::new(
        config.remote.tool.clone(),
        config.remote.bucket.clone(),
        config.remote.prefix.clone(),
        Duration::from_secs(config.remote.timeout_secs),
    );
    if remote.tool_available().await {
        println!("  {} {} installed ({})", CHECK, config.remote.tool, remote.describe());
    } else {
        println!(
            "  {} {} not found - remote lookups will fall back to source builds",
            CROSS,
            style(&config.remote.tool).red()
        );
    }

    println!();
    println!("{}", style("Local cache:").bold());
    let store = LocalCacheStore::new(config.cache.root.clone());
    match store.entries().await {
        Ok(entries) => {
            let total: u64 = entries.iter().map(|e| e.size_bytes).sum();
            println!(
                "  {} {} ({} archives, {})",
                CHECK,
                store.root().display(),
                entries.len(),
                crate::store::format_bytes(total)
            );
        }
        Err(e) => {
            println!("  {} {}: {}", CROSS, store.root().display(), e);
        }
    }

    Ok(())
}

async fn check_cli(name: &str, args: &[&str]) {
    let ok = Command::new(name)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false);

    if ok {
        println!("  {} {} installed", CHECK, name);
    } else {
        println!("  {} {} not found", CROSS, style(name).red());
    }
}
