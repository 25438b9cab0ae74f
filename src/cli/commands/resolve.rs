//! Resolve command - satisfy components from the artifact cache

use crate::cli::args::ResolveArgs;
use crate::config::{policy_table, Config};
use crate::error::PrebakeResult;
use crate::hook::{HookDecision, InterceptionHook, SatisfyRequest};
use crate::policy::{PolicyFlags, PolicyTable};
use crate::resolver::{Resolver, ResolutionOutcome};
use crate::store::{CliRemoteStore, LocalCacheStore};
use crate::version::{GitVcs, VersionDescriptor};
use console::style;
use futures_util::future::join_all;
use std::time::Duration;

/// Execute the resolve command
pub async fn execute(args: ResolveArgs, config: &Config) -> PrebakeResult<()> {
    let constraint = args
        .version
        .as_deref()
        .map(str::parse::<VersionDescriptor>)
        .transpose()?;

    let policies = command_policies(&args, config)?;

    let source_root = args
        .source_root
        .clone()
        .unwrap_or_else(|| config.hook.source_root.clone());
    let install_dir = args
        .install_dir
        .clone()
        .unwrap_or_else(|| config.install.dir.clone());

    let resolver = Resolver::new(
        Box::new(GitVcs::new()),
        LocalCacheStore::new(config.cache.root.clone()),
        Box::new(CliRemoteStore::new(
            config.remote.tool.clone(),
            config.remote.bucket.clone(),
            config.remote.prefix.clone(),
            Duration::from_secs(config.remote.timeout_secs),
        )),
        install_dir,
    );

    let hook = InterceptionHook::new(config.hook.pattern.clone(), policies, resolver, source_root);

    // Independent components: resolve them concurrently
    let requests: Vec<SatisfyRequest> = args
        .components
        .iter()
        .map(|name| SatisfyRequest::new(name, constraint))
        .collect();
    let decisions = join_all(requests.iter().map(|r| hook.handle(r))).await;

    let mut failure = None;
    for (name, decision) in args.components.iter().zip(decisions) {
        match decision {
            Ok(decision) => report(name, &decision),
            Err(e) => {
                eprintln!("{} {}: {}", style("[FAIL]").red(), name, e);
                failure = Some(e);
            }
        }
    }

    // A policy violation aborts the configuration pass; nothing else does
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Apply one-shot CLI overrides on top of the configured policy table
fn command_policies(args: &ResolveArgs, config: &Config) -> PrebakeResult<PolicyTable> {
    if !args.force_source && !args.require_prebuilt {
        return policy_table(config);
    }

    let override_flags = PolicyFlags {
        force_from_source: args.force_source,
        require_prebuilt: args.require_prebuilt,
    };

    let mut entries: Vec<(String, PolicyFlags)> = config
        .components
        .iter()
        .map(|(name, flags)| (name.clone(), *flags))
        .collect();
    for name in &args.components {
        entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        entries.push((name.clone(), override_flags));
    }

    PolicyTable::from_entries(entries)
}

fn report(name: &str, decision: &HookDecision) {
    match decision {
        HookDecision::Routed(resolution) => match &resolution.outcome {
            ResolutionOutcome::Satisfied { version, source } => {
                println!(
                    "{} {}: satisfied from {} (version {})",
                    style("[OK]").green(),
                    name,
                    source,
                    version
                );
            }
            ResolutionOutcome::FallbackToSource(reason) => {
                println!(
                    "{} {}: building from source: {}",
                    style("[SOURCE]").yellow(),
                    name,
                    reason
                );
            }
        },
        HookDecision::PassThrough(reason) => {
            println!(
                "{} {}: passed through: {}",
                style("[SKIP]").dim(),
                name,
                reason.message()
            );
        }
    }
}
