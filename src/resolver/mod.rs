//! Artifact resolution state machine
//!
//! One resolution attempt walks:
//! derive version -> local cache -> remote store -> install, and falls
//! through to a from-source build on any miss or failure. Both terminal
//! outcomes are legitimate for the caller; only diagnostics distinguish
//! "found and used" from "not found, building". The single exception is
//! `require_prebuilt`, which escalates a fallback to a hard failure.

pub mod archive;

use crate::error::{PrebakeError, PrebakeResult};
use crate::policy::PolicyFlags;
use crate::store::{ArtifactKey, LocalCacheStore, Presence, RemoteStore};
use crate::version::{derive_version, Component, Vcs, VersionDescriptor};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where a satisfied artifact came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitSource {
    /// Already present in the local cache
    Local,
    /// Downloaded from the remote store this attempt
    Remote,
}

impl fmt::Display for HitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local cache"),
            Self::Remote => write!(f, "remote store"),
        }
    }
}

/// Why an attempt fell through to a from-source build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// No readable revision for the component source path
    VersionUnavailable(String),
    /// Requested constraint differs from the derived version
    ConstraintMismatch {
        requested: VersionDescriptor,
        derived: VersionDescriptor,
    },
    /// Neither local nor remote store has the artifact (a normal outcome)
    NotFound,
    /// Remote check or fetch failed (tool missing, network, auth, timeout)
    RemoteUnreachable(String),
    /// Local filesystem problem while caching the download
    CacheWriteFailed(String),
    /// Downloaded or cached archive was corrupt or unreadable
    ExtractionFailed(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VersionUnavailable(reason) => write!(f, "no readable revision ({})", reason),
            Self::ConstraintMismatch { requested, derived } => write!(
                f,
                "requested version {} does not match source version {}",
                requested, derived
            ),
            Self::NotFound => write!(f, "artifact not found in local cache or remote store"),
            Self::RemoteUnreachable(reason) => write!(f, "remote store unreachable ({})", reason),
            Self::CacheWriteFailed(reason) => write!(f, "local cache write failed ({})", reason),
            Self::ExtractionFailed(reason) => write!(f, "archive extraction failed ({})", reason),
        }
    }
}

/// Terminal outcome of one resolution attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Artifact extracted into the install location; the host build tool
    /// should treat the dependency as already built
    Satisfied {
        version: VersionDescriptor,
        source: HitSource,
    },
    /// Proceed with a normal from-source build
    FallbackToSource(FallbackReason),
}

impl ResolutionOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied { .. })
    }
}

/// Outcome paired with the component it belongs to
#[derive(Debug, Clone)]
pub struct Resolution {
    pub component: String,
    pub outcome: ResolutionOutcome,
}

/// Orchestrates version derivation, cache lookup, fetch, and extraction
pub struct Resolver {
    vcs: Box<dyn Vcs>,
    local: LocalCacheStore,
    remote: Box<dyn RemoteStore>,
    install_dir: PathBuf,
}

impl Resolver {
    pub fn new(
        vcs: Box<dyn Vcs>,
        local: LocalCacheStore,
        remote: Box<dyn RemoteStore>,
        install_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            vcs,
            local,
            remote,
            install_dir: install_dir.into(),
        }
    }

    /// Attempt to satisfy a component from the artifact cache.
    ///
    /// Returns `Err` only for `PolicyViolation` (when `require_prebuilt` is
    /// set and no artifact was usable); every other failure is absorbed
    /// into a `FallbackToSource` outcome.
    pub async fn resolve(
        &self,
        component: &Component,
        constraint: Option<VersionDescriptor>,
        policy: PolicyFlags,
    ) -> PrebakeResult<Resolution> {
        let outcome = self.attempt(component, constraint).await;

        match &outcome {
            ResolutionOutcome::Satisfied { version, source } => {
                info!(
                    "{}: satisfied from {} (version {})",
                    component.name, source, version
                );
            }
            ResolutionOutcome::FallbackToSource(reason) => {
                info!("{}: building from source: {}", component.name, reason);
                if policy.require_prebuilt {
                    return Err(PrebakeError::PolicyViolation {
                        component: component.name.clone(),
                        reason: reason.to_string(),
                    });
                }
            }
        }

        Ok(Resolution {
            component: component.name.clone(),
            outcome,
        })
    }

    /// One pass through the state machine; never errors, only falls back
    async fn attempt(
        &self,
        component: &Component,
        constraint: Option<VersionDescriptor>,
    ) -> ResolutionOutcome {
        // Start -> VersionDerived
        let version = match derive_version(self.vcs.as_ref(), &component.path).await {
            Ok(v) => v,
            Err(e) => {
                return ResolutionOutcome::FallbackToSource(FallbackReason::VersionUnavailable(
                    e.to_string(),
                ))
            }
        };

        // Exact-match only; fingerprints have no meaningful ordering to range over
        if let Some(requested) = constraint {
            if requested != version {
                return ResolutionOutcome::FallbackToSource(FallbackReason::ConstraintMismatch {
                    requested,
                    derived: version,
                });
            }
        }

        let key = ArtifactKey::new(&component.name, version);

        // VersionDerived -> CacheHitLocal: skip remote entirely
        if let Some(cached) = self.local.get(&key).await {
            debug!("Local cache hit for {}", key);
            return self.install(&key, &cached, HitSource::Local).await;
        }

        // VersionDerived -> CacheHitRemote | Miss
        match self.remote.exists(&key).await {
            Presence::Present => {}
            Presence::Absent => {
                return ResolutionOutcome::FallbackToSource(FallbackReason::NotFound);
            }
            Presence::Error(reason) => {
                // Couldn't check; the correct action is the same as absent
                return ResolutionOutcome::FallbackToSource(FallbackReason::RemoteUnreachable(
                    reason,
                ));
            }
        }

        let cached = match self.download(&key).await {
            Ok(path) => path,
            Err(e @ PrebakeError::CacheWriteFailed { .. }) => {
                return ResolutionOutcome::FallbackToSource(FallbackReason::CacheWriteFailed(
                    e.to_string(),
                ));
            }
            Err(e) => {
                return ResolutionOutcome::FallbackToSource(FallbackReason::RemoteUnreachable(
                    e.to_string(),
                ));
            }
        };

        self.install(&key, &cached, HitSource::Remote).await
    }

    /// Fetch the remote artifact into the local cache via a staged write
    async fn download(&self, key: &ArtifactKey) -> PrebakeResult<PathBuf> {
        let staged = self.local.prepare_staging(key).await?;
        if let Err(e) = self.remote.fetch(key, &staged).await {
            // A failed fetch may leave a partial file behind
            let _ = tokio::fs::remove_file(&staged).await;
            return Err(e);
        }
        self.local.put(key, &staged).await
    }

    /// Any hit -> Installed, or fall back on a corrupt archive
    async fn install(
        &self,
        key: &ArtifactKey,
        cached: &Path,
        source: HitSource,
    ) -> ResolutionOutcome {
        // Gzip and tar are blocking work; keep them off the async workers
        let archive_path = cached.to_path_buf();
        let install_dir = self.install_dir.clone();
        let extracted = tokio::task::spawn_blocking(move || {
            archive::extract_overlay(&archive_path, &install_dir)
        })
        .await
        .map_err(|e| PrebakeError::extraction(cached, e.to_string()))
        .and_then(|r| r);

        match extracted {
            Ok(()) => ResolutionOutcome::Satisfied {
                version: key.version,
                source,
            },
            Err(e) => {
                // The corrupt entry must not be trusted by a future lookup
                let _ = self.local.discard(key).await;
                ResolutionOutcome::FallbackToSource(FallbackReason::ExtractionFailed(
                    e.to_string(),
                ))
            }
        }
    }
}
