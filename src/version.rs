//! Version derivation from source-tree state
//!
//! Maps a component's current revision to a canonical four-part version.
//! The descriptor is a content-derived fingerprint, not a semantic version:
//! any change to the tracked revision changes it deterministically, with no
//! ordering relationship between source changes and descriptor magnitude.
//!
//! Known limitation: the descriptor is a function of the tracked revision
//! only. Build parameters (compiler flags, enabled features) are not
//! incorporated, so two builds of the same revision with different
//! parameters share a descriptor. Accepted staleness risk.

use crate::error::{PrebakeError, PrebakeResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use tokio::process::Command;
use tracing::debug;

/// Number of hex characters in a short revision identifier
pub const REVISION_LEN: usize = 8;

/// Four-part version fingerprint derived from a revision identifier
///
/// Totally ordered and compared for exact equality only; no range or
/// "latest compatible" semantics exist for fingerprint-derived versions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct VersionDescriptor([u8; 4]);

impl VersionDescriptor {
    /// Derive a descriptor from a short hex revision identifier.
    ///
    /// The revision must be exactly eight hex characters; each 2-character
    /// group becomes one byte of the descriptor. `aabbccdd` maps to
    /// `170.187.204.221`.
    pub fn from_revision(revision: &str) -> PrebakeResult<Self> {
        let revision = revision.trim();
        if !revision.is_ascii() || revision.len() != REVISION_LEN {
            return Err(PrebakeError::RevisionInvalid {
                revision: revision.to_string(),
                reason: format!(
                    "expected {} ASCII hex characters, got {}",
                    REVISION_LEN,
                    revision.chars().count()
                ),
            });
        }

        let mut parts = [0u8; 4];
        for (i, part) in parts.iter_mut().enumerate() {
            let group = &revision[i * 2..i * 2 + 2];
            *part = u8::from_str_radix(group, 16).map_err(|_| PrebakeError::RevisionInvalid {
                revision: revision.to_string(),
                reason: format!("'{}' is not a hex byte", group),
            })?;
        }

        Ok(Self(parts))
    }

    /// The four parts in order
    pub fn parts(&self) -> [u8; 4] {
        self.0
    }
}

impl fmt::Display for VersionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

impl FromStr for VersionDescriptor {
    type Err = PrebakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pieces: Vec<&str> = s.split('.').collect();
        if pieces.len() != 4 {
            return Err(PrebakeError::User(format!(
                "version '{}' must have exactly four dotted parts",
                s
            )));
        }
        let mut parts = [0u8; 4];
        for (part, piece) in parts.iter_mut().zip(&pieces) {
            *part = piece.parse().map_err(|_| {
                PrebakeError::User(format!("invalid version part '{}' in '{}'", piece, s))
            })?;
        }
        Ok(Self(parts))
    }
}

impl TryFrom<String> for VersionDescriptor {
    type Error = PrebakeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<VersionDescriptor> for String {
    fn from(v: VersionDescriptor) -> Self {
        v.to_string()
    }
}

/// Version-control abstraction
///
/// One capability: the current short revision identifier for a path.
/// Keeps the deriver unit-testable without invoking any external process.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Current short revision identifier for the given source path
    async fn revision(&self, path: &Path) -> PrebakeResult<String>;
}

/// Git-backed revision reader
pub struct GitVcs;

impl GitVcs {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GitVcs {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Vcs for GitVcs {
    async fn revision(&self, path: &Path) -> PrebakeResult<String> {
        debug!("Reading revision for {}", path.display());

        let output = Command::new("git")
            .args(["-C"])
            .arg(path)
            .args(["rev-parse", &format!("--short={}", REVISION_LEN), "HEAD"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                PrebakeError::version_unavailable(path, format!("git not runnable: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PrebakeError::version_unavailable(
                path,
                stderr.trim().to_string(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Derive the version descriptor for a component source path
///
/// Failure is recoverable for the caller: a component without a readable
/// revision falls through to a from-source build.
pub async fn derive_version(vcs: &dyn Vcs, path: &Path) -> PrebakeResult<VersionDescriptor> {
    let revision = vcs.revision(path).await?;
    let descriptor = VersionDescriptor::from_revision(&revision).map_err(|e| {
        PrebakeError::version_unavailable(path, e.to_string())
    })?;
    debug!("Derived version {} from revision {}", descriptor, revision);
    Ok(descriptor)
}

/// A named source unit subject to resolution
#[derive(Debug, Clone)]
pub struct Component {
    /// Component name, lowercased for store keys
    pub name: String,
    /// Source tree path
    pub path: PathBuf,
}

impl Component {
    /// Create a component, normalizing the name to lowercase
    pub fn new(name: impl AsRef<str>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.as_ref().to_lowercase(),
            path: path.into(),
        }
    }
}
