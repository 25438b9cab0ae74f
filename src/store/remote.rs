//! Remote object store client
//!
//! Wraps an external object-store command-line tool (MinIO `mc` by
//! default). The resolver never assumes a network call succeeds: presence
//! checks return a typed [`Presence`] so "doesn't exist" and "couldn't
//! check" stay distinguishable in diagnostics, even though both fall back
//! to a from-source build.

use crate::error::{PrebakeError, PrebakeResult};
use crate::store::ArtifactKey;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

/// Typed presence result for a remote lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence {
    /// The artifact exists in the remote store
    Present,
    /// The remote store answered and the artifact is not there
    Absent,
    /// The check itself failed (tool missing, network, auth, timeout)
    Error(String),
}

/// Abstract remote artifact store
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Check whether an artifact exists for the key
    async fn exists(&self, key: &ArtifactKey) -> Presence;

    /// Download the artifact for the key to the destination path
    async fn fetch(&self, key: &ArtifactKey, dest: &Path) -> PrebakeResult<()>;

    /// Human-readable store description for diagnostics
    fn describe(&self) -> String;
}

/// Remote store backed by an external object-store CLI
///
/// Presence is judged by the stat verb's exit status; credentials and
/// transport are the tool's own concern.
pub struct CliRemoteStore {
    tool: String,
    bucket: String,
    prefix: String,
    timeout: Duration,
}

impl CliRemoteStore {
    /// Create a client for the given tool and bucket
    pub fn new(
        tool: impl Into<String>,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            tool: tool.into(),
            bucket: bucket.into(),
            prefix: prefix.into(),
            timeout,
        }
    }

    /// Full remote address for a key: `<bucket>[/<prefix>]/<name>/<version>.tar.gz`
    pub fn remote_address(&self, key: &ArtifactKey) -> String {
        if self.prefix.is_empty() {
            format!("{}/{}", self.bucket, key.object_key())
        } else {
            format!("{}/{}/{}", self.bucket, self.prefix, key.object_key())
        }
    }

    /// Check that the external tool can be spawned at all
    pub async fn tool_available(&self) -> bool {
        Command::new(&self.tool)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn exec(&self, args: &[&str]) -> PrebakeResult<std::process::Output> {
        debug!("Executing: {} {:?}", self.tool, args);

        let run = Command::new(&self.tool)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        match timeout(self.timeout, run).await {
            Ok(result) => result
                .map_err(|e| PrebakeError::command_failed(format!("{} {:?}", self.tool, args), e)),
            Err(_) => Err(PrebakeError::remote_unreachable(
                &self.tool,
                format!("timed out after {:?}", self.timeout),
            )),
        }
    }
}

#[async_trait]
impl RemoteStore for CliRemoteStore {
    async fn exists(&self, key: &ArtifactKey) -> Presence {
        let address = self.remote_address(key);

        let output = match self.exec(&["stat", &address]).await {
            Ok(output) => output,
            // Spawn failure or timeout: couldn't check, not "not there"
            Err(e) => return Presence::Error(e.to_string()),
        };

        if output.status.success() {
            debug!("Remote artifact present: {}", address);
            Presence::Present
        } else {
            debug!("Remote artifact absent: {}", address);
            Presence::Absent
        }
    }

    async fn fetch(&self, key: &ArtifactKey, dest: &Path) -> PrebakeResult<()> {
        let address = self.remote_address(key);
        let dest_str = dest.to_string_lossy();
        info!("Fetching {} -> {}", address, dest.display());

        let output = self.exec(&["cp", &address, &dest_str]).await?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(PrebakeError::remote_unreachable(
                &self.tool,
                format!("fetch of {} failed: {}", address, stderr.trim()),
            ))
        }
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.bucket, self.tool)
    }
}
