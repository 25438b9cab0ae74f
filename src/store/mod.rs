//! Artifact stores
//!
//! Artifacts are addressed by (component name, version descriptor) in both
//! the local on-disk cache and the remote object store.

pub mod local;
pub mod remote;

pub use local::{format_bytes, CacheEntry, LocalCacheStore};
pub use remote::{CliRemoteStore, Presence, RemoteStore};

use crate::version::VersionDescriptor;
use std::fmt;
use std::path::PathBuf;

/// Fixed archive extension for prebuilt artifacts
pub const ARCHIVE_EXT: &str = "tar.gz";

/// Addressing tuple for one artifact archive
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    /// Lowercase component name
    pub component: String,
    /// Exact version fingerprint
    pub version: VersionDescriptor,
}

impl ArtifactKey {
    /// Create a key, normalizing the component name to lowercase
    pub fn new(component: impl AsRef<str>, version: VersionDescriptor) -> Self {
        Self {
            component: component.as_ref().to_lowercase(),
            version,
        }
    }

    /// Archive file name: `<dotted-decimal>.tar.gz`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.version, ARCHIVE_EXT)
    }

    /// Path relative to the cache root: `<name>/<dotted-decimal>.tar.gz`
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(&self.component).join(self.file_name())
    }

    /// Object key relative to the remote bucket/prefix
    pub fn object_key(&self) -> String {
        format!("{}/{}", self.component, self.file_name())
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.component, self.version)
    }
}
