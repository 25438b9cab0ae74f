//! Configuration schema for Prebake
//!
//! Configuration is stored at `~/.config/prebake/config.toml`. All options
//! live in this explicit struct, threaded through the resolver and hook
//! constructors; nothing reads ambient state at resolution time.

use crate::policy::PolicyFlags;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local cache settings
    pub cache: CacheConfig,

    /// Remote object store settings
    pub remote: RemoteConfig,

    /// Install destination settings
    pub install: InstallConfig,

    /// Interception hook settings
    pub hook: HookConfig,

    /// Per-component policy flags, keyed by component name
    pub components: HashMap<String, PolicyFlags>,
}

/// Local cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root directory
    pub root: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("prebake"),
        }
    }
}

/// Remote object store settings
///
/// Credentials are not modeled here; the external tool's own configuration
/// handles auth and transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// External object-store command to invoke
    pub tool: String,

    /// Bucket identifier (tool-specific addressing, e.g. alias/bucket)
    pub bucket: String,

    /// Optional key prefix under the bucket
    pub prefix: String,

    /// Timeout for each remote check or fetch, in seconds
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            tool: "mc".to_string(),
            bucket: "ci/prebuilt-artifacts".to_string(),
            prefix: String::new(),
            timeout_secs: 60,
        }
    }
}

/// Install destination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Prefix that cached artifacts are extracted into
    pub dir: PathBuf,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("install"),
        }
    }
}

/// Interception hook settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// Allow-pattern for cache-eligible component names (`*` wildcard)
    pub pattern: String,

    /// Root directory component source paths are resolved under
    pub source_root: PathBuf,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            pattern: "*".to_string(),
            source_root: PathBuf::from("."),
        }
    }
}
