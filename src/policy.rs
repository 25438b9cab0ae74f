//! Per-component resolution policy
//!
//! Flags are read once at configuration time and are read-only afterward.

use crate::error::{PrebakeError, PrebakeResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-component resolution flags
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyFlags {
    /// Never consult the cache; always build from source
    pub force_from_source: bool,

    /// Escalate a fallback to a hard configuration failure
    pub require_prebuilt: bool,
}

impl PolicyFlags {
    /// Reject the meaningless force_from_source + require_prebuilt combination
    pub fn validate(&self, component: &str) -> PrebakeResult<()> {
        if self.force_from_source && self.require_prebuilt {
            return Err(PrebakeError::User(format!(
                "component '{}': require_prebuilt conflicts with force_from_source",
                component
            )));
        }
        Ok(())
    }
}

/// Policy lookup table keyed by lowercase component name
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    flags: HashMap<String, PolicyFlags>,
}

impl PolicyTable {
    /// Build a table from configured per-component flags, validating each entry
    pub fn from_entries<I>(entries: I) -> PrebakeResult<Self>
    where
        I: IntoIterator<Item = (String, PolicyFlags)>,
    {
        let mut flags = HashMap::new();
        for (name, policy) in entries {
            let name = name.to_lowercase();
            policy.validate(&name)?;
            flags.insert(name, policy);
        }
        Ok(Self { flags })
    }

    /// Flags for a component; unknown components get the defaults
    pub fn flags_for(&self, name: &str) -> PolicyFlags {
        self.flags
            .get(&name.to_lowercase())
            .copied()
            .unwrap_or_default()
    }
}
