//! Prebake - Prebuilt Artifact Cache Resolver
//!
//! Skips recompilation of multi-component source trees when a pre-built
//! artifact matching the exact current source state exists in a remote
//! object store. Any miss or failure falls through to a normal
//! from-source build.

pub mod cli;
pub mod config;
pub mod error;
pub mod hook;
pub mod policy;
pub mod resolver;
pub mod store;
pub mod version;

pub use error::{PrebakeError, PrebakeResult};
