//! CLI command implementations

pub mod cache;
pub mod config;
pub mod resolve;
pub mod status;

pub use cache::execute as cache;
pub use config::execute as config;
pub use resolve::execute as resolve;
pub use status::execute as status;
