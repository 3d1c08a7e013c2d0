//! CLI command implementations

pub mod serve;
pub mod stats;

pub use serve::ServeArgs;
pub use stats::StatsArgs;
