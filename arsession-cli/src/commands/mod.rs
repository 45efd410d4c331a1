//! CLI subcommands.

pub mod place;
pub mod probe;
pub mod scan;

/// Boxed error type shared by the subcommands.
pub type CommandError = Box<dyn std::error::Error + Send + Sync>;
