pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CacheAction, CliArgs, Commands, DetectArgs, PhaseArgs};
pub use output::{OutputFormat, OutputFormatter};
