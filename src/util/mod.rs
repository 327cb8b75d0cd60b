//! Utility modules for stackprobe
//!
//! Currently holds the structured logging setup; logging always writes to
//! stderr so machine-readable detection output on stdout stays clean.

pub mod logging;

pub use logging::{init_default, init_from_env, init_logging, LoggingConfig};
