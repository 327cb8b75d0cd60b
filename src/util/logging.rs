//! Structured logging setup for stackprobe
//!
//! Initialization and configuration for the `tracing` ecosystem: pretty
//! console output by default, optional JSON output, filtering via `RUST_LOG`
//! or `STACKPROBE_LOG_LEVEL`. All log output goes to stderr, because stdout
//! is reserved for detection results.
//!
//! Initialization is guarded by a `Once`, so repeated calls are ignored.

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Controls level, format, and metadata of log output
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Use JSON output format (for structured logging in CI)
    pub use_json: bool,
    /// Include the module target (e.g. stackprobe::detection) in logs
    pub include_target: bool,
    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Quiet configuration for CLI runs where only warnings matter
    pub fn quiet() -> Self {
        Self {
            level: Level::WARN,
            ..Default::default()
        }
    }
}

/// Parses a log level from a string, defaulting to INFO on bad input
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Initializes the tracing subscriber with the provided configuration.
/// Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::from_default_env()
            .add_directive(format!("stackprobe={}", config.level).parse().unwrap());

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location),
                )
                .init();
        }
    });
}

/// Initializes logging with the default configuration
pub fn init_default() {
    init_logging(LoggingConfig::default());
}

/// Initializes logging from environment variables:
/// `STACKPROBE_LOG_LEVEL` (trace/debug/info/warn/error) and
/// `STACKPROBE_LOG_JSON` (true/false), with `RUST_LOG` respected for
/// fine-grained filtering.
pub fn init_from_env() {
    let level_str = env::var("STACKPROBE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let level = parse_level(&level_str);

    let use_json = env::var("STACKPROBE_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    init_logging(LoggingConfig {
        level,
        use_json,
        ..Default::default()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("INFO"), Level::INFO);
        assert_eq!(parse_level("Warn"), Level::WARN);
        assert_eq!(parse_level("invalid"), Level::INFO);
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.use_json);
        assert!(config.include_target);
    }

    #[test]
    fn test_repeated_init_is_safe() {
        init_default();
        init_default();
        init_logging(LoggingConfig::quiet());
    }
}
