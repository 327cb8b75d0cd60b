//! Engine configuration
//!
//! Loaded from environment variables with documented defaults, validated up
//! front so a bad value fails at startup instead of mid-scan.

use crate::cache::{DEFAULT_LOCK_TIMEOUT, DEFAULT_TTL};
use crate::scanner::{DEFAULT_MAX_FILES, DEFAULT_SCAN_TIMEOUT};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {var}: {detail}")]
    InvalidValue {
        var: &'static str,
        value: String,
        detail: String,
    },
    #[error("No cache directory available; set STACKPROBE_CACHE_DIR")]
    NoCacheDir,
}

/// Runtime configuration with environment overrides
#[derive(Debug, Clone)]
pub struct StackprobeConfig {
    /// Directory holding the on-disk result cache
    pub cache_dir: PathBuf,
    pub cache_ttl: Duration,
    pub cache_enabled: bool,
    pub cache_lock_timeout: Duration,
    /// Scan budgets
    pub max_files: usize,
    pub scan_timeout: Duration,
}

impl StackprobeConfig {
    /// Environment variables consulted by [`Self::from_env`]
    pub const ENV_CACHE_DIR: &'static str = "STACKPROBE_CACHE_DIR";
    pub const ENV_CACHE_TTL: &'static str = "STACKPROBE_CACHE_TTL_SECS";
    pub const ENV_CACHE_ENABLED: &'static str = "STACKPROBE_CACHE_ENABLED";
    pub const ENV_MAX_FILES: &'static str = "STACKPROBE_MAX_FILES";
    pub const ENV_SCAN_TIMEOUT: &'static str = "STACKPROBE_SCAN_TIMEOUT_SECS";

    /// Build the configuration from the environment, falling back to the
    /// documented defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cache_dir = match env::var_os(Self::ENV_CACHE_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::cache_dir()
                .map(|d| d.join("stackprobe"))
                .ok_or(ConfigError::NoCacheDir)?,
        };

        let cache_ttl = match parse_env_u64(Self::ENV_CACHE_TTL)? {
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TTL,
        };

        let cache_enabled = match env::var(Self::ENV_CACHE_ENABLED) {
            Ok(raw) => parse_bool(Self::ENV_CACHE_ENABLED, &raw)?,
            Err(_) => true,
        };

        let max_files = match parse_env_u64(Self::ENV_MAX_FILES)? {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    var: Self::ENV_MAX_FILES,
                    value: "0".to_string(),
                    detail: "must be at least 1".to_string(),
                })
            }
            Some(n) => n as usize,
            None => DEFAULT_MAX_FILES,
        };

        let scan_timeout = match parse_env_u64(Self::ENV_SCAN_TIMEOUT)? {
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_SCAN_TIMEOUT,
        };

        let config = Self {
            cache_dir,
            cache_ttl,
            cache_enabled,
            cache_lock_timeout: DEFAULT_LOCK_TIMEOUT,
            max_files,
            scan_timeout,
        };
        debug!(?config, "Configuration loaded");
        Ok(config)
    }
}

impl Default for StackprobeConfig {
    fn default() -> Self {
        Self {
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(env::temp_dir)
                .join("stackprobe"),
            cache_ttl: DEFAULT_TTL,
            cache_enabled: true,
            cache_lock_timeout: DEFAULT_LOCK_TIMEOUT,
            max_files: DEFAULT_MAX_FILES,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
        }
    }
}

fn parse_env_u64(var: &'static str) -> Result<Option<u64>, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                var,
                value: raw,
                detail: "expected a non-negative integer".to_string(),
            }),
        Err(_) => Ok(None),
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: raw.to_string(),
            detail: "expected a boolean (true/false/1/0)".to_string(),
        }),
    }
}
