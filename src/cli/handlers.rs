//! Command handlers for the CLI
//!
//! Each handler returns a process exit code: 0 on success, 1 on any error.
//! Errors are rendered to stderr; formatted results go to stdout.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

use crate::cache::FileCache;
use crate::cli::commands::{CacheAction, DetectArgs, PhaseArgs};
use crate::cli::output::{OutputFormat, OutputFormatter};
use crate::config::StackprobeConfig;
use crate::detection::service::DetectionService;

pub fn handle_detect(args: &DetectArgs) -> i32 {
    run(|| {
        let mut config = StackprobeConfig::from_env().context("Invalid configuration")?;
        if args.no_cache {
            config.cache_enabled = false;
        }

        let path = resolve_path(args.path.clone())?;
        debug!(path = %path.display(), "Running stack detection");

        let service = DetectionService::new(config);
        let outcome = service
            .detect(&path)
            .with_context(|| format!("Detection failed for {}", path.display()))?;

        let formatter = OutputFormatter::new(OutputFormat::from(args.format));
        println!("{}", formatter.format_detection(&outcome)?);
        Ok(())
    })
}

pub fn handle_phase(args: &PhaseArgs) -> i32 {
    run(|| {
        let config = StackprobeConfig::from_env().context("Invalid configuration")?;
        let path = resolve_path(args.path.clone())?;
        debug!(path = %path.display(), "Running phase detection");

        let service = DetectionService::new(config);
        let result = service
            .phase(&path)
            .with_context(|| format!("Phase detection failed for {}", path.display()))?;

        let formatter = OutputFormatter::new(OutputFormat::from(args.format));
        println!("{}", formatter.format_phase(&result)?);
        Ok(())
    })
}

pub fn handle_cache(action: &CacheAction) -> i32 {
    run(|| {
        let config = StackprobeConfig::from_env().context("Invalid configuration")?;
        let cache = FileCache::new(
            config.cache_dir.clone(),
            config.cache_ttl,
            config.cache_lock_timeout,
        )
        .with_context(|| format!("Cannot open cache store at {}", config.cache_dir.display()))?;

        match action {
            CacheAction::Stats => {
                let stats = cache.stats().context("Failed to read cache store")?;
                let formatter = OutputFormatter::new(OutputFormat::Human);
                println!("{}", formatter.format_cache_stats(&stats)?);
            }
            CacheAction::Clear => {
                let removed = cache.clear().context("Failed to clear cache store")?;
                println!("Removed {removed} cache entries");
            }
        }
        Ok(())
    })
}

fn resolve_path(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => std::env::current_dir().context("Cannot determine current directory"),
    }
}

fn run(f: impl FnOnce() -> Result<()>) -> i32 {
    match f() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {err:#}");
            1
        }
    }
}
