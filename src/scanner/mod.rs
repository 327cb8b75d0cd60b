//! Bounded, deterministic file tree scanning
//!
//! The scanner walks a project tree with the `ignore` crate so the project's
//! own `.gitignore` rules apply, layered with a built-in denylist of
//! directories that never carry detection signals (`node_modules/`,
//! `target/`, virtualenvs, ...). Symlinks are never followed.
//!
//! The walk is bounded by a file-count budget and a wall-clock budget.
//! Exceeding either terminates the scan early and marks the outcome as
//! partial instead of failing; downstream results carry the flag so callers
//! never see a silently truncated detection.
//!
//! The walk visits entries in name order and the output is sorted by path,
//! so a given tree always produces the same sequence, and a budget always
//! truncates to the same subset.

use ignore::WalkBuilder;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Default maximum number of files visited before the scan is cut short
pub const DEFAULT_MAX_FILES: usize = 5_000;

/// Default wall-clock budget for a single scan
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);

/// Directories that never contain detection signals
pub(crate) const DENYLIST: &[&str] = &[
    "node_modules",
    ".git",
    ".hg",
    ".svn",
    "target",
    "dist",
    "build",
    "out",
    "vendor",
    "venv",
    ".venv",
    "__pycache__",
    ".pytest_cache",
    ".idea",
    ".vscode",
    "coverage",
    ".next",
    ".nx",
    ".turbo",
];

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Path does not exist: {0}")]
    PathNotFound(PathBuf),
    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Failed to walk {path}: {source}")]
    WalkFailed { path: PathBuf, source: io::Error },
}

/// Budgets for a single scan
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub max_files: usize,
    pub timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            timeout: DEFAULT_SCAN_TIMEOUT,
        }
    }
}

/// Result of walking a project tree
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Absolute file paths, sorted
    pub files: Vec<PathBuf>,
    /// True when a budget terminated the walk before completion
    pub partial: bool,
    pub elapsed_ms: u64,
}

impl ScanOutcome {
    /// Files whose name matches `filename`, preserving scan order
    pub fn find_by_name(&self, filename: &str) -> Vec<&PathBuf> {
        self.files
            .iter()
            .filter(|p| p.file_name().and_then(|n| n.to_str()) == Some(filename))
            .collect()
    }
}

/// Walk `root` and collect candidate file paths within the configured budgets.
pub fn scan(root: &Path, config: &ScanConfig) -> Result<ScanOutcome, ScanError> {
    if !root.exists() {
        return Err(ScanError::PathNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let start = Instant::now();
    let mut files = Vec::new();
    let mut partial = false;

    let walker = WalkBuilder::new(root)
        .follow_links(false)
        .hidden(false)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(false)
        .require_git(false)
        .sort_by_file_name(Ord::cmp)
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !DENYLIST.contains(&name.as_ref())
        })
        .build();

    for entry in walker {
        if start.elapsed() > config.timeout {
            warn!(
                timeout_ms = config.timeout.as_millis() as u64,
                "Wall-clock budget exceeded, marking scan partial"
            );
            partial = true;
            break;
        }

        match entry {
            Ok(entry) => {
                if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                    if files.len() == config.max_files {
                        warn!(
                            max_files = config.max_files,
                            "File-count budget exceeded, marking scan partial"
                        );
                        partial = true;
                        break;
                    }
                    files.push(entry.into_path());
                }
            }
            Err(err) => {
                // Unreadable entries are skipped, not fatal
                debug!(error = %err, "Skipping unreadable entry");
            }
        }
    }

    files.sort();
    let elapsed_ms = start.elapsed().as_millis() as u64;
    debug!(
        files = files.len(),
        partial, elapsed_ms, "Scan complete for {}", root.display()
    );

    Ok(ScanOutcome {
        files,
        partial,
        elapsed_ms,
    })
}
