//! Monorepo workspace detection
//!
//! Inspects the project root for workspace-manager markers before
//! per-project detection runs. When markers are found, the declared package
//! globs are expanded and the full detection pipeline is invoked per
//! sub-package directory independently: sub-packages never share signals
//! with the root or each other, so a backend's FastAPI dependency cannot
//! bleed into a frontend package's score. Without markers the detector is a
//! pass-through.
//!
//! Supported managers: pnpm workspaces, npm/yarn workspaces, Lerna, Nx,
//! Cargo workspaces, and Go workspaces (`go.work`).

use crate::detection::types::DetectionResult;
use crate::scanner::DENYLIST;
use crate::signals;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Workspace manager whose configuration declared the packages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkspaceManager {
    PnpmWorkspaces,
    NpmWorkspaces,
    Lerna,
    Nx,
    CargoWorkspace,
    GoWork,
}

impl WorkspaceManager {
    pub fn name(&self) -> &'static str {
        match self {
            WorkspaceManager::PnpmWorkspaces => "pnpm-workspaces",
            WorkspaceManager::NpmWorkspaces => "npm-workspaces",
            WorkspaceManager::Lerna => "lerna",
            WorkspaceManager::Nx => "nx",
            WorkspaceManager::CargoWorkspace => "cargo-workspace",
            WorkspaceManager::GoWork => "go-work",
        }
    }
}

/// Workspace markers found at a project root
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceSpec {
    pub manager: WorkspaceManager,
    /// Declared sub-package glob patterns, relative to the root
    pub patterns: Vec<String>,
}

/// One detected sub-package with its isolated detection result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspacePackage {
    pub name: String,
    /// Path relative to the workspace root
    pub path: PathBuf,
    pub result: DetectionResult,
}

/// Monorepo structure: one per scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceMap {
    pub root: PathBuf,
    pub manager: WorkspaceManager,
    pub packages: Vec<WorkspacePackage>,
}

/// Check the root for workspace-manager markers, in a fixed precedence
/// order. Malformed workspace configuration is non-fatal: the project is
/// treated as a single package.
pub fn detect_markers(root: &Path) -> Option<WorkspaceSpec> {
    if let Some(spec) = pnpm_workspace(root) {
        return Some(spec);
    }
    if let Some(spec) = npm_workspaces(root) {
        return Some(spec);
    }
    if let Some(spec) = lerna(root) {
        return Some(spec);
    }
    if let Some(spec) = nx(root) {
        return Some(spec);
    }
    if let Some(spec) = cargo_workspace(root) {
        return Some(spec);
    }
    go_work(root)
}

fn pnpm_workspace(root: &Path) -> Option<WorkspaceSpec> {
    let content = fs::read_to_string(root.join("pnpm-workspace.yaml")).ok()?;
    let value: serde_yaml::Value = match serde_yaml::from_str(&content) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "Failed to parse pnpm-workspace.yaml, ignoring workspace markers");
            return None;
        }
    };

    let patterns: Vec<String> = value
        .get("packages")?
        .as_sequence()?
        .iter()
        .filter_map(|p| p.as_str().map(String::from))
        .collect();

    Some(WorkspaceSpec {
        manager: WorkspaceManager::PnpmWorkspaces,
        patterns,
    })
}

fn npm_workspaces(root: &Path) -> Option<WorkspaceSpec> {
    let content = fs::read_to_string(root.join("package.json")).ok()?;
    let value: serde_json::Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "Failed to parse package.json, ignoring workspace markers");
            return None;
        }
    };

    // "workspaces" is an array, or an object with a "packages" key
    let workspaces = value.get("workspaces")?;
    let patterns: Vec<String> = if let Some(list) = workspaces.as_array() {
        list.iter()
            .filter_map(|p| p.as_str().map(String::from))
            .collect()
    } else {
        workspaces
            .get("packages")?
            .as_array()?
            .iter()
            .filter_map(|p| p.as_str().map(String::from))
            .collect()
    };

    Some(WorkspaceSpec {
        manager: WorkspaceManager::NpmWorkspaces,
        patterns,
    })
}

fn lerna(root: &Path) -> Option<WorkspaceSpec> {
    let content = fs::read_to_string(root.join("lerna.json")).ok()?;
    let value: serde_json::Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "Failed to parse lerna.json, ignoring workspace markers");
            return None;
        }
    };

    let patterns = value
        .get("packages")
        .and_then(|p| p.as_array())
        .map(|list| {
            list.iter()
                .filter_map(|p| p.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_else(|| vec!["packages/*".to_string()]);

    Some(WorkspaceSpec {
        manager: WorkspaceManager::Lerna,
        patterns,
    })
}

/// Nx gates on `nx.json`. Project roots come from two places: the
/// `projects` map in `workspace.json` (Nx < 13, values are a path string or
/// an object with a `root` key) and directories carrying a `project.json`
/// (Nx >= 13).
fn nx(root: &Path) -> Option<WorkspaceSpec> {
    if !root.join("nx.json").is_file() {
        return None;
    }

    let mut patterns: Vec<String> = Vec::new();

    if let Ok(content) = fs::read_to_string(root.join("workspace.json")) {
        match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(value) => {
                if let Some(projects) = value.get("projects").and_then(|p| p.as_object()) {
                    for (name, config) in projects {
                        let rel = config
                            .as_str()
                            .map(String::from)
                            .or_else(|| {
                                config
                                    .get("root")
                                    .and_then(|r| r.as_str())
                                    .map(String::from)
                            })
                            .unwrap_or_else(|| name.clone());
                        patterns.push(rel.trim_start_matches("./").to_string());
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "Failed to parse workspace.json, ignoring its projects")
            }
        }
    }

    for dir in project_json_dirs(root) {
        let rel = dir.strip_prefix(root).unwrap_or(&dir);
        patterns.push(rel.to_string_lossy().into_owned());
    }

    patterns.sort();
    patterns.dedup();
    Some(WorkspaceSpec {
        manager: WorkspaceManager::Nx,
        patterns,
    })
}

/// Sub-directories holding a `project.json`, bounded like glob expansion
fn project_json_dirs(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut stack = vec![(root.to_path_buf(), 0usize)];

    while let Some((dir, depth)) = stack.pop() {
        if depth > 3 {
            continue;
        }
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() || path.is_symlink() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if DENYLIST.contains(&name.as_ref()) {
                continue;
            }
            if path.join("project.json").is_file() {
                found.push(path.clone());
            }
            stack.push((path, depth + 1));
        }
    }

    found.sort();
    found
}

fn cargo_workspace(root: &Path) -> Option<WorkspaceSpec> {
    let content = fs::read_to_string(root.join("Cargo.toml")).ok()?;
    let value: toml::Value = match content.parse() {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "Failed to parse Cargo.toml, ignoring workspace markers");
            return None;
        }
    };

    let members = value
        .get("workspace")?
        .get("members")
        .and_then(|m| m.as_array())?;
    let patterns: Vec<String> = members
        .iter()
        .filter_map(|m| m.as_str().map(String::from))
        .collect();

    Some(WorkspaceSpec {
        manager: WorkspaceManager::CargoWorkspace,
        patterns,
    })
}

fn go_work(root: &Path) -> Option<WorkspaceSpec> {
    let content = fs::read_to_string(root.join("go.work")).ok()?;
    let mut patterns = Vec::new();
    let mut in_use_block = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("use (") {
            in_use_block = true;
        } else if in_use_block && trimmed == ")" {
            in_use_block = false;
        } else if in_use_block || trimmed.starts_with("use ") {
            let spec = trimmed.strip_prefix("use ").unwrap_or(trimmed).trim();
            if !spec.is_empty() && spec != "(" {
                patterns.push(spec.trim_start_matches("./").to_string());
            }
        }
    }

    if patterns.is_empty() {
        return None;
    }
    Some(WorkspaceSpec {
        manager: WorkspaceManager::GoWork,
        patterns,
    })
}

/// Expand declared glob patterns into sub-package directories.
///
/// A directory qualifies when its relative path matches a pattern and it
/// contains at least one known manifest. Output is sorted for determinism.
pub fn expand_packages(root: &Path, patterns: &[String]) -> Vec<PathBuf> {
    let Some(globs) = build_globset(patterns) else {
        return Vec::new();
    };

    let mut packages = Vec::new();
    let mut stack = vec![(root.to_path_buf(), 0usize)];

    while let Some((dir, depth)) = stack.pop() {
        if depth > 3 {
            continue;
        }
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() || path.is_symlink() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if DENYLIST.contains(&name.as_ref()) {
                continue;
            }

            let rel = path.strip_prefix(root).unwrap_or(&path);
            if globs.is_match(rel) && contains_manifest(&path) {
                packages.push(path.clone());
            }
            stack.push((path, depth + 1));
        }
    }

    packages.sort();
    debug!(packages = packages.len(), "Workspace glob expansion complete");
    packages
}

fn build_globset(patterns: &[String]) -> Option<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let mut any = false;
    for pattern in patterns {
        let cleaned = pattern.trim_end_matches('/');
        match Glob::new(cleaned) {
            Ok(glob) => {
                builder.add(glob);
                any = true;
            }
            Err(err) => warn!(pattern = %pattern, error = %err, "Skipping invalid workspace glob"),
        }
    }
    if !any {
        return None;
    }
    builder.build().ok()
}

/// Nx projects may carry only a `project.json`, so it qualifies alongside
/// the parseable manifests
fn contains_manifest(dir: &Path) -> bool {
    signals::MANIFEST_FILES
        .iter()
        .any(|m| dir.join(m).is_file())
        || dir.join("project.json").is_file()
}

/// Human-readable package name: the manifest's declared name when one
/// exists, otherwise the directory name
pub fn package_name(dir: &Path) -> String {
    if let Ok(content) = fs::read_to_string(dir.join("package.json")) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&content) {
            if let Some(name) = value.get("name").and_then(|n| n.as_str()) {
                return name.to_string();
            }
        }
    }
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}
