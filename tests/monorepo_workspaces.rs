//! Integration tests for workspace detection and sub-package isolation

use stackprobe::{DetectionService, StackprobeConfig, WorkspaceManager};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn service() -> DetectionService {
    DetectionService::uncached(StackprobeConfig::default())
}

/// Two-package pnpm workspace: a FastAPI backend and a Next.js frontend
fn create_pnpm_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "pnpm-workspace.yaml",
        "packages:\n  - 'apps/*'\n",
    );
    write(
        tmp.path(),
        "apps/web/package.json",
        r#"{"name": "web", "dependencies": {"next": "14.2.0", "react": "18.2.0"}}"#,
    );
    write(tmp.path(), "apps/web/next.config.js", "module.exports = {};\n");
    write(
        tmp.path(),
        "apps/api/requirements.txt",
        "fastapi==0.110.0\nuvicorn==0.29.0\npydantic==2.6.4\n",
    );
    tmp
}

#[test]
fn test_pnpm_workspace_packages_detected_independently() {
    let tmp = create_pnpm_workspace();
    let outcome = service().detect(tmp.path()).unwrap();

    let workspace = outcome.workspace.expect("workspace markers not detected");
    assert_eq!(workspace.manager, WorkspaceManager::PnpmWorkspaces);
    assert_eq!(workspace.packages.len(), 2);

    let api = workspace.packages.iter().find(|p| p.name == "api").unwrap();
    let web = workspace.packages.iter().find(|p| p.name == "web").unwrap();
    assert_eq!(api.result.framework, "fastapi");
    assert_eq!(web.result.framework, "nextjs");
}

#[test]
fn test_workspace_signals_do_not_cross_contaminate() {
    let tmp = create_pnpm_workspace();
    let outcome = service().detect(tmp.path()).unwrap();
    let workspace = outcome.workspace.unwrap();

    let api = workspace.packages.iter().find(|p| p.name == "api").unwrap();
    let web = workspace.packages.iter().find(|p| p.name == "web").unwrap();

    assert!(api.result.evidence.iter().all(|e| !e.contains("next")));
    assert!(web.result.evidence.iter().all(|e| !e.contains("fastapi")));
    // Tool maps are scoped per package too
    assert!(api.result.tools.values().flatten().all(|t| t != "jest"));
}

#[test]
fn test_aggregate_is_best_confidence_package() {
    let tmp = create_pnpm_workspace();
    let outcome = service().detect(tmp.path()).unwrap();

    let workspace = outcome.workspace.as_ref().unwrap();
    let best = workspace
        .packages
        .iter()
        .map(|p| p.result.confidence)
        .fold(0.0f64, f64::max);
    assert_eq!(outcome.result.confidence, best);
}

#[test]
fn test_npm_workspaces_object_form_detected() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "package.json",
        r#"{"name": "root", "workspaces": {"packages": ["packages/*"]}}"#,
    );
    write(
        tmp.path(),
        "packages/ui/package.json",
        r#"{"name": "@acme/ui", "dependencies": {"vue": "^3.4.0", "vite": "^5.0.0"}}"#,
    );

    let outcome = service().detect(tmp.path()).unwrap();
    let workspace = outcome.workspace.unwrap();
    assert_eq!(workspace.manager, WorkspaceManager::NpmWorkspaces);
    assert_eq!(workspace.packages.len(), 1);
    assert_eq!(workspace.packages[0].name, "@acme/ui");
    assert_eq!(workspace.packages[0].result.framework, "vue");
}

#[test]
fn test_cargo_workspace_members_detected() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "Cargo.toml",
        "[workspace]\nmembers = [\"crates/*\"]\n",
    );
    write(
        tmp.path(),
        "crates/server/Cargo.toml",
        "[package]\nname = \"server\"\nversion = \"0.1.0\"\n\n[dependencies]\naxum = \"0.7\"\n",
    );

    let outcome = service().detect(tmp.path()).unwrap();
    let workspace = outcome.workspace.unwrap();
    assert_eq!(workspace.manager, WorkspaceManager::CargoWorkspace);
    assert_eq!(workspace.packages[0].result.framework, "axum");
}

#[test]
fn test_workspace_with_no_matching_packages_yields_unknown_aggregate() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "pnpm-workspace.yaml",
        "packages:\n  - 'apps/*'\n",
    );

    let outcome = service().detect(tmp.path()).unwrap();
    let workspace = outcome.workspace.unwrap();
    assert!(workspace.packages.is_empty());
    assert_eq!(outcome.result.framework, "unknown");
    assert_eq!(outcome.result.confidence, 0.0);
}

#[test]
fn test_single_package_project_has_no_workspace() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "package.json",
        r#"{"name": "solo", "dependencies": {"express": "4.19.0"}}"#,
    );

    let outcome = service().detect(tmp.path()).unwrap();
    assert!(outcome.workspace.is_none());
    assert_eq!(outcome.result.framework, "express");
}
