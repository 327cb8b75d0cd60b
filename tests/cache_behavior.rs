//! Integration tests for the on-disk result cache
//!
//! Each test uses its own temporary cache directory, so tests are
//! independent of the user's real cache and of each other.

use stackprobe::cache::{project_key, CacheEntry};
use stackprobe::{DetectionService, StackprobeConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn cached_service(cache_dir: &Path) -> DetectionService {
    DetectionService::new(StackprobeConfig {
        cache_dir: cache_dir.to_path_buf(),
        cache_enabled: true,
        ..Default::default()
    })
}

fn entry_path(cache_dir: &Path, project: &Path) -> PathBuf {
    cache_dir.join(format!("{}.json", project_key(project)))
}

fn read_entry(cache_dir: &Path, project: &Path) -> CacheEntry {
    let content = fs::read_to_string(entry_path(cache_dir, project)).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn nextjs_manifest() -> &'static str {
    r#"{"dependencies": {"next": "14.2.0", "react": "18.2.0"}}"#
}

#[test]
fn test_unchanged_project_hits_cache_with_incremented_count() {
    let project = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    write(project.path(), "package.json", nextjs_manifest());
    write(project.path(), "next.config.js", "module.exports = {};\n");

    let svc = cached_service(cache_dir.path());
    let first = svc.detect(project.path()).unwrap().result;
    assert_eq!(read_entry(cache_dir.path(), project.path()).hit_count, 0);

    let second = svc.detect(project.path()).unwrap().result;
    assert_eq!(first, second);
    assert_eq!(read_entry(cache_dir.path(), project.path()).hit_count, 1);
}

#[test]
fn test_cache_hit_skips_manifest_parsing() {
    let project = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let manifest = project.path().join("package.json");
    write(project.path(), "package.json", nextjs_manifest());
    write(project.path(), "next.config.js", "module.exports = {};\n");

    let svc = cached_service(cache_dir.path());
    let first = svc.detect(project.path()).unwrap().result;
    assert_eq!(first.framework, "nextjs");

    // Corrupt the manifest without changing its size or mtime. The
    // fingerprint is unchanged, so the second run must come from the cache
    // and never read the now-broken file.
    let original_mtime =
        filetime::FileTime::from_last_modification_time(&fs::metadata(&manifest).unwrap());
    let garbage = "x".repeat(nextjs_manifest().len());
    fs::write(&manifest, garbage).unwrap();
    filetime::set_file_mtime(&manifest, original_mtime).unwrap();

    let second = svc.detect(project.path()).unwrap().result;
    assert_eq!(second.framework, "nextjs");
    assert!(second.diagnostics.is_empty());
}

#[test]
fn test_manifest_mtime_bump_invalidates_cache() {
    let project = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let manifest = project.path().join("package.json");
    write(project.path(), "package.json", nextjs_manifest());

    let svc = cached_service(cache_dir.path());
    let first = svc.detect(project.path()).unwrap().result;

    // Same content, newer mtime: the fingerprint must move
    let meta = fs::metadata(&manifest).unwrap();
    let bumped = filetime::FileTime::from_unix_time(
        filetime::FileTime::from_last_modification_time(&meta).unix_seconds() + 60,
        0,
    );
    filetime::set_file_mtime(&manifest, bumped).unwrap();

    let second = svc.detect(project.path()).unwrap().result;
    assert_ne!(first.fingerprint, second.fingerprint);
    assert_eq!(read_entry(cache_dir.path(), project.path()).hit_count, 0);
}

#[test]
fn test_dependency_change_forces_recomputation() {
    let project = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    write(project.path(), "package.json", nextjs_manifest());

    let svc = cached_service(cache_dir.path());
    let first = svc.detect(project.path()).unwrap().result;
    assert_eq!(first.framework, "nextjs");

    write(
        project.path(),
        "package.json",
        r#"{"dependencies": {"vue": "^3.4.21", "vite": "^5.2.0"}}"#,
    );
    let second = svc.detect(project.path()).unwrap().result;
    assert_eq!(second.framework, "vue");
}

#[test]
fn test_corrupt_cache_store_never_blocks_detection() {
    let project = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    write(project.path(), "package.json", nextjs_manifest());

    fs::write(
        entry_path(cache_dir.path(), project.path()),
        "{broken json",
    )
    .unwrap();

    let svc = cached_service(cache_dir.path());
    let result = svc.detect(project.path()).unwrap().result;
    assert_eq!(result.framework, "nextjs");

    // The store was rebuilt and serves hits again
    let second = svc.detect(project.path()).unwrap().result;
    assert_eq!(result, second);
    assert_eq!(read_entry(cache_dir.path(), project.path()).hit_count, 1);
}

#[test]
fn test_no_cache_service_writes_nothing() {
    let project = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    write(project.path(), "package.json", nextjs_manifest());

    let svc = DetectionService::new(StackprobeConfig {
        cache_dir: cache_dir.path().to_path_buf(),
        cache_enabled: false,
        ..Default::default()
    });
    svc.detect(project.path()).unwrap();
    assert!(!entry_path(cache_dir.path(), project.path()).exists());
}
