//! Manifest-set fingerprinting
//!
//! The fingerprint hashes, in a stable order, the (path, size, mtime)
//! triples of every manifest file actually consulted in a scan, not the
//! whole tree. This bounds fingerprint cost and keeps cache entries stable
//! under unrelated edits. The crate version is mixed in so engine upgrades
//! invalidate old entries.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::trace;

/// Compute the fingerprint for a project root and its consulted manifests.
///
/// `manifests` may be in any order; they are sorted by their path relative
/// to `root` before hashing. Manifests that disappear between scan and
/// fingerprinting contribute a tombstone marker instead of failing.
pub fn fingerprint(root: &Path, manifests: &[PathBuf]) -> String {
    let mut sorted: Vec<&PathBuf> = manifests.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    hasher.update(crate::VERSION.as_bytes());

    for manifest in sorted {
        let rel = manifest.strip_prefix(root).unwrap_or(manifest);
        hasher.update(rel.to_string_lossy().as_bytes());
        match manifest.metadata() {
            Ok(meta) => {
                hasher.update(meta.len().to_le_bytes());
                let mtime = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                hasher.update(mtime.to_le_bytes());
            }
            Err(_) => hasher.update(b"gone"),
        }
    }

    let digest = hex::encode(hasher.finalize());
    trace!(manifests = manifests.len(), fingerprint = %digest, "Fingerprint computed");
    digest
}

/// Stable cache key for a project path, independent of manifest contents
pub fn project_key(root: &Path) -> String {
    let canonical = root
        .canonicalize()
        .unwrap_or_else(|_| root.to_path_buf());
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string_lossy().as_bytes());
    hex::encode(&hasher.finalize()[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_fingerprint_is_order_independent() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("package.json");
        let b = tmp.path().join("Cargo.toml");
        fs::write(&a, "{}").unwrap();
        fs::write(&b, "[package]").unwrap();

        let forward = fingerprint(tmp.path(), &[a.clone(), b.clone()]);
        let reverse = fingerprint(tmp.path(), &[b, a]);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_fingerprint_changes_on_content_growth() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join("package.json");
        fs::write(&manifest, "{}").unwrap();
        let before = fingerprint(tmp.path(), &[manifest.clone()]);

        fs::write(&manifest, r#"{"dependencies": {"next": "14.0.0"}}"#).unwrap();
        let after = fingerprint(tmp.path(), &[manifest]);
        assert_ne!(before, after);
    }

    #[test]
    fn test_fingerprint_ignores_unrelated_files() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join("package.json");
        fs::write(&manifest, "{}").unwrap();
        let before = fingerprint(tmp.path(), &[manifest.clone()]);

        fs::write(tmp.path().join("README.md"), "# hello").unwrap();
        let after = fingerprint(tmp.path(), &[manifest]);
        assert_eq!(before, after);
    }

    #[test]
    fn test_empty_manifest_set_is_deterministic() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(
            fingerprint(tmp.path(), &[]),
            fingerprint(tmp.path(), &[])
        );
    }

    #[test]
    fn test_project_key_stable() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(project_key(tmp.path()), project_key(tmp.path()));
    }
}
