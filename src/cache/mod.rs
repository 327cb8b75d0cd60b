//! Fingerprint-keyed detection result cache
//!
//! The cache is an injected, explicit object behind the [`DetectionCache`]
//! trait so the pipeline can run against an in-memory fake in tests. The
//! production store keeps one JSON record per project-path key under the
//! user cache directory, serialized across processes with an `fs2` advisory
//! file lock held for the minimal read-modify-write cycle.
//!
//! The cache is always advisory: a corrupted or unreadable store is treated
//! as a full miss and rebuilt, and lock-acquisition timeouts surface as
//! errors the caller downgrades to uncached recomputation.

mod fingerprint;

pub use fingerprint::{fingerprint, project_key};

use crate::detection::types::DetectionResult;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Default entry time-to-live: 24 hours. A deliberate safety net against
/// fingerprint blind spots (content changes that alter neither size nor
/// mtime on unusual filesystems).
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default advisory-lock acquisition timeout
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to acquire cache lock within {0:?}")]
    LockTimeout(Duration),
    #[error("Cache store I/O failure at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// Cached result plus bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub result: DetectionResult,
    pub created_at: DateTime<Utc>,
    pub ttl_secs: u64,
    pub hit_count: u64,
}

impl CacheEntry {
    pub fn new(fingerprint: String, result: DetectionResult, ttl: Duration) -> Self {
        Self {
            fingerprint,
            result,
            created_at: Utc::now(),
            ttl_secs: ttl.as_secs(),
            hit_count: 0,
        }
    }

    /// Entries older than their TTL are stale even on fingerprint match
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > ChronoDuration::seconds(self.ttl_secs as i64)
    }
}

/// Outcome of a cache probe
#[derive(Debug, Clone)]
pub enum CacheLookup {
    Hit(CacheEntry),
    Miss,
}

/// Injected cache interface; `get` compares the fingerprint and evicts on
/// mismatch, so stale entries never survive a probe
pub trait DetectionCache: Send + Sync {
    fn get(&self, key: &str, fingerprint: &str) -> Result<CacheLookup, CacheError>;
    fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError>;
    fn invalidate(&self, key: &str) -> Result<(), CacheError>;
}

/// Aggregate store statistics for the CLI
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_hits: u64,
}

/// On-disk JSON store, one record per project-path key
pub struct FileCache {
    dir: PathBuf,
    ttl: Duration,
    lock_timeout: Duration,
}

impl FileCache {
    pub fn new(dir: PathBuf, ttl: Duration, lock_timeout: Duration) -> Result<Self, CacheError> {
        fs::create_dir_all(&dir).map_err(|source| CacheError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            ttl,
            lock_timeout,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Acquire the store-wide advisory lock, retrying until the timeout.
    /// The returned guard unlocks on drop.
    fn lock(&self) -> Result<LockGuard, CacheError> {
        let lock_path = self.dir.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|source| CacheError::Io {
                path: lock_path.clone(),
                source,
            })?;

        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(LockGuard { file }),
                Err(_) if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(25));
                }
                Err(_) => return Err(CacheError::LockTimeout(self.lock_timeout)),
            }
        }
    }

    fn read_entry(&self, path: &Path) -> Option<CacheEntry> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Corrupt cache entry, discarding");
                let _ = fs::remove_file(path);
                None
            }
        }
    }

    fn write_entry(&self, path: &Path, entry: &CacheEntry) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(entry).expect("cache entry serializes");
        fs::write(path, json).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Store-wide statistics (entry count, accumulated hits)
    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        let _guard = self.lock()?;
        let mut stats = CacheStats::default();
        let entries = fs::read_dir(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(record) = self.read_entry(&path) {
                    stats.entries += 1;
                    stats.total_hits += record.hit_count;
                }
            }
        }
        Ok(stats)
    }

    /// Remove every record from the store
    pub fn clear(&self) -> Result<usize, CacheError> {
        let _guard = self.lock()?;
        let mut removed = 0;
        let entries = fs::read_dir(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                fs::remove_file(&path).map_err(|source| CacheError::Io {
                    path: path.clone(),
                    source,
                })?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl DetectionCache for FileCache {
    fn get(&self, key: &str, fingerprint: &str) -> Result<CacheLookup, CacheError> {
        let _guard = self.lock()?;
        let path = self.entry_path(key);
        let Some(mut entry) = self.read_entry(&path) else {
            return Ok(CacheLookup::Miss);
        };

        if entry.is_stale(Utc::now()) {
            debug!(key, "Cache entry expired, evicting");
            let _ = fs::remove_file(&path);
            return Ok(CacheLookup::Miss);
        }
        if entry.fingerprint != fingerprint {
            debug!(key, "Fingerprint mismatch, evicting");
            let _ = fs::remove_file(&path);
            return Ok(CacheLookup::Miss);
        }

        entry.hit_count += 1;
        self.write_entry(&path, &entry)?;
        debug!(key, hits = entry.hit_count, "Cache hit");
        Ok(CacheLookup::Hit(entry))
    }

    fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError> {
        let _guard = self.lock()?;
        self.write_entry(&self.entry_path(key), &entry)
    }

    fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let _guard = self.lock()?;
        let path = self.entry_path(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|source| CacheError::Io { path, source })?;
        }
        Ok(())
    }
}

struct LockGuard {
    file: File,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

/// In-memory cache for tests; same eviction semantics as [`FileCache`]
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DetectionCache for MemoryCache {
    fn get(&self, key: &str, fingerprint: &str) -> Result<CacheLookup, CacheError> {
        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries.get_mut(key) else {
            return Ok(CacheLookup::Miss);
        };
        if entry.is_stale(Utc::now()) || entry.fingerprint != fingerprint {
            entries.remove(key);
            return Ok(CacheLookup::Miss);
        }
        entry.hit_count += 1;
        Ok(CacheLookup::Hit(entry.clone()))
    }

    fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError> {
        self.entries.lock().unwrap().insert(key.to_string(), entry);
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(fingerprint: &str) -> CacheEntry {
        CacheEntry::new(
            fingerprint.to_string(),
            DetectionResult::unknown(0.0, fingerprint.to_string()),
            DEFAULT_TTL,
        )
    }

    fn file_cache(dir: &TempDir) -> FileCache {
        FileCache::new(dir.path().to_path_buf(), DEFAULT_TTL, DEFAULT_LOCK_TIMEOUT).unwrap()
    }

    #[test]
    fn test_miss_then_hit_increments_count() {
        let tmp = TempDir::new().unwrap();
        let cache = file_cache(&tmp);

        assert!(matches!(cache.get("k", "fp").unwrap(), CacheLookup::Miss));
        cache.put("k", entry("fp")).unwrap();

        match cache.get("k", "fp").unwrap() {
            CacheLookup::Hit(e) => assert_eq!(e.hit_count, 1),
            CacheLookup::Miss => panic!("expected hit"),
        }
        match cache.get("k", "fp").unwrap() {
            CacheLookup::Hit(e) => assert_eq!(e.hit_count, 2),
            CacheLookup::Miss => panic!("expected hit"),
        }
    }

    #[test]
    fn test_fingerprint_mismatch_evicts() {
        let tmp = TempDir::new().unwrap();
        let cache = file_cache(&tmp);
        cache.put("k", entry("old")).unwrap();

        assert!(matches!(cache.get("k", "new").unwrap(), CacheLookup::Miss));
        // The mismatching entry was evicted, not retained
        assert!(matches!(cache.get("k", "old").unwrap(), CacheLookup::Miss));
    }

    #[test]
    fn test_expired_entry_is_miss_even_with_matching_fingerprint() {
        let tmp = TempDir::new().unwrap();
        let cache = file_cache(&tmp);

        let mut stale = entry("fp");
        stale.created_at = Utc::now() - ChronoDuration::hours(48);
        cache.put("k", stale).unwrap();

        assert!(matches!(cache.get("k", "fp").unwrap(), CacheLookup::Miss));
    }

    #[test]
    fn test_corrupt_store_is_treated_as_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = file_cache(&tmp);
        fs::write(tmp.path().join("k.json"), "{definitely not json").unwrap();

        assert!(matches!(cache.get("k", "fp").unwrap(), CacheLookup::Miss));
        // And the store is usable again afterwards
        cache.put("k", entry("fp")).unwrap();
        assert!(matches!(cache.get("k", "fp").unwrap(), CacheLookup::Hit(_)));
    }

    #[test]
    fn test_stats_and_clear() {
        let tmp = TempDir::new().unwrap();
        let cache = file_cache(&tmp);
        cache.put("a", entry("fp-a")).unwrap();
        cache.put("b", entry("fp-b")).unwrap();
        let _ = cache.get("a", "fp-a").unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.total_hits, 1);

        assert_eq!(cache.clear().unwrap(), 2);
        assert_eq!(cache.stats().unwrap().entries, 0);
    }

    #[test]
    fn test_memory_cache_semantics_match() {
        let cache = MemoryCache::new();
        assert!(matches!(cache.get("k", "fp").unwrap(), CacheLookup::Miss));
        cache.put("k", entry("fp")).unwrap();
        assert!(matches!(cache.get("k", "fp").unwrap(), CacheLookup::Hit(_)));
        assert!(matches!(cache.get("k", "other").unwrap(), CacheLookup::Miss));
        assert!(cache.is_empty());
    }
}
