//! Issuance counters keyed by quotation hash.
//!
//! The engine only talks to the [`CounterStore`] trait. Every implementation
//! serializes its read-modify-write behind a lock, so one store shared between
//! threads never loses an increment. Separate processes writing the same file
//! are not coordinated.

use crate::atomic::write_atomic;
use crate::error::{QuoteError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Persistent `quotation_hash -> count` mapping.
pub trait CounterStore: Send + Sync {
    /// Current count, `0` when the hash was never issued.
    fn get(&self, hash: &str) -> Result<u64>;

    /// Record one more issuance and return the new count. The new count is
    /// durable before this returns.
    fn increment(&self, hash: &str) -> Result<u64>;

    /// Snapshot of every counter.
    fn entries(&self) -> Result<BTreeMap<String, u64>>;
}

/// What to do when an existing store file cannot be read or parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreLoadPolicy {
    /// Log a warning and start from an empty history
    #[default]
    Lenient,
    /// Fail with [`QuoteError::StorageCorrupt`] or [`QuoteError::StorageRead`]
    Strict,
}

fn lock(counts: &Mutex<BTreeMap<String, u64>>) -> Result<MutexGuard<'_, BTreeMap<String, u64>>> {
    counts.lock().map_err(|_| QuoteError::LockPoisoned)
}

// ============================================================================
// In-memory store
// ============================================================================

/// Volatile store for previews and tests.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counts: Mutex<BTreeMap<String, u64>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: BTreeMap<String, u64>) -> Self {
        Self {
            counts: Mutex::new(entries),
        }
    }
}

impl CounterStore for MemoryCounterStore {
    fn get(&self, hash: &str) -> Result<u64> {
        Ok(lock(&self.counts)?.get(hash).copied().unwrap_or(0))
    }

    fn increment(&self, hash: &str) -> Result<u64> {
        let mut counts = lock(&self.counts)?;
        let count = counts.entry(hash.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    fn entries(&self) -> Result<BTreeMap<String, u64>> {
        Ok(lock(&self.counts)?.clone())
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// Store persisted as one pretty-printed JSON object.
///
/// The whole file is loaded on open and rewritten atomically on every
/// increment. Keys are written sorted, so loading and saving an untouched
/// store reproduces the file byte for byte.
#[derive(Debug)]
pub struct JsonFileCounterStore {
    path: PathBuf,
    counts: Mutex<BTreeMap<String, u64>>,
}

impl JsonFileCounterStore {
    /// Load the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>, policy: StoreLoadPolicy) -> Result<Self> {
        let path = path.into();
        let counts = match Self::load(&path) {
            Ok(counts) => counts,
            Err(err) if policy == StoreLoadPolicy::Lenient => {
                tracing::warn!(path = %path.display(), error = %err, "counter store unusable, starting empty");
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };

        tracing::debug!(path = %path.display(), entries = counts.len(), "loaded counter store");
        Ok(Self {
            path,
            counts: Mutex::new(counts),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the file from the in-memory state.
    pub fn save(&self) -> Result<()> {
        let counts = lock(&self.counts)?;
        self.persist(&counts)
    }

    fn load(path: &Path) -> Result<BTreeMap<String, u64>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(QuoteError::StorageRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let counts: BTreeMap<String, u64> =
            serde_json::from_str(&content).map_err(|e| QuoteError::StorageCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if let Some((hash, _)) = counts.iter().find(|(_, count)| **count == 0) {
            return Err(QuoteError::StorageCorrupt {
                path: path.to_path_buf(),
                reason: format!("count for {} is zero", hash),
            });
        }
        Ok(counts)
    }

    fn persist(&self, counts: &BTreeMap<String, u64>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(counts).map_err(|e| QuoteError::Serialize(e.to_string()))?;
        write_atomic(&self.path, &bytes).map_err(|source| QuoteError::StorageWrite {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), entries = counts.len(), "persisted counter store");
        Ok(())
    }
}

impl CounterStore for JsonFileCounterStore {
    fn get(&self, hash: &str) -> Result<u64> {
        Ok(lock(&self.counts)?.get(hash).copied().unwrap_or(0))
    }

    fn increment(&self, hash: &str) -> Result<u64> {
        let mut counts = lock(&self.counts)?;
        let next = counts.get(hash).copied().unwrap_or(0) + 1;
        let previous = counts.insert(hash.to_string(), next);

        if let Err(err) = self.persist(&counts) {
            // Roll back so memory never runs ahead of the file.
            match previous {
                Some(count) => counts.insert(hash.to_string(), count),
                None => counts.remove(hash),
            };
            return Err(err);
        }
        Ok(next)
    }

    fn entries(&self) -> Result<BTreeMap<String, u64>> {
        Ok(lock(&self.counts)?.clone())
    }
}

impl<S: CounterStore + ?Sized> CounterStore for std::sync::Arc<S> {
    fn get(&self, hash: &str) -> Result<u64> {
        (**self).get(hash)
    }

    fn increment(&self, hash: &str) -> Result<u64> {
        (**self).increment(hash)
    }

    fn entries(&self) -> Result<BTreeMap<String, u64>> {
        (**self).entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCounterStore::open(dir.path().join("counts.json"), StoreLoadPolicy::Strict).unwrap();
        assert!(store.entries().unwrap().is_empty());
        assert_eq!(store.get("abc").unwrap(), 0);
    }

    #[test]
    fn test_increment_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.json");

        let store = JsonFileCounterStore::open(&path, StoreLoadPolicy::Strict).unwrap();
        assert_eq!(store.increment("abc").unwrap(), 1);
        assert_eq!(store.increment("abc").unwrap(), 2);
        assert_eq!(store.increment("def").unwrap(), 1);

        let reopened = JsonFileCounterStore::open(&path, StoreLoadPolicy::Strict).unwrap();
        assert_eq!(reopened.get("abc").unwrap(), 2);
        assert_eq!(reopened.get("def").unwrap(), 1);
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.json");

        let store = JsonFileCounterStore::open(&path, StoreLoadPolicy::Strict).unwrap();
        for hash in ["c", "a", "b", "a"] {
            store.increment(hash).unwrap();
        }
        let written = fs::read(&path).unwrap();

        let reloaded = JsonFileCounterStore::open(&path, StoreLoadPolicy::Strict).unwrap();
        assert_eq!(reloaded.entries().unwrap(), store.entries().unwrap());
        reloaded.save().unwrap();
        assert_eq!(fs::read(&path).unwrap(), written);
    }

    #[test]
    fn test_corrupt_file_policies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.json");
        fs::write(&path, "{ not json").unwrap();

        let lenient = JsonFileCounterStore::open(&path, StoreLoadPolicy::Lenient).unwrap();
        assert!(lenient.entries().unwrap().is_empty());

        let strict = JsonFileCounterStore::open(&path, StoreLoadPolicy::Strict);
        assert!(matches!(strict, Err(QuoteError::StorageCorrupt { .. })));
    }

    #[test]
    fn test_zero_count_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.json");
        fs::write(&path, r#"{"abc": 0}"#).unwrap();

        assert!(matches!(
            JsonFileCounterStore::open(&path, StoreLoadPolicy::Strict),
            Err(QuoteError::StorageCorrupt { .. })
        ));
    }

    #[test]
    fn test_failed_write_does_not_advance_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("occupied");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        let store = JsonFileCounterStore::open(&path, StoreLoadPolicy::Lenient).unwrap();
        assert!(matches!(store.increment("abc"), Err(QuoteError::StorageWrite { .. })));
        assert_eq!(store.get("abc").unwrap(), 0);

        assert!(matches!(
            JsonFileCounterStore::open(&path, StoreLoadPolicy::Strict),
            Err(QuoteError::StorageRead { .. })
        ));
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            JsonFileCounterStore::open(dir.path().join("counts.json"), StoreLoadPolicy::Strict).unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..5 {
                        store.increment("shared").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get("shared").unwrap(), 40);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryCounterStore::with_entries(BTreeMap::from([("x".to_string(), 4)]));
        assert_eq!(store.increment("x").unwrap(), 5);
        assert_eq!(store.increment("y").unwrap(), 1);
        assert_eq!(store.entries().unwrap().len(), 2);
    }
}
