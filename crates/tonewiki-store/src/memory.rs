use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::{validate_name, BlobStore};

type Bucket = BTreeMap<String, Vec<u8>>;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and ephemeral servers. Each bucket is a `BTreeMap`, so
/// `list` enumerates keys in lexicographic order, matching [`crate::FsBlobStore`].
pub struct InMemoryBlobStore {
    buckets: RwLock<HashMap<String, Bucket>>,
    offline: AtomicBool,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Number of blobs in a bucket.
    pub fn bucket_len(&self, bucket: &str) -> usize {
        self.buckets
            .read()
            .expect("lock poisoned")
            .get(bucket)
            .map_or(0, BTreeMap::len)
    }

    /// Total number of blobs across all buckets.
    pub fn len(&self) -> usize {
        self.buckets
            .read()
            .expect("lock poisoned")
            .values()
            .map(BTreeMap::len)
            .sum()
    }

    /// Returns `true` if no bucket holds a blob.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every blob from every bucket.
    pub fn clear(&self) {
        self.buckets.write().expect("lock poisoned").clear();
    }

    /// Simulate an outage: while offline every call fails with
    /// [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self, bucket: &str, key: Option<&str>) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store is offline".into()));
        }
        validate_name(bucket)?;
        if let Some(key) = key {
            validate_name(key)?;
        }
        Ok(())
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn exists(&self, bucket: &str, key: &str) -> StoreResult<bool> {
        self.check(bucket, Some(key))?;
        let map = self.buckets.read().expect("lock poisoned");
        Ok(map.get(bucket).is_some_and(|b| b.contains_key(key)))
    }

    fn read(&self, bucket: &str, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.check(bucket, Some(key))?;
        let map = self.buckets.read().expect("lock poisoned");
        Ok(map.get(bucket).and_then(|b| b.get(key)).cloned())
    }

    fn write(&self, bucket: &str, key: &str, data: &[u8]) -> StoreResult<()> {
        self.check(bucket, Some(key))?;
        let mut map = self.buckets.write().expect("lock poisoned");
        map.entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn delete(&self, bucket: &str, key: &str) -> StoreResult<bool> {
        self.check(bucket, Some(key))?;
        let mut map = self.buckets.write().expect("lock poisoned");
        Ok(map
            .get_mut(bucket)
            .is_some_and(|b| b.remove(key).is_some()))
    }

    fn list(&self, bucket: &str) -> StoreResult<Vec<String>> {
        self.check(bucket, None)?;
        let map = self.buckets.read().expect("lock poisoned");
        Ok(map
            .get(bucket)
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default())
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[test]
    fn write_and_read() {
        let store = InMemoryBlobStore::new();
        store.write("content", "chord.md", b"# Chord").unwrap();
        assert_eq!(
            store.read("content", "chord.md").unwrap().as_deref(),
            Some(&b"# Chord"[..])
        );
        assert!(store.exists("content", "chord.md").unwrap());
    }

    #[test]
    fn read_missing_is_none() {
        let store = InMemoryBlobStore::new();
        assert!(store.read("content", "nope.md").unwrap().is_none());
        assert!(!store.exists("content", "nope.md").unwrap());
    }

    #[test]
    fn write_overwrites() {
        let store = InMemoryBlobStore::new();
        store.write("users", "sandy", b"v1").unwrap();
        store.write("users", "sandy", b"v2").unwrap();
        assert_eq!(store.read("users", "sandy").unwrap().unwrap(), b"v2");
        assert_eq!(store.bucket_len("users"), 1);
    }

    #[test]
    fn buckets_are_isolated() {
        let store = InMemoryBlobStore::new();
        store.write("content", "a.md", b"page").unwrap();
        assert!(!store.exists("images", "a.md").unwrap());
        assert!(store.list("images").unwrap().is_empty());
    }

    #[test]
    fn delete_reports_presence() {
        let store = InMemoryBlobStore::new();
        store.write("comments", "k", b"x").unwrap();
        assert!(store.delete("comments", "k").unwrap());
        assert!(!store.delete("comments", "k").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn list_is_sorted() {
        let store = InMemoryBlobStore::new();
        for key in ["melody.md", "chord.md", "harmony.md"] {
            store.write("content", key, b"").unwrap();
        }
        assert_eq!(
            store.list("content").unwrap(),
            vec!["chord.md", "harmony.md", "melody.md"]
        );
    }

    #[test]
    fn read_string_rejects_invalid_utf8() {
        let store = InMemoryBlobStore::new();
        store.write("content", "bad.md", &[0xff, 0xfe]).unwrap();
        assert!(matches!(
            store.read_string("content", "bad.md"),
            Err(StoreError::Encoding { .. })
        ));
    }

    #[test]
    fn invalid_keys_are_rejected() {
        let store = InMemoryBlobStore::new();
        assert!(matches!(
            store.write("content", "../escape", b""),
            Err(StoreError::InvalidKey { .. })
        ));
    }

    #[test]
    fn offline_store_is_retryable() {
        let store = InMemoryBlobStore::new();
        store.set_offline(true);
        let err = store.read("content", "a.md").unwrap_err();
        assert!(err.is_retryable());
        store.set_offline(false);
        assert!(store.read("content", "a.md").unwrap().is_none());
    }
}
