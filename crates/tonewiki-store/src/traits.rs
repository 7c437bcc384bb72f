use crate::error::{StoreError, StoreResult};

/// Bucketed key-blob store.
///
/// All implementations must satisfy these invariants:
/// - `write` replaces the blob at a key atomically.
/// - `read` of a missing key is `Ok(None)`, never an error.
/// - `list` returns every key of the bucket; a bucket nobody wrote to is empty.
/// - All I/O errors are propagated, never silently ignored.
pub trait BlobStore: Send + Sync {
    /// Check whether a blob exists.
    fn exists(&self, bucket: &str, key: &str) -> StoreResult<bool>;

    /// Read a blob.
    ///
    /// Returns `Ok(None)` if the blob does not exist.
    fn read(&self, bucket: &str, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Create or overwrite a blob.
    fn write(&self, bucket: &str, key: &str, data: &[u8]) -> StoreResult<()>;

    /// Delete a blob. Returns `true` if it existed.
    fn delete(&self, bucket: &str, key: &str) -> StoreResult<bool>;

    /// List all keys in a bucket, in the backend's enumeration order.
    fn list(&self, bucket: &str) -> StoreResult<Vec<String>>;

    /// Read a blob and decode it as UTF-8.
    fn read_string(&self, bucket: &str, key: &str) -> StoreResult<Option<String>> {
        match self.read(bucket, key)? {
            None => Ok(None),
            Some(bytes) => String::from_utf8(bytes).map(Some).map_err(|_| StoreError::Encoding {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
        }
    }
}

/// Reject names that cannot be used as a bucket or key by every backend.
pub fn validate_name(name: &str) -> StoreResult<()> {
    let invalid = |reason: &str| StoreError::InvalidKey {
        key: name.to_string(),
        reason: reason.to_string(),
    };
    if name.is_empty() {
        return Err(invalid("empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid("reserved"));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(invalid("contains a path separator or NUL"));
    }
    Ok(())
}
