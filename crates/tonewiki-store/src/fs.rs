use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{StoreError, StoreResult};
use crate::traits::{validate_name, BlobStore};

const STAGING_DIR: &str = ".staging";

/// Filesystem blob store.
///
/// Layout: `<root>/<bucket>/<key>`. Writes land in `<root>/.staging` first and
/// are renamed into place, so a key is always either its old or its new blob.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
    staged: AtomicU64,
}

impl FsBlobStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(STAGING_DIR))?;
        tracing::debug!(root = %root.display(), "opened filesystem blob store");
        Ok(Self {
            root,
            staged: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> StoreResult<PathBuf> {
        validate_name(bucket)?;
        if bucket.starts_with('.') {
            return Err(StoreError::InvalidKey {
                key: bucket.to_string(),
                reason: "bucket names must not start with '.'".into(),
            });
        }
        Ok(self.root.join(bucket))
    }

    fn blob_path(&self, bucket: &str, key: &str) -> StoreResult<PathBuf> {
        validate_name(key)?;
        Ok(self.bucket_dir(bucket)?.join(key))
    }

    fn staging_path(&self) -> PathBuf {
        let n = self.staged.fetch_add(1, Ordering::Relaxed);
        self.root
            .join(STAGING_DIR)
            .join(format!("{}-{n}.tmp", std::process::id()))
    }
}

impl BlobStore for FsBlobStore {
    fn exists(&self, bucket: &str, key: &str) -> StoreResult<bool> {
        let path = self.blob_path(bucket, key)?;
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn read(&self, bucket: &str, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.blob_path(bucket, key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, bucket: &str, key: &str, data: &[u8]) -> StoreResult<()> {
        let path = self.blob_path(bucket, key)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.staging_path();
        fs::write(&tmp, data)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn delete(&self, bucket: &str, key: &str) -> StoreResult<bool> {
        let path = self.blob_path(bucket, key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, bucket: &str) -> StoreResult<Vec<String>> {
        let dir = self.bucket_dir(bucket)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => keys.push(name),
                Err(name) => {
                    tracing::warn!(bucket, ?name, "skipping blob with non UTF-8 name");
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
