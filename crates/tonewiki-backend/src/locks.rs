use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{WikiError, WikiResult};

/// One mutex per key, alive only while someone holds or waits for it.
///
/// Serializes read-modify-write cycles on the same blob within a process.
/// Entries are created on demand and dropped once the last user releases
/// them, so keys that are never seen again (failed sign-ins) cost nothing.
#[derive(Debug, Default)]
pub(crate) struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    /// Run `f` while holding the lock for `key`.
    pub(crate) fn with<T>(&self, key: &str, f: impl FnOnce() -> WikiResult<T>) -> WikiResult<T> {
        let lock = self.acquire(key)?;
        let result = match lock.lock() {
            Ok(_guard) => f(),
            Err(e) => Err(poisoned(e)),
        };
        self.release(key, lock)?;
        result
    }

    fn acquire(&self, key: &str) -> WikiResult<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().map_err(poisoned)?;
        Ok(locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    // Handles are cloned and dropped only under the map lock, so a count of
    // one means nobody else holds or is waiting on this key.
    fn release(&self, key: &str, lock: Arc<Mutex<()>>) -> WikiResult<()> {
        let mut locks = self.locks.lock().map_err(poisoned)?;
        drop(lock);
        if locks.get(key).is_some_and(|entry| Arc::strong_count(entry) == 1) {
            locks.remove(key);
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.lock().map_or(0, |locks| locks.len())
    }
}

pub(crate) fn poisoned<E: std::fmt::Display>(e: E) -> WikiError {
    WikiError::Internal(format!("lock poisoned: {e}"))
}
