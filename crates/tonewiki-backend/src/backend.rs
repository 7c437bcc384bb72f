use std::sync::{Arc, Mutex};

use tonewiki_crypto::PasswordHasher;
use tonewiki_store::BlobStore;
use tonewiki_types::{Clock, SystemClock};

use crate::config::WikiConfig;
use crate::error::WikiResult;
use crate::locks::KeyedLocks;
use crate::summary::{LeadSummarizer, Summarizer};

/// The wiki's persistence layer.
///
/// Operations are spread over the modules of this crate (`pages`, `upload`,
/// `auth`, `comments`, `popularity`, `history`). Within one `Backend`,
/// updates to the popularity table and to any single user record are
/// serialized; separate processes sharing a store race, last writer wins.
pub struct Backend {
    pub(crate) store: Arc<dyn BlobStore>,
    pub(crate) config: WikiConfig,
    pub(crate) hasher: PasswordHasher,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) summarizer: Option<Arc<dyn Summarizer>>,
    pub(crate) popularity_lock: Mutex<()>,
    pub(crate) user_locks: KeyedLocks,
}

impl Backend {
    /// Create a backend over `store`.
    ///
    /// A [`LeadSummarizer`] is installed when `config.summary.enabled` is set.
    pub fn new(store: Arc<dyn BlobStore>, config: WikiConfig) -> WikiResult<Self> {
        let hasher = PasswordHasher::new(config.bcrypt_cost)?;
        let summarizer: Option<Arc<dyn Summarizer>> = if config.summary.enabled {
            Some(Arc::new(LeadSummarizer::new(
                config.summary.max_input_chars,
                config.summary.max_sentences,
            )))
        } else {
            None
        };
        Ok(Self {
            store,
            config,
            hasher,
            clock: Arc::new(SystemClock),
            summarizer,
            popularity_lock: Mutex::new(()),
            user_locks: KeyedLocks::default(),
        })
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace (or with `None`, remove) the summarizer used on upload.
    pub fn with_summarizer(mut self, summarizer: Option<Arc<dyn Summarizer>>) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn config(&self) -> &WikiConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("buckets", &self.config.buckets)
            .field("summarizer", &self.summarizer.is_some())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::harness_with;
    use super::*;

    #[test]
    fn summarizer_follows_config() {
        let mut config = WikiConfig::default();
        assert!(harness_with(config.clone()).backend.summarizer.is_some());
        config.summary.enabled = false;
        assert!(harness_with(config).backend.summarizer.is_none());
    }

    #[test]
    fn invalid_cost_is_rejected() {
        let store: Arc<dyn BlobStore> = Arc::new(tonewiki_store::InMemoryBlobStore::new());
        let config = WikiConfig {
            bcrypt_cost: 2,
            ..WikiConfig::default()
        };
        assert!(Backend::new(store, config).is_err());
    }
}
