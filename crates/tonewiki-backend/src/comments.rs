use serde::Serialize;

use tonewiki_types::{CommentKey, Timestamp, Username};

use crate::backend::Backend;
use crate::error::{WikiError, WikiResult};

/// A comment as shown on the comment wall.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub username: String,
    pub posted_at: Timestamp,
    /// `posted_at` as `YYYY-MM-DD HH:MM:SS`.
    pub posted_at_human: String,
    pub text: String,
}

impl Backend {
    /// Store a comment by `username`, keyed by the current time.
    pub fn upload_comment(&self, username: &str, text: &str) -> WikiResult<CommentKey> {
        let username = Username::new(username)?;
        if text.trim().is_empty() {
            return Err(WikiError::InvalidInput("comment must not be empty".into()));
        }
        let len = text.chars().count();
        if len > self.config.max_comment_chars {
            return Err(WikiError::InvalidInput(format!(
                "comment is {len} characters, limit is {}",
                self.config.max_comment_chars
            )));
        }

        let user_key = username.key();
        self.user_locks.with(&user_key, || {
            let key = CommentKey::new(self.clock.now(), username);
            let blob_key = key.to_string();
            let bucket = &self.config.buckets.comments;
            if self.store.exists(bucket, &blob_key)? {
                return Err(WikiError::AlreadyExists(format!("comment {blob_key}")));
            }
            self.store.write(bucket, &blob_key, text.as_bytes())?;
            tracing::info!(key = %blob_key, "comment stored");
            Ok(key)
        })
    }

    /// Every comment, in store enumeration order.
    ///
    /// Blobs whose key is not a comment key are skipped.
    pub fn list_comments(&self) -> WikiResult<Vec<Comment>> {
        let bucket = &self.config.buckets.comments;
        let mut comments = Vec::new();
        for blob_key in self.store.list(bucket)? {
            let key: CommentKey = match blob_key.parse() {
                Ok(key) => key,
                Err(e) => {
                    tracing::warn!(key = %blob_key, error = %e, "skipping unparseable comment key");
                    continue;
                }
            };
            // Deleted between list and read.
            let Some(text) = self.store.read_string(bucket, &blob_key)? else {
                continue;
            };
            comments.push(Comment {
                username: key.username.into(),
                posted_at_human: key.posted_at.human(),
                posted_at: key.posted_at,
                text,
            });
        }
        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{harness, T0_MICROS};
    use crate::config::WikiConfig;
    use tonewiki_store::BlobStore;

    #[test]
    fn empty_comment_creates_no_blob() {
        let h = harness();
        for text in ["", "   \n"] {
            assert!(matches!(
                h.backend.upload_comment("sandy", text),
                Err(WikiError::InvalidInput(_))
            ));
        }
        assert_eq!(h.store.bucket_len("comments"), 0);
    }

    #[test]
    fn comment_roundtrip() {
        let h = harness();
        let key = h.backend.upload_comment("sandy", "Hello World").unwrap();
        assert_eq!(key.to_string(), "1680980576.645213:sandy");

        let comments = h.backend.list_comments().unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].username, "sandy");
        assert_eq!(comments[0].text, "Hello World");
        assert_eq!(comments[0].posted_at.unix_micros(), T0_MICROS);
        assert_eq!(comments[0].posted_at_human, "2023-04-08 19:02:56");
    }

    #[test]
    fn same_instant_same_user_collides() {
        let h = harness();
        h.backend.upload_comment("sandy", "first").unwrap();
        assert!(matches!(
            h.backend.upload_comment("sandy", "second"),
            Err(WikiError::AlreadyExists(_))
        ));
        h.backend.upload_comment("tim", "other user").unwrap();
        h.clock.advance_micros(1);
        h.backend.upload_comment("sandy", "later").unwrap();
        assert_eq!(h.backend.list_comments().unwrap().len(), 3);
    }

    #[test]
    fn racing_comments_at_one_instant_store_one() {
        let h = harness();
        let backend = &h.backend;
        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| s.spawn(move || backend.upload_comment("sandy", &format!("take {i}"))))
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, WikiError::AlreadyExists(_))));
        assert_eq!(h.store.bucket_len("comments"), 1);
        let stored = h.backend.list_comments().unwrap();
        assert!(stored[0].text.starts_with("take "));
    }

    #[test]
    fn overlong_comment_is_rejected() {
        let h = crate::backend::testing::harness_with(WikiConfig {
            max_comment_chars: 5,
            ..WikiConfig::default()
        });
        h.backend.upload_comment("sandy", "héllo").unwrap();
        h.clock.advance_micros(1);
        assert!(matches!(
            h.backend.upload_comment("sandy", "héllo!"),
            Err(WikiError::InvalidInput(_))
        ));
    }

    #[test]
    fn foreign_blobs_are_skipped() {
        let h = harness();
        h.store.write("comments", "README", b"not a comment").unwrap();
        h.backend.upload_comment("sandy", "hi").unwrap();
        let comments = h.backend.list_comments().unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "hi");
    }

    #[test]
    fn legacy_keys_are_listed() {
        let h = harness();
        h.store
            .write("comments", "1680980576.6452136:sandy", b"Hello World")
            .unwrap();
        let comments = h.backend.list_comments().unwrap();
        assert_eq!(comments[0].username, "sandy");
        assert_eq!(comments[0].posted_at_human, "2023-04-08 19:02:56");
    }
}
