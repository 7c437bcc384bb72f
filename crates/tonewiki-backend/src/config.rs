use serde::{Deserialize, Serialize};

/// Names of the buckets the wiki reads and writes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketNames {
    pub content: String,
    pub users: String,
    pub images: String,
    pub summaries: String,
    pub comments: String,
    pub analytics: String,
}

impl Default for BucketNames {
    fn default() -> Self {
        Self {
            content: "content".into(),
            users: "users".into(),
            images: "images".into(),
            summaries: "summaries".into(),
            comments: "comments".into(),
            analytics: "page-analytics".into(),
        }
    }
}

/// Settings for automatic page summaries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// When `false`, uploads never produce a summary.
    pub enabled: bool,
    /// Pages longer than this (in characters) are not summarized.
    pub max_input_chars: usize,
    pub max_sentences: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_input_chars: 1600,
            max_sentences: 2,
        }
    }
}

/// Configuration of a [`crate::Backend`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiConfig {
    pub buckets: BucketNames,
    /// Page names hidden from listings (leftover test uploads).
    pub page_blocklist: Vec<String>,
    /// Prefix of image URLs; the blob key is appended after a `/`.
    pub image_base_url: String,
    /// File-name prefix marking an image as an author portrait.
    pub author_prefix: String,
    /// Key of the popularity CSV inside the analytics bucket.
    pub popularity_key: String,
    pub max_comment_chars: usize,
    /// Total uncompressed bytes accepted from one zip upload.
    pub max_archive_bytes: u64,
    pub bcrypt_cost: u32,
    pub summary: SummaryConfig,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            buckets: BucketNames::default(),
            page_blocklist: vec!["test_url".into(), "test_sucess".into()],
            image_base_url: "/images/raw".into(),
            author_prefix: "[Author]".into(),
            popularity_key: "page_views.csv".into(),
            max_comment_chars: 500,
            max_archive_bytes: 64 * 1024 * 1024,
            bcrypt_cost: 12,
            summary: SummaryConfig::default(),
        }
    }
}
