use std::collections::BTreeSet;
use std::io::{Cursor, Read};

use serde::Serialize;
use zip::ZipArchive;

use tonewiki_store::validate_name;
use tonewiki_types::PageName;

use crate::backend::Backend;
use crate::error::{WikiError, WikiResult};
use crate::links::unknown_targets;
use crate::pages::ImageInfo;

/// What an uploaded file becomes, decided by its extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadKind {
    Page,
    Image,
    /// A zip of images, unpacked into the images bucket.
    Archive,
}

impl UploadKind {
    /// Dispatch on the (case-insensitive) extension of `file_name`.
    pub fn from_file_name(file_name: &str) -> WikiResult<Self> {
        let ext = base_name(file_name)
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "md" => Ok(Self::Page),
            "png" | "jpg" | "jpeg" => Ok(Self::Image),
            "zip" => Ok(Self::Archive),
            _ => Err(WikiError::InvalidInput(format!(
                "unsupported file type: {file_name}"
            ))),
        }
    }
}

/// Result of a successful upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploadOutcome {
    Page { name: String, summarized: bool },
    Image { file_name: String, url: String },
    /// `skipped` counts entries that were not images.
    Archive { images: Vec<ImageInfo>, skipped: usize },
}

/// Last path component; browsers on some platforms send full paths.
fn base_name(file_name: &str) -> &str {
    file_name.rsplit(['/', '\\']).next().unwrap_or(file_name)
}

fn is_image_name(name: &str) -> bool {
    // Dotfiles include the `._name` resource forks macOS adds to archives.
    !name.starts_with('.')
        && validate_name(name).is_ok()
        && matches!(UploadKind::from_file_name(name), Ok(UploadKind::Image))
}

impl Backend {
    /// Store an uploaded page, image or zip of images.
    pub fn upload(&self, file_name: &str, data: &[u8]) -> WikiResult<UploadOutcome> {
        let file_name = base_name(file_name);
        let kind = UploadKind::from_file_name(file_name)?;
        if data.is_empty() {
            return Err(WikiError::InvalidInput(format!("{file_name} is empty")));
        }
        match kind {
            UploadKind::Page => self.upload_page(file_name, data),
            UploadKind::Image => {
                let ImageInfo { file_name, url } = self.store_image(file_name, data)?;
                Ok(UploadOutcome::Image { file_name, url })
            }
            UploadKind::Archive => self.upload_archive(file_name, data),
        }
    }

    fn upload_page(&self, file_name: &str, data: &[u8]) -> WikiResult<UploadOutcome> {
        let page = PageName::from_file_name(file_name)?;
        let markdown = std::str::from_utf8(data)
            .map_err(|_| WikiError::InvalidInput(format!("{file_name} is not valid UTF-8")))?;

        let mut known: BTreeSet<String> = self.list_pages()?.into_iter().collect();
        known.insert(page.as_str().to_string());
        let unknown = unknown_targets(markdown, &known);
        if !unknown.is_empty() {
            return Err(WikiError::InvalidInput(format!(
                "{file_name} links to unknown pages: {}",
                unknown.join(", ")
            )));
        }

        let key = page.blob_key();
        self.store.write(&self.config.buckets.content, &key, data)?;
        tracing::info!(page = %page, bytes = data.len(), "page uploaded");

        let summarized = self.summarize_page(&key, markdown);
        Ok(UploadOutcome::Page {
            name: page.into(),
            summarized,
        })
    }

    /// Write or clear the summary of a freshly uploaded page.
    ///
    /// Returns whether a summary was stored. Nothing here fails the upload:
    /// summarizer and store errors are logged and the page stays stored.
    fn summarize_page(&self, key: &str, markdown: &str) -> bool {
        let bucket = &self.config.buckets.summaries;
        let Some(summarizer) = &self.summarizer else {
            return false;
        };
        match summarizer.summarize(markdown) {
            Ok(summary) => match self.store.write(bucket, key, summary.as_bytes()) {
                Ok(()) => {
                    tracing::debug!(key, "summary stored");
                    true
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "summary not stored");
                    false
                }
            },
            Err(e) => {
                tracing::warn!(key, error = %e, "summarization failed");
                // The old summary describes the previous revision.
                if let Err(e) = self.store.delete(bucket, key) {
                    tracing::warn!(key, error = %e, "stale summary not cleared");
                }
                false
            }
        }
    }

    fn store_image(&self, file_name: &str, data: &[u8]) -> WikiResult<ImageInfo> {
        self.store.write(&self.config.buckets.images, file_name, data)?;
        tracing::info!(file = file_name, bytes = data.len(), "image uploaded");
        Ok(ImageInfo {
            file_name: file_name.to_string(),
            url: self.image_url(file_name),
        })
    }

    /// Unpack the images of a zip upload, each under its base name.
    ///
    /// Every entry is read before anything is written, so a corrupt or
    /// oversized archive stores nothing. Entries that are not images are
    /// skipped; of two images with the same base name the later one wins.
    fn upload_archive(&self, file_name: &str, data: &[u8]) -> WikiResult<UploadOutcome> {
        let corrupt = |e: String| WikiError::InvalidInput(format!("{file_name}: {e}"));
        let mut archive =
            ZipArchive::new(Cursor::new(data)).map_err(|e| corrupt(e.to_string()))?;

        let mut budget = self.config.max_archive_bytes;
        let mut entries = Vec::new();
        let mut skipped = 0;
        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|e| corrupt(e.to_string()))?;
            let name = base_name(entry.name()).to_string();
            if entry.is_dir() || !is_image_name(&name) {
                skipped += 1;
                continue;
            }
            let mut bytes = Vec::new();
            (&mut entry)
                .take(budget.saturating_add(1))
                .read_to_end(&mut bytes)
                .map_err(|e| corrupt(e.to_string()))?;
            let read = bytes.len() as u64;
            if read > budget {
                return Err(WikiError::InvalidInput(format!(
                    "{file_name} unpacks to more than {} bytes",
                    self.config.max_archive_bytes
                )));
            }
            budget -= read;
            if bytes.is_empty() {
                skipped += 1;
                continue;
            }
            entries.push((name, bytes));
        }

        let mut images = Vec::with_capacity(entries.len());
        for (name, bytes) in &entries {
            images.push(self.store_image(name, bytes)?);
        }
        tracing::info!(archive = file_name, images = images.len(), skipped, "archive unpacked");
        Ok(UploadOutcome::Archive { images, skipped })
    }
}
