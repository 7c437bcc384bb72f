use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use pulldown_cmark::{html, Event, Options, Parser};
use serde::Serialize;

use tonewiki_types::PageName;

use crate::backend::Backend;
use crate::error::{WikiError, WikiResult};

/// A page rendered for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderedPage {
    pub name: String,
    pub html: String,
    /// Rendered summary, when one has been generated for this page.
    pub summary_html: Option<String>,
}

/// A content image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub file_name: String,
    pub url: String,
}

/// An author portrait from the images bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthorInfo {
    pub name: String,
    pub file_name: String,
    pub url: String,
}

pub(crate) fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS
}

/// Render markdown to HTML.
///
/// Raw HTML in the source is escaped rather than passed through.
pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, markdown_options()).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Everything but RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

impl Backend {
    /// Names of all listed pages, sorted.
    pub fn list_pages(&self) -> WikiResult<Vec<String>> {
        let keys = self.store.list(&self.config.buckets.content)?;
        let mut names: Vec<String> = keys
            .iter()
            .filter_map(|key| PageName::from_blob_key(key))
            .map(String::from)
            .filter(|name| !self.config.page_blocklist.contains(name))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Fetch and render a page, counting the view.
    pub fn render_page(&self, name: &str) -> WikiResult<RenderedPage> {
        let page = PageName::new(name)?;
        let key = page.blob_key();
        let markdown = self
            .store
            .read_string(&self.config.buckets.content, &key)?
            .ok_or_else(|| WikiError::NotFound(format!("page {page}")))?;

        self.record_view(page.as_str())?;

        let summary_html = self
            .store
            .read_string(&self.config.buckets.summaries, &key)?
            .map(|summary| render_markdown(&summary));

        tracing::debug!(page = %page, has_summary = summary_html.is_some(), "rendered page");
        Ok(RenderedPage {
            name: page.into(),
            html: render_markdown(&markdown),
            summary_html,
        })
    }

    pub(crate) fn image_url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.config.image_base_url.trim_end_matches('/'),
            utf8_percent_encode(key, PATH_SEGMENT)
        )
    }

    /// Content images (everything except author portraits), sorted by URL.
    pub fn list_images(&self) -> WikiResult<Vec<ImageInfo>> {
        let prefix = &self.config.author_prefix;
        let mut images: Vec<ImageInfo> = self
            .store
            .list(&self.config.buckets.images)?
            .into_iter()
            .filter(|key| !key.starts_with(prefix.as_str()))
            .map(|key| ImageInfo {
                url: self.image_url(&key),
                file_name: key,
            })
            .collect();
        images.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(images)
    }

    /// Author portraits, sorted by URL.
    ///
    /// `[Author]Mozart, composer.jpg` yields the author name `Mozart`.
    pub fn list_authors(&self) -> WikiResult<Vec<AuthorInfo>> {
        let prefix = &self.config.author_prefix;
        let mut authors: Vec<AuthorInfo> = self
            .store
            .list(&self.config.buckets.images)?
            .into_iter()
            .filter_map(|key| {
                let rest = key.strip_prefix(prefix.as_str())?;
                let stem = rest.rsplit_once('.').map_or(rest, |(stem, _)| stem);
                let name = stem.split(',').next().unwrap_or(stem).trim().to_string();
                Some(AuthorInfo {
                    name,
                    url: self.image_url(&key),
                    file_name: key,
                })
            })
            .collect();
        authors.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(authors)
    }

    /// Raw bytes of an image.
    pub fn read_image(&self, file_name: &str) -> WikiResult<Vec<u8>> {
        self.store
            .read(&self.config.buckets.images, file_name)?
            .ok_or_else(|| WikiError::NotFound(format!("image {file_name}")))
    }
}
