//! Link extraction and validation for uploaded markdown.
//!
//! A page may only link to pages the wiki knows about. Targets are compared
//! after normalization, so `chord`, `/chord`, `//chord`, `/pages/chord` and
//! `chord.md#voicings` all name the page `chord`.

use std::collections::BTreeSet;

use pulldown_cmark::{Event, Parser, Tag};

use crate::pages::markdown_options;

/// Destinations of every link in `markdown`, in document order.
///
/// Image embeds are not links and are not returned.
pub fn link_targets(markdown: &str) -> Vec<String> {
    Parser::new_ext(markdown, markdown_options())
        .filter_map(|event| match event {
            Event::Start(Tag::Link { dest_url, .. }) => Some(dest_url.into_string()),
            _ => None,
        })
        .collect()
}

/// The page name a link target refers to.
///
/// Returns `None` for in-page anchors (`#section`), which need no page.
pub fn normalize_target(target: &str) -> Option<String> {
    let target = target.trim();
    let path = target.split_once('#').map_or(target, |(path, _)| path);
    if path.is_empty() {
        return None;
    }
    // One or two leading slashes are equivalent.
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_prefix("pages/").unwrap_or(path);
    let path = path.strip_suffix(".md").unwrap_or(path);
    Some(path.to_string())
}

/// Link targets of `markdown` that do not resolve to a page in `known`.
///
/// Each offending target is reported once, in document order.
pub fn unknown_targets(markdown: &str, known: &BTreeSet<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    link_targets(markdown)
        .into_iter()
        .filter(|target| match normalize_target(target) {
            None => false,
            Some(page) => !known.contains(&page),
        })
        .filter(|target| seen.insert(target.clone()))
        .collect()
}
