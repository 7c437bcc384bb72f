//! Automatic page summaries.
//!
//! Summaries are best-effort: the upload pipeline stores whatever a
//! [`Summarizer`] returns and carries on without one when it fails. The
//! bundled [`LeadSummarizer`] is extractive; a trained model plugs in
//! through the same trait.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use thiserror::Error;

use crate::pages::markdown_options;

/// Produces a short markdown summary of a page.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, markdown: &str) -> Result<String, SummaryError>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummaryError {
    #[error("page too long to summarize: {len} characters, limit {max}")]
    InputTooLong { len: usize, max: usize },

    #[error("page has no prose to summarize")]
    NoProse,

    #[error("summarizer failed: {0}")]
    Failed(String),
}

/// Summarizes a page by its opening sentences.
///
/// Takes the first paragraph of prose (headings, lists and code are
/// skipped) and keeps its first `max_sentences` sentences.
#[derive(Clone, Debug)]
pub struct LeadSummarizer {
    max_input_chars: usize,
    max_sentences: usize,
}

impl LeadSummarizer {
    pub fn new(max_input_chars: usize, max_sentences: usize) -> Self {
        Self {
            max_input_chars,
            max_sentences: max_sentences.max(1),
        }
    }
}

impl Default for LeadSummarizer {
    fn default() -> Self {
        Self::new(1600, 2)
    }
}

/// Plain text of the first non-empty top-level paragraph.
fn first_paragraph(markdown: &str) -> String {
    let mut depth = 0usize;
    let mut in_paragraph = false;
    let mut text = String::new();

    for event in Parser::new_ext(markdown, markdown_options()) {
        match event {
            Event::Start(tag) => {
                if depth == 0 && matches!(tag, Tag::Paragraph) {
                    in_paragraph = true;
                }
                depth += 1;
            }
            Event::End(end) => {
                depth = depth.saturating_sub(1);
                if in_paragraph && depth == 0 && matches!(end, TagEnd::Paragraph) {
                    if !text.trim().is_empty() {
                        break;
                    }
                    in_paragraph = false;
                    text.clear();
                }
            }
            Event::Text(t) | Event::Code(t) if in_paragraph => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak if in_paragraph => text.push(' '),
            _ => {}
        }
    }
    text.trim().to_string()
}

fn leading_sentences(text: &str, count: usize) -> String {
    let mut found = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
            if at_boundary {
                found += 1;
                if found == count {
                    return text[..i + c.len_utf8()].to_string();
                }
            }
        }
    }
    text.to_string()
}

impl Summarizer for LeadSummarizer {
    fn summarize(&self, markdown: &str) -> Result<String, SummaryError> {
        let len = markdown.chars().count();
        if len > self.max_input_chars {
            return Err(SummaryError::InputTooLong {
                len,
                max: self.max_input_chars,
            });
        }
        let paragraph = first_paragraph(markdown);
        if paragraph.is_empty() {
            return Err(SummaryError::NoProse);
        }
        Ok(leading_sentences(&paragraph, self.max_sentences))
    }
}
