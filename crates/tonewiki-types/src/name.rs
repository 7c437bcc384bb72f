use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// File extension (without the dot) of markdown page blobs.
pub const MARKDOWN_EXTENSION: &str = "md";

const MAX_PAGE_NAME_LEN: usize = 128;
const MAX_USERNAME_LEN: usize = 64;

/// Identifier of a wiki page.
///
/// The page `chord` lives in the content bucket under the key `chord.md`.
/// Names may contain spaces and punctuation but never path separators,
/// `:` or control characters.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageName(String);

impl PageName {
    /// Validate and wrap a page name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        let invalid = |reason: &str| TypeError::InvalidPageName {
            name: name.clone(),
            reason: reason.to_string(),
        };

        if name.trim().is_empty() {
            return Err(invalid("must not be empty"));
        }
        if name.len() > MAX_PAGE_NAME_LEN {
            return Err(invalid("too long"));
        }
        if name.starts_with('.') {
            return Err(invalid("must not start with '.'"));
        }
        if let Some(c) = name
            .chars()
            .find(|c| matches!(c, '/' | '\\' | ':') || c.is_control())
        {
            return Err(invalid(&format!("contains forbidden character {c:?}")));
        }
        Ok(Self(name))
    }

    /// Derive a page name from an uploaded markdown file name.
    ///
    /// `chord.md` and `Chord.MD` both yield their stem; any other extension
    /// is rejected.
    pub fn from_file_name(file_name: &str) -> Result<Self, TypeError> {
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if ext.eq_ignore_ascii_case(MARKDOWN_EXTENSION) => Self::new(stem),
            _ => Err(TypeError::InvalidPageName {
                name: file_name.to_string(),
                reason: format!("expected a .{MARKDOWN_EXTENSION} file"),
            }),
        }
    }

    /// Recover the page name from a content-bucket key, if it is a page blob.
    pub fn from_blob_key(key: &str) -> Option<Self> {
        let stem = key.strip_suffix(&format!(".{MARKDOWN_EXTENSION}"))?;
        Self::new(stem).ok()
    }

    /// The content-bucket key of this page.
    pub fn blob_key(&self) -> String {
        format!("{}.{MARKDOWN_EXTENSION}", self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageName({})", self.0)
    }
}

impl fmt::Display for PageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PageName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageName> for String {
    fn from(name: PageName) -> Self {
        name.0
    }
}

/// A login name as typed by the user.
///
/// Usernames are case-insensitive: `Sandy` and `sandy` refer to the same
/// account, whose record lives under [`Username::key`].
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        let invalid = |reason: &str| TypeError::InvalidUsername {
            name: name.clone(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if name.len() > MAX_USERNAME_LEN {
            return Err(invalid("too long"));
        }
        if name == "." || name == ".." {
            return Err(invalid("reserved name"));
        }
        if let Some(c) = name
            .chars()
            .find(|c| matches!(c, ':' | '/' | '\\') || c.is_whitespace() || c.is_control())
        {
            return Err(invalid(&format!("contains forbidden character {c:?}")));
        }
        Ok(Self(name))
    }

    /// The name exactly as the user typed it.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased key of the user record.
    pub fn key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Debug for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Username({})", self.0)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(name: Username) -> Self {
        name.0
    }
}
