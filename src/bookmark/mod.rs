//! Bookmark record and its canonical serialized form.
//!
//! A [`Bookmark`] is stored in the vector store as a fixed four-field text
//! block (title, category, URL, summary). The same block is embedded for
//! similarity search and parsed back into a record on read.

mod category;

pub use category::*;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const TITLE_MARKER: &str = "Title: ";
const CATEGORY_MARKER: &str = "\n\nCategory: ";
const URL_MARKER: &str = "\n\nURL: ";
const SUMMARY_MARKER: &str = "\n\nSummary: ";

/// A saved web page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Page URL; unique identity key.
    pub url: String,
    /// Page title.
    pub title: String,
    /// Short description of the page.
    pub summary: String,
    /// `/`-separated category path. Empty means uncategorized.
    pub category: String,
}

impl Bookmark {
    /// Create an uncategorized bookmark, validating the URL.
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        summary: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let url = url.into();
        validate_url(&url)?;

        Ok(Self {
            url,
            title: title.into(),
            summary: summary.into(),
            category: String::new(),
        })
    }

    /// Set the category path
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Whether the bookmark has no category
    pub fn is_uncategorized(&self) -> bool {
        self.category.is_empty()
    }

    /// Render the canonical document stored in the vector store.
    ///
    /// Newlines and backslashes in title, category and URL are escaped so no
    /// field can contain a marker; the summary is the remainder and is kept
    /// verbatim.
    pub fn to_document(&self) -> String {
        format!(
            "{TITLE_MARKER}{}{CATEGORY_MARKER}{}{URL_MARKER}{}{SUMMARY_MARKER}{}",
            escape_field(&self.title),
            escape_field(&self.category),
            escape_field(&self.url),
            self.summary
        )
    }

    /// Parse a document produced by [`Bookmark::to_document`].
    pub fn from_document(document: &str) -> Result<Self, ValidationError> {
        let rest = document
            .strip_prefix(TITLE_MARKER)
            .ok_or_else(|| malformed("missing Title field"))?;
        let (title, rest) = rest
            .split_once(CATEGORY_MARKER)
            .ok_or_else(|| malformed("missing Category field"))?;
        let (category, rest) = rest
            .split_once(URL_MARKER)
            .ok_or_else(|| malformed("missing URL field"))?;
        let (url, summary) = rest
            .split_once(SUMMARY_MARKER)
            .ok_or_else(|| malformed("missing Summary field"))?;

        Ok(Self::new(unescape_field(url), unescape_field(title), summary)?
            .with_category(unescape_field(category)))
    }
}

fn escape_field(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn unescape_field(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => unescaped.push('\n'),
            Some('\\') => unescaped.push('\\'),
            Some(other) => {
                unescaped.push('\\');
                unescaped.push(other);
            }
            None => unescaped.push('\\'),
        }
    }
    unescaped
}

/// Check that a URL is non-empty and uses an HTTP scheme.
pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ValidationError::UnsupportedScheme {
            url: url.to_string(),
        });
    }
    Ok(())
}

fn malformed(reason: &str) -> ValidationError {
    ValidationError::MalformedDocument {
        reason: reason.to_string(),
    }
}
