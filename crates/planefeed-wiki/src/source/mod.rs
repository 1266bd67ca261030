use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod mediawiki;

#[cfg(test)]
pub(crate) mod fake;

pub use mediawiki::WikiClient;

/// Which plain-text extract to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractScope {
    /// Lead section only.
    Intro,
    /// Whole article, section headings kept as `== Heading ==`.
    Full,
}

/// Parts of a page to fetch in one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageParts {
    pub extract: Option<ExtractScope>,
    pub wikitext: bool,
    pub thumbnail: bool,
}

impl PageParts {
    /// Lead text and thumbnail for a feed card.
    pub const SUMMARY: Self = Self {
        extract: Some(ExtractScope::Intro),
        wikitext: false,
        thumbnail: true,
    };
    /// Lead text plus raw markup.
    pub const ARTICLE: Self = Self {
        extract: Some(ExtractScope::Intro),
        wikitext: true,
        thumbnail: false,
    };
    pub const MARKUP: Self = Self {
        extract: None,
        wikitext: true,
        thumbnail: false,
    };
    pub const FULL_TEXT: Self = Self {
        extract: Some(ExtractScope::Full),
        wikitext: false,
        thumbnail: false,
    };
    /// Full text plus raw markup.
    pub const EVERYTHING: Self = Self {
        extract: Some(ExtractScope::Full),
        wikitext: true,
        thumbnail: false,
    };
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub title: String,
    pub extract: Option<String>,
    pub wikitext: Option<String>,
    pub thumbnail: Option<String>,
}

/// Read-only encyclopedia the pipeline queries.
#[async_trait]
pub trait Encyclopedia: Send + Sync {
    /// Titles of the best matches for `query`, best first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>>;

    /// The page titled `title` (redirects followed). Fails with
    /// `WikiError::PageNotFound` when there is no such page.
    async fn page(&self, title: &str, parts: PageParts) -> Result<Page>;
}
