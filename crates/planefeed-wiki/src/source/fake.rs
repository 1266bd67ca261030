use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{Result, WikiError};
use crate::source::{Encyclopedia, ExtractScope, Page, PageParts};

/// In-memory encyclopedia for pipeline tests. Counts every call.
#[derive(Default)]
pub struct FakeEncyclopedia {
    pages: HashMap<String, Page>,
    searches: HashMap<String, Vec<String>>,
    failing: bool,
    calls: AtomicUsize,
}

impl FakeEncyclopedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as a transport error would.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_page(mut self, title: &str, extract: &str, wikitext: &str) -> Self {
        self.pages.insert(
            title.to_lowercase(),
            Page {
                title: title.to_string(),
                extract: (!extract.is_empty()).then(|| extract.to_string()),
                wikitext: (!wikitext.is_empty()).then(|| wikitext.to_string()),
                thumbnail: Some(format!("https://upload.example/{}.jpg", title.replace(' ', "_"))),
            },
        );
        self
    }

    /// Fixed result list for an exact query string.
    pub fn with_search(mut self, query: &str, titles: &[&str]) -> Self {
        self.searches.insert(
            query.to_string(),
            titles.iter().map(|t| (*t).to_string()).collect(),
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Encyclopedia for FakeEncyclopedia {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(WikiError::Timeout(query.to_string(), 8));
        }
        if let Some(titles) = self.searches.get(query) {
            return Ok(titles.iter().take(limit).cloned().collect());
        }
        let query = query.to_lowercase();
        let mut titles: Vec<String> = self
            .pages
            .iter()
            .filter(|(key, _)| query.contains(key.as_str()))
            .map(|(_, page)| page.title.clone())
            .collect();
        titles.sort();
        titles.truncate(limit);
        Ok(titles)
    }

    async fn page(&self, title: &str, parts: PageParts) -> Result<Page> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(WikiError::Timeout(title.to_string(), 8));
        }
        let page = self
            .pages
            .get(&title.to_lowercase())
            .ok_or_else(|| WikiError::PageNotFound(title.to_string()))?;

        let extract = match parts.extract {
            None => None,
            Some(ExtractScope::Full) => page.extract.clone(),
            Some(ExtractScope::Intro) => page.extract.as_deref().map(|text| {
                text.split("\n==").next().unwrap_or(text).trim().to_string()
            }),
        };
        Ok(Page {
            title: page.title.clone(),
            extract,
            wikitext: parts.wikitext.then(|| page.wikitext.clone()).flatten(),
            thumbnail: parts.thumbnail.then(|| page.thumbnail.clone()).flatten(),
        })
    }
}
