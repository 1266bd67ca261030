//! Field extraction over encyclopedia articles.
//!
//! Each extractor runs an ordered list of named [`strategy::Strategy`] steps
//! per stage and never fails outward: errors are logged and the next stage
//! (or the `"Unknown"` result) takes over.

pub mod extended;
pub mod first_flight;
pub mod manufacturer;
pub mod resolver;
pub mod strategy;

use std::sync::Arc;

use crate::config::{ExtractionTables, WikiConfig};
use crate::error::Result;
use crate::markup::TemplateResolver;
use crate::source::{Encyclopedia, WikiClient};

pub use resolver::{SearchMode, resolve_title};
pub use strategy::{Resolved, Strategy, first_success};

/// Aircraft extraction pipeline over one encyclopedia.
#[derive(Clone)]
pub struct AircraftPipeline {
    source: Arc<dyn Encyclopedia>,
    tables: Arc<ExtractionTables>,
}

impl AircraftPipeline {
    pub fn new(source: Arc<dyn Encyclopedia>, tables: ExtractionTables) -> Self {
        Self {
            source,
            tables: Arc::new(tables),
        }
    }

    /// Pipeline over the live MediaWiki API described by `config`.
    pub fn from_config(config: &WikiConfig) -> Result<Self> {
        let client = WikiClient::from_config(&config.api)?;
        Ok(Self::new(Arc::new(client), config.tables.clone()))
    }

    pub fn tables(&self) -> &ExtractionTables {
        &self.tables
    }

    pub fn source(&self) -> &dyn Encyclopedia {
        self.source.as_ref()
    }

    pub fn templates(&self) -> TemplateResolver<'_> {
        TemplateResolver::new(&self.tables)
    }

    pub async fn resolve_title(&self, name: &str, mode: SearchMode) -> Result<String> {
        resolve_title(self.source(), name, mode).await
    }
}
