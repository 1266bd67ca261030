//! Aircraft facts from encyclopedia articles.
//!
//! Resolves a free-text aircraft name to an article, pulls the infobox and
//! plain-text extract, and derives manufacturer, first-flight date,
//! specifications, history and variants with layered fallbacks.

pub mod aggregate;
pub mod config;
pub mod dates;
pub mod error;
pub mod extract;
pub mod http;
pub mod markup;
pub mod source;
pub mod types;

pub use aggregate::Summary;
pub use config::{ApiConfig, ExtractionTables, SpecAliases, WikiConfig};
pub use error::{Result, WikiError};
pub use extract::{AircraftPipeline, SearchMode};
pub use source::{Encyclopedia, Page, PageParts, WikiClient};
pub use types::{
    AircraftRecord, DATE_UNKNOWN, ExtendedInfo, PLACEHOLDER_IMAGE_URL, SpecField, Specifications,
    UNKNOWN, UNKNOWN_MANUFACTURER,
};
