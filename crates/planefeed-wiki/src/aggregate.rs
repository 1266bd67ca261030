use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::extract::AircraftPipeline;
use crate::source::PageParts;
use crate::types::AircraftRecord;

/// Lead paragraph and thumbnail of an article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub description: String,
    pub image_url: Option<String>,
}

impl AircraftPipeline {
    /// Description and thumbnail for the page titled `name`; empty on failure.
    pub async fn summary(&self, name: &str) -> Summary {
        match self.source().page(name.trim(), PageParts::SUMMARY).await {
            Ok(page) => Summary {
                description: page
                    .extract
                    .as_deref()
                    .map(first_paragraph)
                    .unwrap_or_default(),
                image_url: page.thumbnail,
            },
            Err(err) => {
                warn!(aircraft = name, error = %err, "summary lookup failed");
                Summary::default()
            }
        }
    }

    /// One feed card. Manufacturer, first flight and summary are fetched
    /// concurrently; each falls back on its own.
    pub async fn lookup(&self, id: u64, name: &str) -> AircraftRecord {
        let (manufacturer, first_flight, summary) = tokio::join!(
            self.manufacturer(name),
            self.first_flight(name),
            self.summary(name),
        );
        AircraftRecord::new(
            id,
            name.trim(),
            manufacturer,
            first_flight,
            summary.description,
            summary.image_url,
        )
    }

    /// Cards for every name, ids counted up from `first_id`, in input order.
    pub async fn feed_with_ids<S: AsRef<str>>(&self, first_id: u64, names: &[S]) -> Vec<AircraftRecord> {
        let lookups = names
            .iter()
            .enumerate()
            .map(|(index, name)| self.lookup(first_id + index as u64, name.as_ref()));
        let records = join_all(lookups).await;
        info!(count = records.len(), "feed batch ready");
        records
    }

    /// Cards for every name, ids taken from the current time in milliseconds.
    pub async fn feed<S: AsRef<str>>(&self, names: &[S]) -> Vec<AircraftRecord> {
        let first_id = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        self.feed_with_ids(first_id, names).await
    }
}

/// First non-blank line of a plain-text extract that is not a heading.
fn first_paragraph(extract: &str) -> String {
    extract
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("=="))
        .unwrap_or_default()
        .to_string()
}
