use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Results of one kind (`records`, `extended`) stored per aircraft as JSON
/// files under `<cache_dir>/planefeed/<kind>/`, stale after `ttl`.
pub struct DiskCache {
    dir: PathBuf,
    ttl: Duration,
}

#[derive(Serialize, Deserialize)]
struct Entry<T> {
    aircraft: String,
    fetched_at: DateTime<Utc>,
    value: T,
}

/// Lookup key for an aircraft name: lowercased, single-spaced.
fn aircraft_key(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `boeing-747-1a2b3c4d.json`. The hash keeps `F-16` and `F 16` apart.
fn file_name(key: &str) -> String {
    let slug: String = key
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    format!("{slug}-{:08x}.json", hasher.finish() as u32)
}

impl DiskCache {
    pub fn new(kind: &str, ttl: Duration) -> Self {
        let dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("planefeed")
            .join(kind);
        Self::in_dir(dir, ttl)
    }

    pub fn in_dir(dir: PathBuf, ttl: Duration) -> Self {
        let _ = std::fs::create_dir_all(&dir);
        Self { dir, ttl }
    }

    fn is_stale(&self, fetched_at: DateTime<Utc>) -> bool {
        let age = Utc::now().signed_duration_since(fetched_at);
        age.to_std().is_ok_and(|age| age > self.ttl)
    }

    pub async fn get<T: DeserializeOwned>(&self, aircraft: &str) -> Option<T> {
        let key = aircraft_key(aircraft);
        let path = self.dir.join(file_name(&key));
        let data = tokio::fs::read(&path).await.ok()?;
        let entry: Entry<T> = serde_json::from_slice(&data).ok()?;
        if entry.aircraft != key {
            return None;
        }
        if self.is_stale(entry.fetched_at) {
            let _ = tokio::fs::remove_file(&path).await;
            return None;
        }
        debug!(aircraft = %key, fetched_at = %entry.fetched_at, "cache hit");
        Some(entry.value)
    }

    /// Best effort; a failed write only costs a refetch later.
    pub async fn set<T: Serialize>(&self, aircraft: &str, value: &T) {
        let key = aircraft_key(aircraft);
        let path = self.dir.join(file_name(&key));
        let entry = Entry {
            aircraft: key,
            fetched_at: Utc::now(),
            value,
        };
        if let Ok(data) = serde_json::to_vec(&entry) {
            let _ = tokio::fs::write(&path, data).await;
        }
    }

    /// Deletes every cached entry of this kind. Returns how many were removed.
    pub async fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                tokio::fs::remove_file(&path).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
