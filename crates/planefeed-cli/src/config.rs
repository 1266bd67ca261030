use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use planefeed_wiki::{ApiConfig, ExtractionTables, WikiConfig};

/// CLI configuration, loaded from `~/.config/planefeed/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FeedConfig {
    pub api: ApiConfig,
    pub feed: FeedSection,
    pub cache: CacheConfig,
    pub tables: ExtractionTables,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSection {
    /// Names the feed draws from when none are given on the command line.
    pub aircraft: Vec<String>,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub record_ttl_secs: u64,
    pub extended_ttl_secs: u64,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for FeedSection {
    fn default() -> Self {
        let aircraft = [
            "Boeing 747",
            "Concorde",
            "Airbus A380",
            "Lockheed SR-71 Blackbird",
            "Supermarine Spitfire",
            "F-22 Raptor",
            "P-51 Mustang",
            "Boeing B-17",
            "Messerschmitt Bf 109",
            "Airbus A320",
            "Boeing 737",
            "Lockheed C-130",
            "F-16 Fighting Falcon",
            "MiG-21",
            "Airbus A350",
            "Boeing 787",
            "F-35",
            "Antonov An-225",
            "DC-3",
            "Hawker Hurricane",
            "B-2 Spirit",
            "F-14 Tomcat",
            "A-10 Thunderbolt II",
            "Mitsubishi Zero",
            "Boeing B-52",
        ];
        Self {
            aircraft: aircraft.iter().map(|s| (*s).to_string()).collect(),
            batch_size: 5,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            record_ttl_secs: 24 * 60 * 60,
            extended_ttl_secs: 7 * 24 * 60 * 60,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl FeedConfig {
    /// `$PLANEFEED_CONFIG`, else `~/.config/planefeed/config.toml`.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PLANEFEED_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("planefeed")
            .join("config.toml")
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Defaults when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn wiki(&self) -> WikiConfig {
        WikiConfig {
            api: self.api.clone(),
            tables: self.tables.clone(),
        }
    }

    /// Feed names: the configured list minus `exclude`, at most `count`.
    pub fn feed_names(&self, exclude: &[String], count: Option<usize>) -> Vec<String> {
        self.feed
            .aircraft
            .iter()
            .filter(|name| !exclude.iter().any(|ex| ex.eq_ignore_ascii_case(name)))
            .take(count.unwrap_or(self.feed.batch_size))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        let cfg = FeedConfig::default();
        assert_eq!(cfg.feed.batch_size, 5);
        assert_eq!(cfg.feed.aircraft.len(), 25);
        assert_eq!(cfg.api.timeout_secs, 8);
        assert!(cfg.cache.enabled);
    }

    #[test]
    fn config_toml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = FeedConfig::default();
        cfg.feed.batch_size = 3;
        cfg.tables.known_manufacturers.push("Pilatus".to_string());
        cfg.save_to(&path).unwrap();

        let loaded = FeedConfig::load_from(&path).unwrap();
        assert_eq!(loaded.feed.batch_size, 3);
        assert!(loaded.wiki().tables.known_manufacturer("pilatus").is_some());
    }

    #[test]
    fn load_nonexistent_returns_default() {
        let dir = TempDir::new().unwrap();
        let cfg = FeedConfig::load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(cfg.cache.record_ttl_secs, 86_400);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[feed]\nbatch_size = \"many\"\n").unwrap();
        assert!(FeedConfig::load_from(&path).is_err());
    }

    #[test]
    fn feed_names_exclude_and_limit() {
        let cfg = FeedConfig::default();
        let names = cfg.feed_names(&["concorde".to_string()], None);
        assert_eq!(names, vec!["Boeing 747", "Airbus A380", "Lockheed SR-71 Blackbird", "Supermarine Spitfire", "F-22 Raptor"]);
        assert_eq!(cfg.feed_names(&[], Some(2)).len(), 2);
    }
}
