use serde::{Deserialize, Serialize};

use crate::types::SpecField;

/// Pipeline configuration: how to reach the encyclopedia and the lookup
/// tables that drive extraction.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WikiConfig {
    pub api: ApiConfig,
    pub tables: ExtractionTables,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub min_interval_ms: u64,
    /// Retries on HTTP 429 / connection errors. The extraction logic itself
    /// never retries; this only covers the transport.
    pub max_retries: u32,
    pub thumbnail_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://en.wikipedia.org/w/api.php".to_string(),
            user_agent: format!("planefeed/{} (aircraft card feed)", env!("CARGO_PKG_VERSION")),
            timeout_secs: 8,
            min_interval_ms: 50,
            max_retries: 0,
            thumbnail_size: 1000,
        }
    }
}

/// Infobox keys tried for one specification row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecAliases {
    pub field: SpecField,
    pub keys: Vec<String>,
}

/// Fixed lists consulted while extracting. Kept as data so they can be
/// extended from the config file without touching the parsers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionTables {
    pub known_manufacturers: Vec<String>,
    pub infobox_shapes: Vec<String>,
    pub manufacturer_fields: Vec<String>,
    pub first_flight_fields: Vec<String>,
    pub history_sections: Vec<String>,
    pub spec_fields: Vec<SpecAliases>,
}

impl Default for ExtractionTables {
    fn default() -> Self {
        Self {
            known_manufacturers: strings(&[
                "Airbus",
                "Boeing",
                "Lockheed Martin",
                "Lockheed",
                "McDonnell Douglas",
                "Douglas",
                "Northrop Grumman",
                "Northrop",
                "Grumman",
                "General Dynamics",
                "North American",
                "Fairchild",
                "Convair",
                "Sukhoi",
                "Mikoyan",
                "Tupolev",
                "Ilyushin",
                "Antonov",
                "Dassault",
                "Saab",
                "Embraer",
                "Bombardier",
                "de Havilland",
                "Supermarine",
                "Hawker",
                "Messerschmitt",
                "Mitsubishi",
                "BAE Systems",
                "BAC",
                "Eurofighter",
            ]),
            infobox_shapes: strings(&[
                "Infobox aircraft begin",
                "Infobox aircraft type",
                "Infobox aircraft",
                "Infobox military aircraft",
                "Infobox weapon",
                "Aircraft specs",
            ]),
            manufacturer_fields: strings(&[
                "manufacturer",
                "designer",
                "builder",
                "developer",
                "produced by",
                "design org",
                "prime contractor",
                "company",
                "org",
                "producer",
                "built by",
                "origin",
            ]),
            first_flight_fields: strings(&[
                "first flight",
                "maiden flight",
                "first flew",
                "introduced",
                "maiden",
                "flight date",
                "first test flight",
                "prototype first flight",
                "service entry",
                "entered service",
            ]),
            history_sections: strings(&[
                "History",
                "Development",
                "Design",
                "Operational history",
                "Background",
                "Origins",
                "Combat history",
                "Service history",
                "Notable incidents",
            ]),
            spec_fields: default_spec_fields(),
        }
    }
}

impl ExtractionTables {
    /// Known manufacturer matching `candidate` exactly (case-insensitive).
    pub fn known_manufacturer(&self, candidate: &str) -> Option<&str> {
        let candidate = candidate.trim();
        self.known_manufacturers
            .iter()
            .find(|m| m.eq_ignore_ascii_case(candidate))
            .map(String::as_str)
    }

    /// Longest known manufacturer that `name` starts with, case-insensitive.
    pub fn manufacturer_prefix(&self, name: &str) -> Option<&str> {
        self.longest_prefix(name, false)
    }

    /// Like [`manufacturer_prefix`](Self::manufacturer_prefix), but the entry
    /// must end on a word boundary (`Boeing Company`, not `Boeingish`).
    pub fn manufacturer_word_prefix(&self, name: &str) -> Option<&str> {
        self.longest_prefix(name, true)
    }

    fn longest_prefix(&self, name: &str, whole_word: bool) -> Option<&str> {
        let name = name.trim();
        self.known_manufacturers
            .iter()
            .filter(|m| {
                !m.is_empty()
                    && name.len() >= m.len()
                    && name.is_char_boundary(m.len())
                    && name[..m.len()].eq_ignore_ascii_case(m)
                    && (!whole_word
                        || name[m.len()..]
                            .chars()
                            .next()
                            .is_none_or(|c| !c.is_alphanumeric()))
            })
            .max_by_key(|m| m.len())
            .map(String::as_str)
    }

    /// Known manufacturer mentioned earliest in `text` as whole words; the
    /// longer entry wins when two start at the same place.
    pub fn manufacturer_mention(&self, text: &str) -> Option<&str> {
        self.known_manufacturers
            .iter()
            .filter_map(|m| word_position(text, m).map(|pos| (pos, m)))
            .min_by_key(|(pos, m)| (*pos, std::cmp::Reverse(m.len())))
            .map(|(_, m)| m.as_str())
    }

    pub fn aliases(&self, field: SpecField) -> &[String] {
        self.spec_fields
            .iter()
            .find(|s| s.field == field)
            .map(|s| s.keys.as_slice())
            .unwrap_or_default()
    }
}

/// Byte offset (in the lowercased text) of the first whole-word occurrence.
fn word_position(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let hay = haystack.to_lowercase();
    let needle = needle.to_lowercase();
    hay.match_indices(&needle)
        .find(|(idx, _)| {
            let before = hay[..*idx].chars().next_back();
            let after = hay[idx + needle.len()..].chars().next();
            before.is_none_or(|c| !c.is_alphanumeric())
                && after.is_none_or(|c| !c.is_alphanumeric())
        })
        .map(|(idx, _)| idx)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn default_spec_fields() -> Vec<SpecAliases> {
    let table: &[(SpecField, &[&str])] = &[
        (SpecField::Crew, &["crew"]),
        (SpecField::Length, &["length", "length m", "length ft", "length main"]),
        (SpecField::Wingspan, &["wingspan", "span", "span m", "span ft", "span main"]),
        (SpecField::Height, &["height", "height m", "height ft", "height main"]),
        (SpecField::MaxSpeed, &["max speed", "maxspeed", "max speed kmh", "max speed mph", "max speed main"]),
        (SpecField::Range, &["range", "range km", "range nmi", "range main"]),
        (SpecField::Service, &["introduction", "introduced", "service", "in service"]),
        (SpecField::Armament, &["armament", "guns", "hardpoints", "missiles", "bombs"]),
        (SpecField::Capacity, &["capacity"]),
        (SpecField::Engine, &["engine", "engine (prop)", "engine (jet)", "eng1 name", "powerplant"]),
        (SpecField::Weight, &["empty weight", "empty weight kg", "empty weight lb", "weight", "max takeoff weight"]),
        (SpecField::Ceiling, &["ceiling", "ceiling m", "ceiling ft", "service ceiling"]),
        (SpecField::ClimbRate, &["climb rate", "climb rate ms", "climb rate ftmin"]),
        (SpecField::UnitCost, &["unit cost", "program cost"]),
        (SpecField::Status, &["status"]),
        (SpecField::PrimaryUser, &["primary user", "primary users", "users"]),
        (SpecField::Produced, &["produced", "production", "manufactured"]),
        (SpecField::NumberBuilt, &["number built", "numberbuilt", "built"]),
    ];
    table
        .iter()
        .map(|(field, keys)| SpecAliases {
            field: *field,
            keys: strings(keys),
        })
        .collect()
}
